//! qbridge statevector simulator and equivalence oracle
//!
//! This crate checks that conversions preserve semantics. It simulates
//! [`Circuit`](qbridge_ir::Circuit)s exactly, as dense statevectors or
//! unitaries, and compares two programs of any supported type up to global
//! phase.
//!
//! # Features
//!
//! - **All IR gates**: QIS, trapped-ion native and arbitrarily-controlled
//! - **Terminal measurements** and barriers are ignored; mid-circuit
//!   measurements and resets are rejected
//! - **Unitary or statevector comparison** depending on register size
//!
//! # Performance
//!
//! | Qubits | Unitary | Statevector |
//! |--------|---------|-------------|
//! | 5 | Instant | Instant |
//! | 10 | ~16 MB | Instant |
//! | 20 | Not used | ~16 MB |
//! | 24 | Not used | ~256 MB (limit) |
//!
//! # Example
//!
//! ```rust
//! use qbridge_sim::EquivalenceOracle;
//! use qbridge_transpiler::QuantumProgram;
//!
//! let oracle = EquivalenceOracle::default();
//! let a = QuantumProgram::from(r#"OPENQASM 3.0; include "stdgates.inc"; qubit q; sx q;"#);
//! let b = QuantumProgram::from(r#"OPENQASM 3.0; include "stdgates.inc"; qubit q; rx(pi/2) q;"#);
//! assert!(oracle.equivalent(&a, &b).unwrap());
//! ```

mod compare;
mod error;
pub mod matrix;
mod oracle;
mod statevector;

pub use compare::{allclose_up_to_global_phase, circuit_unitary, circuits_allclose};
pub use error::{SimError, SimResult};
pub use oracle::{EquivalenceOracle, OracleConfig};
pub use statevector::{MAX_QUBITS, Statevector};
