//! qbridge conversion engine
//!
//! This crate ties the program formats together. It tags opaque inputs
//! with a [`ProgramType`], resolves a path of converters through the
//! [`ConversionGraph`] and applies it.
//!
//! # Overview
//!
//! ```text
//! QuantumProgram
//!       |
//!       v
//! ProgramTypeRegistry::classify  -> ProgramType
//!       |
//!       v
//! ConversionGraph::resolve_path  -> [edge] or [edge, edge] via a bridge
//!       |
//!       v
//! ConversionEdge::apply ...      -> QuantumProgram of the target type
//! ```
//!
//! # Program Types
//!
//! | Type | Value | Recognized by |
//! |------|-------|---------------|
//! | `qasm2` | [`QuantumProgram::Text`] | `OPENQASM 2.x;` header |
//! | `qasm3` | [`QuantumProgram::Text`] | `OPENQASM 3.x;` header |
//! | `openqasm3` | [`QuantumProgram::Ast`] | parsed syntax tree |
//! | `qbridge` | [`QuantumProgram::Circuit`] | in-memory circuit (the bridge) |
//! | `ionq` | [`QuantumProgram::Json`] | object with `qubits` and `circuit` |
//!
//! # Example
//!
//! ```rust
//! use qbridge_transpiler::{ProgramType, convert};
//! use serde_json::json;
//!
//! let job = convert(
//!     r#"OPENQASM 2.0; include "qelib1.inc"; qreg q[2]; h q; cx q[0],q[1];"#,
//!     ProgramType::IonQ,
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     job.as_json().unwrap(),
//!     &json!({
//!         "qubits": 2,
//!         "circuit": [
//!             {"gate": "h", "target": 0},
//!             {"gate": "h", "target": 1},
//!             {"gate": "cnot", "control": 0, "target": 1}
//!         ],
//!         "gateset": "qis"
//!     })
//! );
//! ```

pub mod classify;
pub mod config;
pub mod conversions;
pub mod error;
pub mod graph;
pub mod logging;
pub mod program;
mod transpiler;

pub use classify::{Predicate, ProgramSpec, ProgramTypeRegistry};
pub use config::{ConfigError, ConversionRef, LoggingConfig, TranspilerConfig};
pub use error::{ClassificationError, TranspileResult, TranspilerError};
pub use graph::{ConversionEdge, ConversionGraph, ConvertFn};
pub use program::{ProgramType, QuantumProgram};
pub use transpiler::{Transpiler, classify, convert};
