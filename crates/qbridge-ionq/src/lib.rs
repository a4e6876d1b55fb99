//! IonQ job-description format for qbridge
//!
//! An IonQ job is a JSON object listing a qubit count, a gate set and a
//! flat array of gate records. This crate models the record
//! ([`IonQProgram`], [`IonQOperation`]), converts normalized instruction
//! streams into it, and reads it back into a [`Circuit`](qbridge_ir::Circuit).
//!
//! # Gate sets
//!
//! | Gate set | Gates | Parameters |
//! |----------|-------|------------|
//! | `qis` | `x`, `not`, `y`, `z`, `h`, `s`, `si`, `t`, `ti`, `v`, `vi`, `rx`, `ry`, `rz`, `cnot`, `swap`, `xx`, `yy`, `zz` | rotations in radians |
//! | `native` | `gpi`, `gpi2`, `ms`, `zz` | phases in `[-1, 1]` turns, angles in `[0, 0.25]` turns |
//!
//! A job uses exactly one gate set. Measurements are not representable.
//!
//! # Example
//!
//! ```rust
//! use qbridge_ir::{Circuit, GateSet, QubitId};
//! use qbridge_ionq::IonQProgram;
//!
//! let mut circuit = Circuit::with_size("bell", 2, 0);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//!
//! let job = IonQProgram::from_circuit(&circuit).unwrap();
//! assert_eq!(job.gateset, GateSet::Qis);
//! assert_eq!(job.circuit[1].gate, "cnot");
//! assert_eq!(job.circuit[1].control, Some(0));
//! ```

mod convert;
mod error;
mod job;
pub mod validate;

pub use error::{IonQError, IonQResult};
pub use job::{IonQOperation, IonQProgram, is_ionq_job};
