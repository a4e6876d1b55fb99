//! qbridge circuit intermediate representation
//!
//! This crate holds the data structures every program format in qbridge
//! converts through.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`], dense 0-based
//!   indices across the flattened register
//! - **Parameters**: [`ParameterExpression`] for constant and symbolic angles
//! - **Gates**: [`StandardGate`] for the QIS and trapped-ion native
//!   vocabularies, [`Gate`] for arbitrarily-controlled variants
//! - **Normalized instructions**: [`NormalizedInstruction`] and
//!   [`NormalizedProgram`], the format-neutral stream produced by extractors,
//!   with modifier expansion in [`inverse_sequence`], [`power_sequence`] and
//!   [`control_sequence`]
//! - **Circuit**: [`Circuit`], the bridge representation
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qbridge_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! let normalized = circuit.to_normalized();
//! assert_eq!(normalized.instructions[1].gate, "cx");
//! assert!(normalized.has_measurements());
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Set | Description |
//! |------|--------|-----|-------------|
//! | `X`, `Y`, `Z`, `H` | 1 | QIS | Pauli and Hadamard gates |
//! | `S`, `Sdg`, `T`, `Tdg`, `SX`, `SXdg` | 1 | QIS | Clifford+T roots |
//! | `Rx`, `Ry`, `Rz`, `P`, `U` | 1 | QIS | Rotations and U(θ,φ,λ) |
//! | `CX`, `CY`, `CZ`, `CH`, `Swap` | 2 | QIS | Two-qubit gates |
//! | `CRx`, `CRy`, `CRz`, `CP`, `RXX`, `RYY`, `RZZ` | 2 | QIS | Parametric two-qubit gates |
//! | `CCX`, `CSwap` | 3 | QIS | Toffoli and Fredkin |
//! | `GPI`, `GPI2` | 1 | native | Phase gates, φ in turns |
//! | `MS`, `ZZ` | 2 | native | Mølmer–Sørensen and ZZ interaction |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod normalized;
pub mod parameter;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{Gate, GateSet, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use normalized::{
    NormalizedInstruction, NormalizedProgram, control_sequence, inverse_sequence, power_sequence,
};
pub use parameter::{MathFunction, ParameterExpression};
pub use qubit::{ClbitId, QubitId};
