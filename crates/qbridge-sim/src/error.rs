//! Error types for simulation and equivalence checking.

use qbridge_transpiler::TranspilerError;
use thiserror::Error;

/// Errors that can occur while simulating a circuit.
#[derive(Debug, Error)]
pub enum SimError {
    /// A gate parameter has no numeric value.
    #[error("Cannot simulate gate '{gate}' with symbolic parameter {expression}")]
    SymbolicParameter { gate: String, expression: String },

    /// A gate acts on a qubit after it was measured.
    #[error("Instruction {index} acts on a measured qubit; only terminal measurements can be simulated")]
    MidCircuitMeasurement { index: usize },

    /// Resets have no unitary action.
    #[error("Instruction {index} is a reset, which has no unitary action")]
    Reset { index: usize },

    /// The register is too large for a dense representation.
    #[error("Cannot simulate {num_qubits} qubits (maximum {max})")]
    TooManyQubits { num_qubits: usize, max: usize },

    /// Lowering a program to a circuit failed.
    #[error("Failed to lower program for simulation: {0}")]
    Transpile(#[from] TranspilerError),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
