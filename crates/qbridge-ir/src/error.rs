//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit index outside the circuit.
    #[error("Qubit {qubit} out of range for a circuit with {num_qubits} qubits{}", format_gate_context(.gate_name))]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Number of qubits in the circuit.
        num_qubits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Classical bit index outside the circuit.
    #[error("Classical bit c{clbit} out of range for a circuit with {num_clbits} classical bits")]
    ClbitOutOfRange {
        /// The offending classical bit index.
        clbit: u32,
        /// Number of classical bits in the circuit.
        num_clbits: u32,
    },

    /// Gate requires different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Gate requires different number of parameters.
    #[error("Gate '{gate_name}' takes {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Accepted parameter count (e.g. "1" or "2 or 3").
        expected: String,
        /// Actual number of parameters provided.
        got: usize,
    },

    /// Gate name is not part of the vocabulary.
    #[error("Unknown gate '{0}'")]
    UnknownGate(String),

    /// A gate modifier cannot be applied.
    #[error("Unsupported gate modifier: {0}")]
    UnsupportedModifier(String),

    /// Measurement operands do not pair up.
    #[error("measure: qubit count ({qubits}) does not match clbit count ({clbits})")]
    MeasureMismatch {
        /// Number of measured qubits.
        qubits: usize,
        /// Number of target classical bits.
        clbits: usize,
    },

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },
}

#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
