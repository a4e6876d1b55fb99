//! Error types for the IonQ format.

use thiserror::Error;

/// Result type for IonQ conversions.
pub type IonQResult<T> = Result<T, IonQError>;

/// Ways a program can fail to become, or be read from, an IonQ job.
#[derive(Debug, Error)]
pub enum IonQError {
    /// Gate has no IonQ spelling.
    #[error("Gate '{0}' not supported")]
    UnsupportedGate(String),

    /// Native and QIS gates in one circuit.
    #[error("Cannot mix native and QIS gates in the same circuit (native '{native}', QIS '{qis}')")]
    MixedGateSets {
        /// First native gate seen.
        native: String,
        /// First QIS gate seen.
        qis: String,
    },

    /// The job format has no measurement concept.
    #[error("Circuits with measurements are not supported by the IonQ job format")]
    Measurement,

    /// Non-unitary operation other than measurement.
    #[error("Operation '{0}' is not supported by the IonQ job format")]
    UnsupportedOperation(String),

    /// Required parameter absent.
    #[error("{parameter} parameter is required for gate '{gate}'")]
    MissingParameter {
        /// Gate name.
        gate: String,
        /// Capitalised parameter name (`Phase`, `Angle`, `Rotation`).
        parameter: &'static str,
    },

    /// Phase outside `[-1, 1]` turns, or not numeric.
    #[error("Invalid phase value {value} for gate '{gate}': must be a number in [-1, 1]")]
    InvalidPhase {
        /// Gate name.
        gate: String,
        /// Offending value as written.
        value: String,
    },

    /// Angle outside `[0, 0.25]` turns, or not numeric.
    #[error("Invalid angle value {value} for gate '{gate}': must be a number in [0, 0.25]")]
    InvalidAngle {
        /// Gate name.
        gate: String,
        /// Offending value as written.
        value: String,
    },

    /// Wrong number of parameters.
    #[error("Invalid number of parameters for gate '{gate}': expected {expected}, got {got}")]
    InvalidParameterCount {
        /// Gate name.
        gate: String,
        /// Accepted counts.
        expected: &'static str,
        /// Actual count.
        got: usize,
    },

    /// Rotation angle that is not a number.
    #[error("Parameter '{value}' of gate '{gate}' must be numeric")]
    SymbolicParameter {
        /// Gate name.
        gate: String,
        /// The symbolic expression.
        value: String,
    },

    /// Operand count does not fit the gate.
    #[error("Gate '{gate}' expects {expected} operands, got {got}")]
    OperandMismatch {
        /// Gate name.
        gate: String,
        /// Expected operands.
        expected: usize,
        /// Actual operands.
        got: usize,
    },

    /// Record is missing a required field.
    #[error("Malformed IonQ operation: {0}")]
    Malformed(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Circuit construction failed.
    #[error("Circuit error: {0}")]
    Ir(#[from] qbridge_ir::IrError),
}
