//! Error types for classification and conversion.

use qbridge_ionq::IonQError;
use qbridge_ir::IrError;
use qbridge_qasm::ParseError;
use thiserror::Error;

use crate::program::ProgramType;

/// Result type for transpiler operations.
pub type TranspileResult<T> = Result<T, TranspilerError>;

/// The input could not be tagged with exactly one program type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassificationError {
    /// No registered predicate accepts the input.
    #[error("Unsupported program format: {0}")]
    Unsupported(String),

    /// More than one predicate accepts the input and no overlap rule
    /// decides between them.
    #[error("Ambiguous program format: input matches {}", format_types(.0))]
    Ambiguous(Vec<ProgramType>),
}

fn format_types(types: &[ProgramType]) -> String {
    types
        .iter()
        .map(|ty| format!("'{ty}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced by [`Transpiler`](crate::Transpiler).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranspilerError {
    /// Input type unrecognized or ambiguous.
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    /// Language feature outside what conversion can lower.
    #[error("Unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// No direct edge and no bridge route between two types.
    #[error("No conversion path from '{from}' to '{to}'")]
    NoConversionPath { from: ProgramType, to: ProgramType },

    /// The output would violate a structural rule of the target format.
    #[error("Conversion validation failed: {0}")]
    Validation(String),

    /// Malformed source text or document.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An edge received a value of the wrong kind.
    #[error("Expected a '{expected}' program, found a {found} value")]
    InputMismatch {
        expected: ProgramType,
        found: &'static str,
    },
}

impl From<ParseError> for TranspilerError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnsupportedConstruct(msg) => TranspilerError::UnsupportedConstruct(msg),
            ParseError::UnknownGate(_) => TranspilerError::Validation(err.to_string()),
            ParseError::Ir(ir) => ir.into(),
            other => TranspilerError::Parse(other.to_string()),
        }
    }
}

impl From<IrError> for TranspilerError {
    fn from(err: IrError) -> Self {
        match err {
            IrError::UnsupportedModifier(msg) => TranspilerError::UnsupportedConstruct(msg),
            other => TranspilerError::Validation(other.to_string()),
        }
    }
}

impl From<IonQError> for TranspilerError {
    fn from(err: IonQError) -> Self {
        match err {
            IonQError::Ir(ir) => ir.into(),
            IonQError::Json(json) => TranspilerError::Parse(json.to_string()),
            IonQError::Malformed(msg) => TranspilerError::Parse(msg),
            other => TranspilerError::Validation(other.to_string()),
        }
    }
}
