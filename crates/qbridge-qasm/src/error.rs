//! Error types for the QASM parser, extractor and emitters.

use thiserror::Error;

/// Errors that can occur while parsing, extracting or emitting QASM.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Lexer error (invalid token).
    #[error("Lexer error at position {position}: {message}")]
    LexerError { position: usize, message: String },

    /// Unexpected token.
    #[error("Unexpected token at line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// Missing or invalid `OPENQASM` header.
    #[error("Invalid OPENQASM version: {0}")]
    InvalidVersion(String),

    /// Undefined identifier.
    #[error("Undefined identifier: {0}")]
    UndefinedIdentifier(String),

    /// Duplicate declaration.
    #[error("Duplicate declaration: {0}")]
    DuplicateDeclaration(String),

    /// Gate name that is neither built in nor user-defined.
    #[error("Gate '{0}' not supported")]
    UnknownGate(String),

    /// Wrong number of qubit operands.
    #[error("Gate '{gate}' expects {expected} qubits, got {got}")]
    WrongQubitCount {
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Wrong number of parameters.
    #[error("Gate '{gate}' expects {expected} parameters, got {got}")]
    WrongParameterCount {
        gate: String,
        expected: usize,
        got: usize,
    },

    /// Index out of bounds.
    #[error("Index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        register: String,
        index: i64,
        size: usize,
    },

    /// Broadcast operands of different lengths.
    #[error("Register size mismatch in '{gate}': {sizes:?}")]
    RegisterSizeMismatch { gate: String, sizes: Vec<usize> },

    /// The same qubit used twice in one application.
    #[error("Duplicate qubit operand in '{gate}'")]
    DuplicateOperand { gate: String },

    /// Syntactically valid construct that cannot be lowered to a
    /// static instruction stream.
    #[error("Unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// IR error during circuit construction or modifier expansion.
    #[error("Circuit error: {0}")]
    Ir(#[from] qbridge_ir::IrError),

    /// Generic parse error.
    #[error("Parse error: {0}")]
    Generic(String),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
