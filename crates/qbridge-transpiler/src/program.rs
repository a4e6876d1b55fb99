//! Program types and the values that carry them.

use std::fmt;
use std::str::FromStr;

use qbridge_ir::Circuit;
use qbridge_qasm::Program;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClassificationError, TranspileResult, TranspilerError};

/// A family of circuit representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramType {
    /// OpenQASM 2 source text.
    Qasm2,
    /// OpenQASM 3 source text.
    Qasm3,
    /// A parsed OpenQASM 3 syntax tree.
    OpenQasm3,
    /// An in-memory [`Circuit`].
    Qbridge,
    /// An IonQ job description.
    IonQ,
}

impl ProgramType {
    /// Every program type, in declaration order.
    pub const ALL: [ProgramType; 5] = [
        ProgramType::Qasm2,
        ProgramType::Qasm3,
        ProgramType::OpenQasm3,
        ProgramType::Qbridge,
        ProgramType::IonQ,
    ];

    /// The canonical alias.
    pub fn as_str(self) -> &'static str {
        match self {
            ProgramType::Qasm2 => "qasm2",
            ProgramType::Qasm3 => "qasm3",
            ProgramType::OpenQasm3 => "openqasm3",
            ProgramType::Qbridge => "qbridge",
            ProgramType::IonQ => "ionq",
        }
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgramType {
    type Err = TranspilerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProgramType::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ClassificationError::Unsupported(format!("unknown program type '{s}'")).into()
            })
    }
}

/// An opaque program value handed to the transpiler.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantumProgram {
    /// Source text.
    Text(String),
    /// A JSON document.
    Json(Value),
    /// A parsed OpenQASM syntax tree.
    Ast(Box<Program>),
    /// An in-memory circuit.
    Circuit(Circuit),
}

impl QuantumProgram {
    /// Short name of the value's structural kind.
    pub fn kind(&self) -> &'static str {
        match self {
            QuantumProgram::Text(_) => "text",
            QuantumProgram::Json(_) => "json",
            QuantumProgram::Ast(_) => "ast",
            QuantumProgram::Circuit(_) => "circuit",
        }
    }

    /// The source text, for textual programs.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            QuantumProgram::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The JSON document, for JSON programs.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            QuantumProgram::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The parsed QASM3 syntax tree.
    pub fn as_ast(&self) -> Option<&Program> {
        match self {
            QuantumProgram::Ast(program) => Some(program),
            _ => None,
        }
    }

    /// The bridge circuit.
    pub fn as_circuit(&self) -> Option<&Circuit> {
        match self {
            QuantumProgram::Circuit(circuit) => Some(circuit),
            _ => None,
        }
    }

    /// Take the text out, or fail naming the type that was expected.
    pub fn into_text(self, expected: ProgramType) -> TranspileResult<String> {
        match self {
            QuantumProgram::Text(text) => Ok(text),
            other => Err(other.mismatch(expected)),
        }
    }

    /// Take the JSON document out, or fail naming the type that was expected.
    pub fn into_json(self, expected: ProgramType) -> TranspileResult<Value> {
        match self {
            QuantumProgram::Json(value) => Ok(value),
            other => Err(other.mismatch(expected)),
        }
    }

    /// Take the syntax tree out, or fail naming the type that was expected.
    pub fn into_ast(self, expected: ProgramType) -> TranspileResult<Program> {
        match self {
            QuantumProgram::Ast(program) => Ok(*program),
            other => Err(other.mismatch(expected)),
        }
    }

    /// Take the circuit out, or fail naming the type that was expected.
    pub fn into_circuit(self, expected: ProgramType) -> TranspileResult<Circuit> {
        match self {
            QuantumProgram::Circuit(circuit) => Ok(circuit),
            other => Err(other.mismatch(expected)),
        }
    }

    fn mismatch(&self, expected: ProgramType) -> TranspilerError {
        TranspilerError::InputMismatch {
            expected,
            found: self.kind(),
        }
    }
}

impl From<String> for QuantumProgram {
    fn from(text: String) -> Self {
        QuantumProgram::Text(text)
    }
}

impl From<&str> for QuantumProgram {
    fn from(text: &str) -> Self {
        QuantumProgram::Text(text.to_string())
    }
}

impl From<Value> for QuantumProgram {
    fn from(value: Value) -> Self {
        QuantumProgram::Json(value)
    }
}

impl From<Program> for QuantumProgram {
    fn from(program: Program) -> Self {
        QuantumProgram::Ast(Box::new(program))
    }
}

impl From<Circuit> for QuantumProgram {
    fn from(circuit: Circuit) -> Self {
        QuantumProgram::Circuit(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        for ty in ProgramType::ALL {
            assert_eq!(ty.as_str().parse::<ProgramType>().unwrap(), ty);
        }
        assert_eq!("OpenQASM3".parse::<ProgramType>().unwrap(), ProgramType::OpenQasm3);
        assert!("cirq".parse::<ProgramType>().is_err());
    }

    #[test]
    fn test_serde_uses_aliases() {
        let json = serde_json::to_string(&ProgramType::OpenQasm3).unwrap();
        assert_eq!(json, "\"openqasm3\"");
        let ty: ProgramType = serde_json::from_str("\"ionq\"").unwrap();
        assert_eq!(ty, ProgramType::IonQ);
    }

    #[test]
    fn test_mismatch() {
        let program = QuantumProgram::from("OPENQASM 2.0;");
        let err = program.into_circuit(ProgramType::Qbridge).unwrap_err();
        assert!(matches!(
            err,
            TranspilerError::InputMismatch {
                expected: ProgramType::Qbridge,
                found: "text"
            }
        ));
    }
}
