//! Program classification.
//!
//! Each program type registers a predicate over [`QuantumProgram`] values.
//! Predicates look at the value's structural kind and, for text, at the
//! `OPENQASM` header only; nothing is parsed in full. Exactly one predicate
//! must accept an input. When two predicates are deliberately overlapping,
//! the pair is declared with [`ProgramTypeRegistry::declare_overlap`];
//! every other multi-match is an error.

use qbridge_ionq::is_ionq_job;
use qbridge_qasm::header_version;
use tracing::trace;

use crate::error::ClassificationError;
use crate::program::{ProgramType, QuantumProgram};

/// Structural test for one program type.
pub type Predicate = fn(&QuantumProgram) -> bool;

/// A program type together with the predicate that recognizes it.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSpec {
    /// The type this spec tags.
    pub program_type: ProgramType,
    /// Recognizer for programs of that type.
    pub predicate: Predicate,
}

impl ProgramSpec {
    /// Pair a type with its recognizer.
    pub fn new(program_type: ProgramType, predicate: Predicate) -> Self {
        Self {
            program_type,
            predicate,
        }
    }

    /// Whether this spec accepts the program.
    pub fn matches(&self, program: &QuantumProgram) -> bool {
        (self.predicate)(program)
    }
}

/// Registered predicates and declared overlaps.
#[derive(Debug, Clone, Default)]
pub struct ProgramTypeRegistry {
    specs: Vec<ProgramSpec>,
    /// `(preferred, superseded)` pairs.
    overlaps: Vec<(ProgramType, ProgramType)>,
}

impl ProgramTypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry for every built-in program type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ProgramSpec::new(ProgramType::Qasm2, is_qasm2));
        registry.register(ProgramSpec::new(ProgramType::Qasm3, is_qasm3));
        registry.register(ProgramSpec::new(ProgramType::OpenQasm3, |p| {
            matches!(p, QuantumProgram::Ast(_))
        }));
        registry.register(ProgramSpec::new(ProgramType::Qbridge, |p| {
            matches!(p, QuantumProgram::Circuit(_))
        }));
        registry.register(ProgramSpec::new(ProgramType::IonQ, |p| {
            p.as_json().is_some_and(is_ionq_job)
        }));
        registry
    }

    /// Register a predicate. A later spec for the same type replaces the
    /// earlier one.
    pub fn register(&mut self, spec: ProgramSpec) {
        self.specs.retain(|s| s.program_type != spec.program_type);
        self.specs.push(spec);
    }

    /// Declare that `preferred` wins whenever both it and `superseded` match.
    pub fn declare_overlap(&mut self, preferred: ProgramType, superseded: ProgramType) {
        if !self.overlaps.contains(&(preferred, superseded)) {
            self.overlaps.push((preferred, superseded));
        }
    }

    /// Registered specs in registration order.
    pub fn specs(&self) -> &[ProgramSpec] {
        &self.specs
    }

    /// Tag a program with its type.
    pub fn classify(&self, program: &QuantumProgram) -> Result<ProgramType, ClassificationError> {
        let matches: Vec<ProgramType> = self
            .specs
            .iter()
            .filter(|spec| spec.matches(program))
            .map(|spec| spec.program_type)
            .collect();
        trace!(kind = program.kind(), ?matches, "classifier predicates evaluated");

        let remaining: Vec<ProgramType> = matches
            .iter()
            .copied()
            .filter(|ty| {
                !matches
                    .iter()
                    .any(|other| self.overlaps.contains(&(*other, *ty)))
            })
            .collect();

        match remaining.as_slice() {
            [ty] => Ok(*ty),
            [] if matches.is_empty() => Err(ClassificationError::Unsupported(describe(program))),
            // Overlap rules that cancel each other out.
            [] => Err(ClassificationError::Ambiguous(matches)),
            _ => Err(ClassificationError::Ambiguous(remaining)),
        }
    }
}

fn is_qasm2(program: &QuantumProgram) -> bool {
    program.as_text().and_then(header_version) == Some(2)
}

fn is_qasm3(program: &QuantumProgram) -> bool {
    program.as_text().and_then(header_version) == Some(3)
}

fn describe(program: &QuantumProgram) -> String {
    match program {
        QuantumProgram::Text(text) => match header_version(text) {
            Some(version) => format!("OpenQASM version {version} is not supported"),
            None => "text without an OPENQASM header".to_string(),
        },
        QuantumProgram::Json(_) => {
            "JSON document without 'qubits' and 'circuit' keys".to_string()
        }
        other => format!("no program type accepts a {} value", other.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbridge_ir::Circuit;
    use serde_json::json;

    #[test]
    fn test_classify_text() {
        let registry = ProgramTypeRegistry::with_defaults();
        let qasm2 = QuantumProgram::from("OPENQASM 2.0;\nqreg q[1];");
        let qasm3 = QuantumProgram::from("// header\nOPENQASM 3.0;\nqubit q;");
        assert_eq!(registry.classify(&qasm2), Ok(ProgramType::Qasm2));
        assert_eq!(registry.classify(&qasm3), Ok(ProgramType::Qasm3));
    }

    #[test]
    fn test_classify_objects() {
        let registry = ProgramTypeRegistry::with_defaults();
        let circuit = QuantumProgram::from(Circuit::with_size("c", 1, 0));
        let ast = QuantumProgram::from(qbridge_qasm::parse("OPENQASM 3.0; qubit q;").unwrap());
        let job = QuantumProgram::from(json!({"qubits": 1, "circuit": []}));
        assert_eq!(registry.classify(&circuit), Ok(ProgramType::Qbridge));
        assert_eq!(registry.classify(&ast), Ok(ProgramType::OpenQasm3));
        assert_eq!(registry.classify(&job), Ok(ProgramType::IonQ));
    }

    #[test]
    fn test_unsupported() {
        let registry = ProgramTypeRegistry::with_defaults();
        for program in [
            QuantumProgram::from("qreg q[1];"),
            QuantumProgram::from("OPENQASM 4.0;"),
            QuantumProgram::from(json!({"circuit": []})),
        ] {
            assert!(matches!(
                registry.classify(&program),
                Err(ClassificationError::Unsupported(_))
            ));
        }
    }

    #[test]
    fn test_overlap_needs_declaration() {
        let mut registry = ProgramTypeRegistry::with_defaults();
        registry.register(ProgramSpec::new(ProgramType::Qasm3, |p| {
            p.as_text().is_some_and(|t| t.contains("OPENQASM"))
        }));
        let program = QuantumProgram::from("OPENQASM 2.0;");

        let err = registry.classify(&program).unwrap_err();
        assert_eq!(
            err,
            ClassificationError::Ambiguous(vec![ProgramType::Qasm2, ProgramType::Qasm3])
        );

        registry.declare_overlap(ProgramType::Qasm2, ProgramType::Qasm3);
        assert_eq!(registry.classify(&program), Ok(ProgramType::Qasm2));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ProgramTypeRegistry::with_defaults();
        registry.register(ProgramSpec::new(ProgramType::IonQ, |_| false));
        assert_eq!(registry.specs().len(), ProgramType::ALL.len());
    }
}
