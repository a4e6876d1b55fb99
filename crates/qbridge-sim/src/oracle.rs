//! The equivalence oracle.
//!
//! Lowers two programs of any supported type to circuits through the
//! transpiler and compares their action up to global phase. Used for
//! verifying conversions, never on the conversion path itself.

use qbridge_ir::Circuit;
use qbridge_transpiler::{ProgramType, QuantumProgram, Transpiler};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compare::circuits_allclose;
use crate::error::SimResult;

/// Oracle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Absolute tolerance for element-wise comparison.
    #[serde(default = "default_atol")]
    pub atol: f64,

    /// Largest register compared by full unitary.
    #[serde(default = "default_max_unitary_qubits")]
    pub max_unitary_qubits: usize,
}

fn default_atol() -> f64 {
    1e-7
}

fn default_max_unitary_qubits() -> usize {
    10
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            atol: default_atol(),
            max_unitary_qubits: default_max_unitary_qubits(),
        }
    }
}

/// Compares programs by simulation.
#[derive(Debug, Clone)]
pub struct EquivalenceOracle {
    transpiler: Transpiler,
    config: OracleConfig,
}

impl Default for EquivalenceOracle {
    fn default() -> Self {
        Self::new(OracleConfig::default())
    }
}

impl EquivalenceOracle {
    /// An oracle lowering through the default transpiler.
    pub fn new(config: OracleConfig) -> Self {
        Self::with_transpiler(Transpiler::global().clone(), config)
    }

    /// An oracle lowering through `transpiler`.
    pub fn with_transpiler(transpiler: Transpiler, config: OracleConfig) -> Self {
        Self { transpiler, config }
    }

    /// Thresholds in effect.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Lower a program to a circuit.
    pub fn lower(&self, program: &QuantumProgram) -> SimResult<Circuit> {
        if let QuantumProgram::Circuit(circuit) = program {
            return Ok(circuit.clone());
        }
        let lowered = self
            .transpiler
            .convert(program.clone(), ProgramType::Qbridge)?;
        Ok(lowered.into_circuit(ProgramType::Qbridge)?)
    }

    /// Whether two programs act identically within `atol`, up to global
    /// phase.
    pub fn allclose(
        &self,
        a: &QuantumProgram,
        b: &QuantumProgram,
        atol: f64,
    ) -> SimResult<bool> {
        let (ca, cb) = (self.lower(a)?, self.lower(b)?);
        let equal = circuits_allclose(&ca, &cb, atol, self.config.max_unitary_qubits)?;
        debug!(equal, atol, qubits = ca.num_qubits(), "compared programs");
        Ok(equal)
    }

    /// [`allclose`](Self::allclose) with the configured tolerance.
    pub fn equivalent(&self, a: &QuantumProgram, b: &QuantumProgram) -> SimResult<bool> {
        self.allclose(a, b, self.config.atol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = OracleConfig::default();
        assert!((config.atol - 1e-7).abs() < f64::EPSILON);
        assert_eq!(config.max_unitary_qubits, 10);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: OracleConfig = serde_json::from_value(json!({"atol": 1e-6})).unwrap();
        assert_eq!(config.max_unitary_qubits, 10);
    }

    #[test]
    fn test_text_against_job() {
        let oracle = EquivalenceOracle::default();
        let qasm = QuantumProgram::from(
            r#"OPENQASM 2.0; include "qelib1.inc"; qreg q[2]; h q[0]; cx q[0], q[1];"#,
        );
        let job = QuantumProgram::from(json!({
            "qubits": 2,
            "circuit": [
                {"gate": "h", "target": 0},
                {"gate": "cnot", "control": 0, "target": 1}
            ]
        }));
        assert!(oracle.equivalent(&qasm, &job).unwrap());

        let swapped = QuantumProgram::from(json!({
            "qubits": 2,
            "circuit": [
                {"gate": "h", "target": 1},
                {"gate": "cnot", "control": 1, "target": 0}
            ]
        }));
        assert!(!oracle.equivalent(&qasm, &swapped).unwrap());
    }

    #[test]
    fn test_unclassifiable_input() {
        let oracle = EquivalenceOracle::default();
        let err = oracle
            .equivalent(&QuantumProgram::from("h q;"), &QuantumProgram::from("h q;"))
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported program format"));
    }
}
