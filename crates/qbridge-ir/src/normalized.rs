//! Format-neutral instruction stream.
//!
//! A [`NormalizedInstruction`] names a gate as a string and lists its
//! operands as dense qubit indices. Extractors produce these, converters
//! consume them. Modifier expansion (`inv @`, `pow(k) @`, `ctrl @`)
//! works on whole instruction sequences and always returns new values.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::parameter::ParameterExpression;

/// Name of the measurement pseudo-gate.
pub const MEASURE: &str = "measure";
/// Name of the reset pseudo-gate.
pub const RESET: &str = "reset";
/// Name of the barrier pseudo-gate.
pub const BARRIER: &str = "barrier";
/// Name of the global-phase pseudo-gate. It has no targets; under
/// `ctrl @` it becomes a phase gate on the controls.
pub const GPHASE: &str = "gphase";

/// Largest number of instructions an integer `pow(k) @` may expand to.
pub const MAX_POWER_EXPANSION: usize = 1 << 16;

/// A single operation in a normalized program.
///
/// `controls` precede `targets` in the gate's operand order, so
/// `{gate: "x", controls: [0], targets: [1]}` and
/// `{gate: "cx", targets: [0, 1]}` describe the same CNOT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInstruction {
    /// Gate name (lowercase for standard gates).
    pub gate: String,
    /// Target qubits, in declared order.
    pub targets: Vec<u32>,
    /// Control qubits, in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<u32>,
    /// Gate parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParameterExpression>,
    /// Classical bits written by a measurement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clbits: Vec<u32>,
}

impl NormalizedInstruction {
    /// Create an uncontrolled, parameterless instruction.
    pub fn new(gate: impl Into<String>, targets: impl IntoIterator<Item = u32>) -> Self {
        Self {
            gate: gate.into(),
            targets: targets.into_iter().collect(),
            controls: vec![],
            params: vec![],
            clbits: vec![],
        }
    }

    /// Set the control qubits.
    #[must_use]
    pub fn with_controls(mut self, controls: impl IntoIterator<Item = u32>) -> Self {
        self.controls = controls.into_iter().collect();
        self
    }

    /// Set the parameters.
    #[must_use]
    pub fn with_params(mut self, params: impl IntoIterator<Item = ParameterExpression>) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    /// Measure `qubit` into `clbit`.
    pub fn measure(qubit: u32, clbit: u32) -> Self {
        Self {
            clbits: vec![clbit],
            ..Self::new(MEASURE, [qubit])
        }
    }

    /// Reset `qubit`.
    pub fn reset(qubit: u32) -> Self {
        Self::new(RESET, [qubit])
    }

    /// Barrier across `qubits`.
    pub fn barrier(qubits: impl IntoIterator<Item = u32>) -> Self {
        Self::new(BARRIER, qubits)
    }

    /// Global phase `e^{i theta}`.
    pub fn global_phase(theta: ParameterExpression) -> Self {
        Self::new(GPHASE, []).with_params([theta])
    }

    /// Whether this is an uncontrolled global phase.
    pub fn is_global_phase(&self) -> bool {
        self.gate == GPHASE
    }

    /// All qubits touched: controls first, then targets.
    pub fn qubits(&self) -> Vec<u32> {
        self.controls.iter().chain(&self.targets).copied().collect()
    }

    /// Whether this is a measurement.
    pub fn is_measurement(&self) -> bool {
        self.gate == MEASURE
    }

    /// Whether this is a unitary gate rather than measure/reset/barrier.
    pub fn is_gate(&self) -> bool {
        !matches!(self.gate.as_str(), MEASURE | RESET | BARRIER)
    }

    /// Resolve the gate name and parameters against the IR vocabulary.
    pub fn resolve(&self) -> IrResult<Gate> {
        Gate::from_name(&self.gate, &self.params)
    }

    /// The adjoint of this instruction.
    pub fn adjoint(&self) -> IrResult<Self> {
        if !self.is_gate() {
            return Err(IrError::UnsupportedModifier(format!(
                "inv cannot be applied to '{}'",
                self.gate
            )));
        }
        if self.is_global_phase() {
            return Ok(Self {
                params: self.params.iter().map(ParameterExpression::negated).collect(),
                ..self.clone()
            });
        }
        Ok(self.replace_gate(&self.resolve()?.inverse()))
    }

    /// Prepend `controls` to this instruction's controls.
    pub fn controlled(&self, controls: &[u32]) -> IrResult<Self> {
        if !self.is_gate() {
            return Err(IrError::UnsupportedModifier(format!(
                "ctrl cannot be applied to '{}'",
                self.gate
            )));
        }
        if self.is_global_phase() {
            let Some((&target, rest)) = controls.split_last() else {
                return Ok(self.clone());
            };
            return Ok(Self::new("p", [target])
                .with_controls(rest.iter().copied())
                .with_params(self.params.iter().cloned()));
        }
        Ok(Self {
            controls: controls.iter().chain(&self.controls).copied().collect(),
            ..self.clone()
        })
    }

    fn replace_gate(&self, gate: &Gate) -> Self {
        Self {
            gate: gate.name(),
            params: gate.parameters().into_iter().cloned().collect(),
            ..self.clone()
        }
    }
}

/// The result of extraction: a flat instruction stream over a dense
/// register of `num_qubits` qubits and `num_clbits` classical bits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProgram {
    /// Number of qubits across all declared registers.
    pub num_qubits: u32,
    /// Number of classical bits across all declared registers.
    pub num_clbits: u32,
    /// Instructions in program order.
    pub instructions: Vec<NormalizedInstruction>,
}

impl NormalizedProgram {
    /// Create an empty program.
    pub fn new(num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            num_qubits,
            num_clbits,
            instructions: vec![],
        }
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether there are no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Whether any instruction is a measurement.
    pub fn has_measurements(&self) -> bool {
        self.instructions.iter().any(NormalizedInstruction::is_measurement)
    }
}

/// `inv @`: reverse the sequence and take each adjoint.
pub fn inverse_sequence(
    instructions: &[NormalizedInstruction],
) -> IrResult<Vec<NormalizedInstruction>> {
    instructions
        .iter()
        .rev()
        .map(NormalizedInstruction::adjoint)
        .collect()
}

/// `ctrl @`: add `controls` to every instruction in the sequence.
pub fn control_sequence(
    instructions: &[NormalizedInstruction],
    controls: &[u32],
) -> IrResult<Vec<NormalizedInstruction>> {
    instructions
        .iter()
        .map(|inst| inst.controlled(controls))
        .collect()
}

/// `pow(k) @`: rotations scale their angle for any real exponent. For
/// other gates only integer exponents are defined: the sequence is
/// repeated (negative exponents repeat its inverse), and a single fixed
/// gate whose expansion would exceed [`MAX_POWER_EXPANSION`] is first
/// reduced modulo its period.
pub fn power_sequence(
    instructions: &[NormalizedInstruction],
    exponent: f64,
) -> IrResult<Vec<NormalizedInstruction>> {
    if !exponent.is_finite() {
        return Err(IrError::UnsupportedModifier(format!(
            "pow({exponent}) is not a finite exponent"
        )));
    }

    #[allow(clippy::cast_precision_loss)]
    let cap = MAX_POWER_EXPANSION as f64;
    let mut reduced = exponent;
    if let [inst] = instructions {
        if inst.is_gate() && !inst.is_global_phase() {
            let gate = inst.resolve()?;
            let (base, num_controls) = gate.split_controls();
            if let Some(scaled) = base.scaled_rotation(exponent) {
                return Ok(vec![
                    inst.replace_gate(&Gate::Standard(scaled).controlled(num_controls)),
                ]);
            }
            if exponent.fract() != 0.0 {
                return Err(IrError::UnsupportedModifier(format!(
                    "pow({exponent}) is not supported for non-parametrized gate '{}'",
                    inst.gate
                )));
            }
            if let Some(period) = base.period() {
                if exponent.abs() > cap {
                    reduced = exponent.rem_euclid(f64::from(period));
                }
            }
        }
    }

    if reduced.fract() != 0.0 {
        return Err(IrError::UnsupportedModifier(format!(
            "pow({exponent}) is only supported on a single rotation gate"
        )));
    }

    let too_large = || {
        IrError::UnsupportedModifier(format!(
            "pow({exponent}) expands to more than {MAX_POWER_EXPANSION} instructions"
        ))
    };
    if reduced.abs() > cap {
        return Err(too_large());
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let times = reduced.abs() as usize;
    let total = instructions
        .len()
        .checked_mul(times)
        .filter(|&n| n <= MAX_POWER_EXPANSION)
        .ok_or_else(too_large)?;
    let base = if reduced < 0.0 {
        inverse_sequence(instructions)?
    } else {
        instructions.to_vec()
    };

    let mut out = Vec::with_capacity(total);
    for _ in 0..times {
        out.extend(base.iter().cloned());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: f64) -> ParameterExpression {
        ParameterExpression::Constant(v)
    }

    #[test]
    fn test_qubits_controls_first() {
        let inst = NormalizedInstruction::new("x", [2]).with_controls([0, 1]);
        assert_eq!(inst.qubits(), vec![0, 1, 2]);
        assert!(inst.is_gate());
        assert!(NormalizedInstruction::measure(0, 0).is_measurement());
        assert!(!NormalizedInstruction::barrier([0, 1]).is_gate());
    }

    #[test]
    fn test_inverse_sequence_reverses() {
        let seq = vec![
            NormalizedInstruction::new("s", [0]),
            NormalizedInstruction::new("rx", [1]).with_params([p(0.5)]),
            NormalizedInstruction::new("cx", [0, 1]),
        ];
        let inv = inverse_sequence(&seq).unwrap();
        assert_eq!(inv[0].gate, "cx");
        assert_eq!(inv[1].gate, "rx");
        assert_eq!(inv[1].params, vec![p(-0.5)]);
        assert_eq!(inv[2].gate, "sdg");
        assert_eq!(inv[2].targets, vec![0]);
    }

    #[test]
    fn test_inverse_keeps_extra_controls() {
        let seq = vec![NormalizedInstruction::new("t", [3]).with_controls([1])];
        let inv = inverse_sequence(&seq).unwrap();
        assert_eq!(inv[0].gate, "tdg");
        assert_eq!(inv[0].controls, vec![1]);
    }

    #[test]
    fn test_integer_power_repeats() {
        let seq = vec![NormalizedInstruction::new("h", [0])];
        assert_eq!(power_sequence(&seq, 3.0).unwrap().len(), 3);
        assert!(power_sequence(&seq, 0.0).unwrap().is_empty());

        let s = vec![NormalizedInstruction::new("s", [0])];
        let inv = power_sequence(&s, -2.0).unwrap();
        assert_eq!(inv.len(), 2);
        assert!(inv.iter().all(|i| i.gate == "sdg"));
    }

    #[test]
    fn test_fractional_power() {
        let rz = vec![NormalizedInstruction::new("rz", [0]).with_params([p(1.0)])];
        let half = power_sequence(&rz, 0.5).unwrap();
        assert_eq!(half[0].gate, "rz");
        assert_eq!(half[0].params, vec![p(0.5)]);

        let crx = vec![NormalizedInstruction::new("crx", [0, 1]).with_params([p(2.0)])];
        let quarter = power_sequence(&crx, 0.25).unwrap();
        assert_eq!(quarter[0].gate, "crx");
        assert_eq!(quarter[0].params, vec![p(0.5)]);

        let h = vec![NormalizedInstruction::new("h", [0])];
        let err = power_sequence(&h, 0.5).unwrap_err();
        assert!(err.to_string().contains("non-parametrized"));
    }

    #[test]
    fn test_integer_power_reduced_by_period() {
        let x = vec![NormalizedInstruction::new("cx", [0, 1])];
        assert!(power_sequence(&x, 1e300).unwrap().is_empty());
        assert_eq!(power_sequence(&x, 1_000_001.0).unwrap().len(), 1);

        let t = vec![NormalizedInstruction::new("t", [0])];
        let out = power_sequence(&t, -8_000_005.0).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|i| i.gate == "t"));
        assert_eq!(power_sequence(&t, -3.0).unwrap()[0].gate, "tdg");
    }

    #[test]
    fn test_integer_power_of_rotation_scales() {
        let rz = vec![NormalizedInstruction::new("rz", [0]).with_params([p(0.5)])];
        let out = power_sequence(&rz, 1e6).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].params, vec![p(5e5)]);
    }

    #[test]
    fn test_huge_power_is_an_error() {
        let u = vec![NormalizedInstruction::new("u", [0]).with_params([p(1.0), p(2.0), p(3.0)])];
        let err = power_sequence(&u, 1e300).unwrap_err();
        assert!(matches!(err, IrError::UnsupportedModifier(_)));

        let seq = vec![NormalizedInstruction::new("h", [0]), NormalizedInstruction::new("s", [0])];
        assert!(power_sequence(&seq, 40_000.0).is_err());
        assert_eq!(power_sequence(&seq, 3.0).unwrap().len(), 6);
    }

    #[test]
    fn test_global_phase_under_modifiers() {
        let seq = vec![NormalizedInstruction::global_phase(p(0.3))];
        let inv = inverse_sequence(&seq).unwrap();
        assert_eq!(inv[0].params, vec![p(-0.3)]);
        assert!(inv[0].is_global_phase());

        let one = control_sequence(&seq, &[2]).unwrap();
        assert_eq!(one[0].gate, "p");
        assert_eq!(one[0].targets, vec![2]);
        assert!(one[0].controls.is_empty());

        let two = control_sequence(&seq, &[0, 1]).unwrap();
        assert_eq!(two[0].qubits(), vec![0, 1]);
        assert_eq!(two[0].resolve().unwrap().name(), "cp");
    }

    #[test]
    fn test_control_sequence_prepends() {
        let seq = vec![NormalizedInstruction::new("x", [2]).with_controls([1])];
        let ctrl = control_sequence(&seq, &[0]).unwrap();
        assert_eq!(ctrl[0].controls, vec![0, 1]);
        assert_eq!(ctrl[0].resolve().unwrap().num_qubits(), 3);

        let measure = vec![NormalizedInstruction::measure(0, 0)];
        assert!(control_sequence(&measure, &[1]).is_err());
    }

    #[test]
    fn test_serde_skips_empty_fields() {
        let json = serde_json::to_value(NormalizedInstruction::new("h", [0])).unwrap();
        assert_eq!(json, serde_json::json!({"gate": "h", "targets": [0]}));
    }
}
