//! Quantum gate vocabulary.
//!
//! [`StandardGate`] covers the abstract (QIS) gates of `qelib1.inc` and
//! `stdgates.inc` plus the trapped-ion native gates (`gpi`, `gpi2`, `ms`,
//! `zz`). Native phases and angles are expressed in turns, not radians.
//! [`Gate`] adds an arbitrary number of control qubits on top of a
//! standard gate when no dedicated controlled variant exists.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::parameter::ParameterExpression;

/// The two gate vocabularies a target program may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateSet {
    /// Abstract, hardware-agnostic gates.
    Qis,
    /// Trapped-ion native gates.
    Native,
}

impl fmt::Display for GateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateSet::Qis => write!(f, "qis"),
            GateSet::Native => write!(f, "native"),
        }
    }
}

/// Standard gates with known semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),
    /// Phase gate.
    P(ParameterExpression),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// Controlled rotation around X.
    CRx(ParameterExpression),
    /// Controlled rotation around Y.
    CRy(ParameterExpression),
    /// Controlled rotation around Z.
    CRz(ParameterExpression),
    /// Controlled phase gate.
    CP(ParameterExpression),
    /// XX rotation gate.
    RXX(ParameterExpression),
    /// YY rotation gate.
    RYY(ParameterExpression),
    /// ZZ rotation gate.
    RZZ(ParameterExpression),

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,

    // Trapped-ion native gates
    /// GPI(φ): a π rotation about the axis at phase φ in the XY plane.
    GPI(ParameterExpression),
    /// GPI2(φ): a π/2 rotation about the axis at phase φ in the XY plane.
    GPI2(ParameterExpression),
    /// Mølmer–Sørensen gate MS(φ0, φ1, θ); θ = 0.25 is fully entangling.
    MS(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),
    /// Native ZZ interaction ZZ(θ) = exp(-iπθ Z⊗Z).
    ZZ(ParameterExpression),
}

impl StandardGate {
    /// Look up a gate by name (case-insensitive), accepting the common
    /// aliases used by `qelib1.inc`, `stdgates.inc` and vendor SDKs.
    pub fn from_name(name: &str, params: &[ParameterExpression]) -> IrResult<Self> {
        let lower = name.to_ascii_lowercase();
        let fixed = |gate: StandardGate| -> IrResult<StandardGate> {
            expect_params(name, params, 0)?;
            Ok(gate)
        };
        let one = |make: fn(ParameterExpression) -> StandardGate| -> IrResult<StandardGate> {
            expect_params(name, params, 1)?;
            Ok(make(params[0].clone()))
        };

        match lower.as_str() {
            "id" | "i" | "iden" => fixed(StandardGate::I),
            "x" | "not" => fixed(StandardGate::X),
            "y" => fixed(StandardGate::Y),
            "z" => fixed(StandardGate::Z),
            "h" => fixed(StandardGate::H),
            "s" => fixed(StandardGate::S),
            "sdg" | "si" => fixed(StandardGate::Sdg),
            "t" => fixed(StandardGate::T),
            "tdg" | "ti" => fixed(StandardGate::Tdg),
            "sx" | "v" => fixed(StandardGate::SX),
            "sxdg" | "vi" => fixed(StandardGate::SXdg),
            "rx" => one(StandardGate::Rx),
            "ry" => one(StandardGate::Ry),
            "rz" => one(StandardGate::Rz),
            "p" | "u1" | "phase" => one(StandardGate::P),
            "u2" => {
                expect_params(name, params, 2)?;
                Ok(StandardGate::U(
                    ParameterExpression::Constant(PI / 2.0),
                    params[0].clone(),
                    params[1].clone(),
                ))
            }
            "u" | "u3" => {
                expect_params(name, params, 3)?;
                Ok(StandardGate::U(
                    params[0].clone(),
                    params[1].clone(),
                    params[2].clone(),
                ))
            }
            "cx" | "cnot" => fixed(StandardGate::CX),
            "cy" => fixed(StandardGate::CY),
            "cz" => fixed(StandardGate::CZ),
            "ch" => fixed(StandardGate::CH),
            "swap" => fixed(StandardGate::Swap),
            "crx" => one(StandardGate::CRx),
            "cry" => one(StandardGate::CRy),
            "crz" => one(StandardGate::CRz),
            "cp" | "cu1" | "cphase" => one(StandardGate::CP),
            "rxx" => one(StandardGate::RXX),
            "ryy" => one(StandardGate::RYY),
            "rzz" => one(StandardGate::RZZ),
            "ccx" | "toffoli" => fixed(StandardGate::CCX),
            "cswap" | "fredkin" => fixed(StandardGate::CSwap),
            "gpi" => one(StandardGate::GPI),
            "gpi2" => one(StandardGate::GPI2),
            "ms" => match params {
                [p0, p1] => Ok(StandardGate::MS(
                    p0.clone(),
                    p1.clone(),
                    ParameterExpression::Constant(0.25),
                )),
                [p0, p1, angle] => Ok(StandardGate::MS(p0.clone(), p1.clone(), angle.clone())),
                _ => Err(IrError::ParameterCountMismatch {
                    gate_name: name.to_string(),
                    expected: "2 or 3".into(),
                    got: params.len(),
                }),
            },
            "zz" => one(StandardGate::ZZ),
            _ => Err(IrError::UnknownGate(name.to_string())),
        }
    }

    /// Get the canonical name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(_, _, _) => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::CRx(_) => "crx",
            StandardGate::CRy(_) => "cry",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RYY(_) => "ryy",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
            StandardGate::GPI(_) => "gpi",
            StandardGate::GPI2(_) => "gpi2",
            StandardGate::MS(_, _, _) => "ms",
            StandardGate::ZZ(_) => "zz",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_)
            | StandardGate::U(_, _, _)
            | StandardGate::GPI(_)
            | StandardGate::GPI2(_) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::RXX(_)
            | StandardGate::RYY(_)
            | StandardGate::RZZ(_)
            | StandardGate::MS(_, _, _)
            | StandardGate::ZZ(_) => 2,

            StandardGate::CCX | StandardGate::CSwap => 3,
        }
    }

    /// Check if any parameter of this gate is symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::CRx(p)
            | StandardGate::CRy(p)
            | StandardGate::CRz(p)
            | StandardGate::CP(p)
            | StandardGate::RXX(p)
            | StandardGate::RYY(p)
            | StandardGate::RZZ(p)
            | StandardGate::GPI(p)
            | StandardGate::GPI2(p)
            | StandardGate::ZZ(p) => vec![p],

            StandardGate::U(a, b, c) | StandardGate::MS(a, b, c) => vec![a, b, c],

            _ => vec![],
        }
    }

    /// The vocabulary this gate belongs to.
    pub fn gate_set(&self) -> GateSet {
        match self {
            StandardGate::GPI(_)
            | StandardGate::GPI2(_)
            | StandardGate::MS(_, _, _)
            | StandardGate::ZZ(_) => GateSet::Native,
            _ => GateSet::Qis,
        }
    }

    /// Whether `gate^k` equals the same gate with its single angle scaled
    /// by `k`, for any real `k`.
    pub fn is_rotation(&self) -> bool {
        matches!(
            self,
            StandardGate::Rx(_)
                | StandardGate::Ry(_)
                | StandardGate::Rz(_)
                | StandardGate::P(_)
                | StandardGate::CRx(_)
                | StandardGate::CRy(_)
                | StandardGate::CRz(_)
                | StandardGate::CP(_)
                | StandardGate::RXX(_)
                | StandardGate::RYY(_)
                | StandardGate::RZZ(_)
                | StandardGate::ZZ(_)
        )
    }

    /// Scale the angle of a rotation gate. `None` for non-rotations.
    pub fn scaled_rotation(&self, factor: f64) -> Option<Self> {
        let s = |p: &ParameterExpression| p.scaled(factor);
        Some(match self {
            StandardGate::Rx(p) => StandardGate::Rx(s(p)),
            StandardGate::Ry(p) => StandardGate::Ry(s(p)),
            StandardGate::Rz(p) => StandardGate::Rz(s(p)),
            StandardGate::P(p) => StandardGate::P(s(p)),
            StandardGate::CRx(p) => StandardGate::CRx(s(p)),
            StandardGate::CRy(p) => StandardGate::CRy(s(p)),
            StandardGate::CRz(p) => StandardGate::CRz(s(p)),
            StandardGate::CP(p) => StandardGate::CP(s(p)),
            StandardGate::RXX(p) => StandardGate::RXX(s(p)),
            StandardGate::RYY(p) => StandardGate::RYY(s(p)),
            StandardGate::RZZ(p) => StandardGate::RZZ(s(p)),
            StandardGate::ZZ(p) => StandardGate::ZZ(s(p)),
            _ => return None,
        })
    }

    /// The adjoint of this gate.
    pub fn inverse(&self) -> Self {
        match self {
            StandardGate::S => StandardGate::Sdg,
            StandardGate::Sdg => StandardGate::S,
            StandardGate::T => StandardGate::Tdg,
            StandardGate::Tdg => StandardGate::T,
            StandardGate::SX => StandardGate::SXdg,
            StandardGate::SXdg => StandardGate::SX,
            StandardGate::U(theta, phi, lambda) => {
                StandardGate::U(theta.negated(), lambda.negated(), phi.negated())
            }
            StandardGate::GPI2(phase) => StandardGate::GPI2(wrap_turns(&phase.offset(0.5))),
            StandardGate::MS(phase0, phase1, angle) => {
                StandardGate::MS(wrap_turns(&phase0.offset(0.5)), phase1.clone(), angle.clone())
            }
            rotation if rotation.is_rotation() => {
                rotation.scaled_rotation(-1.0).unwrap_or_else(|| rotation.clone())
            }
            // Self-inverse: Paulis, H, CX family, SWAP family, GPI.
            other => other.clone(),
        }
    }

    /// Smallest `n > 0` with `gate^n = I` exactly (no global phase), for
    /// fixed gates that have one.
    pub fn period(&self) -> Option<u32> {
        match self {
            StandardGate::I => Some(1),
            StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CCX
            | StandardGate::CSwap
            | StandardGate::GPI(_) => Some(2),
            StandardGate::S | StandardGate::Sdg | StandardGate::SX | StandardGate::SXdg => Some(4),
            StandardGate::T | StandardGate::Tdg => Some(8),
            _ => None,
        }
    }

    /// Split a dedicated controlled variant into its base gate and the
    /// number of controls it carries (`CCX` is `X` with two controls).
    pub fn split_controls(&self) -> (StandardGate, u32) {
        match self {
            StandardGate::CX => (StandardGate::X, 1),
            StandardGate::CY => (StandardGate::Y, 1),
            StandardGate::CZ => (StandardGate::Z, 1),
            StandardGate::CH => (StandardGate::H, 1),
            StandardGate::CRx(p) => (StandardGate::Rx(p.clone()), 1),
            StandardGate::CRy(p) => (StandardGate::Ry(p.clone()), 1),
            StandardGate::CRz(p) => (StandardGate::Rz(p.clone()), 1),
            StandardGate::CP(p) => (StandardGate::P(p.clone()), 1),
            StandardGate::CCX => (StandardGate::X, 2),
            StandardGate::CSwap => (StandardGate::Swap, 1),
            other => (other.clone(), 0),
        }
    }

    /// The dedicated controlled variant of `self` with `num_controls`
    /// controls, if the vocabulary has one.
    pub fn with_controls(&self, num_controls: u32) -> Option<StandardGate> {
        match (self, num_controls) {
            (gate, 0) => Some(gate.clone()),
            (StandardGate::X, 1) => Some(StandardGate::CX),
            (StandardGate::X, 2) => Some(StandardGate::CCX),
            (StandardGate::Y, 1) => Some(StandardGate::CY),
            (StandardGate::Z, 1) => Some(StandardGate::CZ),
            (StandardGate::H, 1) => Some(StandardGate::CH),
            (StandardGate::Rx(p), 1) => Some(StandardGate::CRx(p.clone())),
            (StandardGate::Ry(p), 1) => Some(StandardGate::CRy(p.clone())),
            (StandardGate::Rz(p), 1) => Some(StandardGate::CRz(p.clone())),
            (StandardGate::P(p), 1) => Some(StandardGate::CP(p.clone())),
            (StandardGate::Swap, 1) => Some(StandardGate::CSwap),
            _ => None,
        }
    }
}

/// Fold a concrete phase in turns into `[-1, 1)`. Symbolic phases are
/// left as they are.
fn wrap_turns(phase: &ParameterExpression) -> ParameterExpression {
    match phase.as_f64() {
        Some(v) if !phase.is_symbolic() => {
            ParameterExpression::Constant((v + 1.0).rem_euclid(2.0) - 1.0)
        }
        _ => phase.clone(),
    }
}

fn expect_params(name: &str, params: &[ParameterExpression], expected: usize) -> IrResult<()> {
    if params.len() == expected {
        Ok(())
    } else {
        Err(IrError::ParameterCountMismatch {
            gate_name: name.to_string(),
            expected: expected.to_string(),
            got: params.len(),
        })
    }
}

/// A gate applied in a circuit: a standard gate, or a standard gate with
/// extra controls that has no dedicated variant.
///
/// Operand order is always controls first, then the base gate's qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// A standard gate.
    Standard(StandardGate),
    /// A base gate with `num_controls` leading control qubits.
    Controlled {
        /// The uncontrolled base gate.
        base: StandardGate,
        /// Number of control qubits.
        num_controls: u32,
    },
}

impl Gate {
    /// Resolve a gate name. Names not in the vocabulary are retried with
    /// leading `c` prefixes read as extra controls (`cccx`, `csx`, `cu3`).
    pub fn from_name(name: &str, params: &[ParameterExpression]) -> IrResult<Self> {
        match StandardGate::from_name(name, params) {
            Ok(gate) => Ok(Gate::Standard(gate)),
            Err(IrError::UnknownGate(_)) => {
                let lower = name.to_ascii_lowercase();
                let prefix = lower.bytes().take_while(|&b| b == b'c').count();
                for strip in 1..=prefix {
                    let rest = &lower[strip..];
                    if rest.is_empty() {
                        break;
                    }
                    match StandardGate::from_name(rest, params) {
                        Ok(base) => return Ok(Gate::Standard(base).controlled(strip as u32)),
                        Err(IrError::UnknownGate(_)) => {}
                        Err(e) => return Err(e),
                    }
                }
                Err(IrError::UnknownGate(name.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Number of qubits `name` acts on, whatever parameters a call
    /// supplies. Parameter counts are checked later, by [`Gate::from_name`].
    pub fn arity(name: &str) -> Option<u32> {
        let zero = ParameterExpression::Constant(0.0);
        (0..=3).find_map(|n| {
            Gate::from_name(name, &vec![zero.clone(); n])
                .ok()
                .map(|gate| gate.num_qubits())
        })
    }

    /// The uncontrolled base gate and total control count.
    pub fn split_controls(&self) -> (StandardGate, u32) {
        match self {
            Gate::Standard(gate) => gate.split_controls(),
            Gate::Controlled { base, num_controls } => {
                let (inner, k) = base.split_controls();
                (inner, k + num_controls)
            }
        }
    }

    /// Add `extra` controls, promoting to a dedicated variant when one exists.
    #[must_use]
    pub fn controlled(&self, extra: u32) -> Self {
        let (base, k) = self.split_controls();
        let total = k + extra;
        match base.with_controls(total) {
            Some(gate) => Gate::Standard(gate),
            None => Gate::Controlled {
                base,
                num_controls: total,
            },
        }
    }

    /// The adjoint gate.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            Gate::Standard(gate) => Gate::Standard(gate.inverse()),
            Gate::Controlled { base, num_controls } => Gate::Controlled {
                base: base.inverse(),
                num_controls: *num_controls,
            },
        }
    }

    /// Name usable with [`Gate::from_name`]; controlled gates are
    /// spelled with one `c` per control.
    pub fn name(&self) -> String {
        match self {
            Gate::Standard(gate) => gate.name().to_string(),
            Gate::Controlled { base, num_controls } => {
                format!("{}{}", "c".repeat(*num_controls as usize), base.name())
            }
        }
    }

    /// Total number of qubits, controls included.
    pub fn num_qubits(&self) -> u32 {
        match self {
            Gate::Standard(gate) => gate.num_qubits(),
            Gate::Controlled { base, num_controls } => base.num_qubits() + num_controls,
        }
    }

    /// Parameters of the underlying gate.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            Gate::Standard(gate) => gate.parameters(),
            Gate::Controlled { base, .. } => base.parameters(),
        }
    }

    /// The vocabulary of the underlying gate.
    pub fn gate_set(&self) -> GateSet {
        match self {
            Gate::Standard(gate) => gate.gate_set(),
            Gate::Controlled { base, .. } => base.gate_set(),
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::Standard(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: f64) -> ParameterExpression {
        ParameterExpression::Constant(v)
    }

    #[test]
    fn test_standard_gate_properties() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);
        assert_eq!(StandardGate::MS(p(0.0), p(0.0), p(0.25)).num_qubits(), 2);

        assert!(!StandardGate::H.is_parameterized());
        assert!(StandardGate::Rx(ParameterExpression::symbol("t")).is_parameterized());
        assert!(!StandardGate::Rx(p(1.0)).is_parameterized());
    }

    #[test]
    fn test_aliases() {
        assert_eq!(StandardGate::from_name("CNOT", &[]).unwrap(), StandardGate::CX);
        assert_eq!(StandardGate::from_name("toffoli", &[]).unwrap(), StandardGate::CCX);
        assert_eq!(StandardGate::from_name("si", &[]).unwrap(), StandardGate::Sdg);
        assert_eq!(StandardGate::from_name("v", &[]).unwrap(), StandardGate::SX);
        assert_eq!(
            StandardGate::from_name("u1", &[p(0.5)]).unwrap(),
            StandardGate::P(p(0.5))
        );
        assert_eq!(
            StandardGate::from_name("u2", &[p(0.1), p(0.2)]).unwrap(),
            StandardGate::U(p(PI / 2.0), p(0.1), p(0.2))
        );
    }

    #[test]
    fn test_parameter_count_checked() {
        let err = StandardGate::from_name("rz", &[]).unwrap_err();
        assert!(matches!(err, IrError::ParameterCountMismatch { .. }));
        assert!(StandardGate::from_name("h", &[p(1.0)]).is_err());
        assert_eq!(
            StandardGate::from_name("ms", &[p(0.0), p(0.5)]).unwrap(),
            StandardGate::MS(p(0.0), p(0.5), p(0.25))
        );
        assert!(StandardGate::from_name("ms", &[p(0.0)]).is_err());
    }

    #[test]
    fn test_control_prefix_fallback() {
        assert_eq!(
            Gate::from_name("cccx", &[]).unwrap(),
            Gate::Controlled {
                base: StandardGate::X,
                num_controls: 3
            }
        );
        assert_eq!(
            Gate::from_name("csx", &[]).unwrap(),
            Gate::Controlled {
                base: StandardGate::SX,
                num_controls: 1
            }
        );
        assert_eq!(Gate::from_name("ccx", &[]).unwrap(), Gate::Standard(StandardGate::CCX));
        assert!(matches!(
            Gate::from_name("frobnicate", &[]),
            Err(IrError::UnknownGate(_))
        ));
        assert!(matches!(Gate::from_name("c", &[]), Err(IrError::UnknownGate(_))));
    }

    #[test]
    fn test_controlled_promotion() {
        let x = Gate::Standard(StandardGate::X);
        assert_eq!(x.controlled(1), Gate::Standard(StandardGate::CX));
        assert_eq!(x.controlled(2), Gate::Standard(StandardGate::CCX));
        assert_eq!(
            Gate::Standard(StandardGate::CZ).controlled(1),
            Gate::Controlled {
                base: StandardGate::Z,
                num_controls: 2
            }
        );
        let cs = Gate::Standard(StandardGate::S).controlled(1);
        assert_eq!(cs.num_qubits(), 2);
        assert_eq!(Gate::from_name(&cs.name(), &[]).unwrap(), cs);
    }

    #[test]
    fn test_inverse() {
        assert_eq!(StandardGate::S.inverse(), StandardGate::Sdg);
        assert_eq!(StandardGate::Rz(p(0.3)).inverse(), StandardGate::Rz(p(-0.3)));
        assert_eq!(
            StandardGate::U(p(1.0), p(2.0), p(3.0)).inverse(),
            StandardGate::U(p(-1.0), p(-3.0), p(-2.0))
        );
        assert_eq!(StandardGate::GPI2(p(0.25)).inverse(), StandardGate::GPI2(p(0.75)));
        assert_eq!(StandardGate::GPI2(p(-1.0)).inverse(), StandardGate::GPI2(p(-0.5)));
        assert_eq!(StandardGate::ZZ(p(0.2)).inverse(), StandardGate::ZZ(p(-0.2)));
        assert_eq!(StandardGate::CX.inverse(), StandardGate::CX);
    }

    #[test]
    fn test_native_inverse_phase_stays_in_range() {
        let StandardGate::GPI2(phase) = StandardGate::GPI2(p(0.6)).inverse() else {
            panic!("expected gpi2");
        };
        assert!((phase.as_f64().unwrap() + 0.9).abs() < 1e-12);

        let StandardGate::MS(phase0, phase1, angle) =
            StandardGate::MS(p(0.9), p(0.1), p(0.2)).inverse()
        else {
            panic!("expected ms");
        };
        assert!((phase0.as_f64().unwrap() + 0.6).abs() < 1e-12);
        assert_eq!(phase1, p(0.1));
        assert_eq!(angle, p(0.2));

        let symbolic = StandardGate::GPI2(ParameterExpression::symbol("phi")).inverse();
        assert!(symbolic.is_parameterized());
    }

    #[test]
    fn test_arity_ignores_parameter_count() {
        assert_eq!(Gate::arity("h"), Some(1));
        assert_eq!(Gate::arity("rz"), Some(1));
        assert_eq!(Gate::arity("u3"), Some(1));
        assert_eq!(Gate::arity("ms"), Some(2));
        assert_eq!(Gate::arity("zz"), Some(2));
        assert_eq!(Gate::arity("cccx"), Some(4));
        assert_eq!(Gate::arity("invalid_gate"), None);
    }

    #[test]
    fn test_periods() {
        assert_eq!(StandardGate::H.period(), Some(2));
        assert_eq!(StandardGate::S.period(), Some(4));
        assert_eq!(StandardGate::T.period(), Some(8));
        assert_eq!(StandardGate::GPI2(p(0.0)).period(), None);
        assert_eq!(StandardGate::Rz(p(1.0)).period(), None);
    }

    #[test]
    fn test_gate_sets() {
        assert_eq!(StandardGate::H.gate_set(), GateSet::Qis);
        assert_eq!(StandardGate::GPI(p(0.0)).gate_set(), GateSet::Native);
        assert_eq!(GateSet::Native.to_string(), "native");
    }
}
