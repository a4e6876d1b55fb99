//! Conversion between normalized instruction streams and IonQ jobs.
//!
//! # Gate mapping
//!
//! | Instruction | IonQ record |
//! |-------------|-------------|
//! | `x`/`not`, `y`, `z`, `h`, `s`, `t` | same name, `target` |
//! | `sdg`, `tdg`, `sx`, `sxdg` | `si`, `ti`, `v`, `vi` |
//! | `rx`, `ry`, `rz` | same name, `rotation` in radians |
//! | `cx`, `ccx`, any controlled `x` | `cnot` with `control`/`controls` |
//! | `cy`, `cz`, `ch`, `crx`, `cry`, `crz` | base gate with `control` |
//! | `swap`, `cswap` | `swap` with `targets` (and `control`) |
//! | `rxx`, `ryy`, `rzz` | `xx`, `yy`, `zz` with `targets`, `rotation` |
//! | `gpi`, `gpi2` | native, `phase` in turns |
//! | `ms` | native, `phases` (and optional `angle`) in turns |
//! | `zz` | native, `angle` in turns |
//! | `id`, `barrier` | dropped |

use qbridge_ir::{
    Circuit, Gate, GateSet, IrError, NormalizedInstruction, NormalizedProgram, ParameterExpression,
    QubitId, StandardGate,
};
use tracing::{debug, trace};

use crate::error::{IonQError, IonQResult};
use crate::job::{IonQOperation, IonQProgram};
use crate::validate;

const NATIVE_GATES: [&str; 4] = ["gpi", "gpi2", "ms", "zz"];

/// Tracks which vocabulary a job uses and rejects mixing.
#[derive(Default)]
struct GateSetTracker {
    native: Option<String>,
    qis: Option<String>,
}

impl GateSetTracker {
    fn record(&mut self, set: GateSet, gate: &str) -> IonQResult<()> {
        let slot = match set {
            GateSet::Native => &mut self.native,
            GateSet::Qis => &mut self.qis,
        };
        slot.get_or_insert_with(|| gate.to_string());
        match (&self.native, &self.qis) {
            (Some(native), Some(qis)) => Err(IonQError::MixedGateSets {
                native: native.clone(),
                qis: qis.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn gateset(&self) -> GateSet {
        if self.native.is_some() {
            GateSet::Native
        } else {
            GateSet::Qis
        }
    }
}

impl IonQProgram {
    /// Convert a normalized program.
    ///
    /// Fails on measurements and resets, on gates with no IonQ spelling,
    /// on circuits mixing native and QIS gates, and on native parameters
    /// outside their documented ranges.
    pub fn from_normalized(program: &NormalizedProgram) -> IonQResult<Self> {
        if program.has_measurements() {
            return Err(IonQError::Measurement);
        }

        let mut tracker = GateSetTracker::default();
        let mut circuit = Vec::with_capacity(program.instructions.len());
        for inst in &program.instructions {
            let (set, ops) = convert_instruction(inst)?;
            if let Some(set) = set {
                tracker.record(set, &inst.gate)?;
            }
            trace!(gate = %inst.gate, records = ops.len(), "converted instruction");
            circuit.extend(ops);
        }

        let gateset = tracker.gateset();
        debug!(qubits = program.num_qubits, records = circuit.len(), %gateset, "built IonQ job");
        Ok(Self {
            qubits: program.num_qubits,
            circuit,
            gateset,
        })
    }

    /// Convert a circuit.
    pub fn from_circuit(circuit: &Circuit) -> IonQResult<Self> {
        Self::from_normalized(&circuit.to_normalized())
    }

    /// Build the equivalent circuit. `zz` is read as the native gate in a
    /// `native` job and as the QIS `rzz` rotation otherwise.
    pub fn to_circuit(&self) -> IonQResult<Circuit> {
        let mut circuit = Circuit::with_size("ionq", self.qubits, 0);
        let mut tracker = GateSetTracker::default();
        for op in &self.circuit {
            let name = op.gate.to_ascii_lowercase();
            let native = match name.as_str() {
                "gpi" | "gpi2" | "ms" => true,
                "zz" => self.gateset == GateSet::Native,
                _ => false,
            };
            if native {
                tracker.record(GateSet::Native, &name)?;
                apply_native(&mut circuit, &name, op)?;
            } else {
                tracker.record(GateSet::Qis, &name)?;
                apply_qis(&mut circuit, &name, op)?;
            }
        }
        Ok(circuit)
    }
}

/// Convert one instruction. Returns the vocabulary it belongs to (none
/// for dropped instructions) and its records.
fn convert_instruction(
    inst: &NormalizedInstruction,
) -> IonQResult<(Option<GateSet>, Vec<IonQOperation>)> {
    let name = inst.gate.to_ascii_lowercase();
    match name.as_str() {
        qbridge_ir::normalized::MEASURE => return Err(IonQError::Measurement),
        qbridge_ir::normalized::RESET => return Err(IonQError::UnsupportedOperation(name.clone())),
        qbridge_ir::normalized::BARRIER => return Ok((None, vec![])),
        _ => {}
    }

    if NATIVE_GATES.contains(&name.as_str()) {
        if !inst.controls.is_empty() {
            return Err(IonQError::UnsupportedGate(format!(
                "{}{name}",
                "c".repeat(inst.controls.len())
            )));
        }
        return Ok((Some(GateSet::Native), convert_native(&name, inst)?));
    }

    let gate = inst.resolve().map_err(|e| match e {
        IrError::UnknownGate(_) => IonQError::UnsupportedGate(inst.gate.clone()),
        IrError::ParameterCountMismatch { got: 0, .. } => IonQError::MissingParameter {
            gate: inst.gate.clone(),
            parameter: "Angle",
        },
        other => IonQError::Ir(other),
    })?;
    let (base, implied) = gate.split_controls();
    let operands = inst.qubits();
    let num_controls = inst.controls.len() + implied as usize;
    if num_controls > operands.len() {
        return Err(IonQError::OperandMismatch {
            gate: inst.gate.clone(),
            expected: num_controls + base.num_qubits() as usize,
            got: operands.len(),
        });
    }
    let (controls, targets) = operands.split_at(num_controls);

    let ops = convert_qis(&name, &base, controls, targets)?;
    let set = if ops.is_empty() { None } else { Some(GateSet::Qis) };
    Ok((set, ops))
}

fn convert_native(name: &str, inst: &NormalizedInstruction) -> IonQResult<Vec<IonQOperation>> {
    let params = &inst.params;
    match name {
        "gpi" | "gpi2" => {
            let phase = params.first().ok_or_else(|| IonQError::MissingParameter {
                gate: name.to_string(),
                parameter: "Phase",
            })?;
            if params.len() > 1 {
                return Err(IonQError::InvalidParameterCount {
                    gate: name.to_string(),
                    expected: "1",
                    got: params.len(),
                });
            }
            let phase = validate::phase_param(name, phase)?;
            Ok(inst
                .targets
                .iter()
                .map(|&t| IonQOperation {
                    phase: Some(phase),
                    ..IonQOperation::new(name).on(t)
                })
                .collect())
        }
        "ms" => {
            let [a, b] = pair(name, &inst.targets)?;
            let (phases, angle) = match params.as_slice() {
                [p0, p1] => (vec![p0, p1], None),
                [p0, p1, angle] => (vec![p0, p1], Some(angle)),
                _ => {
                    return Err(IonQError::InvalidParameterCount {
                        gate: name.to_string(),
                        expected: "2 or 3",
                        got: params.len(),
                    });
                }
            };
            let phases = phases
                .into_iter()
                .map(|p| validate::phase_param(name, p))
                .collect::<IonQResult<Vec<_>>>()?;
            let angle = angle.map(|a| validate::angle_param(name, a)).transpose()?;
            Ok(vec![IonQOperation {
                phases: Some(phases),
                angle,
                ..IonQOperation::new(name).on_pair(a, b)
            }])
        }
        _ => {
            let [a, b] = pair(name, &inst.targets)?;
            let angle = params.first().ok_or_else(|| IonQError::MissingParameter {
                gate: name.to_string(),
                parameter: "Angle",
            })?;
            let angle = validate::angle_param(name, angle)?;
            Ok(vec![IonQOperation {
                angle: Some(angle),
                ..IonQOperation::new(name).on_pair(a, b)
            }])
        }
    }
}

fn convert_qis(
    source_name: &str,
    base: &StandardGate,
    controls: &[u32],
    targets: &[u32],
) -> IonQResult<Vec<IonQOperation>> {
    let single = |gate: &str, rotation: Option<&ParameterExpression>| -> IonQResult<Vec<IonQOperation>> {
        let rotation = rotation
            .map(|p| validate::rotation_param(source_name, p))
            .transpose()?;
        if controls.is_empty() {
            // Several targets on a one-qubit gate: one record each.
            return Ok(targets
                .iter()
                .map(|&t| IonQOperation {
                    rotation,
                    ..IonQOperation::new(gate).on(t)
                })
                .collect());
        }
        let &[target] = targets else {
            return Err(IonQError::OperandMismatch {
                gate: source_name.to_string(),
                expected: controls.len() + 1,
                got: controls.len() + targets.len(),
            });
        };
        Ok(vec![IonQOperation {
            rotation,
            ..IonQOperation::new(gate).on(target).controlled_by(controls)
        }])
    };
    let two = |gate: &str, rotation: Option<&ParameterExpression>| -> IonQResult<Vec<IonQOperation>> {
        let [a, b] = pair(source_name, targets)?;
        let rotation = rotation
            .map(|p| validate::rotation_param(source_name, p))
            .transpose()?;
        Ok(vec![IonQOperation {
            rotation,
            ..IonQOperation::new(gate).on_pair(a, b).controlled_by(controls)
        }])
    };

    match base {
        StandardGate::I => Ok(vec![]),
        StandardGate::X if controls.is_empty() && source_name == "not" => single("not", None),
        StandardGate::X if controls.is_empty() => single("x", None),
        StandardGate::X => single("cnot", None),
        StandardGate::Y => single("y", None),
        StandardGate::Z => single("z", None),
        StandardGate::H => single("h", None),
        StandardGate::S => single("s", None),
        StandardGate::Sdg => single("si", None),
        StandardGate::T => single("t", None),
        StandardGate::Tdg => single("ti", None),
        StandardGate::SX => single("v", None),
        StandardGate::SXdg => single("vi", None),
        StandardGate::Rx(p) => single("rx", Some(p)),
        StandardGate::Ry(p) => single("ry", Some(p)),
        StandardGate::Rz(p) => single("rz", Some(p)),
        StandardGate::Swap => two("swap", None),
        StandardGate::RXX(p) => two("xx", Some(p)),
        StandardGate::RYY(p) => two("yy", Some(p)),
        StandardGate::RZZ(p) => two("zz", Some(p)),
        _ => Err(IonQError::UnsupportedGate(source_name.to_string())),
    }
}

fn pair(gate: &str, targets: &[u32]) -> IonQResult<[u32; 2]> {
    match targets {
        &[a, b] => Ok([a, b]),
        other => Err(IonQError::OperandMismatch {
            gate: gate.to_string(),
            expected: 2,
            got: other.len(),
        }),
    }
}

// ---------------------------------------------------------------------------
// IonQ record -> circuit
// ---------------------------------------------------------------------------

fn apply_native(circuit: &mut Circuit, name: &str, op: &IonQOperation) -> IonQResult<()> {
    match name {
        "gpi" | "gpi2" => {
            let phase = op.phase.ok_or_else(|| IonQError::MissingParameter {
                gate: name.to_string(),
                parameter: "Phase",
            })?;
            let phase = validate::phase(name, phase)?;
            let gate = if name == "gpi" {
                StandardGate::GPI(phase.into())
            } else {
                StandardGate::GPI2(phase.into())
            };
            for target in single_targets(name, op)? {
                circuit.gate(gate.clone(), [QubitId(target)])?;
            }
        }
        "ms" => {
            let [a, b] = record_pair(name, op)?;
            let phases = op.phases.as_deref().ok_or_else(|| IonQError::MissingParameter {
                gate: name.to_string(),
                parameter: "Phase",
            })?;
            let &[p0, p1] = phases else {
                return Err(IonQError::InvalidParameterCount {
                    gate: name.to_string(),
                    expected: "2 phases",
                    got: phases.len(),
                });
            };
            let angle = validate::angle(name, op.angle.unwrap_or(0.25))?;
            circuit.ms(
                validate::phase(name, p0)?,
                validate::phase(name, p1)?,
                angle,
                QubitId(a),
                QubitId(b),
            )?;
        }
        _ => {
            let [a, b] = record_pair(name, op)?;
            let angle = op.angle.ok_or_else(|| IonQError::MissingParameter {
                gate: name.to_string(),
                parameter: "Angle",
            })?;
            circuit.zz(validate::angle(name, angle)?, QubitId(a), QubitId(b))?;
        }
    }
    Ok(())
}

fn apply_qis(circuit: &mut Circuit, name: &str, op: &IonQOperation) -> IonQResult<()> {
    let rotation = || -> IonQResult<ParameterExpression> {
        op.rotation
            .map(ParameterExpression::Constant)
            .ok_or_else(|| IonQError::MissingParameter {
                gate: name.to_string(),
                parameter: "Rotation",
            })
    };
    let (base, two_qubit) = match name {
        "cnot" => (StandardGate::X, false),
        "rx" => (StandardGate::Rx(rotation()?), false),
        "ry" => (StandardGate::Ry(rotation()?), false),
        "rz" => (StandardGate::Rz(rotation()?), false),
        "swap" => (StandardGate::Swap, true),
        "xx" => (StandardGate::RXX(rotation()?), true),
        "yy" => (StandardGate::RYY(rotation()?), true),
        "zz" => (StandardGate::RZZ(rotation()?), true),
        "x" | "not" | "y" | "z" | "h" | "s" | "si" | "t" | "ti" | "v" | "vi" => {
            (StandardGate::from_name(name, &[])?, false)
        }
        _ => return Err(IonQError::UnsupportedGate(op.gate.clone())),
    };

    let controls = op.control_qubits();
    if name == "cnot" && controls.is_empty() {
        return Err(IonQError::Malformed("cnot without control".into()));
    }
    let gate = Gate::Standard(base).controlled(controls.len() as u32);

    if two_qubit {
        let [a, b] = record_pair(name, op)?;
        let qubits = controls.iter().copied().chain([a, b]).map(QubitId);
        circuit.gate(gate, qubits)?;
    } else if controls.is_empty() {
        for target in single_targets(name, op)? {
            circuit.gate(gate.clone(), [QubitId(target)])?;
        }
    } else {
        let target = op
            .target
            .ok_or_else(|| IonQError::Malformed(format!("'{name}' record without target")))?;
        let qubits = controls.iter().copied().chain([target]).map(QubitId);
        circuit.gate(gate, qubits)?;
    }
    Ok(())
}

fn single_targets(name: &str, op: &IonQOperation) -> IonQResult<Vec<u32>> {
    match (op.target, &op.targets) {
        (Some(t), _) => Ok(vec![t]),
        (None, Some(ts)) if !ts.is_empty() => Ok(ts.clone()),
        _ => Err(IonQError::Malformed(format!("'{name}' record without target"))),
    }
}

fn record_pair(name: &str, op: &IonQOperation) -> IonQResult<[u32; 2]> {
    let targets = op
        .targets
        .as_deref()
        .ok_or_else(|| IonQError::Malformed(format!("'{name}' record without targets")))?;
    pair(name, targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(num_qubits: u32, instructions: Vec<NormalizedInstruction>) -> NormalizedProgram {
        NormalizedProgram {
            num_qubits,
            num_clbits: 0,
            instructions,
        }
    }

    #[test]
    fn test_aliases() {
        let job = IonQProgram::from_normalized(&program(
            1,
            vec![
                NormalizedInstruction::new("sdg", [0]),
                NormalizedInstruction::new("tdg", [0]),
                NormalizedInstruction::new("sx", [0]),
                NormalizedInstruction::new("sxdg", [0]),
                NormalizedInstruction::new("id", [0]),
            ],
        ))
        .unwrap();
        let names: Vec<_> = job.circuit.iter().map(|op| op.gate.as_str()).collect();
        assert_eq!(names, ["si", "ti", "v", "vi"]);
        assert_eq!(job.gateset, GateSet::Qis);
    }

    #[test]
    fn test_controlled_variants() {
        let job = IonQProgram::from_normalized(&program(
            3,
            vec![
                NormalizedInstruction::new("cz", [0, 1]),
                NormalizedInstruction::new("crx", [1, 2]).with_params([0.5.into()]),
                NormalizedInstruction::new("cswap", [0, 1, 2]),
                NormalizedInstruction::new("x", [2]).with_controls([0, 1]),
            ],
        ))
        .unwrap();
        assert_eq!(job.circuit[0], IonQOperation::new("z").on(1).controlled_by(&[0]));
        assert_eq!(
            job.circuit[1],
            IonQOperation::new("rx").on(2).controlled_by(&[1]).with_rotation(0.5)
        );
        assert_eq!(
            job.circuit[2],
            IonQOperation::new("swap").on_pair(1, 2).controlled_by(&[0])
        );
        assert_eq!(
            job.circuit[3],
            IonQOperation::new("cnot").on(2).controlled_by(&[0, 1])
        );
    }

    #[test]
    fn test_two_qubit_rotations() {
        let job = IonQProgram::from_normalized(&program(
            2,
            vec![NormalizedInstruction::new("rzz", [0, 1]).with_params([0.3.into()])],
        ))
        .unwrap();
        assert_eq!(
            job.circuit[0],
            IonQOperation::new("zz").on_pair(0, 1).with_rotation(0.3)
        );
        assert_eq!(job.gateset, GateSet::Qis);
    }

    #[test]
    fn test_multi_target_single_qubit_gate() {
        let job = IonQProgram::from_normalized(&program(
            3,
            vec![NormalizedInstruction::new("h", [0, 1, 2])],
        ))
        .unwrap();
        let targets: Vec<_> = job.circuit.iter().map(|op| op.target).collect();
        assert_eq!(targets, [Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_measurement_rejected() {
        let err = IonQProgram::from_normalized(&program(
            1,
            vec![
                NormalizedInstruction::new("h", [0]),
                NormalizedInstruction::measure(0, 0),
            ],
        ))
        .unwrap_err();
        assert!(matches!(err, IonQError::Measurement));
    }

    #[test]
    fn test_barrier_dropped_reset_rejected() {
        let job = IonQProgram::from_normalized(&program(
            2,
            vec![NormalizedInstruction::barrier([0, 1])],
        ))
        .unwrap();
        assert!(job.circuit.is_empty());

        let err = IonQProgram::from_normalized(&program(1, vec![NormalizedInstruction::reset(0)]))
            .unwrap_err();
        assert!(matches!(err, IonQError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_mixing_names_both_gates() {
        let err = IonQProgram::from_normalized(&program(
            1,
            vec![
                NormalizedInstruction::new("gpi", [0]).with_params([0.1.into()]),
                NormalizedInstruction::new("h", [0]),
            ],
        ))
        .unwrap_err();
        match err {
            IonQError::MixedGateSets { native, qis } => {
                assert_eq!(native, "gpi");
                assert_eq!(qis, "h");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_parameters() {
        let err = IonQProgram::from_normalized(&program(1, vec![NormalizedInstruction::new("gpi", [0])]))
            .unwrap_err();
        assert!(err.to_string().starts_with("Phase parameter is required"));

        let err = IonQProgram::from_normalized(&program(2, vec![NormalizedInstruction::new("zz", [0, 1])]))
            .unwrap_err();
        assert!(err.to_string().starts_with("Angle parameter is required"));

        let err = IonQProgram::from_normalized(&program(
            2,
            vec![NormalizedInstruction::new("ms", [0, 1]).with_params([0.0.into()])],
        ))
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid number of parameters"));

        let err = IonQProgram::from_normalized(&program(1, vec![NormalizedInstruction::new("rx", [0])]))
            .unwrap_err();
        assert!(err.to_string().starts_with("Angle parameter is required"));
    }

    #[test]
    fn test_unsupported_gate() {
        let err = IonQProgram::from_normalized(&program(
            1,
            vec![NormalizedInstruction::new("u3", [0]).with_params([
                0.1.into(),
                0.2.into(),
                0.3.into(),
            ])],
        ))
        .unwrap_err();
        assert_eq!(err.to_string(), "Gate 'u3' not supported");

        let err = IonQProgram::from_normalized(&program(1, vec![NormalizedInstruction::new("foo", [0])]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Gate 'foo' not supported");
    }

    #[test]
    fn test_reverse_reads_zz_by_gateset() {
        let op = IonQOperation {
            angle: Some(0.1),
            rotation: Some(0.1),
            ..IonQOperation::new("zz").on_pair(0, 1)
        };
        let native = IonQProgram {
            qubits: 2,
            circuit: vec![op.clone()],
            gateset: GateSet::Native,
        };
        let qis = IonQProgram {
            gateset: GateSet::Qis,
            ..native.clone()
        };

        let gate = |p: &IonQProgram| p.to_circuit().unwrap().instructions()[0].as_gate().cloned();
        assert!(matches!(gate(&native), Some(Gate::Standard(StandardGate::ZZ(_)))));
        assert!(matches!(gate(&qis), Some(Gate::Standard(StandardGate::RZZ(_)))));
    }

    #[test]
    fn test_reverse_controls() {
        let job = IonQProgram {
            qubits: 3,
            circuit: vec![
                IonQOperation::new("cnot").on(2).controlled_by(&[0, 1]),
                IonQOperation::new("si").on(0),
                IonQOperation::new("ry").on(1).controlled_by(&[0]).with_rotation(0.25),
            ],
            gateset: GateSet::Qis,
        };
        let circuit = job.to_circuit().unwrap();
        let gates: Vec<_> = circuit
            .instructions()
            .iter()
            .map(|i| i.as_gate().unwrap().clone())
            .collect();
        assert_eq!(gates[0], Gate::Standard(StandardGate::CCX));
        assert_eq!(gates[1], Gate::Standard(StandardGate::Sdg));
        assert_eq!(gates[2], Gate::Standard(StandardGate::CRy(0.25.into())));
        assert_eq!(circuit.instructions()[2].qubits, vec![QubitId(0), QubitId(1)]);
    }

    #[test]
    fn test_reverse_validates_native_ranges() {
        let job = IonQProgram {
            qubits: 1,
            circuit: vec![IonQOperation {
                phase: Some(2.0),
                ..IonQOperation::new("gpi").on(0)
            }],
            gateset: GateSet::Native,
        };
        assert!(matches!(job.to_circuit(), Err(IonQError::InvalidPhase { .. })));
    }
}
