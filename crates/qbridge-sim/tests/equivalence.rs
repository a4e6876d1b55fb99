//! Conversions checked by simulation.

use std::f64::consts::PI;

use proptest::prelude::*;
use qbridge_ir::{Circuit, ParameterExpression, QubitId, StandardGate};
use qbridge_sim::{EquivalenceOracle, OracleConfig, circuits_allclose};
use qbridge_transpiler::{ProgramType, QuantumProgram, Transpiler};
use serde_json::json;

const ATOL: f64 = 1e-7;

fn native_circuit(gate: StandardGate) -> Circuit {
    let mut circuit = Circuit::with_size("native", 2, 0);
    let qubits: Vec<QubitId> = (0..gate.num_qubits()).map(QubitId).collect();
    circuit.gate(gate, qubits).unwrap();
    circuit
}

/// QASM2 has no native gates; the emitter writes them as gate definitions.
#[test]
fn test_qasm2_native_definitions_match_native_matrices() {
    let p = ParameterExpression::constant;
    let gates = [
        StandardGate::GPI(p(0.0)),
        StandardGate::GPI(p(0.37)),
        StandardGate::GPI2(p(-0.8)),
        StandardGate::GPI2(p(0.25)),
        StandardGate::MS(p(0.0), p(0.0), p(0.25)),
        StandardGate::MS(p(-0.5), p(0.6), p(0.1)),
        StandardGate::MS(p(0.15), p(-0.35), p(0.2)),
        StandardGate::ZZ(p(0.12)),
        StandardGate::RYY(p(0.9)),
    ];
    for gate in gates {
        let native = native_circuit(gate.clone());
        let qasm2 = qbridge_qasm::emit_qasm2(&native).unwrap();
        let expanded = qbridge_qasm::parse_circuit(&qasm2).unwrap();
        assert!(
            expanded
                .instructions()
                .iter()
                .all(|inst| inst.as_gate().is_none_or(|g| g.gate_set() == qbridge_ir::GateSet::Qis)),
            "{gate:?} was not expanded"
        );
        assert!(
            circuits_allclose(&native, &expanded, ATOL, 10).unwrap(),
            "{gate:?}\n{qasm2}"
        );
    }
}

#[test]
fn test_qelib_compatibility_definitions() {
    let qasm2 = r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[5];
u(0.3, 0.2, 0.1) q[0];
sxdg q[1];
csx q[0], q[2];
cu1(pi/5) q[1], q[3];
cu3(0.4, -0.2, 0.7) q[3], q[4];
rxx(0.6) q[0], q[4];
rzz(1.3) q[2], q[1];
c3x q[0], q[1], q[2], q[3];
c4x q[4], q[3], q[2], q[1], q[0];
c3sqrtx q[1], q[2], q[3], q[4];
rccx q[0], q[1], q[2];
rc3x q[1], q[2], q[3], q[4];
u0(0.2) q[3];
u2(0.3, -0.1) q[2];
"#;
    let transpiler = Transpiler::global();
    let qasm3 = transpiler
        .convert(qasm2.into(), ProgramType::Qasm3)
        .unwrap();
    let oracle = EquivalenceOracle::default();
    assert!(oracle.equivalent(&qasm2.into(), &qasm3).unwrap());
}

#[test]
fn test_ionq_round_trip_is_equivalent() {
    let source = r#"OPENQASM 3.0;
include "stdgates.inc";
qubit[3] q;
h q;
rx(pi/4) q[0];
ry(-0.3) q[1];
rz(3*pi/4) q[2];
cx q[0], q[1];
ctrl(2) @ x q[0], q[1], q[2];
inv @ s q[1];
sdg q[0];
tdg q[2];
sx q[1];
swap q[0], q[2];
cz q[1], q[2];
crz(0.4) q[0], q[1];
rzz(0.2) q[1], q[2];
"#;
    let oracle = EquivalenceOracle::default();
    let original = QuantumProgram::from(source);
    let job = Transpiler::global()
        .convert(original.clone(), ProgramType::IonQ)
        .unwrap();
    assert!(oracle.equivalent(&original, &job).unwrap());
}

#[test]
fn test_native_job_round_trip_through_qasm() {
    let job = QuantumProgram::from(json!({
        "qubits": 3,
        "gateset": "native",
        "circuit": [
            {"gate": "gpi2", "target": 0, "phase": 0.25},
            {"gate": "gpi", "target": 2, "phase": -0.4},
            {"gate": "ms", "targets": [0, 1], "phases": [0.1, 0.7]},
            {"gate": "ms", "targets": [2, 1], "phases": [-0.5, 0.6], "angle": 0.1},
            {"gate": "zz", "targets": [0, 2], "angle": 0.12}
        ]
    }));
    let oracle = EquivalenceOracle::default();
    let transpiler = Transpiler::global();
    for target in [ProgramType::Qasm2, ProgramType::Qasm3, ProgramType::OpenQasm3] {
        let converted = transpiler.convert(job.clone(), target).unwrap();
        assert!(oracle.equivalent(&job, &converted).unwrap(), "{target}");
    }
}

#[test]
fn test_modifiers_match_hand_expansion() {
    let modified = QuantumProgram::from(
        r#"OPENQASM 3.0; include "stdgates.inc"; qubit[2] q; pow(3) @ t q[0]; negctrl @ x q[0], q[1];"#,
    );
    let expanded = QuantumProgram::from(
        r#"OPENQASM 3.0; include "stdgates.inc"; qubit[2] q; t q[0]; t q[0]; t q[0]; x q[0]; cx q[0], q[1]; x q[0];"#,
    );
    let oracle = EquivalenceOracle::default();
    assert!(oracle.equivalent(&modified, &expanded).unwrap());
}

#[test]
fn test_controlled_u3_keeps_relative_phase() {
    let controlled = QuantumProgram::from(
        r#"OPENQASM 3.0; include "stdgates.inc"; qubit[2] q; ctrl @ u3(0.4, -0.2, 0.7) q[0], q[1];"#,
    );
    let expanded = QuantumProgram::from(
        r#"OPENQASM 3.0; include "stdgates.inc"; qubit[2] q; p(-0.25) q[0]; ctrl @ U(0.4, -0.2, 0.7) q[0], q[1];"#,
    );
    let without_phase = QuantumProgram::from(
        r#"OPENQASM 2.0; include "qelib1.inc"; qreg q[2]; cu3(0.4, -0.2, 0.7) q[0], q[1];"#,
    );
    let oracle = EquivalenceOracle::default();
    assert!(oracle.equivalent(&controlled, &expanded).unwrap());
    assert!(!oracle.equivalent(&controlled, &without_phase).unwrap());
}

#[test]
fn test_relative_phase_toffoli_matches_toffoli_on_basis_states() {
    // rccx only differs from ccx by phases, so populations agree.
    for prep in ["", "x q[0];", "x q[0]; x q[1];", "x q[1]; x q[2];", "x q[0]; x q[1]; x q[2];"] {
        let rccx = qbridge_qasm::parse_circuit(&format!(
            r#"OPENQASM 2.0; include "qelib1.inc"; qreg q[3]; {prep} rccx q[0], q[1], q[2];"#
        ))
        .unwrap();
        let ccx = qbridge_qasm::parse_circuit(&format!(
            r#"OPENQASM 2.0; include "qelib1.inc"; qreg q[3]; {prep} ccx q[0], q[1], q[2];"#
        ))
        .unwrap();
        let a = qbridge_sim::Statevector::from_circuit(&rccx).unwrap().probabilities();
        let b = qbridge_sim::Statevector::from_circuit(&ccx).unwrap().probabilities();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < ATOL, "{prep}");
        }
    }
}

#[test]
fn test_loops_and_subroutines_match_unrolled() {
    let looped = QuantumProgram::from(
        r#"OPENQASM 3.0;
include "stdgates.inc";
qubit[4] q;
def entangle(qubit a, qubit b, float t) { cx a, b; rz(t) b; }
h q[0];
for int i in [0:2] { entangle(q[i], q[i + 1], pi / (i + 1)); }
"#,
    );
    let unrolled = QuantumProgram::from(
        r#"OPENQASM 3.0;
include "stdgates.inc";
qubit[4] q;
h q[0];
cx q[0], q[1]; rz(pi) q[1];
cx q[1], q[2]; rz(pi/2) q[2];
cx q[2], q[3]; rz(pi/3) q[3];
"#,
    );
    let oracle = EquivalenceOracle::default();
    assert!(oracle.equivalent(&looped, &unrolled).unwrap());
}

#[test]
fn test_terminal_measurements_ignored() {
    let measured = QuantumProgram::from(
        r#"OPENQASM 2.0; include "qelib1.inc"; qreg q[2]; creg c[2]; h q[0]; cx q[0], q[1]; measure q -> c;"#,
    );
    let bare = QuantumProgram::from(Circuit::ghz(2).unwrap());
    let oracle = EquivalenceOracle::default();
    assert!(oracle.equivalent(&measured, &bare).unwrap());
}

#[test]
fn test_statevector_path_for_large_registers() {
    let oracle = EquivalenceOracle::new(OracleConfig {
        max_unitary_qubits: 2,
        ..OracleConfig::default()
    });
    let a = QuantumProgram::from(Circuit::ghz(12).unwrap());
    let b = Transpiler::global()
        .convert(a.clone(), ProgramType::IonQ)
        .unwrap();
    assert!(oracle.equivalent(&a, &b).unwrap());
}

#[test]
fn test_relaxed_tolerance_for_accumulated_rotations() {
    let mut many = Circuit::with_size("many", 1, 0);
    for _ in 0..1000 {
        many.rz(PI / 1000.0, QubitId(0)).unwrap();
    }
    let mut once = Circuit::with_size("once", 1, 0);
    once.rz(PI, QubitId(0)).unwrap();
    assert!(circuits_allclose(&many, &once, 1e-6, 10).unwrap());
}

fn circuit_strategy() -> impl Strategy<Value = Circuit> {
    (2u32..=4, prop::collection::vec((0u8..5, 0u32..4, 0u32..4, -PI..PI), 1..25)).prop_map(
        |(n, ops)| {
            let mut circuit = Circuit::with_size("random", n, 0);
            for (kind, a, b, theta) in ops {
                let (a, b) = (a % n, b % n);
                match kind {
                    0 => {
                        circuit.h(QubitId(a)).unwrap();
                    }
                    1 => {
                        circuit.ry(theta, QubitId(a)).unwrap();
                    }
                    2 if a != b => {
                        circuit.cx(QubitId(a), QubitId(b)).unwrap();
                    }
                    3 if a != b => {
                        circuit.rzz(theta, QubitId(a), QubitId(b)).unwrap();
                    }
                    _ => {
                        circuit.t(QubitId(a)).unwrap();
                    }
                }
            }
            circuit
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every representation of a circuit is equivalent to it.
    #[test]
    fn every_representation_is_equivalent(circuit in circuit_strategy()) {
        let oracle = EquivalenceOracle::default();
        let transpiler = Transpiler::global();
        let original = QuantumProgram::from(circuit);
        for target in ProgramType::ALL {
            let converted = transpiler.convert(original.clone(), target).unwrap();
            prop_assert!(oracle.equivalent(&original, &converted).unwrap(), "{}", target);
        }
    }
}
