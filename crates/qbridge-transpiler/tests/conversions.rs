//! End-to-end conversions through the default transpiler.

use qbridge_ir::{Circuit, QubitId};
use qbridge_transpiler::{
    ClassificationError, ProgramType, QuantumProgram, Transpiler, TranspilerError, classify,
    convert,
};
use serde_json::json;

const BROADCAST_QASM2: &str =
    r#"OPENQASM 2.0; include "qelib1.inc"; qreg q[2]; h q; cx q[0],q[1];"#;

#[test]
fn test_qasm2_to_ionq_scenario() {
    let job = convert(BROADCAST_QASM2, ProgramType::IonQ).unwrap();
    assert_eq!(
        job,
        QuantumProgram::Json(json!({
            "qubits": 2,
            "circuit": [
                {"gate": "h", "target": 0},
                {"gate": "h", "target": 1},
                {"gate": "cnot", "control": 0, "target": 1}
            ],
            "gateset": "qis"
        }))
    );
}

#[test]
fn test_every_pair_is_connected() {
    let transpiler = Transpiler::global();
    for source in ProgramType::ALL {
        for target in ProgramType::ALL {
            let path = transpiler.resolve_path(source, target).unwrap();
            assert!(path.len() <= 2, "{source} -> {target}");
            if let Some(first) = path.first() {
                assert_eq!(first.source, source);
            }
            if let Some(last) = path.last() {
                assert_eq!(last.target, target);
            }
        }
    }
}

#[test]
fn test_ionq_to_qasm2_goes_through_bridge() {
    let job = json!({
        "qubits": 2,
        "gateset": "native",
        "circuit": [
            {"gate": "gpi2", "target": 0, "phase": 0.25},
            {"gate": "ms", "targets": [0, 1], "phases": [0, 0.5], "angle": 0.25}
        ]
    });
    let path = Transpiler::global()
        .resolve_path(ProgramType::IonQ, ProgramType::Qasm2)
        .unwrap();
    assert_eq!(path[0].target, ProgramType::Qbridge);

    let out = convert(job, ProgramType::Qasm2).unwrap();
    let text = out.as_text().unwrap();
    assert!(text.starts_with("OPENQASM 2.0;"));
    assert!(text.contains("gate gpi2("));
    assert!(text.contains("ms(0, 0.5, 0.25) q[0], q[1];"));
}

#[test]
fn test_classification_of_every_type() {
    let circuit = Circuit::bell().unwrap();
    let samples = [
        (QuantumProgram::from(BROADCAST_QASM2), ProgramType::Qasm2),
        (
            QuantumProgram::from("OPENQASM 3.0;\nqubit[1] q;"),
            ProgramType::Qasm3,
        ),
        (
            QuantumProgram::from(qbridge_qasm::parse("OPENQASM 3.0; qubit q;").unwrap()),
            ProgramType::OpenQasm3,
        ),
        (QuantumProgram::from(circuit), ProgramType::Qbridge),
        (
            QuantumProgram::from(json!({"qubits": 1, "circuit": []})),
            ProgramType::IonQ,
        ),
    ];
    for (program, expected) in samples {
        assert_eq!(classify(&program).unwrap(), expected);
    }
}

#[test]
fn test_unsupported_input() {
    let err = convert("h q[0];", ProgramType::IonQ).unwrap_err();
    assert!(matches!(
        err,
        TranspilerError::Classification(ClassificationError::Unsupported(_))
    ));
}

#[test]
fn test_measurement_rejected_for_job_target() {
    let source = r#"OPENQASM 2.0; include "qelib1.inc"; qreg q[1]; creg c[1]; h q[0]; measure q[0] -> c[0];"#;
    let err = convert(source, ProgramType::IonQ).unwrap_err();
    assert!(matches!(err, TranspilerError::Validation(_)));
    assert!(err.to_string().contains("measurements are not supported"));

    let mut circuit = Circuit::with_size("m", 1, 1);
    circuit.h(QubitId(0)).unwrap();
    circuit.measure_all().unwrap();
    let err = convert(circuit, ProgramType::IonQ).unwrap_err();
    assert!(err.to_string().contains("measurements are not supported"));
}

#[test]
fn test_mixed_gate_sets_rejected() {
    let err = convert(
        "OPENQASM 3.0; qubit[2] q; h q[0]; gpi(0.5) q[1];",
        ProgramType::IonQ,
    )
    .unwrap_err();
    assert!(
        err.to_string()
            .contains("Cannot mix native and QIS gates")
    );
}

#[test]
fn test_phase_bounds() {
    let err = convert("OPENQASM 3.0; qubit q; gpi(-6) q;", ProgramType::IonQ).unwrap_err();
    assert!(err.to_string().contains("Invalid phase value"));
    assert!(convert("OPENQASM 3.0; qubit q; gpi(0) q;", ProgramType::IonQ).is_ok());
}

#[test]
fn test_ionq_parameter_errors_surface() {
    let cases = [
        ("OPENQASM 3.0; qubit[2] q; gpi q[0];", "Phase parameter is required"),
        ("OPENQASM 3.0; qubit[1] q; rz q[0];", "Angle parameter is required"),
        ("OPENQASM 3.0; qubit[2] q; zz q[0], q[1];", "Angle parameter is required"),
        ("OPENQASM 3.0; qubit[2] q; ms q[0], q[1];", "Invalid number of parameters"),
        ("OPENQASM 3.0; qubit[2] q; ms(0,0,0,0) q[0], q[1];", "Invalid number of parameters"),
        ("OPENQASM 3.0; qubit[1] q; invalid_gate q[0];", "Gate 'invalid_gate' not supported"),
    ];
    for (source, message) in cases {
        let err = convert(source, ProgramType::IonQ).unwrap_err();
        assert!(matches!(err, TranspilerError::Validation(_)), "{source}: {err}");
        assert!(err.to_string().contains(message), "{source}: {err}");
    }
}

#[test]
fn test_single_qubit_gate_over_operands() {
    let job = convert(
        r#"OPENQASM 2.0; include "qelib1.inc"; qreg q[2]; z q[0], q[1];"#,
        ProgramType::IonQ,
    )
    .unwrap();
    assert_eq!(
        job,
        QuantumProgram::Json(json!({
            "qubits": 2,
            "circuit": [{"gate": "z", "target": 0}, {"gate": "z", "target": 1}],
            "gateset": "qis"
        }))
    );
}

#[test]
fn test_unsupported_construct() {
    let source = "OPENQASM 3.0; qubit q; bit c; c = measure q; if (c) { x q; }";
    let err = convert(source, ProgramType::Qbridge).unwrap_err();
    assert!(matches!(err, TranspilerError::UnsupportedConstruct(_)));
}

#[test]
fn test_fractional_power_rejected() {
    let source = r#"OPENQASM 3.0; include "stdgates.inc"; qubit q; pow(0.5) @ h q;"#;
    let err = convert(source, ProgramType::Qbridge).unwrap_err();
    assert!(matches!(err, TranspilerError::UnsupportedConstruct(_)));
}

#[test]
fn test_qasm3_ast_round_trip() {
    let source = r#"OPENQASM 3.0;
include "stdgates.inc";
qubit[2] q;
bit[2] c;
h q[0];
cx q[0], q[1];
c = measure q;
"#;
    let ast = convert(source, ProgramType::OpenQasm3).unwrap();
    assert!(ast.as_ast().is_some());
    let text = convert(ast.clone(), ProgramType::Qasm3).unwrap();
    let again = convert(text, ProgramType::OpenQasm3).unwrap();
    assert_eq!(ast, again);
}

#[test]
fn test_circuit_survives_qasm_round_trips() {
    let circuit = Circuit::qft(3).unwrap();
    for target in [ProgramType::Qasm2, ProgramType::Qasm3, ProgramType::OpenQasm3] {
        let intermediate = convert(circuit.clone(), target).unwrap();
        let back = convert(intermediate, ProgramType::Qbridge).unwrap();
        let back = back.as_circuit().unwrap();
        assert_eq!(back.num_qubits(), circuit.num_qubits(), "{target}");
        assert_eq!(back.gate_count(), circuit.gate_count(), "{target}");
    }
}
