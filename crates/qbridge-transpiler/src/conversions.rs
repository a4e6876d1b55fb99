//! Converter functions for the default edges.
//!
//! | Source | Target | Mechanism |
//! |--------|--------|-----------|
//! | `qasm2` | `qasm3` | parse, print as QASM3 |
//! | `qasm3` | `openqasm3` | parse |
//! | `openqasm3` | `qasm3` | print |
//! | `qasm2`, `qasm3`, `openqasm3` | `ionq` | extract, IonQ converter |
//! | `qasm2`, `qasm3`, `openqasm3` | `qbridge` | extract, build circuit |
//! | `qbridge` | `qasm2`, `qasm3` | emit |
//! | `qbridge` | `openqasm3` | emit QASM3, parse |
//! | `qbridge` | `ionq` | IonQ converter |
//! | `ionq` | `qbridge` | read job, build circuit |

use qbridge_ionq::IonQProgram;
use qbridge_ir::{Circuit, NormalizedProgram};
use qbridge_qasm::Program;

use crate::error::TranspileResult;
use crate::graph::ConversionGraph;
use crate::program::{ProgramType, QuantumProgram};

/// Register every default edge.
pub fn register_defaults(graph: &mut ConversionGraph) {
    use ProgramType::{IonQ, OpenQasm3, Qasm2, Qasm3, Qbridge};

    graph.add_edge(Qasm2, Qasm3, qasm2_to_qasm3);
    graph.add_edge(Qasm3, OpenQasm3, qasm3_to_openqasm3);
    graph.add_edge(OpenQasm3, Qasm3, openqasm3_to_qasm3);

    graph.add_edge(Qasm2, IonQ, qasm2_to_ionq);
    graph.add_edge(Qasm3, IonQ, qasm3_to_ionq);
    graph.add_edge(OpenQasm3, IonQ, openqasm3_to_ionq);

    graph.add_edge(Qasm2, Qbridge, qasm2_to_qbridge);
    graph.add_edge(Qasm3, Qbridge, qasm3_to_qbridge);
    graph.add_edge(OpenQasm3, Qbridge, openqasm3_to_qbridge);

    graph.add_edge(Qbridge, Qasm2, qbridge_to_qasm2);
    graph.add_edge(Qbridge, Qasm3, qbridge_to_qasm3);
    graph.add_edge(Qbridge, OpenQasm3, qbridge_to_openqasm3);
    graph.add_edge(Qbridge, IonQ, qbridge_to_ionq);
    graph.add_edge(IonQ, Qbridge, ionq_to_qbridge);
}

fn qasm2_to_qasm3(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    let ast = qbridge_qasm::parse(&program.into_text(ProgramType::Qasm2)?)?;
    Ok(QuantumProgram::Text(qbridge_qasm::to_qasm3(&ast)))
}

fn qasm3_to_openqasm3(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    let ast = qbridge_qasm::parse(&program.into_text(ProgramType::Qasm3)?)?;
    Ok(ast.into())
}

fn openqasm3_to_qasm3(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    let ast = program.into_ast(ProgramType::OpenQasm3)?;
    Ok(QuantumProgram::Text(qbridge_qasm::to_qasm3(&ast)))
}

fn text_to_normalized(
    program: QuantumProgram,
    expected: ProgramType,
) -> TranspileResult<NormalizedProgram> {
    Ok(qbridge_qasm::extract_source(&program.into_text(expected)?)?)
}

fn ast_to_normalized(program: QuantumProgram) -> TranspileResult<NormalizedProgram> {
    let ast: Program = program.into_ast(ProgramType::OpenQasm3)?;
    Ok(qbridge_qasm::extract(&ast)?)
}

fn normalized_to_ionq(program: &NormalizedProgram) -> TranspileResult<QuantumProgram> {
    let job = IonQProgram::from_normalized(program)?;
    Ok(QuantumProgram::Json(job.to_json()?))
}

fn normalized_to_qbridge(program: &NormalizedProgram) -> TranspileResult<QuantumProgram> {
    Ok(QuantumProgram::Circuit(Circuit::from_normalized(program)?))
}

fn qasm2_to_ionq(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    normalized_to_ionq(&text_to_normalized(program, ProgramType::Qasm2)?)
}

fn qasm3_to_ionq(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    normalized_to_ionq(&text_to_normalized(program, ProgramType::Qasm3)?)
}

fn openqasm3_to_ionq(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    normalized_to_ionq(&ast_to_normalized(program)?)
}

fn qasm2_to_qbridge(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    normalized_to_qbridge(&text_to_normalized(program, ProgramType::Qasm2)?)
}

fn qasm3_to_qbridge(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    normalized_to_qbridge(&text_to_normalized(program, ProgramType::Qasm3)?)
}

fn openqasm3_to_qbridge(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    normalized_to_qbridge(&ast_to_normalized(program)?)
}

fn qbridge_to_qasm2(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    let circuit = program.into_circuit(ProgramType::Qbridge)?;
    Ok(QuantumProgram::Text(qbridge_qasm::emit_qasm2(&circuit)?))
}

fn qbridge_to_qasm3(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    let circuit = program.into_circuit(ProgramType::Qbridge)?;
    Ok(QuantumProgram::Text(qbridge_qasm::emit(&circuit)?))
}

fn qbridge_to_openqasm3(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    let circuit = program.into_circuit(ProgramType::Qbridge)?;
    let ast = qbridge_qasm::parse(&qbridge_qasm::emit(&circuit)?)?;
    Ok(ast.into())
}

fn qbridge_to_ionq(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    let circuit = program.into_circuit(ProgramType::Qbridge)?;
    let job = IonQProgram::from_circuit(&circuit)?;
    Ok(QuantumProgram::Json(job.to_json()?))
}

fn ionq_to_qbridge(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
    let value = program.into_json(ProgramType::IonQ)?;
    let job = IonQProgram::from_json(&value)?;
    Ok(QuantumProgram::Circuit(job.to_circuit()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranspilerError;
    use qbridge_ir::QubitId;
    use serde_json::json;

    const BELL_QASM2: &str =
        "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nh q[0];\ncx q[0], q[1];\n";

    #[test]
    fn test_default_edges() {
        let mut graph = ConversionGraph::new();
        register_defaults(&mut graph);
        assert_eq!(graph.edges().len(), 14);
        assert!(graph.edge(ProgramType::IonQ, ProgramType::Qasm2).is_none());
    }

    #[test]
    fn test_qasm2_to_qasm3_text() {
        let out = qasm2_to_qasm3(BELL_QASM2.into()).unwrap();
        let text = out.as_text().unwrap();
        assert!(text.starts_with("OPENQASM 3.0;"));
        assert!(text.contains("include \"stdgates.inc\";"));
        assert!(text.contains("qubit[2] q;"));
    }

    #[test]
    fn test_qasm2_to_qbridge() {
        let out = qasm2_to_qbridge(BELL_QASM2.into()).unwrap();
        let circuit = out.as_circuit().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.gate_count(), 2);
    }

    #[test]
    fn test_qbridge_to_openqasm3() {
        let mut circuit = Circuit::with_size("c", 1, 0);
        circuit.h(QubitId(0)).unwrap();
        let out = qbridge_to_openqasm3(circuit.into()).unwrap();
        assert_eq!(out.as_ast().unwrap().major_version(), Some(3));
    }

    #[test]
    fn test_ionq_round_trip() {
        let job = json!({
            "qubits": 2,
            "gateset": "qis",
            "circuit": [
                {"gate": "h", "target": 0},
                {"gate": "cnot", "control": 0, "target": 1}
            ]
        });
        let circuit = ionq_to_qbridge(job.clone().into()).unwrap();
        let back = qbridge_to_ionq(circuit).unwrap();
        assert_eq!(back.as_json().unwrap(), &job);
    }

    #[test]
    fn test_wrong_input_kind() {
        let err = qbridge_to_qasm2(BELL_QASM2.into()).unwrap_err();
        assert!(matches!(err, TranspilerError::InputMismatch { .. }));
    }
}
