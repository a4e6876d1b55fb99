//! Benchmarks for the conversion hot path
//!
//! Run with: cargo bench -p qbridge-transpiler

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qbridge_ir::Circuit;
use qbridge_transpiler::{ProgramType, QuantumProgram, Transpiler};

/// A layered QASM2 program: a Hadamard wall followed by a CX ladder.
fn layered_qasm2(num_qubits: u32, layers: u32) -> String {
    let mut source = format!("OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[{num_qubits}];\n");
    for _ in 0..layers {
        source.push_str("h q;\n");
        for i in 0..num_qubits - 1 {
            source.push_str(&format!("cx q[{i}], q[{}];\n", i + 1));
            source.push_str(&format!("rz(pi/4) q[{}];\n", i + 1));
        }
    }
    source
}

/// Benchmark classification alone
fn bench_classify(c: &mut Criterion) {
    let transpiler = Transpiler::global();
    let program = QuantumProgram::from(layered_qasm2(20, 10));
    c.bench_function("classify_qasm2", |b| {
        b.iter(|| transpiler.classify(black_box(&program)).unwrap());
    });
}

/// Benchmark direct-edge conversions from QASM2 text
fn bench_direct(c: &mut Criterion) {
    let mut group = c.benchmark_group("qasm2_direct");
    let transpiler = Transpiler::global();

    for num_qubits in &[5u32, 20, 50] {
        let program = QuantumProgram::from(layered_qasm2(*num_qubits, 10));
        for target in [ProgramType::IonQ, ProgramType::Qbridge, ProgramType::Qasm3] {
            group.bench_with_input(
                BenchmarkId::new(target.as_str(), num_qubits),
                &program,
                |b, program| {
                    b.iter(|| transpiler.convert(black_box(program.clone()), target).unwrap());
                },
            );
        }
    }

    group.finish();
}

/// Benchmark a two-hop conversion through the bridge
fn bench_bridged(c: &mut Criterion) {
    let mut group = c.benchmark_group("ionq_to_qasm3");
    let transpiler = Transpiler::global();

    for num_qubits in &[5u32, 20] {
        let circuit = Circuit::ghz(*num_qubits).unwrap();
        let job = transpiler
            .convert(QuantumProgram::from(circuit), ProgramType::IonQ)
            .unwrap();
        group.bench_with_input(BenchmarkId::new("ghz", num_qubits), &job, |b, job| {
            b.iter(|| transpiler.convert(black_box(job.clone()), ProgramType::Qasm3).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_direct, bench_bridged);
criterion_main!(benches);
