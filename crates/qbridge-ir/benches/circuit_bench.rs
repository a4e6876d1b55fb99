//! Benchmarks for qbridge circuit and normalized-instruction operations
//!
//! Run with: cargo bench -p qbridge-ir

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qbridge_ir::{
    Circuit, NormalizedInstruction, NormalizedProgram, ParameterExpression, QubitId,
    inverse_sequence, power_sequence,
};

/// Benchmark lowering a normalized stream into a circuit
fn bench_from_normalized(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_normalized");

    for num_qubits in &[5u32, 20, 50] {
        let mut program = NormalizedProgram::new(*num_qubits, 0);
        for _layer in 0..10 {
            program
                .instructions
                .push(NormalizedInstruction::new("h", 0..*num_qubits));
            for i in 0..num_qubits - 1 {
                program
                    .instructions
                    .push(NormalizedInstruction::new("x", [i + 1]).with_controls([i]));
            }
        }

        group.bench_with_input(
            BenchmarkId::new("layers", num_qubits),
            &program,
            |b, program| {
                b.iter(|| Circuit::from_normalized(black_box(program)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark flattening a circuit back to normalized form
fn bench_to_normalized(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_normalized");

    for num_qubits in &[5u32, 20, 50] {
        let circuit = Circuit::qft(*num_qubits).unwrap();
        group.bench_with_input(
            BenchmarkId::new("qft", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| black_box(circuit.to_normalized()));
            },
        );
    }

    group.finish();
}

/// Benchmark modifier expansion
fn bench_modifiers(c: &mut Criterion) {
    let body: Vec<_> = (0..16)
        .map(|i| {
            NormalizedInstruction::new("rz", [i % 4])
                .with_params([ParameterExpression::constant(0.1 * f64::from(i))])
        })
        .collect();

    c.bench_function("inverse_sequence", |b| {
        b.iter(|| inverse_sequence(black_box(&body)).unwrap());
    });
    c.bench_function("power_sequence_8", |b| {
        b.iter(|| power_sequence(black_box(&body), black_box(8.0)).unwrap());
    });
}

/// Benchmark circuit depth calculation
fn bench_circuit_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("circuit_depth");

    for num_qubits in &[5u32, 10, 20, 50] {
        let mut circuit = Circuit::with_size("bench", *num_qubits, 0);
        for _layer in 0..5 {
            for i in 0..*num_qubits {
                circuit.h(QubitId(i)).unwrap();
            }
            for i in (0..*num_qubits - 1).step_by(2) {
                circuit.cx(QubitId(i), QubitId(i + 1)).unwrap();
            }
        }

        group.bench_with_input(
            BenchmarkId::new("depth", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| black_box(circuit.depth()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_from_normalized,
    bench_to_normalized,
    bench_modifiers,
    bench_circuit_depth,
);

criterion_main!(benches);
