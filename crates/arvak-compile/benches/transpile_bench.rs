//! Benchmarks for the heavyweight compilation passes.
//!
//! Run with: cargo bench -p arvak-compile

use arvak_compile::passes::{BasisTranslation, SabreRouting, TrivialLayout};
use arvak_compile::{BasisGates, CouplingMap, Pass, PropertySet};
use arvak_ir::{Circuit, QubitId};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// Star-shaped interaction pattern on a linear device: every CX reaches
/// from qubit 0 to a progressively farther partner, which keeps the SWAP
/// search busy for the whole circuit.
fn long_range_circuit(n: u32) -> Circuit {
    let mut circuit = Circuit::with_size("bench", n, 0);
    circuit.h(QubitId(0)).unwrap();
    for i in 1..n {
        circuit.cx(QubitId(0), QubitId(i)).unwrap();
    }
    circuit
}

fn bench_sabre_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sabre_routing");

    for num_qubits in &[5u32, 10, 20] {
        group.bench_with_input(
            BenchmarkId::new("linear_device", num_qubits),
            num_qubits,
            |b, &n| {
                b.iter(|| {
                    let mut dag = long_range_circuit(n).into_dag();
                    let mut props = PropertySet::new()
                        .with_target(CouplingMap::linear(n), BasisGates::ibm());
                    TrivialLayout.run(&mut dag, &mut props).unwrap();
                    SabreRouting.run(&mut dag, &mut props).unwrap();
                    black_box(dag)
                });
            },
        );
    }

    group.finish();
}

fn bench_basis_translation(c: &mut Criterion) {
    let mut group = c.benchmark_group("basis_translation");

    for num_qubits in &[3u32, 5, 8] {
        group.bench_with_input(BenchmarkId::new("qft", num_qubits), num_qubits, |b, &n| {
            b.iter(|| {
                let mut dag = Circuit::qft(n).unwrap().into_dag();
                let mut props = PropertySet::new();
                props.basis_gates = Some(BasisGates::ibm());
                BasisTranslation.run(&mut dag, &mut props).unwrap();
                black_box(dag)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sabre_routing, bench_basis_translation);
criterion_main!(benches);
