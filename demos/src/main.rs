//! Demo suite: compiles a handful of textbook circuits against each
//! built-in hardware preset and prints before/after depth and gate count.

use arvak_compile::{BasisGates, CouplingMap, PassManagerBuilder};
use arvak_ir::Circuit;
use tracing_subscriber::EnvFilter;

fn demo(name: &str, circuit: Circuit, basis: BasisGates, coupling: CouplingMap) {
    let before_depth = circuit.depth();
    let before_ops = circuit.dag().num_ops();

    let (pm, mut props) = PassManagerBuilder::new()
        .with_optimization_level(2)
        .with_target(coupling, basis)
        .build();

    let mut dag = circuit.into_dag();
    pm.run(&mut dag, &mut props).expect("compilation succeeds");
    let compiled = Circuit::from_dag(dag);

    println!(
        "{name:<12} depth {before_depth:>3} -> {:>3}   ops {before_ops:>3} -> {:>3}",
        compiled.depth(),
        compiled.dag().num_ops(),
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_target(false)
        .init();

    println!("bell/ghz/qft compiled against each hardware preset\n");

    demo(
        "bell/iqm",
        Circuit::bell().unwrap(),
        BasisGates::iqm(),
        CouplingMap::linear(2),
    );
    demo(
        "ghz/ibm",
        Circuit::ghz(5).unwrap(),
        BasisGates::ibm(),
        CouplingMap::star(5),
    );
    demo(
        "qft/heron",
        Circuit::qft(4).unwrap(),
        BasisGates::heron(),
        CouplingMap::full(4),
    );
    demo(
        "ghz/neutral",
        Circuit::ghz(6).unwrap(),
        BasisGates::neutral_atom(),
        CouplingMap::linear(6),
    );
}
