//! Arvak command-line interface.
//!
//! A thin wrapper over `arvak-ir`/`arvak-compile`: build one of a handful
//! of named demo circuits, compile it against a named hardware target, and
//! print the resulting circuit statistics as JSON. Parsing an external
//! circuit wire format is out of scope here (see crate-level docs).

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use console::style;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use std::time::Instant;

use arvak_compile::{BasisGates, CompileReport, CouplingMap, PassManagerBuilder};
use arvak_ir::Circuit;

/// Rust-native quantum circuit compilation.
#[derive(Parser)]
#[command(name = "arvak")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a built-in demo circuit for a target backend.
    Compile {
        /// Circuit to build: bell, ghz, or qft.
        #[arg(short, long)]
        circuit: String,

        /// Number of qubits (ignored for `bell`, which is fixed at 2).
        #[arg(short, long, default_value = "4")]
        qubits: u32,

        /// Target backend: iqm, ibm, heron, or neutral-atom.
        #[arg(short, long, default_value = "iqm")]
        target: String,

        /// Device topology: linear, star, or full.
        #[arg(long, default_value = "linear")]
        topology: String,

        /// Optimization level (0-3).
        #[arg(long, default_value = "1")]
        optimization_level: u8,
    },

    /// List available hardware targets.
    Backends,

    /// Show version information.
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Compile {
            circuit,
            qubits,
            target,
            topology,
            optimization_level,
        } => compile(&circuit, qubits, &target, &topology, optimization_level),
        Commands::Backends => {
            backends();
            Ok(())
        }
        Commands::Version => {
            version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

fn build_circuit(name: &str, qubits: u32) -> Result<Circuit> {
    match name {
        "bell" => Ok(Circuit::bell()?),
        "ghz" => Ok(Circuit::ghz(qubits)?),
        "qft" => Ok(Circuit::qft(qubits)?),
        other => bail!("unknown circuit '{other}', expected bell, ghz, or qft"),
    }
}

fn build_basis(name: &str) -> Result<BasisGates> {
    match name {
        "iqm" => Ok(BasisGates::iqm()),
        "ibm" => Ok(BasisGates::ibm()),
        "heron" => Ok(BasisGates::heron()),
        "neutral-atom" | "neutral_atom" => Ok(BasisGates::neutral_atom()),
        other => bail!("unknown target '{other}', expected iqm, ibm, heron, or neutral-atom"),
    }
}

fn build_topology(name: &str, n: u32) -> Result<CouplingMap> {
    match name {
        "linear" => Ok(CouplingMap::linear(n)),
        "star" => Ok(CouplingMap::star(n)),
        "full" => Ok(CouplingMap::full(n)),
        other => bail!("unknown topology '{other}', expected linear, star, or full"),
    }
}

fn compile(
    circuit_name: &str,
    qubits: u32,
    target: &str,
    topology: &str,
    optimization_level: u8,
) -> Result<()> {
    let circuit = build_circuit(circuit_name, qubits)?;
    let basis = build_basis(target)?;
    let coupling = build_topology(topology, circuit.num_qubits().max(qubits as usize) as u32)?;

    let input_depth = circuit.depth();
    let input_ops = circuit.dag().num_ops();

    let (pass_manager, mut props) = PassManagerBuilder::new()
        .with_optimization_level(optimization_level)
        .with_target(coupling, basis)
        .build();

    let mut dag = circuit.into_dag();
    let start = Instant::now();
    pass_manager.run(&mut dag, &mut props)?;
    let report = CompileReport::build(&dag, props.layout.as_ref(), start.elapsed(), target);

    let layout: Vec<_> = report
        .layout
        .iter()
        .map(|&(logical, physical)| json!({ "logical": logical.0, "physical": physical }))
        .collect();
    let output = json!({
        "circuit": circuit_name,
        "target": report.backend_name,
        "topology": topology,
        "optimization_level": optimization_level,
        "input": { "depth": input_depth, "ops": input_ops },
        "output": {
            "depth": report.depth,
            "single_qubit_gates": report.single_qubit_gates,
            "two_qubit_gates": report.two_qubit_gates,
        },
        "layout": layout,
        "compile_time_us": report.compile_time.as_micros() as u64,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn backends() {
    println!("Available targets:");
    println!("  iqm           PRX + CZ native gate set");
    println!("  ibm           CX + single-qubit Clifford/T native gate set");
    println!("  heron         CZ + fixed-angle rotation native gate set");
    println!("  neutral-atom  global/local addressing native gate set");
    println!("Available topologies: linear, star, full");
}

fn version() {
    println!("arvak {}", env!("CARGO_PKG_VERSION"));
}
