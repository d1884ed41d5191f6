//! Arvak Compilation and Transpilation Framework
//!
//! This crate provides the compilation infrastructure for transforming
//! quantum circuits to run on target hardware. It implements a pass-based
//! architecture similar to LLVM, enabling modular and extensible compilation.
//!
//! # Overview
//!
//! The compilation process transforms an input circuit through a series of
//! passes that:
//! 1. **Layout**: Map virtual qubits to physical qubits on the target device
//! 2. **Routing**: Insert SWAP gates to satisfy connectivity constraints
//! 3. **Translation**: Convert gates to the target's native gate set
//! 4. **Optimization**: Reduce gate count and circuit depth
//!
//! # Architecture
//!
//! ```text
//! Input Circuit
//!       |
//!       v
//! +-------------+
//! | PassManager | <-- PropertySet (coupling map, basis gates, layout)
//! +-------------+
//!       |
//!       +-- UnrollToTwoQubit
//!       +-- TrivialLayout / SabreLayout
//!       +-- SabreRouting
//!       +-- Optimize1qGates / PairedInverseElimination / CommutativeCancellation
//!       +-- BasisTranslation (rule-table unroll + CSD/Euler synthesis)
//!       |
//!       v
//! Output Circuit (hardware-compatible)
//! ```
//!
//! # Example: Basic Compilation
//!
//! ```rust
//! use arvak_compile::{PassManagerBuilder, CouplingMap, BasisGates};
//! use arvak_ir::Circuit;
//!
//! // Create a circuit
//! let circuit = Circuit::bell().unwrap();
//!
//! // Build pass manager for a 5-qubit star-topology device
//! let (pm, mut props) = PassManagerBuilder::new()
//!     .with_optimization_level(2)
//!     .with_target(CouplingMap::star(5), BasisGates::ibm())
//!     .build();
//!
//! // Compile the circuit
//! let mut dag = circuit.into_dag();
//! pm.run(&mut dag, &mut props).unwrap();
//!
//! let compiled = Circuit::from_dag(dag);
//! println!("Compiled depth: {}", compiled.depth());
//! ```
//!
//! # Optimization Levels
//!
//! | Level | Passes Included |
//! |-------|-----------------|
//! | 0 | Trivial layout + SABRE routing + basis translation only |
//! | 1 | + one round of 1q optimization and paired-inverse elimination |
//! | 2 | SABRE-searched layout + commutative cancellation added to cleanup |
//! | 3 | level 2's cleanup run twice |
//!
//! # Built-in Passes
//!
//! ## Layout Passes
//! - [`passes::TrivialLayout`]: Simple 1:1 mapping of virtual to physical qubits
//! - [`passes::SabreLayout`]: Bidirectional warm-start layout search
//!
//! ## Routing Passes
//! - [`passes::SabreRouting`]: Lookahead SWAP insertion scored by a
//!   distance/fidelity heuristic
//!
//! ## Translation Passes
//! - [`passes::UnrollToTwoQubit`]: Arity reduction — rewrite gates on three
//!   or more qubits into one- and two-qubit gates before layout/routing
//! - [`passes::BasisTranslation`]: Rule-table-driven unroll into the
//!   target's basis, falling back to CSD/Euler synthesis for arbitrary
//!   unitaries
//!
//! ## Optimization Passes
//! - [`passes::Optimize1qGates`]: Merge consecutive 1-qubit gates via Euler
//!   decomposition
//! - [`passes::PairedInverseElimination`]: Cancel adjacent self-inverse
//!   gate pairs (CX, CZ, H, ...)
//! - [`passes::CommutativeCancellation`]: Merge commuting rotation gates
//!
//! # Custom Passes
//!
//! Implement the [`Pass`] trait to create custom compilation passes:
//!
//! ```rust
//! use arvak_compile::{Pass, PassKind, CompileResult, PropertySet};
//! use arvak_ir::CircuitDag;
//!
//! struct MyCustomPass;
//!
//! impl Pass for MyCustomPass {
//!     fn name(&self) -> &str { "my_custom_pass" }
//!     fn kind(&self) -> PassKind { PassKind::Transformation }
//!
//!     fn run(&self, dag: &mut CircuitDag, props: &mut PropertySet) -> CompileResult<()> {
//!         // Your pass logic here
//!         Ok(())
//!     }
//! }
//! ```

pub mod assembly;
pub mod error;
pub mod manager;
pub mod matrix;
pub mod pass;
pub mod property;
pub mod synthesis;
pub mod unitary;

// Built-in passes
pub mod passes;

pub use assembly::{compile_program, CompileReport, ProgramCheck, RegisterInfo};
pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder};
pub use pass::{Pass, PassKind};
pub use property::{BasisGates, CouplingMap, Layout, PropertySet, RoutingHeuristic};
