//! Arvak Circuit Intermediate Representation
//!
//! This crate provides the core data structures for representing quantum circuits
//! in Arvak. It forms the foundation of the entire Arvak compilation stack.
//!
//! # Overview
//!
//! The circuit IR uses a DAG (Directed Acyclic Graph) representation internally,
//! which enables efficient compilation and optimization passes. The high-level
//! [`Circuit`] API provides a convenient builder pattern for constructing circuits.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`] for addressing quantum
//!   and classical registers
//! - **Gates**: [`StandardGate`] for built-in gates (H, X, CX, etc.) and [`CustomGate`]
//!   for user-defined operations
//! - **Parameters**: [`ParameterExpression`] for symbolic parameters in variational circuits
//! - **Instructions**: [`Instruction`] combining gates with their operands
//! - **DAG**: [`CircuitDag`] for the internal graph representation
//! - **Circuit**: [`Circuit`] high-level builder API
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use arvak_ir::{Circuit, QubitId};
//!
//! // Create a new circuit with 2 qubits and 2 classical bits
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//!
//! // Build the Bell state: |00⟩ → (|00⟩ + |11⟩)/√2
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//!
//! // Add measurement
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert!(circuit.depth() >= 2);  // H, CX, measure
//! ```
//!
//! # Example: Parameterized Circuit
//!
//! ```rust
//! use arvak_ir::{Circuit, QubitId, ParameterExpression};
//! use std::f64::consts::PI;
//!
//! // Create a 1-qubit circuit
//! let mut circuit = Circuit::with_size("variational", 1, 0);
//!
//! // Create a symbolic parameter
//! let theta = ParameterExpression::symbol("theta");
//!
//! // Add parameterized rotation
//! circuit.rx(theta.clone(), QubitId(0)).unwrap();
//!
//! // Later, bind the parameter to a concrete value
//! let bound = theta.bind("theta", PI / 4.0);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg` | 1 | S and S-dagger gates |
//! | `T`, `Tdg` | 1 | T and T-dagger gates |
//! | `SX`, `SXdg`, `SY`, `SYdg` | 1 | sqrt(X)/sqrt(Y) and their adjoints |
//! | `W`, `SW`, `SWdg` | 1 | (X+Y)/sqrt(2)-axis rotation and its square root |
//! | `Rx`, `Ry`, `Rz`, `P` | 1 | Rotation and phase gates |
//! | `U` | 1 | Universal single-qubit gate U(θ,φ,λ) |
//! | `PRX` | 1 | Phased RX gate, θ,φ parameterized |
//! | `CX` | 2 | Controlled-NOT (CNOT) |
//! | `CY`, `CZ`, `CH`, `CS`, `CT` | 2 | Controlled Pauli/Clifford/T gates |
//! | `CRx`, `CRy`, `CRz`, `CP` | 2 | Controlled rotation and phase gates |
//! | `RXX`, `RYY`, `RZZ`, `XY` | 2 | Two-qubit interaction gates |
//! | `Swap`, `ISwap` | 2 | SWAP and iSWAP gates |
//! | `CCX`, `CSwap` | 3 | Toffoli and Fredkin gates |
//! | `MCX`, `MCY`, `MCZ`, `MCRx`, `MCRy`, `MCRz` | n | Multi-controlled gates |

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use circuit::Circuit;
pub use dag::{CircuitDag, CircuitLevel, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{ClassicalCondition, CustomGate, Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind, Positions};
pub use parameter::{BinaryOp, ParameterExpression};
pub use qubit::{Clbit, ClbitId, Qubit, QubitId};
