//! Compilation error types.

use thiserror::Error;

use arvak_ir::IrError;

/// Result type returned by passes and the pass manager.
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors that can occur while compiling a circuit.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The input circuit or configuration was malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A gate has no rule taking it into the target basis.
    #[error("gate not in basis: {0}")]
    GateNotInBasis(String),

    /// Unroll recursion bottomed out without reaching the target basis.
    #[error("no path from {gate} to basis {basis:?} within depth {max_depth}")]
    UnreachableBasis {
        /// The gate that could not be reduced.
        gate: String,
        /// The basis gate set being targeted.
        basis: Vec<String>,
        /// The recursion depth bound that was hit.
        max_depth: u32,
    },

    /// A pass that needs a coupling map ran without one in the property set.
    #[error("pass requires a coupling map but none is set")]
    MissingCouplingMap,

    /// A pass that needs a basis gate set ran without one in the property set.
    #[error("pass requires a basis gate set but none is set")]
    MissingBasisGates,

    /// A pass that needs a layout ran before one was computed.
    #[error("pass requires a layout but none is set")]
    MissingLayout,

    /// The circuit uses more qubits than the target device has.
    #[error("circuit needs {required} qubits, device has {available}")]
    CircuitTooLarge {
        /// Qubits the circuit requires.
        required: usize,
        /// Qubits the device provides.
        available: u32,
    },

    /// Two qubits that must interact are not connected, and routing
    /// could not bridge them (e.g. the coupling graph is disconnected).
    #[error("no route between physical qubits {qubit1} and {qubit2}")]
    RoutingFailed {
        /// First physical qubit.
        qubit1: u32,
        /// Second physical qubit.
        qubit2: u32,
    },

    /// A two-qubit operation was scheduled between physical qubits that
    /// the coupling map does not connect, after routing should have
    /// resolved it: an invariant violation, not a user-fixable error.
    #[error("gate '{gate_name}' on physical qubits {q0}-{q1} violates the coupling map")]
    TopologyViolation {
        /// Offending gate's name.
        gate_name: String,
        /// First physical qubit.
        q0: u32,
        /// Second physical qubit.
        q1: u32,
    },

    /// A measurement is not ordered before dependent classical control or
    /// a barrier meant to separate it from subsequent gates.
    #[error("measurement ordering violated by '{gate_name}' on qubit {qubit}: {detail}")]
    MeasurementViolation {
        /// Offending gate's name.
        gate_name: String,
        /// Logical qubit index.
        qubit: u32,
        /// Human-readable explanation.
        detail: String,
    },

    /// A resource (classical register slot, ancilla, etc.) the circuit
    /// requires was not available.
    #[error("required resource unavailable: {0}")]
    NoResource(String),

    /// A requested allocation exceeds a hard capacity limit (too many
    /// ancillas for multi-controlled synthesis, recursion budget, etc.).
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// A numerical routine (matrix synthesis, eigendecomposition) failed to
    /// converge or produced a result outside tolerance.
    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    /// An error from the IR layer (DAG mutation, parameter binding, etc).
    #[error(transparent)]
    Ir(#[from] IrError),

    /// A coupling map was constructed from an empty edge list.
    #[error("coupling map has no edges")]
    EmptyCouplingMap,

    /// A coupling map was constructed from directed edges missing an
    /// inverse pair; call `CouplingMap::bidirectionalize` on the input
    /// first if that is intended.
    #[error("coupling map edge ({from}, {to}) has no inverse ({to}, {from})")]
    NonBidirectionalCouplingMap {
        /// Source qubit of the one-directional edge.
        from: u32,
        /// Destination qubit of the one-directional edge.
        to: u32,
    },
}
