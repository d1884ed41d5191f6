//! Pass manager for orchestrating compilation.

use tracing::{debug, info, instrument};

use arvak_ir::CircuitDag;

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{
    BasisTranslation, CircuitCheck, CommutativeCancellation, MeasurementBarrierVerification,
    Optimize1qGates, PairedInverseElimination, SabreLayout, SabreRouting, TrivialLayout,
    UnrollToTwoQubit,
};
use crate::property::{BasisGates, CouplingMap, PropertySet};

/// Manages and executes a sequence of compilation passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes on the given DAG.
    #[instrument(skip(self, dag, properties))]
    pub fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits",
            self.passes.len(),
            dag.num_qubits()
        );

        for pass in &self.passes {
            if pass.should_run(dag, properties) {
                debug!("Running pass: {}", pass.name());
                pass.run(dag, properties)?;
                // Avoid calling dag.depth() here — it performs a full topological
                // sort (O(V+E)) on every pass and is only used for debug logging.
                debug!("Pass {} completed, ops: {}", pass.name(), dag.num_ops());
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, final depth: {}, ops: {}",
            dag.depth(),
            dag.num_ops()
        );

        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating pass managers with preset configurations.
pub struct PassManagerBuilder {
    /// Optimization level (0-3).
    optimization_level: u8,
    /// Target properties.
    properties: PropertySet,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            optimization_level: 1,
            properties: PropertySet::new(),
        }
    }

    /// Set the optimization level.
    ///
    /// - Level 0: No optimization, only required transformations
    /// - Level 1: Light optimization (default)
    /// - Level 2: Moderate optimization
    /// - Level 3: Heavy optimization
    #[must_use]
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level.min(3);
        self
    }

    /// Set the target properties.
    #[must_use]
    pub fn with_properties(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    /// Set the target coupling map and basis gates.
    #[must_use]
    pub fn with_target(mut self, coupling_map: CouplingMap, basis_gates: BasisGates) -> Self {
        self.properties.coupling_map = Some(coupling_map);
        self.properties.basis_gates = Some(basis_gates);
        self
    }

    /// Build the pass manager and return it with the properties.
    ///
    /// Four presets, modeled after the levels named in the pipeline design:
    ///
    /// - **0**: trivial layout, SABRE routing, basis translation. No
    ///   optimization beyond what's required to satisfy the target.
    /// - **1**: level 0 plus a single pass of [`Optimize1qGates`] and
    ///   [`PairedInverseElimination`] (light cleanup).
    /// - **2**: SABRE-searched initial layout instead of trivial, plus
    ///   [`CommutativeCancellation`] added to the cleanup pass.
    /// - **3**: level 2's cleanup run twice, since each pass can expose
    ///   new cancellation opportunities the previous round missed.
    ///
    /// [`UnrollToTwoQubit`] always opens the pipeline so routing never sees
    /// a gate wider than two qubits. Cleanup runs between routing and
    /// [`BasisTranslation`]: the Euler merge re-emits generic rotations, so
    /// translation must come after it for the output to stay inside the
    /// target basis. [`CircuitCheck`] and
    /// [`MeasurementBarrierVerification`] always run last, regardless of
    /// level, as a safety net.
    pub fn build(self) -> (PassManager, PropertySet) {
        let mut pm = PassManager::new();
        let has_target = self.properties.coupling_map.is_some();

        // Arity reduction comes first so the SWAP search below only ever
        // reasons about two-qubit interactions.
        pm.add_pass(UnrollToTwoQubit);

        if has_target {
            if self.optimization_level >= 2 {
                pm.add_pass(SabreLayout);
            } else {
                pm.add_pass(TrivialLayout);
            }
            pm.add_pass(SabreRouting);
        }

        let cleanup_rounds = match self.optimization_level {
            0 => 0,
            1 => 1,
            2 => 1,
            _ => 2,
        };
        for _ in 0..cleanup_rounds {
            pm.add_pass(Optimize1qGates::new());
            pm.add_pass(PairedInverseElimination::new());
            if self.optimization_level >= 2 {
                pm.add_pass(CommutativeCancellation::new());
            }
        }

        if self.properties.basis_gates.is_some() {
            pm.add_pass(BasisTranslation);
        }

        pm.add_pass(MeasurementBarrierVerification);
        if has_target {
            pm.add_pass(CircuitCheck);
        }

        (pm, self.properties)
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arvak_ir::{Circuit, QubitId};

    #[test]
    fn test_empty_pass_manager() {
        let pm = PassManager::new();
        assert!(pm.is_empty());
        assert_eq!(pm.len(), 0);
    }

    #[test]
    fn test_pass_manager_run() {
        let pm = PassManager::new();
        let mut props = PropertySet::new();

        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();

        let mut dag = circuit.into_dag();
        pm.run(&mut dag, &mut props).unwrap();

        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_pass_manager_builder() {
        let (pm, props) = PassManagerBuilder::new()
            .with_optimization_level(2)
            .with_target(CouplingMap::linear(5), BasisGates::iqm())
            .build();

        assert!(!pm.is_empty());
        assert!(props.coupling_map.is_some());
        assert!(props.basis_gates.is_some());
    }

    #[test]
    fn test_toffoli_on_sparse_topology_lands_in_basis_and_coupled() {
        // A Toffoli on the ends of a linear chain forces the whole
        // pipeline to cooperate: arity reduction before routing, SWAP
        // insertion, then translation into the target basis.
        let mut circuit = Circuit::with_size("test", 4, 0);
        circuit.ccx(QubitId(0), QubitId(2), QubitId(3)).unwrap();
        let mut dag = circuit.into_dag();

        let (pm, mut props) = PassManagerBuilder::new()
            .with_optimization_level(1)
            .with_target(CouplingMap::linear(4), BasisGates::ibm())
            .build();
        pm.run(&mut dag, &mut props).unwrap();

        let basis = props.basis_gates.as_ref().unwrap();
        let coupling = props.coupling_map.as_ref().unwrap();
        for (_, inst) in dag.topological_ops() {
            if inst.is_gate() {
                assert!(
                    basis.contains(inst.name()),
                    "'{}' escaped translation",
                    inst.name()
                );
            }
            if inst.is_gate() && inst.qubits.len() == 2 {
                assert!(
                    coupling.is_connected(inst.qubits[0].0, inst.qubits[1].0),
                    "two-qubit gate on non-coupled pair ({}, {})",
                    inst.qubits[0].0,
                    inst.qubits[1].0
                );
            }
        }
    }
}
