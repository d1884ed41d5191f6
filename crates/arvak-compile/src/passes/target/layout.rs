//! Layout passes for mapping logical qubits to physical qubits.

use arvak_ir::{CircuitDag, CircuitLevel, Instruction};
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::{Layout, PropertySet};

use super::routing::route;

/// Trivial layout pass.
///
/// Maps logical qubit i to physical qubit i.
/// This is the simplest layout strategy and works when the
/// circuit fits within the device and no optimization is needed.
pub struct TrivialLayout;

impl Pass for TrivialLayout {
    fn name(&self) -> &'static str {
        "TrivialLayout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    #[allow(clippy::cast_possible_truncation)]
    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        // Check if we have a coupling map
        let coupling_map = properties
            .coupling_map
            .as_ref()
            .ok_or(CompileError::MissingCouplingMap)?;

        // Check if circuit fits
        let num_logical = dag.num_qubits();
        let num_physical = coupling_map.num_qubits() as usize;

        if num_logical > num_physical {
            return Err(CompileError::CircuitTooLarge {
                required: num_logical,
                available: coupling_map.num_qubits(),
            });
        }

        // Create trivial layout
        let layout = Layout::trivial(num_logical as u32);
        properties.layout = Some(layout);

        // Mark the circuit as physical level
        dag.set_level(CircuitLevel::Physical);

        Ok(())
    }

    fn should_run(&self, _dag: &CircuitDag, properties: &PropertySet) -> bool {
        // Only run if we don't have a layout yet and have a coupling map
        properties.layout.is_none() && properties.coupling_map.is_some()
    }
}

/// Number of forward/backward warm-start rounds before the layout settles.
const SABRE_ITERATIONS: usize = 3;

/// SABRE layout pass: bidirectional iterative initial-layout search.
///
/// Starting from a random injection of logical onto physical qubits, the
/// pass alternates cost-evaluation routing runs over the circuit and its
/// reversal. The final layout of each run warm-starts the next: routing the
/// reversed circuit from where the forward run ended pulls the layout
/// towards a placement that is cheap in *both* directions, which is exactly
/// what a good initial layout looks like. Cost-evaluation runs mutate only
/// layout bookkeeping, so the search is cheap relative to a real routing
/// pass.
///
/// The committed layout is the ending layout of the last backward run; the
/// subsequent [`super::SabreRouting`] pass performs the one real (apply
/// mode) forward run the search has been optimizing for.
pub struct SabreLayout;

impl Pass for SabreLayout {
    fn name(&self) -> &'static str {
        "SabreLayout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    #[allow(clippy::cast_possible_truncation)]
    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let heuristic = properties.routing_heuristic;
        let mut rng = properties.rng.clone();
        let num_logical = dag.num_qubits();

        let settled = {
            let coupling = properties
                .coupling_map
                .as_ref()
                .ok_or(CompileError::MissingCouplingMap)?;
            let num_physical = coupling.num_qubits();

            if num_logical > num_physical as usize {
                return Err(CompileError::CircuitTooLarge {
                    required: num_logical,
                    available: num_physical,
                });
            }

            let mut layout = match properties.layout.clone() {
                Some(layout) => layout,
                None => Layout::random(num_logical as u32, num_physical, &mut rng),
            };

            let forward: Vec<Instruction> =
                dag.topological_ops().map(|(_, inst)| inst.clone()).collect();
            let backward: Vec<Instruction> = forward.iter().rev().cloned().collect();

            for _ in 0..SABRE_ITERATIONS {
                let (after_forward, _) =
                    route(&forward, coupling, layout, heuristic, &mut rng, None)?;
                let (after_backward, _) =
                    route(&backward, coupling, after_forward, heuristic, &mut rng, None)?;
                layout = after_backward;
            }
            layout
        };

        debug!(qubits = num_logical, "sabre layout settled");
        properties.layout = Some(settled);
        properties.rng = rng;
        dag.set_level(CircuitLevel::Physical);
        Ok(())
    }

    fn should_run(&self, _dag: &CircuitDag, properties: &PropertySet) -> bool {
        properties.layout.is_none() && properties.coupling_map.is_some()
    }
}
