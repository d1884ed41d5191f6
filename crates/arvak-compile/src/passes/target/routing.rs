//! SABRE-style swap-insertion routing.
//!
//! The router keeps a *front layer* of operations whose predecessors have
//! all been applied. Anything executable under the current layout is emitted
//! immediately; once every front gate sits on a non-adjacent qubit pair, one
//! SWAP is chosen by scoring every coupling-map edge that touches the front
//! layer, with a lookahead over an *extended set* of upcoming two-qubit
//! gates and a decay penalty that spreads consecutive SWAPs across
//! different qubits.
//!
//! The same engine runs in two modes: **apply** (producing a new DAG on
//! physical wire labels, used by [`SabreRouting`]) and **cost evaluation**
//! (layout bookkeeping only, no DAG mutation, used by the bidirectional
//! search in [`super::layout::SabreLayout`]).

use std::collections::VecDeque;

use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};

use arvak_ir::{CircuitDag, CircuitLevel, Instruction, Positions, QubitId, StandardGate, WireId};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind};
use crate::property::{CouplingMap, Layout, PropertySet, RoutingHeuristic};

/// Decay added to a just-swapped qubit in `Distance`/`Mixture` mode.
const DECAY_STEP: f64 = 0.01;
/// Weight of the extended-set (lookahead) cost relative to the front layer.
const EXTENDED_SET_WEIGHT: f64 = 0.5;
/// Scores within this of the best are treated as tied and broken at random.
const SCORE_TOL: f64 = 1e-9;

/// Bookkeeping left behind in the property set by [`SabreRouting`].
///
/// The routed DAG itself uses physical wire labels, so the active
/// `PropertySet::layout` after routing is the identity over those wires;
/// the logical-to-physical story lives here instead.
#[derive(Debug, Clone)]
pub struct RoutingSummary {
    /// Logical-to-physical mapping the routing started from.
    pub initial_layout: Layout,
    /// The mapping after every inserted SWAP has been applied.
    pub final_layout: Layout,
    /// Number of SWAP gates inserted (each decomposes to 3 CNOTs later).
    pub added_swaps: usize,
}

/// Per-wire dependency structure derived from a topologically ordered
/// instruction list: `succs[i]` holds the distinct instructions directly
/// depending on instruction `i` through a shared qubit or clbit wire, and
/// `pred_count[i]` the number of distinct direct predecessors.
struct Dependencies {
    succs: Vec<Vec<usize>>,
    pred_count: Vec<usize>,
}

fn build_dependencies(ops: &[Instruction]) -> Dependencies {
    let mut succs = vec![Vec::new(); ops.len()];
    let mut pred_count = vec![0usize; ops.len()];
    let mut last_on_wire: FxHashMap<WireId, usize> = FxHashMap::default();

    for (i, inst) in ops.iter().enumerate() {
        let wires = inst
            .qubits
            .iter()
            .copied()
            .map(WireId::Qubit)
            .chain(inst.clbits.iter().copied().map(WireId::Clbit));
        for wire in wires {
            if let Some(&prev) = last_on_wire.get(&wire) {
                if prev != i && !succs[prev].contains(&i) {
                    succs[prev].push(i);
                    pred_count[i] += 1;
                }
            }
            last_on_wire.insert(wire, i);
        }
    }

    Dependencies { succs, pred_count }
}

/// True if the instruction can run under the current layout without SWAPs:
/// everything except a two-qubit gate on a non-coupled pair. The `xy`
/// resonance gate is driven globally rather than through a coupler, so it is
/// never routing-limited.
fn is_executable(inst: &Instruction, layout: &Layout, coupling: &CouplingMap) -> bool {
    let qubits = match inst.positions() {
        Positions::Measure(..) => return true,
        Positions::Qubits(qubits) => qubits,
    };
    if !inst.is_gate() || qubits.len() != 2 {
        return true;
    }
    if inst.name() == "xy" {
        return true;
    }
    match (layout.get_physical(qubits[0]), layout.get_physical(qubits[1])) {
        (Some(p0), Some(p1)) => coupling.is_connected(p0, p1),
        _ => false,
    }
}

/// The current physical positions of a two-qubit gate's operands.
fn physical_pair(inst: &Instruction, layout: &Layout) -> CompileResult<(u32, u32)> {
    let p0 = layout
        .get_physical(inst.qubits[0])
        .ok_or(CompileError::MissingLayout)?;
    let p1 = layout
        .get_physical(inst.qubits[1])
        .ok_or(CompileError::MissingLayout)?;
    Ok((p0, p1))
}

/// Logical operand pairs of the two-qubit gates among `indices`.
fn gate_pairs(indices: &[usize], ops: &[Instruction]) -> Vec<(QubitId, QubitId)> {
    indices
        .iter()
        .filter(|&&i| ops[i].is_gate() && ops[i].qubits.len() == 2)
        .map(|&i| (ops[i].qubits[0], ops[i].qubits[1]))
        .collect()
}

/// Up to `cap` upcoming two-qubit gates reachable from the front layer via
/// BFS over the dependency structure. Barriers and measurements are walked
/// through but never counted.
fn extended_set(
    front: &[usize],
    succs: &[Vec<usize>],
    ops: &[Instruction],
    cap: usize,
) -> Vec<usize> {
    let mut seen: FxHashSet<usize> = front.iter().copied().collect();
    let mut queue: VecDeque<usize> = front.iter().copied().collect();
    let mut out = Vec::new();

    while let Some(i) = queue.pop_front() {
        for &s in &succs[i] {
            if seen.insert(s) {
                if ops[s].is_gate() && ops[s].qubits.len() == 2 {
                    out.push(s);
                    if out.len() >= cap {
                        return out;
                    }
                }
                queue.push_back(s);
            }
        }
    }
    out
}

/// Candidate SWAPs: every coupling-map edge with at least one endpoint in
/// the physical image of the front layer's two-qubit gates, canonicalized
/// to `(min, max)` physical pairs, in edge-list order for determinism.
fn candidate_swaps(
    front_pairs: &[(QubitId, QubitId)],
    layout: &Layout,
    coupling: &CouplingMap,
) -> CompileResult<Vec<(u32, u32)>> {
    let mut involved: FxHashSet<u32> = FxHashSet::default();
    for &(a, b) in front_pairs {
        involved.insert(layout.get_physical(a).ok_or(CompileError::MissingLayout)?);
        involved.insert(layout.get_physical(b).ok_or(CompileError::MissingLayout)?);
    }

    let mut seen: FxHashSet<(u32, u32)> = FxHashSet::default();
    let mut out = Vec::new();
    for &(u, v) in coupling.edges() {
        if involved.contains(&u) || involved.contains(&v) {
            let canonical = (u.min(v), u.max(v));
            if seen.insert(canonical) {
                out.push(canonical);
            }
        }
    }
    Ok(out)
}

fn decay_of(decay: &FxHashMap<u32, f64>, qubit: u32) -> f64 {
    decay.get(&qubit).copied().unwrap_or(1.0)
}

/// Mean coupling-graph distance over the pairs, after a trial layout.
fn mean_distance(
    pairs: &[(QubitId, QubitId)],
    layout: &Layout,
    coupling: &CouplingMap,
) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }
    let total: f64 = pairs
        .iter()
        .map(|&(a, b)| {
            match (layout.get_physical(a), layout.get_physical(b)) {
                (Some(p0), Some(p1)) => {
                    coupling.distance(p0, p1).map_or(1e9, f64::from)
                }
                _ => 1e9,
            }
        })
        .sum();
    total / pairs.len() as f64
}

/// Sum of edge-averaged best-path log-fidelities over the pairs: the
/// path-fidelity matrix value (closer to 0 is better) divided by the hop
/// count, so long high-fidelity detours and short lossy hops compare fairly.
fn path_fidelity_cost(
    pairs: &[(QubitId, QubitId)],
    layout: &Layout,
    coupling: &CouplingMap,
) -> f64 {
    pairs
        .iter()
        .map(|&(a, b)| {
            match (layout.get_physical(a), layout.get_physical(b)) {
                (Some(p0), Some(p1)) => {
                    let fidelity = coupling.path_fidelity(p0, p1).unwrap_or(-1e9);
                    let hops = coupling.distance(p0, p1).unwrap_or(1).max(1);
                    fidelity / f64::from(hops)
                }
                _ => -1e9,
            }
        })
        .sum()
}

fn score_distance(
    swap: (u32, u32),
    front_pairs: &[(QubitId, QubitId)],
    extended_pairs: &[(QubitId, QubitId)],
    layout: &Layout,
    coupling: &CouplingMap,
    decay: &FxHashMap<u32, f64>,
) -> f64 {
    let mut trial = layout.clone();
    trial.swap(swap.0, swap.1);

    let front_cost = mean_distance(front_pairs, &trial, coupling);
    let extended_cost = mean_distance(extended_pairs, &trial, coupling);
    let decay_factor = decay_of(decay, swap.0).max(decay_of(decay, swap.1));
    (front_cost + EXTENDED_SET_WEIGHT * extended_cost) * decay_factor
}

fn score_fidelity(
    swap: (u32, u32),
    front_pairs: &[(QubitId, QubitId)],
    extended_pairs: &[(QubitId, QubitId)],
    layout: &Layout,
    coupling: &CouplingMap,
    decay: &FxHashMap<u32, f64>,
) -> f64 {
    let mut trial = layout.clone();
    trial.swap(swap.0, swap.1);

    let front_cost = path_fidelity_cost(front_pairs, &trial, coupling);
    let extended_cost = path_fidelity_cost(extended_pairs, &trial, coupling);
    let mean_decay = 0.5 * (decay_of(decay, swap.0) + decay_of(decay, swap.1));

    let forward = coupling.fidelity(swap.0, swap.1).ln();
    let reverse = coupling.fidelity(swap.1, swap.0).ln();

    mean_decay * (front_cost + EXTENDED_SET_WEIGHT * extended_cost)
        + 2.0 * forward.max(reverse)
        + forward.min(reverse)
}

/// Indices of the candidates whose score ties the best one.
fn tied_best(scores: &[f64], maximize: bool) -> Vec<usize> {
    let best = scores.iter().copied().fold(
        if maximize {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        },
        |acc, s| if maximize { acc.max(s) } else { acc.min(s) },
    );
    (0..scores.len())
        .filter(|&i| (scores[i] - best).abs() < SCORE_TOL)
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn select_swap(
    candidates: &[(u32, u32)],
    front_pairs: &[(QubitId, QubitId)],
    extended_pairs: &[(QubitId, QubitId)],
    layout: &Layout,
    coupling: &CouplingMap,
    decay: &FxHashMap<u32, f64>,
    heuristic: RoutingHeuristic,
    rng: &mut rand::rngs::StdRng,
) -> (u32, u32) {
    let distance_scores = |cands: &[(u32, u32)]| -> Vec<f64> {
        cands
            .iter()
            .map(|&c| score_distance(c, front_pairs, extended_pairs, layout, coupling, decay))
            .collect()
    };
    let fidelity_scores = |cands: &[(u32, u32)]| -> Vec<f64> {
        cands
            .iter()
            .map(|&c| score_fidelity(c, front_pairs, extended_pairs, layout, coupling, decay))
            .collect()
    };

    let tied = match heuristic {
        RoutingHeuristic::Distance => tied_best(&distance_scores(candidates), false),
        RoutingHeuristic::Fidelity => tied_best(&fidelity_scores(candidates), true),
        RoutingHeuristic::Mixture => {
            // Distance picks the candidate set; fidelity breaks its ties.
            let tied = tied_best(&distance_scores(candidates), false);
            if tied.len() == 1 {
                tied
            } else {
                let subset: Vec<(u32, u32)> = tied.iter().map(|&i| candidates[i]).collect();
                let refined = tied_best(&fidelity_scores(&subset), true);
                refined.into_iter().map(|i| tied[i]).collect()
            }
        }
    };

    candidates[tied[rng.gen_range(0..tied.len())]]
}

fn decay_step_for(heuristic: RoutingHeuristic, coupling: &CouplingMap) -> f64 {
    match heuristic {
        RoutingHeuristic::Fidelity => {
            let edges = coupling.edges();
            if edges.is_empty() {
                return DECAY_STEP;
            }
            let mean: f64 = edges
                .iter()
                .map(|&(u, v)| coupling.fidelity(u, v))
                .sum::<f64>()
                / edges.len() as f64;
            let step = 1.0 - mean;
            // A perfect-fidelity graph would otherwise never accumulate decay.
            if step > f64::EPSILON { step } else { DECAY_STEP }
        }
        RoutingHeuristic::Distance | RoutingHeuristic::Mixture => DECAY_STEP,
    }
}

/// Append `inst` to `dag` with its qubits remapped through `layout` onto
/// physical wire labels, creating wires on first use.
fn emit(dag: &mut CircuitDag, inst: &Instruction, layout: &Layout) -> CompileResult<()> {
    let mut mapped = inst.clone();
    mapped.qubits = inst
        .qubits
        .iter()
        .map(|&q| {
            let p = layout.get_physical(q).ok_or(CompileError::MissingLayout)?;
            Ok(QubitId(p))
        })
        .collect::<CompileResult<Vec<_>>>()?;
    for &q in &mapped.qubits {
        dag.add_qubit(q);
    }
    for &c in &mapped.clbits {
        dag.add_clbit(c);
    }
    dag.apply(mapped).map_err(CompileError::Ir)?;
    Ok(())
}

/// Run the SABRE main loop over a topologically ordered instruction list.
///
/// When `sink` is given the routed circuit is materialized into it on
/// physical wire labels (apply mode); otherwise only the layout and SWAP
/// count evolve (cost-evaluation mode). Returns the final layout and the
/// number of SWAPs that were (or would have been) inserted.
pub(crate) fn route(
    ops: &[Instruction],
    coupling: &CouplingMap,
    initial_layout: Layout,
    heuristic: RoutingHeuristic,
    rng: &mut rand::rngs::StdRng,
    mut sink: Option<&mut CircuitDag>,
) -> CompileResult<(Layout, usize)> {
    let deps = build_dependencies(ops);
    let mut pred_count = deps.pred_count;
    let mut front: Vec<usize> = (0..ops.len()).filter(|&i| pred_count[i] == 0).collect();

    let mut layout = initial_layout;
    let mut decay: FxHashMap<u32, f64> = FxHashMap::default();
    // The pair swapped on the previous iteration, blocked from immediate
    // reversal unless it is the only candidate left.
    let mut unavailable: Option<(u32, u32)> = None;
    let mut added_swaps = 0usize;
    let mut swaps_since_reset = 0usize;
    let mut swaps_since_progress = 0usize;

    let extended_set_size = (coupling.num_qubits() as usize).max(1);
    let decay_reset_interval =
        (((extended_set_size as f64) / 2.0).round() as usize).max(1);
    let decay_step = decay_step_for(heuristic, coupling);
    let stall_limit = extended_set_size * extended_set_size * 8 + 64;

    while !front.is_empty() {
        let executable: Vec<usize> = front
            .iter()
            .copied()
            .filter(|&i| is_executable(&ops[i], &layout, coupling))
            .collect();

        if !executable.is_empty() {
            for &i in &executable {
                if let Some(dag) = sink.as_deref_mut() {
                    emit(dag, &ops[i], &layout)?;
                }
            }
            let done: FxHashSet<usize> = executable.iter().copied().collect();
            front.retain(|i| !done.contains(i));
            for &i in &executable {
                for &s in &deps.succs[i] {
                    pred_count[s] -= 1;
                    if pred_count[s] == 0 {
                        front.push(s);
                    }
                }
            }
            decay.clear();
            swaps_since_reset = 0;
            swaps_since_progress = 0;
            unavailable = None;
            continue;
        }

        // Every front gate is two-qubit on a non-adjacent pair: insert a SWAP.
        swaps_since_progress += 1;
        if swaps_since_progress > stall_limit {
            let (p0, p1) = physical_pair(&ops[front[0]], &layout)?;
            return Err(CompileError::RoutingFailed {
                qubit1: p0,
                qubit2: p1,
            });
        }

        let front_pairs = gate_pairs(&front, ops);
        let extended = extended_set(&front, &deps.succs, ops, extended_set_size);
        let extended_pairs = gate_pairs(&extended, ops);

        let mut candidates = candidate_swaps(&front_pairs, &layout, coupling)?;
        if candidates.is_empty() {
            let (p0, p1) = physical_pair(&ops[front[0]], &layout)?;
            return Err(CompileError::RoutingFailed {
                qubit1: p0,
                qubit2: p1,
            });
        }
        if let Some(blocked) = unavailable {
            let filtered: Vec<(u32, u32)> = candidates
                .iter()
                .copied()
                .filter(|&c| c != blocked)
                .collect();
            if !filtered.is_empty() {
                candidates = filtered;
            }
        }

        let (p1, p2) = select_swap(
            &candidates,
            &front_pairs,
            &extended_pairs,
            &layout,
            coupling,
            &decay,
            heuristic,
            rng,
        );

        if let Some(dag) = sink.as_deref_mut() {
            dag.add_qubit(QubitId(p1));
            dag.add_qubit(QubitId(p2));
            dag.apply(Instruction::two_qubit_gate(
                StandardGate::Swap,
                QubitId(p1),
                QubitId(p2),
            ))
            .map_err(CompileError::Ir)?;
        }
        layout.swap(p1, p2);
        unavailable = Some((p1.min(p2), p1.max(p2)));
        added_swaps += 1;

        swaps_since_reset += 1;
        if swaps_since_reset >= decay_reset_interval {
            decay.clear();
            swaps_since_reset = 0;
        } else {
            *decay.entry(p1).or_insert(1.0) += decay_step;
            *decay.entry(p2).or_insert(1.0) += decay_step;
        }
    }

    Ok((layout, added_swaps))
}

/// SABRE routing pass.
///
/// Consumes the layout produced by a layout pass, inserts SWAPs wherever a
/// two-qubit gate straddles a non-coupled pair, and rebuilds the DAG on
/// **physical** wire labels so the emitted circuit is ready for hardware
/// execution. The logical-to-physical story (initial layout, final layout,
/// SWAP count) is recorded as a [`RoutingSummary`] in the property set, and
/// the active layout is replaced by the identity over the physical wires in
/// use so downstream topology checks read the labels directly.
pub struct SabreRouting;

impl Pass for SabreRouting {
    fn name(&self) -> &'static str {
        "SabreRouting"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    #[instrument(skip_all)]
    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        let initial_layout = properties
            .layout
            .clone()
            .ok_or(CompileError::MissingLayout)?;
        let heuristic = properties.routing_heuristic;
        let mut rng = properties.rng.clone();

        let ops: Vec<Instruction> = dag.topological_ops().map(|(_, inst)| inst.clone()).collect();

        let mut new_dag = CircuitDag::new();
        let mut mapped: Vec<(QubitId, u32)> = initial_layout.iter().collect();
        mapped.sort_by_key(|&(_, p)| p);
        for &(_, p) in &mapped {
            new_dag.add_qubit(QubitId(p));
        }
        for clbit in dag.clbits().collect::<Vec<_>>() {
            new_dag.add_clbit(clbit);
        }

        let (final_layout, added_swaps) = {
            let coupling = properties
                .coupling_map
                .as_ref()
                .ok_or(CompileError::MissingCouplingMap)?;
            route(
                &ops,
                coupling,
                initial_layout.clone(),
                heuristic,
                &mut rng,
                Some(&mut new_dag),
            )?
        };

        new_dag.set_global_phase(dag.global_phase());
        new_dag.set_level(CircuitLevel::Physical);
        *dag = new_dag;

        properties.rng = rng;
        let mut physical = Layout::new();
        for q in dag.qubits() {
            physical.add(q, q.0);
        }
        properties.layout = Some(physical);
        properties.insert(RoutingSummary {
            initial_layout,
            final_layout,
            added_swaps,
        });

        debug!(added_swaps, "sabre routing complete");
        Ok(())
    }

    fn should_run(&self, _dag: &CircuitDag, properties: &PropertySet) -> bool {
        properties.coupling_map.is_some() && properties.layout.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::TrivialLayout;
    use crate::property::{BasisGates, CouplingMap};
    use arvak_ir::{Circuit, InstructionKind};

    fn gate_names(dag: &CircuitDag) -> Vec<String> {
        dag.topological_ops()
            .filter_map(|(_, inst)| {
                if let InstructionKind::Gate(gate) = &inst.kind {
                    Some(gate.name().to_string())
                } else {
                    None
                }
            })
            .collect()
    }

    fn assert_coupled(dag: &CircuitDag, coupling: &CouplingMap) {
        for (_, inst) in dag.topological_ops() {
            if inst.is_gate() && inst.qubits.len() == 2 {
                assert!(
                    coupling.is_connected(inst.qubits[0].0, inst.qubits[1].0),
                    "two-qubit gate on non-adjacent physical qubits ({}, {})",
                    inst.qubits[0].0,
                    inst.qubits[1].0
                );
            }
        }
    }

    #[test]
    fn test_routing_adjacent_pair_needs_no_swap() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let mut dag = circuit.into_dag();

        let mut props = PropertySet::new().with_target(CouplingMap::linear(5), BasisGates::iqm());
        TrivialLayout.run(&mut dag, &mut props).unwrap();
        SabreRouting.run(&mut dag, &mut props).unwrap();

        assert_eq!(dag.num_ops(), 2);
        let summary = props.get::<RoutingSummary>().unwrap();
        assert_eq!(summary.added_swaps, 0);
    }

    #[test]
    fn test_routing_inserts_swaps_before_distant_gate() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let mut dag = circuit.into_dag();

        let mut props = PropertySet::new().with_target(CouplingMap::linear(5), BasisGates::iqm());
        TrivialLayout.run(&mut dag, &mut props).unwrap();
        SabreRouting.run(&mut dag, &mut props).unwrap();

        let ops = gate_names(&dag);
        let last_swap = ops.iter().rposition(|name| name == "swap");
        let first_cx = ops.iter().position(|name| name == "cx");
        assert!(last_swap.is_some(), "expected at least one SWAP, got {ops:?}");
        assert!(first_cx.is_some(), "expected the CX to survive, got {ops:?}");
        assert!(
            last_swap.unwrap() < first_cx.unwrap(),
            "SWAPs must precede the CX they unblock, got {ops:?}"
        );

        assert_coupled(&dag, props.coupling_map.as_ref().unwrap());
        assert_eq!(dag.level(), CircuitLevel::Physical);
    }

    #[test]
    fn test_routing_end_to_end_distance_bound() {
        // CX between the ends of a 5-qubit chain: the pair starts at
        // distance 4, and one SWAP shortens the distance by at most 1,
        // so at least 3 SWAPs are required.
        let mut circuit = Circuit::with_size("test", 5, 0);
        circuit.cx(QubitId(0), QubitId(4)).unwrap();
        let mut dag = circuit.into_dag();

        let mut props = PropertySet::new().with_target(CouplingMap::linear(5), BasisGates::iqm());
        TrivialLayout.run(&mut dag, &mut props).unwrap();
        SabreRouting.run(&mut dag, &mut props).unwrap();

        let summary = props.get::<RoutingSummary>().unwrap();
        assert!(
            summary.added_swaps >= 3,
            "expected at least 3 SWAPs for distance 4, got {}",
            summary.added_swaps
        );
        assert_coupled(&dag, props.coupling_map.as_ref().unwrap());
    }

    #[test]
    fn test_routing_deterministic_given_seed() {
        let added = |seed: u64| {
            let mut circuit = Circuit::with_size("test", 4, 0);
            circuit.cx(QubitId(0), QubitId(3)).unwrap();
            circuit.cx(QubitId(1), QubitId(3)).unwrap();
            circuit.cx(QubitId(0), QubitId(2)).unwrap();
            let mut dag = circuit.into_dag();

            let mut props = PropertySet::new()
                .with_seed(seed)
                .with_target(CouplingMap::linear(4), BasisGates::iqm());
            TrivialLayout.run(&mut dag, &mut props).unwrap();
            SabreRouting.run(&mut dag, &mut props).unwrap();
            (
                props.get::<RoutingSummary>().unwrap().added_swaps,
                gate_names(&dag),
            )
        };

        assert_eq!(added(7), added(7));
    }

    #[test]
    fn test_routing_fidelity_heuristic_respects_topology() {
        let coupling = CouplingMap::linear(4).with_fidelity([
            (0, 1, 0.99),
            (1, 2, 0.42),
            (2, 3, 0.97),
        ]);

        let mut circuit = Circuit::with_size("test", 4, 0);
        circuit.cx(QubitId(0), QubitId(3)).unwrap();
        let mut dag = circuit.into_dag();

        let mut props = PropertySet::new()
            .with_target(coupling, BasisGates::iqm())
            .with_routing_heuristic(RoutingHeuristic::Fidelity);
        TrivialLayout.run(&mut dag, &mut props).unwrap();
        SabreRouting.run(&mut dag, &mut props).unwrap();

        assert_coupled(&dag, props.coupling_map.as_ref().unwrap());
        assert!(props.get::<RoutingSummary>().unwrap().added_swaps >= 2);
    }

    #[test]
    fn test_routing_mixture_heuristic_matches_distance_topology_guarantee() {
        let mut circuit = Circuit::with_size("test", 5, 0);
        circuit.cx(QubitId(0), QubitId(4)).unwrap();
        circuit.cx(QubitId(1), QubitId(3)).unwrap();
        let mut dag = circuit.into_dag();

        let mut props = PropertySet::new()
            .with_target(
                CouplingMap::linear(5).with_fidelity([(0, 1, 0.9), (3, 4, 0.8)]),
                BasisGates::iqm(),
            )
            .with_routing_heuristic(RoutingHeuristic::Mixture);
        TrivialLayout.run(&mut dag, &mut props).unwrap();
        SabreRouting.run(&mut dag, &mut props).unwrap();

        assert_coupled(&dag, props.coupling_map.as_ref().unwrap());
    }

    #[test]
    fn test_routing_preserves_measurements_and_barriers() {
        let mut circuit = Circuit::with_size("test", 3, 3);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.barrier([QubitId(0), QubitId(1), QubitId(2)]).unwrap();
        circuit.measure(QubitId(0), arvak_ir::ClbitId(0)).unwrap();
        circuit.measure(QubitId(2), arvak_ir::ClbitId(2)).unwrap();
        let mut dag = circuit.into_dag();

        let mut props = PropertySet::new().with_target(CouplingMap::linear(3), BasisGates::iqm());
        TrivialLayout.run(&mut dag, &mut props).unwrap();
        SabreRouting.run(&mut dag, &mut props).unwrap();

        let measures = dag
            .topological_ops()
            .filter(|(_, inst)| inst.is_measure())
            .count();
        let barriers = dag
            .topological_ops()
            .filter(|(_, inst)| inst.is_barrier())
            .count();
        assert_eq!(measures, 2);
        assert_eq!(barriers, 1);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_cost_eval_mode_leaves_no_dag() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let ops: Vec<Instruction> = circuit
            .dag()
            .topological_ops()
            .map(|(_, inst)| inst.clone())
            .collect();

        let coupling = CouplingMap::linear(3);
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(0);
        let (final_layout, added) = route(
            &ops,
            &coupling,
            Layout::trivial(3),
            RoutingHeuristic::Distance,
            &mut rng,
            None,
        )
        .unwrap();

        assert!(added >= 1);
        // The layout moved: some logical qubit no longer sits on its
        // trivial physical position.
        let moved = (0..3).any(|i| final_layout.get_physical(QubitId(i)) != Some(i));
        assert!(moved);
    }
}
