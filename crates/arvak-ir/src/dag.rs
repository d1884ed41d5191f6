//! DAG-based circuit representation.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit DAG.
///
/// Every DAG has exactly one [`DagNode::Source`] and one [`DagNode::Sink`]:
/// the sentinel vertices conventionally named `-1` and `+inf`. Every wire
/// the circuit uses runs from the shared source to the shared sink,
/// passing through whichever operation nodes touch it along the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// The single sentinel vertex all wires originate from.
    Source,
    /// The single sentinel vertex all wires terminate at.
    Sink,
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    /// Check if this is the source sentinel.
    #[inline]
    pub fn is_source(&self) -> bool {
        matches!(self, DagNode::Source)
    }

    /// Check if this is the sink sentinel.
    #[inline]
    pub fn is_sink(&self) -> bool {
        matches!(self, DagNode::Sink)
    }

    /// Check if this is an operation node.
    #[inline]
    pub fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    /// Get the instruction if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }

    /// Get mutable reference to the instruction.
    #[inline]
    pub fn instruction_mut(&mut self) -> Option<&mut Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// An edge in the circuit DAG representing a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: WireId,
}

/// The abstraction level of a circuit in the compilation pipeline.
///
/// Circuits start at the `Logical` level (abstract qubits) and are
/// lowered to the `Physical` level by layout and routing passes
/// (qubits mapped to physical device positions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CircuitLevel {
    /// Logical level: qubits are abstract, no physical mapping applied.
    #[default]
    Logical,
    /// Physical level: qubits are mapped to physical device positions.
    Physical,
}

/// DAG-based circuit representation.
///
/// The circuit is represented as a directed acyclic graph with a single
/// sentinel `source` and a single sentinel `sink` (see [`DagNode`]); every
/// other node is an operation, and every edge carries the wire (qubit or
/// classical bit) it represents. For each wire in use there is exactly one
/// directed path from `source` to `sink` visiting every node that touches
/// that wire, in program order (invariant I3 of the DAG model).
///
/// ## Performance
///
/// The DAG maintains a `wire_front` index that maps each wire to the last
/// node before the sink on that wire. This enables O(1) predecessor lookups
/// in `apply()` instead of scanning all incoming edges of the sink.
#[derive(Debug)]
pub struct CircuitDag {
    /// The underlying graph.
    graph: DiGraph<DagNode, DagEdge, u32>,
    /// The single source sentinel (conventionally `-1`).
    source: NodeIndex,
    /// The single sink sentinel (conventionally `+inf`).
    sink: NodeIndex,
    /// Qubits in insertion order.
    qubits: Vec<QubitId>,
    /// Classical bits in insertion order.
    clbits: Vec<ClbitId>,
    /// Wire front: maps each wire in use to the node just before the sink.
    /// Updated on every edit that touches the wire, to give O(1)
    /// predecessor lookups instead of edge scanning.
    wire_front: FxHashMap<WireId, NodeIndex>,
    /// Global phase of the circuit.
    global_phase: f64,
    /// Abstraction level of the circuit.
    level: CircuitLevel,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        let mut graph = DiGraph::default();
        let source = graph.add_node(DagNode::Source);
        let sink = graph.add_node(DagNode::Sink);
        Self {
            graph,
            source,
            sink,
            qubits: Vec::new(),
            clbits: Vec::new(),
            wire_front: FxHashMap::default(),
            global_phase: 0.0,
            level: CircuitLevel::Logical,
        }
    }

    /// Add a qubit to the circuit.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        let wire = WireId::Qubit(qubit);
        if self.wire_front.contains_key(&wire) {
            return;
        }
        self.graph.add_edge(self.source, self.sink, DagEdge { wire });
        self.qubits.push(qubit);
        self.wire_front.insert(wire, self.source);
    }

    /// Add a classical bit to the circuit.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        let wire = WireId::Clbit(clbit);
        if self.wire_front.contains_key(&wire) {
            return;
        }
        self.graph.add_edge(self.source, self.sink, DagEdge { wire });
        self.clbits.push(clbit);
        self.wire_front.insert(wire, self.source);
    }

    /// The source sentinel node.
    #[inline]
    pub fn source(&self) -> NodeIndex {
        self.source
    }

    /// The sink sentinel node.
    #[inline]
    pub fn sink(&self) -> NodeIndex {
        self.sink
    }

    /// Find the edge carrying `wire` directly from `from` to `to`, if any.
    fn find_edge_on_wire(
        &self,
        from: NodeIndex,
        to: NodeIndex,
        wire: WireId,
    ) -> Option<petgraph::graph::EdgeIndex<u32>> {
        self.graph
            .edges_directed(from, Direction::Outgoing)
            .find(|e| e.weight().wire == wire && e.target() == to)
            .map(|e| e.id())
    }

    /// Splice `node` onto `wire` between `prev` and the wire's current
    /// sink-facing front, removing the direct edge between them.
    fn splice_on_wire(&mut self, prev: NodeIndex, node: NodeIndex, wire: WireId) -> IrResult<()> {
        let next = self
            .graph
            .edges_directed(prev, Direction::Outgoing)
            .find(|e| e.weight().wire == wire)
            .map(|e| e.target())
            .ok_or_else(|| {
                IrError::InvalidDag(format!("no outgoing edge for wire {wire:?} from {prev:?}"))
            })?;
        let eid = self.find_edge_on_wire(prev, next, wire).ok_or_else(|| {
            IrError::InvalidDag(format!("missing direct edge for wire {wire:?}"))
        })?;
        self.graph.remove_edge(eid);
        self.graph.add_edge(prev, node, DagEdge { wire });
        self.graph.add_edge(node, next, DagEdge { wire });
        Ok(())
    }

    /// Apply an instruction to the circuit, appending it at the current
    /// front of every wire it touches (`add_node_end`).
    #[allow(clippy::needless_pass_by_value, clippy::cast_possible_truncation)]
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        let gate_name = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits() as usize;
            let got = instruction.qubits.len();
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: expected as u32,
                    got: got as u32,
                });
            }
        }

        for &qubit in &instruction.qubits {
            if !self.wire_front.contains_key(&WireId::Qubit(qubit)) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        for &clbit in &instruction.clbits {
            if !self.wire_front.contains_key(&WireId::Clbit(clbit)) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = rustc_hash::FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let op_node = self.graph.add_node(DagNode::Op(instruction.clone()));

        for &qubit in &instruction.qubits {
            let wire = WireId::Qubit(qubit);
            let front = self.wire_front[&wire];
            self.splice_on_wire(front, op_node, wire)?;
            self.wire_front.insert(wire, op_node);
        }

        for &clbit in &instruction.clbits {
            let wire = WireId::Clbit(clbit);
            let front = self.wire_front[&wire];
            self.splice_on_wire(front, op_node, wire)?;
            self.wire_front.insert(wire, op_node);
        }

        Ok(op_node)
    }

    /// Splice `instruction` into the DAG between explicit per-wire
    /// predecessor and successor nodes (`add_node_between`).
    ///
    /// `preds`/`succs` name, for every qubit the instruction touches, the
    /// node that must immediately precede/follow it on that wire. Any
    /// existing direct edge between the two is removed and rerouted
    /// through the new node.
    #[allow(clippy::needless_pass_by_value, clippy::cast_possible_truncation)]
    pub fn add_node_between(
        &mut self,
        instruction: Instruction,
        preds: &FxHashMap<QubitId, NodeIndex>,
        succs: &FxHashMap<QubitId, NodeIndex>,
    ) -> IrResult<NodeIndex> {
        let gate_name = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits() as usize;
            let got = instruction.qubits.len();
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: expected as u32,
                    got: got as u32,
                });
            }
        }

        for &qubit in &instruction.qubits {
            if !self.wire_front.contains_key(&WireId::Qubit(qubit)) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
            if !preds.contains_key(&qubit) || !succs.contains_key(&qubit) {
                return Err(IrError::InvalidDag(format!(
                    "add_node_between: missing predecessor/successor for qubit {qubit:?}"
                )));
            }
        }

        let op_node = self.graph.add_node(DagNode::Op(instruction.clone()));

        for &qubit in &instruction.qubits {
            let wire = WireId::Qubit(qubit);
            let pred = preds[&qubit];
            let succ = succs[&qubit];
            let eid = self.find_edge_on_wire(pred, succ, wire).ok_or_else(|| {
                IrError::InvalidDag(format!(
                    "add_node_between: no direct edge from {pred:?} to {succ:?} on wire {wire:?}"
                ))
            })?;
            self.graph.remove_edge(eid);
            self.graph.add_edge(pred, op_node, DagEdge { wire });
            self.graph.add_edge(op_node, succ, DagEdge { wire });
            if self.wire_front.get(&wire) == Some(&pred) {
                self.wire_front.insert(wire, op_node);
            }
        }

        Ok(op_node)
    }

    /// Iterate over operations in topological order.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        let sorted: Vec<_> = petgraph::algo::toposort(&self.graph, None)
            .expect("DAG must be acyclic — cycle detected in circuit graph")
            .into_iter()
            .filter_map(|idx| {
                if let DagNode::Op(inst) = &self.graph[idx] {
                    Some((idx, inst))
                } else {
                    None
                }
            })
            .collect();

        sorted.into_iter()
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(|n| n.instruction())
    }

    /// Get a mutable instruction by node index.
    #[inline]
    pub fn get_instruction_mut(&mut self, node: NodeIndex) -> Option<&mut Instruction> {
        self.graph
            .node_weight_mut(node)
            .and_then(|n| n.instruction_mut())
    }

    /// For each qubit/clbit wire `node` touches, the node immediately
    /// preceding it on that wire.
    pub fn node_predecessors(&self, node: NodeIndex) -> FxHashMap<WireId, NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.weight().wire, e.source()))
            .collect()
    }

    /// For each qubit/clbit wire `node` touches, the node immediately
    /// following it on that wire.
    pub fn node_successors(&self, node: NodeIndex) -> FxHashMap<WireId, NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.weight().wire, e.target()))
            .collect()
    }

    /// Remove an operation node from the DAG, restitching its wires
    /// (`remove_node`).
    pub fn remove_op(&mut self, node: NodeIndex) -> IrResult<Instruction> {
        let dag_node = self
            .graph
            .node_weight(node)
            .ok_or(IrError::InvalidNode)?
            .clone();

        let DagNode::Op(instruction) = dag_node else {
            return Err(IrError::InvalidDag(
                "Cannot remove non-operation node".into(),
            ));
        };

        let incoming: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.source(), e.weight().wire))
            .collect();

        let outgoing: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.target(), e.weight().wire))
            .collect();

        // WARNING: petgraph's `remove_node` swaps the removed node with the last
        // node in the graph, invalidating the last node's `NodeIndex`. Callers must
        // not hold stale `NodeIndex` references after calling `remove_op`. If you
        // are removing multiple nodes, iterate in reverse topological order or
        // re-fetch indices after each removal.
        let last_idx = NodeIndex::new(self.graph.node_count() - 1);

        for (pred, wire) in &incoming {
            if self.wire_front.get(wire) == Some(&node) {
                self.wire_front.insert(*wire, *pred);
            }
        }

        self.graph.remove_node(node);

        let fix = |idx: NodeIndex| -> NodeIndex {
            if last_idx != node && idx == last_idx {
                node
            } else {
                idx
            }
        };

        if last_idx != node {
            if self.source == last_idx {
                self.source = node;
            }
            if self.sink == last_idx {
                self.sink = node;
            }
            for v in self.wire_front.values_mut() {
                if *v == last_idx {
                    *v = node;
                }
            }
        }

        for (pred, wire) in &incoming {
            let pred = fix(*pred);
            for (succ, succ_wire) in &outgoing {
                let succ = fix(*succ);
                if wire == succ_wire {
                    self.graph.add_edge(pred, succ, DagEdge { wire: *wire });
                }
            }
        }

        Ok(instruction)
    }

    /// Replace `node` with the contents of `sub`, a self-contained DAG
    /// (`substitute_node_with_dag`).
    ///
    /// `sub`'s set of qubit wires must equal `node`'s instruction's qubit
    /// positions. `sub`'s source is replaced by `node`'s predecessors and
    /// `sub`'s sink by `node`'s successors; `sub`'s operation nodes and
    /// internal edges are moved into `self`. Returns the new node indices,
    /// in `sub`'s topological order, mapped into `self`'s index space.
    pub fn substitute_node_with_dag(
        &mut self,
        node: NodeIndex,
        sub: CircuitDag,
    ) -> IrResult<Vec<NodeIndex>> {
        let instruction = self
            .graph
            .node_weight(node)
            .ok_or(IrError::InvalidNode)?
            .instruction()
            .ok_or_else(|| IrError::InvalidDag("substitute_node_with_dag: not an op node".into()))?
            .clone();

        let mut node_qubits: Vec<QubitId> = instruction.qubits.clone();
        node_qubits.sort();
        let mut sub_qubits = sub.qubits.clone();
        sub_qubits.sort();
        if node_qubits != sub_qubits {
            return Err(IrError::WireMismatch {
                expected: node_qubits.into_iter().map(WireId::Qubit).collect(),
                got: sub_qubits.into_iter().map(WireId::Qubit).collect(),
            });
        }

        let mut preds = self.node_predecessors(node);
        let mut succs = self.node_successors(node);

        // `remove_op` swap-removes `node`, which can move the graph's last
        // node into `node`'s slot and invalidate any index pointing at it.
        // Remap our captured predecessor/successor indices the same way.
        let last_idx = NodeIndex::new(self.graph.node_count() - 1);
        self.remove_op(node)?;
        if last_idx != node {
            for v in preds.values_mut().chain(succs.values_mut()) {
                if *v == last_idx {
                    *v = node;
                }
            }
        }

        let phase = self.splice_sub_dag(&sub, &preds, &succs)?;
        self.global_phase = normalize_phase(self.global_phase + phase);

        Ok(self.imported_op_nodes(&sub))
    }

    /// Concatenate `other` onto `self`, wiring `other`'s wires onto the
    /// current front of the matching wire in `self` (creating the wire in
    /// `self` first if it is new).
    ///
    /// The two DAGs' instruction-label spaces must be disjoint: a shared
    /// label means one instruction value was cloned into both graphs, and
    /// merging the alias would make label-based bookkeeping ambiguous.
    /// Labels come from a process-wide counter, so independently built
    /// instructions never collide; only explicit clones do.
    pub fn merge(&mut self, other: CircuitDag) -> IrResult<()> {
        let own_labels: rustc_hash::FxHashSet<u64> = self
            .graph
            .node_weights()
            .filter_map(DagNode::instruction)
            .map(|inst| inst.label)
            .collect();
        for inst in other.graph.node_weights().filter_map(DagNode::instruction) {
            if own_labels.contains(&inst.label) {
                return Err(IrError::LabelCollision { label: inst.label });
            }
        }

        let mut wires: Vec<WireId> = other.wire_front.keys().copied().collect();
        wires.sort();

        for wire in &wires {
            match *wire {
                WireId::Qubit(q) => self.add_qubit(q),
                WireId::Clbit(c) => self.add_clbit(c),
            }
        }

        let mut preds = FxHashMap::default();
        let mut succs = FxHashMap::default();
        for &wire in &wires {
            let front = self.wire_front[&wire];
            // self's front->sink edge on this wire is the splice point.
            let next = self
                .graph
                .edges_directed(front, Direction::Outgoing)
                .find(|e| e.weight().wire == wire)
                .map(|e| e.target())
                .ok_or_else(|| {
                    IrError::InvalidDag(format!("merge: broken wire {wire:?} in self"))
                })?;
            preds.insert(wire, front);
            succs.insert(wire, next);
        }

        let phase = self.splice_sub_dag(&other, &preds, &succs)?;
        self.global_phase = normalize_phase(self.global_phase + phase);
        Ok(())
    }

    /// Shared splicing engine for `substitute_node_with_dag` and `merge`:
    /// imports `sub`'s operation nodes/edges into `self` and reconnects
    /// the given per-wire predecessor/successor onto them.
    fn splice_sub_dag(
        &mut self,
        sub: &CircuitDag,
        preds: &FxHashMap<WireId, NodeIndex>,
        succs: &FxHashMap<WireId, NodeIndex>,
    ) -> IrResult<f64> {
        let mut index_map: FxHashMap<NodeIndex, NodeIndex> = FxHashMap::default();
        for idx in sub.graph.node_indices() {
            if let DagNode::Op(inst) = &sub.graph[idx] {
                let new_idx = self.graph.add_node(DagNode::Op(inst.clone()));
                index_map.insert(idx, new_idx);
            }
        }

        for edge in sub.graph.edge_references() {
            let (src, dst) = (edge.source(), edge.target());
            let wire = edge.weight().wire;
            let src_mapped = index_map.get(&src).copied();
            let dst_mapped = index_map.get(&dst).copied();
            match (src_mapped, dst_mapped) {
                (Some(s), Some(d)) => {
                    self.graph.add_edge(s, d, DagEdge { wire });
                }
                (Some(s), None) if dst == sub.sink => {
                    let exit = succs.get(&wire).copied().ok_or_else(|| {
                        IrError::InvalidDag(format!("splice: no successor for wire {wire:?}"))
                    })?;
                    self.graph.add_edge(s, exit, DagEdge { wire });
                }
                (None, Some(d)) if src == sub.source => {
                    let entry = preds.get(&wire).copied().ok_or_else(|| {
                        IrError::InvalidDag(format!("splice: no predecessor for wire {wire:?}"))
                    })?;
                    self.graph.add_edge(entry, d, DagEdge { wire });
                }
                (None, None) if src == sub.source && dst == sub.sink => {
                    // Pass-through wire: sub has no ops on it.
                    let entry = preds.get(&wire).copied().ok_or_else(|| {
                        IrError::InvalidDag(format!("splice: no predecessor for wire {wire:?}"))
                    })?;
                    let exit = succs.get(&wire).copied().ok_or_else(|| {
                        IrError::InvalidDag(format!("splice: no successor for wire {wire:?}"))
                    })?;
                    self.graph.add_edge(entry, exit, DagEdge { wire });
                }
                _ => {
                    return Err(IrError::InvalidDag(
                        "splice: malformed sub-DAG edge".into(),
                    ));
                }
            }
        }

        // Remove the old direct edges the splice points replaced.
        for (&wire, &pred) in preds {
            if let Some(succ) = succs.get(&wire) {
                if let Some(eid) = self.find_edge_on_wire(pred, *succ, wire) {
                    self.graph.remove_edge(eid);
                }
            }
        }

        // Recompute wire_front for every wire in succs that feeds self.sink
        // directly, by walking back from the successor.
        for (&wire, &succ) in succs {
            if succ == self.sink {
                if let Some(new_front) = self
                    .graph
                    .edges_directed(self.sink, Direction::Incoming)
                    .find(|e| e.weight().wire == wire)
                    .map(|e| e.source())
                {
                    self.wire_front.insert(wire, new_front);
                }
            }
        }

        Ok(sub.global_phase)
    }

    /// Node indices imported from `sub` by the most recent splice, in
    /// `sub`'s own topological order but re-expressed in `self`'s index
    /// space. Recomputed by re-deriving from `sub`'s instructions, since
    /// the splice does not keep the index map around after returning.
    fn imported_op_nodes(&self, sub: &CircuitDag) -> Vec<NodeIndex> {
        // The imported nodes are exactly the last `sub`'s op-node-count
        // entries added to self.graph, in insertion order, which matches
        // sub's own node_indices order (iterated during splice_sub_dag).
        let sub_op_count = sub
            .graph
            .node_indices()
            .filter(|&idx| matches!(&sub.graph[idx], DagNode::Op(_)))
            .count();
        let total = self.graph.node_count();
        ((total - sub_op_count)..total)
            .map(NodeIndex::new)
            .collect()
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.graph.node_count().saturating_sub(2)
    }

    /// Calculate the circuit depth.
    pub fn depth(&self) -> usize {
        let node_count = self.graph.node_count();
        let mut depths: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(node_count, Default::default());

        let mut max_depth = 0usize;

        for node in petgraph::algo::toposort(&self.graph, None)
            .expect("DAG must be acyclic — cycle detected in circuit graph")
        {
            let max_pred_depth = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| depths.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);

            let node_depth = if matches!(self.graph[node], DagNode::Op(_)) {
                max_pred_depth + 1
            } else {
                max_pred_depth
            };

            if node_depth > max_depth {
                max_depth = node_depth;
            }
            depths.insert(node, node_depth);
        }

        max_depth
    }

    /// Iterate over qubits, in insertion order.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.qubits.iter().copied()
    }

    /// Iterate over classical bits, in insertion order.
    pub fn clbits(&self) -> impl Iterator<Item = ClbitId> + '_ {
        self.clbits.iter().copied()
    }

    /// Get every measurement node in the DAG, in topological order.
    pub fn get_measure_nodes(&self) -> Vec<NodeIndex> {
        self.topological_ops()
            .filter(|(_, inst)| inst.is_measure())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Remove measurement nodes from the DAG.
    ///
    /// If `only_last` is set, only removes a qubit's measurement if it is
    /// the final operation on that wire (i.e. nothing reads the classical
    /// result afterwards within the DAG); otherwise every measurement node
    /// is removed.
    pub fn remove_measure_nodes(&mut self, only_last: bool) -> IrResult<()> {
        let mut candidates = self.get_measure_nodes();
        if only_last {
            candidates.retain(|&idx| {
                self.node_successors(idx)
                    .values()
                    .all(|&succ| succ == self.sink)
            });
        }
        // Remove in reverse topological order so a swap-remove never
        // invalidates an index we still need to process.
        candidates.sort_by_key(|idx| std::cmp::Reverse(idx.index()));
        for idx in candidates {
            self.remove_op(idx)?;
        }
        Ok(())
    }

    /// Get the global phase.
    pub fn global_phase(&self) -> f64 {
        self.global_phase
    }

    /// Set the global phase.
    pub fn set_global_phase(&mut self, phase: f64) {
        self.global_phase = phase;
    }

    /// Get the abstraction level of this circuit.
    pub fn level(&self) -> CircuitLevel {
        self.level
    }

    /// Set the abstraction level of this circuit.
    pub fn set_level(&mut self, level: CircuitLevel) {
        self.level = level;
    }

    /// Get a reference to the underlying graph.
    pub fn graph(&self) -> &DiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that:
    /// - The graph is acyclic (I1)
    /// - The source has no incoming edges and the sink has no outgoing
    ///   edges (I2)
    /// - Every wire in use forms a single unbroken path from source to
    ///   sink (I3)
    /// - All nodes are reachable, i.e. no orphaned operation nodes (I4)
    #[allow(clippy::too_many_lines)]
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        if self.graph.edges_directed(self.source, Direction::Incoming).next().is_some() {
            return Err(IrError::InvalidDag(
                "Source node has incoming edges".into(),
            ));
        }
        if self.graph.edges_directed(self.sink, Direction::Outgoing).next().is_some() {
            return Err(IrError::InvalidDag("Sink node has outgoing edges".into()));
        }

        let wires: Vec<WireId> = self
            .qubits
            .iter()
            .copied()
            .map(WireId::Qubit)
            .chain(self.clbits.iter().copied().map(WireId::Clbit))
            .collect();

        for wire in wires {
            let mut current = self.source;
            let mut steps = 0;
            let max_steps = self.graph.node_count();

            loop {
                if current == self.sink {
                    break;
                }

                let next = self
                    .graph
                    .edges_directed(current, Direction::Outgoing)
                    .find(|e| e.weight().wire == wire)
                    .map(|e| e.target());

                match next {
                    Some(n) => current = n,
                    None => {
                        return Err(IrError::InvalidDag(format!(
                            "Wire {wire:?} is broken: no outgoing edge from node {current:?}"
                        )));
                    }
                }

                steps += 1;
                if steps > max_steps {
                    return Err(IrError::InvalidDag(format!(
                        "Wire {wire:?} has too many steps (possible infinite loop)"
                    )));
                }
            }
        }

        let topo_nodes = petgraph::algo::toposort(&self.graph, None).unwrap_or_default();
        let node_count = self.graph.node_count();
        if topo_nodes.len() != node_count {
            return Err(IrError::InvalidDag(
                "Unreachable operation node found in DAG".into(),
            ));
        }

        Ok(())
    }
}

fn normalize_phase(phase: f64) -> f64 {
    phase.rem_euclid(2.0 * std::f64::consts::PI)
}

impl Default for CircuitDag {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CircuitDag {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            source: self.source,
            sink: self.sink,
            qubits: self.qubits.clone(),
            clbits: self.clbits.clone(),
            wire_front: self.wire_front.clone(),
            global_phase: self.global_phase,
            level: self.level,
        }
    }
}
