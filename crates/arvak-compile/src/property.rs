//! `PropertySet` and related types for pass communication.
//!
//! This module provides the [`PropertySet`] type, which enables compilation passes
//! to share data with each other. It contains both standard properties (layout,
//! coupling map, basis gates) and supports arbitrary custom properties.
//!
//! # Overview
//!
//! During quantum circuit compilation, multiple passes need to share information:
//! - **Layout pass** determines which logical qubits map to which physical qubits
//! - **Routing pass** uses the coupling map to insert SWAP gates
//! - **Translation pass** uses basis gates to decompose unsupported gates
//!
//! The `PropertySet` acts as a shared context passed through all compilation passes.
//!
//! # Examples
//!
//! ## Basic usage with target configuration
//!
//! ```
//! use arvak_compile::{PropertySet, CouplingMap, BasisGates};
//!
//! // Create a property set for an IQM backend
//! let props = PropertySet::new()
//!     .with_target(
//!         CouplingMap::linear(5),  // 5-qubit linear chain
//!         BasisGates::iqm(),       // PRX + CZ native gates
//!     );
//!
//! assert!(props.coupling_map.is_some());
//! assert!(props.basis_gates.as_ref().unwrap().contains("prx"));
//! ```
//!
//! ## Using the `PassManager` with `PropertySet`
//!
//! ```
//! use arvak_compile::{PassManagerBuilder, CouplingMap, BasisGates};
//!
//! let (pass_manager, props) = PassManagerBuilder::new()
//!     .with_optimization_level(2)
//!     .with_target(CouplingMap::star(5), BasisGates::ibm())
//!     .build();
//!
//! // The pass manager is now configured with the target properties
//! assert!(!pass_manager.is_empty());
//! ```
//!
//! ## Custom properties for pass communication
//!
//! ```
//! use arvak_compile::PropertySet;
//!
//! // Define a custom property type
//! #[derive(Debug, Clone, PartialEq)]
//! struct OptimizationStats {
//!     gates_removed: usize,
//!     depth_reduction: usize,
//! }
//!
//! let mut props = PropertySet::new();
//!
//! // Insert custom property
//! props.insert(OptimizationStats {
//!     gates_removed: 15,
//!     depth_reduction: 3,
//! });
//!
//! // Retrieve it later
//! let stats = props.get::<OptimizationStats>().unwrap();
//! assert_eq!(stats.gates_removed, 15);
//! ```

use rand::seq::SliceRandom;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};

use arvak_ir::QubitId;

/// A mapping from logical qubits to physical qubits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    /// Map from logical qubit to physical qubit index.
    logical_to_physical: FxHashMap<QubitId, u32>,
    /// Map from physical qubit index to logical qubit.
    physical_to_logical: FxHashMap<u32, QubitId>,
}

impl Layout {
    /// Create a new empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trivial layout (logical qubit i -> physical qubit i).
    pub fn trivial(num_qubits: u32) -> Self {
        let mut layout = Self::new();
        for i in 0..num_qubits {
            layout.add(QubitId(i), i);
        }
        layout
    }

    /// Create a uniformly random injection from `num_virtual` logical
    /// qubits into `num_physical` physical qubits (`num_physical >=
    /// num_virtual`). Physical qubits not chosen are left unmapped.
    pub fn random(num_virtual: u32, num_physical: u32, rng: &mut impl rand::Rng) -> Self {
        let mut physical: Vec<u32> = (0..num_physical).collect();
        physical.shuffle(rng);

        let mut layout = Self::new();
        for (i, &p) in physical.iter().take(num_virtual as usize).enumerate() {
            layout.add(QubitId(i as u32), p);
        }
        layout
    }

    /// Add a mapping from logical to physical qubit.
    ///
    /// If the physical qubit is already mapped to a different logical qubit,
    /// the old mapping is removed first to keep both maps consistent.
    /// Similarly, if the logical qubit is already mapped to a different physical
    /// qubit, that old physical mapping is removed.
    pub fn add(&mut self, logical: QubitId, physical: u32) {
        // Remove conflicting physical → logical mapping if it exists.
        if let Some(&old_logical) = self.physical_to_logical.get(&physical) {
            if old_logical != logical {
                self.logical_to_physical.remove(&old_logical);
            }
        }
        // Remove conflicting logical → physical mapping if it exists.
        if let Some(&old_physical) = self.logical_to_physical.get(&logical) {
            if old_physical != physical {
                self.physical_to_logical.remove(&old_physical);
            }
        }
        self.logical_to_physical.insert(logical, physical);
        self.physical_to_logical.insert(physical, logical);
    }

    /// Get the physical qubit for a logical qubit.
    pub fn get_physical(&self, logical: QubitId) -> Option<u32> {
        self.logical_to_physical.get(&logical).copied()
    }

    /// Get the logical qubit for a physical qubit.
    pub fn get_logical(&self, physical: u32) -> Option<QubitId> {
        self.physical_to_logical.get(&physical).copied()
    }

    /// Swap two physical qubits in the layout.
    pub fn swap(&mut self, p1: u32, p2: u32) {
        let l1 = self.physical_to_logical.get(&p1).copied();
        let l2 = self.physical_to_logical.get(&p2).copied();

        if let Some(l1) = l1 {
            self.logical_to_physical.insert(l1, p2);
            self.physical_to_logical.insert(p2, l1);
        } else {
            self.physical_to_logical.remove(&p2);
        }

        if let Some(l2) = l2 {
            self.logical_to_physical.insert(l2, p1);
            self.physical_to_logical.insert(p1, l2);
        } else {
            self.physical_to_logical.remove(&p1);
        }
    }

    /// Get the number of mapped qubits.
    pub fn len(&self) -> usize {
        self.logical_to_physical.len()
    }

    /// Check if the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.logical_to_physical.is_empty()
    }

    /// Iterate over (logical, physical) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        self.logical_to_physical.iter().map(|(&l, &p)| (l, p))
    }
}

/// Min-heap entry for Dijkstra over `-log(fidelity)` edge weights.
#[derive(Debug, Clone, Copy)]
struct DijkstraState {
    node: u32,
    cost: f64,
}

impl PartialEq for DijkstraState {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for DijkstraState {}

impl PartialOrd for DijkstraState {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DijkstraState {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap; reverse so the lowest cost pops first.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Target device coupling map.
///
/// The coupling map defines which pairs of physical qubits can
/// interact with two-qubit gates.
///
/// ## Performance
///
/// On construction, a distance matrix is precomputed using BFS from each
/// node. This enables O(1) `distance()` lookups and O(distance) path
/// reconstruction during routing, eliminating per-gate BFS.
///
/// ## Fidelity weighting
///
/// Edges may optionally carry a per-edge two-qubit-gate fidelity in `(0,1]`,
/// set via [`add_edge_with_fidelity`](Self::add_edge_with_fidelity) or
/// [`with_fidelity`](Self::with_fidelity). Edges without an explicit value
/// default to fidelity `1.0`. The map is bidirectionalized on precompute: if
/// only `(u,v)` carries a fidelity, `(v,u)` is given the same value. From
/// this, an all-pairs best-path fidelity matrix is derived by running
/// Dijkstra from every vertex on edge weights `w(e) = -log(f(e))` (so higher
/// fidelity is cheaper); the accumulated weight is negated back before being
/// stored, so values closer to `0` mean a higher-fidelity path.
///
/// ## Deserialization
///
/// After deserialization, call [`rebuild_caches()`](Self::rebuild_caches) to
/// recompute the adjacency list and distance/predecessor/fidelity matrices
/// (which are skipped during serialization). Without this call, `distance()`
/// will fall back to per-query BFS, and `shortest_path()` will return `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingMap {
    /// List of connected qubit pairs (bidirectional).
    edges: Vec<(u32, u32)>,
    /// Number of physical qubits.
    num_qubits: u32,
    /// Directed per-edge fidelity overrides. Entries absent here default to
    /// `1.0`. Stored as a flat list (rather than a hash map) so the struct
    /// stays plain-data for serialization.
    edge_fidelity: Vec<(u32, u32, f64)>,
    /// Adjacency list for fast lookup.
    #[serde(skip)]
    adjacency: FxHashMap<u32, Vec<u32>>,
    /// Directed fidelity lookup built from `edge_fidelity`, bidirectionalized.
    #[serde(skip)]
    fidelity: FxHashMap<(u32, u32), f64>,
    /// Precomputed all-pairs distance matrix. `dist_matrix[from][to]` is the
    /// shortest-path distance, or `u32::MAX` if unreachable.
    /// Computed lazily on first access or eagerly via `precompute_distances()`.
    #[serde(skip)]
    dist_matrix: Vec<Vec<u32>>,
    /// Precomputed predecessor matrix for shortest-path reconstruction.
    /// `pred_matrix[from][to]` is the next hop on the shortest path from→to.
    #[serde(skip)]
    pred_matrix: Vec<Vec<u32>>,
    /// Precomputed all-pairs best-path fidelity matrix, `-log` sign
    /// preserved (closer to `0` is better). `f64::NEG_INFINITY` if
    /// unreachable.
    #[serde(skip)]
    fidelity_matrix: Vec<Vec<f64>>,
}

impl CouplingMap {
    /// Symmetrize a raw hardware-description edge list: for every `(u, v,
    /// f)` missing its reverse `(v, u, _)`, add `(v, u, f)`.
    #[must_use]
    pub fn bidirectionalize(edges: &[(u32, u32, f64)]) -> Vec<(u32, u32, f64)> {
        let present: std::collections::HashSet<(u32, u32)> =
            edges.iter().map(|&(u, v, _)| (u, v)).collect();
        let mut out = edges.to_vec();
        for &(u, v, f) in edges {
            if !present.contains(&(v, u)) {
                out.push((v, u, f));
            }
        }
        out
    }

    /// Build a coupling map from a raw hardware description: a list of
    /// `(qubit_a, qubit_b, fidelity)` triples plus the total physical
    /// qubit count.
    ///
    /// Fails on an empty edge list, and on directed input missing an
    /// inverse edge for some pair — run [`bidirectionalize`](Self::bidirectionalize)
    /// over the list first if the description only lists one direction
    /// per connected pair.
    pub fn from_hardware_description(
        num_qubits: u32,
        edges: &[(u32, u32, f64)],
    ) -> crate::error::CompileResult<Self> {
        if edges.is_empty() {
            return Err(crate::error::CompileError::EmptyCouplingMap);
        }
        let present: std::collections::HashSet<(u32, u32)> =
            edges.iter().map(|&(u, v, _)| (u, v)).collect();
        for &(u, v, _) in edges {
            if !present.contains(&(v, u)) {
                return Err(crate::error::CompileError::NonBidirectionalCouplingMap { from: u, to: v });
            }
        }

        let mut map = Self::new(num_qubits);
        for &(u, v, f) in edges {
            map.add_edge_with_fidelity(u, v, f);
        }
        map.rebuild_caches();
        Ok(map)
    }

    /// Create a new coupling map with the given number of qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            edges: vec![],
            num_qubits,
            edge_fidelity: vec![],
            adjacency: FxHashMap::default(),
            fidelity: FxHashMap::default(),
            dist_matrix: vec![],
            pred_matrix: vec![],
            fidelity_matrix: vec![],
        }
    }

    /// Add an edge between two qubits (bidirectional).
    ///
    /// Duplicate edges (including reversed pairs) are silently ignored.
    pub fn add_edge(&mut self, q1: u32, q2: u32) {
        // Check for duplicates in either direction.
        if self
            .edges
            .iter()
            .any(|&(a, b)| (a == q1 && b == q2) || (a == q2 && b == q1))
        {
            return;
        }
        self.edges.push((q1, q2));
        self.adjacency.entry(q1).or_default().push(q2);
        self.adjacency.entry(q2).or_default().push(q1);
    }

    /// Add an edge carrying an explicit two-qubit-gate fidelity in `(0,1]`.
    ///
    /// Call [`rebuild_caches()`](Self::rebuild_caches) (or use a factory
    /// method / [`with_fidelity`](Self::with_fidelity)) afterwards to
    /// recompute the fidelity matrix.
    pub fn add_edge_with_fidelity(&mut self, q1: u32, q2: u32, fidelity: f64) {
        self.add_edge(q1, q2);
        self.edge_fidelity.push((q1, q2, fidelity));
    }

    /// Builder: attach directed per-edge fidelities and recompute derived
    /// matrices. Edges named here must already exist in the map (added via
    /// [`add_edge`](Self::add_edge) or a factory method); this only
    /// overrides their weight.
    #[must_use]
    pub fn with_fidelity(mut self, edges: impl IntoIterator<Item = (u32, u32, f64)>) -> Self {
        self.edge_fidelity.extend(edges);
        self.rebuild_caches();
        self
    }

    /// Two-qubit-gate fidelity of the directed edge `(from, to)`, or `1.0`
    /// if no explicit value was set.
    pub fn fidelity(&self, from: u32, to: u32) -> f64 {
        self.fidelity.get(&(from, to)).copied().unwrap_or(1.0)
    }

    /// Rebuild the directed fidelity lookup from `edge_fidelity`,
    /// bidirectionalizing by copying a forward value onto a missing reverse
    /// edge.
    fn rebuild_fidelity(&mut self) {
        self.fidelity.clear();
        for &(u, v, f) in &self.edge_fidelity {
            self.fidelity.insert((u, v), f);
        }
        for &(u, v) in &self.edges {
            let fwd = self.fidelity.get(&(u, v)).copied();
            let rev = self.fidelity.get(&(v, u)).copied();
            match (fwd, rev) {
                (Some(f), None) => {
                    self.fidelity.insert((v, u), f);
                }
                (None, Some(f)) => {
                    self.fidelity.insert((u, v), f);
                }
                _ => {}
            }
        }
    }

    /// Dijkstra from every vertex on weights `w(e) = -log(f(e))`, storing
    /// the accumulated weight negated back so closer-to-zero means
    /// higher fidelity. Unreachable pairs get `f64::NEG_INFINITY`.
    fn precompute_fidelity_matrix(&mut self) {
        let n = self.num_qubits as usize;
        self.fidelity_matrix = vec![vec![f64::NEG_INFINITY; n]; n];

        for src in 0..n as u32 {
            let mut dist = vec![f64::INFINITY; n];
            dist[src as usize] = 0.0;
            let mut heap = std::collections::BinaryHeap::new();
            heap.push(DijkstraState {
                node: src,
                cost: 0.0,
            });

            while let Some(DijkstraState { node, cost }) = heap.pop() {
                let u = node as usize;
                if cost > dist[u] {
                    continue;
                }
                for &v in self.adjacency.get(&node).into_iter().flatten() {
                    let weight = -self.fidelity(node, v).ln();
                    let next = cost + weight;
                    if next < dist[v as usize] {
                        dist[v as usize] = next;
                        heap.push(DijkstraState {
                            node: v,
                            cost: next,
                        });
                    }
                }
            }

            for (to, &d) in dist.iter().enumerate() {
                self.fidelity_matrix[src as usize][to] = -d;
            }
        }
    }

    /// O(1) lookup of the best-path fidelity between two physical qubits,
    /// `-log` sign preserved (closer to `0` is better). `None` if
    /// unreachable or the matrix has not been precomputed.
    pub fn path_fidelity(&self, from: u32, to: u32) -> Option<f64> {
        if from == to {
            return Some(0.0);
        }
        let (f, t) = (from as usize, to as usize);
        let value = *self.fidelity_matrix.get(f)?.get(t)?;
        if value.is_finite() { Some(value) } else { None }
    }

    /// Precompute all-pairs shortest paths using BFS from each node.
    /// Called automatically by factory methods (linear, star, full, zoned).
    fn precompute_distances(&mut self) {
        let n = self.num_qubits as usize;
        self.dist_matrix = vec![vec![u32::MAX; n]; n];
        self.pred_matrix = vec![vec![u32::MAX; n]; n];

        for src in 0..n {
            self.dist_matrix[src][src] = 0;
            let mut queue = std::collections::VecDeque::new();
            queue.push_back(src as u32);

            while let Some(current) = queue.pop_front() {
                let cur = current as usize;
                for &neighbor in self.adjacency.get(&current).into_iter().flatten() {
                    let nb = neighbor as usize;
                    if self.dist_matrix[src][nb] == u32::MAX {
                        self.dist_matrix[src][nb] = self.dist_matrix[src][cur] + 1;
                        // Predecessor on path from src to nb is current
                        self.pred_matrix[src][nb] = current;
                        queue.push_back(neighbor);
                    }
                }
            }
        }
    }

    /// Rebuild the adjacency list and distance/predecessor matrices from the
    /// edge list. Must be called after deserialization to restore O(1) distance
    /// lookups and shortest-path reconstruction.
    pub fn rebuild_caches(&mut self) {
        self.adjacency.clear();
        for &(q1, q2) in &self.edges {
            self.adjacency.entry(q1).or_default().push(q2);
            self.adjacency.entry(q2).or_default().push(q1);
        }
        self.rebuild_fidelity();
        self.precompute_distances();
        self.precompute_fidelity_matrix();
    }

    /// Check if two qubits are directly connected.
    #[inline]
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        self.adjacency
            .get(&q1)
            .is_some_and(|neighbors| neighbors.contains(&q2))
    }

    /// Get the number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the coupling edges.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Get neighbors of a qubit.
    pub fn neighbors(&self, qubit: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency
            .get(&qubit)
            .map(|v| v.iter().copied())
            .into_iter()
            .flatten()
    }

    /// Create a linear coupling map (0-1-2-3-...).
    pub fn linear(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n.saturating_sub(1) {
            map.add_edge(i, i + 1);
        }
        map.precompute_distances();
        map.precompute_fidelity_matrix();
        map
    }

    /// Create a fully connected coupling map.
    pub fn full(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                map.add_edge(i, j);
            }
        }
        map.precompute_distances();
        map.precompute_fidelity_matrix();
        map
    }

    /// Create a star topology (center qubit connected to all others).
    pub fn star(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 1..n {
            map.add_edge(0, i);
        }
        map.precompute_distances();
        map.precompute_fidelity_matrix();
        map
    }

    /// Create a zoned coupling map for neutral-atom devices.
    ///
    /// Qubits within each zone are fully connected; qubits across zones are
    /// not, so cross-zone interactions have to be routed through SWAPs like
    /// any other non-adjacent pair. With more than one zone the graph is
    /// disconnected and cross-zone routing fails, which models hardware
    /// where zones only interact via physical atom transport.
    pub fn zoned(num_qubits: u32, zones: u32) -> Self {
        let mut map = Self::new(num_qubits);
        let qubits_per_zone = num_qubits / zones.max(1);

        for z in 0..zones {
            let start = z * qubits_per_zone;
            let end = if z == zones - 1 {
                num_qubits
            } else {
                start + qubits_per_zone
            };
            for i in start..end {
                for j in (i + 1)..end {
                    map.add_edge(i, j);
                }
            }
        }

        map.precompute_distances();
        map.precompute_fidelity_matrix();
        map
    }

    /// O(1) shortest-path distance lookup using the precomputed matrix.
    /// Falls back to BFS if the matrix has not been precomputed.
    pub fn distance(&self, from: u32, to: u32) -> Option<u32> {
        if from == to {
            return Some(0);
        }

        let (f, t) = (from as usize, to as usize);
        if f < self.dist_matrix.len() && t < self.dist_matrix[f].len() {
            let d = self.dist_matrix[f][t];
            return if d == u32::MAX { None } else { Some(d) };
        }

        // Fallback BFS (for manually-constructed maps without precompute)
        self.distance_bfs(from, to)
    }

    /// Reconstruct shortest path from→to using the predecessor matrix.
    /// Returns `None` if no path exists.
    pub fn shortest_path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        if from == to {
            return Some(vec![from]);
        }

        let (f, t) = (from as usize, to as usize);
        if f >= self.pred_matrix.len() || t >= self.pred_matrix[f].len() {
            return None;
        }

        if self.dist_matrix[f][t] == u32::MAX {
            return None;
        }

        // Reconstruct from→to using predecessor chain
        let mut path = vec![to];
        let mut current = to;
        while current != from {
            let pred = self.pred_matrix[f][current as usize];
            if pred == u32::MAX {
                return None;
            }
            path.push(pred);
            current = pred;
        }
        path.reverse();
        Some(path)
    }

    /// BFS fallback for distance computation.
    fn distance_bfs(&self, from: u32, to: u32) -> Option<u32> {
        let mut visited = FxHashMap::default();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((from, 0u32));
        visited.insert(from, 0u32);

        while let Some((current, dist)) = queue.pop_front() {
            for &neighbor in self.adjacency.get(&current).into_iter().flatten() {
                if neighbor == to {
                    return Some(dist + 1);
                }
                if let std::collections::hash_map::Entry::Vacant(e) = visited.entry(neighbor) {
                    e.insert(dist + 1);
                    queue.push_back((neighbor, dist + 1));
                }
            }
        }

        None
    }
}

/// Swap-scoring heuristic for [`SabreRouting`](crate::passes::SabreRouting).
///
/// `Distance` only ever sees the unweighted coupling graph; `Fidelity` scores
/// candidate swaps by the best-path fidelity matrix instead; `Mixture` picks
/// the distance-optimal swap set and, if more than one is tied, breaks the
/// tie by fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoutingHeuristic {
    #[default]
    Distance,
    Fidelity,
    Mixture,
}

/// Basis gates for the target device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasisGates {
    /// List of gate names in the basis.
    gates: Vec<String>,
}

impl BasisGates {
    /// Create a new basis gates set.
    pub fn new(gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            gates: gates.into_iter().map(std::convert::Into::into).collect(),
        }
    }

    /// Check if a gate is in the basis.
    ///
    /// Note: This uses linear search over the gate list. For large basis gate
    /// sets, consider using a `HashSet<String>` for O(1) lookups instead.
    pub fn contains(&self, gate: &str) -> bool {
        self.gates.iter().any(|g| g == gate)
    }

    /// Get the basis gates.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }

    /// Create IQM basis gates (PRX + CZ).
    pub fn iqm() -> Self {
        Self::new(["prx", "cz", "measure", "barrier"])
    }

    /// Create IBM basis gates (RZ + SX + X + CX).
    pub fn ibm() -> Self {
        Self::new(["rz", "sx", "x", "cx", "measure", "barrier", "id"])
    }

    /// Create IBM Heron basis gates (RZ + SX + X + CZ).
    pub fn heron() -> Self {
        Self::new([
            "rz", "sx", "x", "cz", "id", "rx", "rzz", "measure", "barrier",
        ])
    }

    /// Create neutral-atom basis gates (RZ + RX + RY + CZ).
    pub fn neutral_atom() -> Self {
        Self::new(["rz", "rx", "ry", "cz", "measure", "barrier"])
    }

    /// Create a universal basis (all standard gates).
    pub fn universal() -> Self {
        Self::new([
            "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz", "p",
            "u", "cx", "cy", "cz", "ch", "swap", "iswap", "crx", "cry", "crz", "cp", "rxx", "ryy",
            "rzz", "ccx", "cswap", "prx", "measure", "reset", "barrier",
        ])
    }
}

/// Properties shared between compilation passes.
///
/// The `PropertySet` allows passes to communicate by storing and retrieving
/// typed values. Standard properties like layout, coupling map, and basis
/// gates have dedicated public fields for convenience.
///
/// # Standard Properties
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `layout` | [`Layout`] | Logical-to-physical qubit mapping |
/// | `coupling_map` | [`CouplingMap`] | Device connectivity graph |
/// | `basis_gates` | [`BasisGates`] | Native gate set for the target |
///
/// # Custom Properties
///
/// Passes can store arbitrary data using the type-safe [`insert`](Self::insert)
/// and [`get`](Self::get) methods. Each type can have at most one value stored.
///
/// # Examples
///
/// ```
/// use arvak_compile::{PropertySet, CouplingMap, BasisGates, Layout};
/// use arvak_ir::QubitId;
///
/// let mut props = PropertySet::new();
///
/// // Set up target device
/// props.coupling_map = Some(CouplingMap::linear(5));
/// props.basis_gates = Some(BasisGates::iqm());
///
/// // Layout is typically set by the layout pass
/// props.layout = Some(Layout::trivial(5));
///
/// // Check connectivity
/// let cm = props.coupling_map.as_ref().unwrap();
/// assert!(cm.is_connected(0, 1));
/// assert!(!cm.is_connected(0, 2));
/// ```
#[derive(Debug)]
pub struct PropertySet {
    /// Qubit layout mapping (logical → physical).
    ///
    /// Set by layout passes, used by routing and translation passes.
    pub layout: Option<Layout>,

    /// Target coupling map defining allowed two-qubit interactions.
    ///
    /// Should be set before running routing passes.
    pub coupling_map: Option<CouplingMap>,

    /// Target basis gates for gate decomposition.
    ///
    /// Should be set before running translation passes.
    pub basis_gates: Option<BasisGates>,

    /// Swap-scoring heuristic for routing passes. Defaults to `Distance`.
    pub routing_heuristic: RoutingHeuristic,

    /// Seeded RNG shared by every pass that needs randomness (random
    /// layout generation, SABRE tie-breaking). Never a thread-local or
    /// global RNG, so a fixed seed makes a full compilation run
    /// reproducible end to end.
    pub rng: rand::rngs::StdRng,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Default for PropertySet {
    fn default() -> Self {
        Self {
            layout: None,
            coupling_map: None,
            basis_gates: None,
            routing_heuristic: RoutingHeuristic::default(),
            rng: rand::SeedableRng::seed_from_u64(0),
            custom: FxHashMap::default(),
        }
    }
}

impl PropertySet {
    /// Create a new empty property set.
    ///
    /// The RNG is seeded deterministically (seed `0`); call
    /// [`with_seed`](Self::with_seed) for a different seed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reseed the shared RNG. Two `PropertySet`s built with the same seed
    /// and run through the same passes produce identical random choices.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = rand::SeedableRng::seed_from_u64(seed);
        self
    }

    /// Create a property set with target configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use arvak_compile::{PropertySet, CouplingMap, BasisGates};
    ///
    /// let props = PropertySet::new()
    ///     .with_target(CouplingMap::linear(5), BasisGates::ibm());
    ///
    /// assert!(props.coupling_map.is_some());
    /// assert!(props.basis_gates.is_some());
    /// ```
    #[must_use]
    pub fn with_target(mut self, coupling_map: CouplingMap, basis_gates: BasisGates) -> Self {
        self.coupling_map = Some(coupling_map);
        self.basis_gates = Some(basis_gates);
        self
    }

    /// Set the layout.
    ///
    /// # Example
    ///
    /// ```
    /// use arvak_compile::{PropertySet, Layout};
    ///
    /// let props = PropertySet::new()
    ///     .with_layout(Layout::trivial(3));
    ///
    /// assert!(props.layout.is_some());
    /// ```
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Select the swap-scoring heuristic used by routing passes.
    #[must_use]
    pub fn with_routing_heuristic(mut self, heuristic: RoutingHeuristic) -> Self {
        self.routing_heuristic = heuristic;
        self
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable custom property.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.custom
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a custom property.
    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}
