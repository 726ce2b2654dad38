use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// Opaque, graph-local node identifier.
pub type NodeId = u64;

/// Undirected weighted edge record. Multiplicity starts at 1 and is only
/// incremented during Eulerian augmentation; parallel edges never exist in a
/// freshly built graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRecord {
    /// Segment length in meters.
    pub weight: f64,
    /// Number of times the segment must be traversed.
    pub multiplicity: u32,
}

/// In-memory representation of a drivable street network.
///
/// Nodes are intersections with WGS84 coordinates; edges are street segments
/// weighted by their length in meters. Storage is ordered (`BTreeMap`) so
/// that every traversal of the graph is deterministic for a fixed input,
/// which the solvers rely on for reproducible tie-breaking.
#[derive(Debug, Clone, Default)]
pub struct StreetGraph {
    nodes: BTreeMap<NodeId, Coordinate>,
    edges: BTreeMap<(NodeId, NodeId), EdgeRecord>,
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

pub(crate) fn edge_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl StreetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a node.
    pub fn insert_node(&mut self, id: NodeId, coord: Coordinate) {
        self.nodes.insert(id, coord);
        self.adjacency.entry(id).or_default();
    }

    /// Insert an undirected edge between two existing nodes.
    ///
    /// Self-loops are rejected. Inserting an edge that already exists keeps
    /// the smaller weight; the street source can report the same segment
    /// from both directions.
    pub fn insert_edge(&mut self, a: NodeId, b: NodeId, weight: f64) -> Result<()> {
        if a == b {
            return Err(Error::InvalidGraphDocument {
                message: format!("self-loop on node {a}"),
            });
        }
        if !self.nodes.contains_key(&a) || !self.nodes.contains_key(&b) {
            return Err(Error::InvalidGraphDocument {
                message: format!("edge {a}-{b} references a missing node"),
            });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidGraphDocument {
                message: format!("edge {a}-{b} has invalid weight {weight}"),
            });
        }

        let record = self.edges.entry(edge_key(a, b)).or_insert(EdgeRecord {
            weight,
            multiplicity: 1,
        });
        if weight < record.weight {
            record.weight = weight;
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        Ok(())
    }

    /// Duplicate an existing edge, incrementing its multiplicity.
    ///
    /// Used by the edge-cover solver while augmenting the graph to all-even
    /// degree.
    pub fn duplicate_edge(&mut self, a: NodeId, b: NodeId) -> Result<()> {
        match self.edges.get_mut(&edge_key(a, b)) {
            Some(record) => {
                record.multiplicity += 1;
                Ok(())
            }
            None => Err(Error::SolverInvariant {
                message: format!("attempted to duplicate missing edge {a}-{b}"),
            }),
        }
    }

    /// Remove a node and all of its incident edges.
    pub fn remove_node(&mut self, id: NodeId) {
        if self.nodes.remove(&id).is_none() {
            return;
        }
        if let Some(neighbours) = self.adjacency.remove(&id) {
            for neighbour in neighbours {
                self.edges.remove(&edge_key(id, neighbour));
                if let Some(back) = self.adjacency.get_mut(&neighbour) {
                    back.remove(&id);
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct edges (multiplicity not counted).
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn coordinate(&self, id: NodeId) -> Option<Coordinate> {
        self.nodes.get(&id).copied()
    }

    /// Iterate node identifiers in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Iterate edges as `(a, b, record)` with `a < b`, in ascending key order.
    pub fn edge_records(&self) -> impl Iterator<Item = (NodeId, NodeId, EdgeRecord)> + '_ {
        self.edges.iter().map(|(&(a, b), &record)| (a, b, record))
    }

    /// Distinct neighbours of a node with the edge weight, in ascending order.
    pub fn neighbours(&self, id: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&other| {
                let record = self.edges[&edge_key(id, other)];
                (other, record.weight)
            })
    }

    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.edges.get(&edge_key(a, b)).map(|record| record.weight)
    }

    pub fn multiplicity(&self, a: NodeId, b: NodeId) -> u32 {
        self.edges
            .get(&edge_key(a, b))
            .map(|record| record.multiplicity)
            .unwrap_or(0)
    }

    /// Node degree, counting edge multiplicity.
    pub fn degree(&self, id: NodeId) -> u32 {
        self.adjacency
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&other| self.multiplicity(id, other))
            .sum()
    }

    /// Smallest degree over all nodes, or `None` for an empty graph.
    pub fn min_degree(&self) -> Option<u32> {
        self.nodes.keys().map(|&id| self.degree(id)).min()
    }

    /// Nodes with odd degree, in ascending order.
    pub fn odd_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .keys()
            .copied()
            .filter(|&id| self.degree(id) % 2 == 1)
            .collect()
    }

    /// Sum of edge weights ignoring multiplicity.
    pub fn base_weight(&self) -> f64 {
        self.edges.values().map(|record| record.weight).sum()
    }

    /// Sum of edge weights counting multiplicity.
    pub fn total_weight(&self) -> f64 {
        self.edges
            .values()
            .map(|record| record.weight * f64::from(record.multiplicity))
            .sum()
    }

    /// Number of connected components (isolated nodes each count as one).
    pub fn component_count(&self) -> usize {
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut components = 0;
        for &start in self.nodes.keys() {
            if seen.contains(&start) {
                continue;
            }
            components += 1;
            let mut queue = VecDeque::from([start]);
            seen.insert(start);
            while let Some(current) = queue.pop_front() {
                for (next, _) in self.neighbours(current) {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        components
    }

    /// Restrict the graph to its largest connected component, breaking size
    /// ties by smallest contained node id. Street sources use this to drop
    /// fragments that are unreachable from the main network.
    pub fn largest_component(&self) -> StreetGraph {
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut best: Vec<NodeId> = Vec::new();
        for &start in self.nodes.keys() {
            if seen.contains(&start) {
                continue;
            }
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            seen.insert(start);
            while let Some(current) = queue.pop_front() {
                for (next, _) in self.neighbours(current) {
                    if seen.insert(next) {
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }
            if component.len() > best.len() {
                best = component;
            }
        }

        let keep: BTreeSet<NodeId> = best.into_iter().collect();
        let mut component = StreetGraph::new();
        for (&id, &coord) in &self.nodes {
            if keep.contains(&id) {
                component.insert_node(id, coord);
            }
        }
        for (&(a, b), record) in &self.edges {
            if keep.contains(&a) && keep.contains(&b) {
                component.edges.insert((a, b), *record);
                component.adjacency.entry(a).or_default().insert(b);
                component.adjacency.entry(b).or_default().insert(a);
            }
        }
        component
    }

    /// Solver precondition: the graph must be one connected component.
    pub fn ensure_connected(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::DegenerateGraph);
        }
        let components = self.component_count();
        if components != 1 {
            return Err(Error::NotConnected { components });
        }
        Ok(())
    }
}
