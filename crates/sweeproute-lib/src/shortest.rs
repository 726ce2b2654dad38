use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use crate::graph::{NodeId, StreetGraph};

/// Single-source shortest-path tree over a street graph.
///
/// Produced by [`shortest_path_tree`]; holds final distances and parent
/// pointers for every reachable node so that callers can reconstruct paths
/// to many targets from one Dijkstra run.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    start: NodeId,
    distances: BTreeMap<NodeId, f64>,
    parents: BTreeMap<NodeId, NodeId>,
}

impl ShortestPathTree {
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// Shortest-path distance from the source, if reachable.
    pub fn distance_to(&self, goal: NodeId) -> Option<f64> {
        self.distances.get(&goal).copied()
    }

    /// Reconstruct the node sequence `[start, .., goal]`, if reachable.
    pub fn path_to(&self, goal: NodeId) -> Option<Vec<NodeId>> {
        if !self.distances.contains_key(&goal) {
            return None;
        }
        let mut path = vec![goal];
        let mut current = goal;
        while current != self.start {
            current = *self.parents.get(&current)?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }
}

/// Run Dijkstra's algorithm from `start` over the whole graph.
///
/// Edge multiplicity is irrelevant here: a duplicated segment is no shorter
/// than the original. Ties are broken by ascending node id so the tree is
/// deterministic for a fixed input.
pub fn shortest_path_tree(graph: &StreetGraph, start: NodeId) -> ShortestPathTree {
    let mut distances: BTreeMap<NodeId, f64> = BTreeMap::new();
    let mut parents: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    let mut queue = BinaryHeap::new();

    distances.insert(start, 0.0);
    queue.push(QueueEntry::new(start, 0.0));

    while let Some(entry) = queue.pop() {
        let settled = match distances.get(&entry.node) {
            Some(distance) if *distance < entry.cost.0 => continue,
            Some(distance) => *distance,
            None => continue,
        };

        for (next, weight) in graph.neighbours(entry.node) {
            let next_cost = settled + weight;
            if next_cost < *distances.get(&next).unwrap_or(&f64::INFINITY) {
                distances.insert(next, next_cost);
                parents.insert(next, entry.node);
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    ShortestPathTree {
        start,
        distances,
        parents,
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeId,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: NodeId, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn coord(i: u64) -> Coordinate {
        Coordinate::new(i as f64 * 0.001, 0.0)
    }

    fn diamond() -> StreetGraph {
        // 0-1 is long; 0-2-1 is the short way around.
        let mut graph = StreetGraph::new();
        for id in 0..4 {
            graph.insert_node(id, coord(id));
        }
        graph.insert_edge(0, 1, 500.0).unwrap();
        graph.insert_edge(0, 2, 100.0).unwrap();
        graph.insert_edge(2, 1, 100.0).unwrap();
        graph.insert_edge(1, 3, 100.0).unwrap();
        graph
    }

    #[test]
    fn prefers_cheaper_detour() {
        let tree = shortest_path_tree(&diamond(), 0);
        assert_eq!(tree.distance_to(1), Some(200.0));
        assert_eq!(tree.path_to(1), Some(vec![0, 2, 1]));
    }

    #[test]
    fn distances_compose_along_tree() {
        let tree = shortest_path_tree(&diamond(), 0);
        assert_eq!(tree.distance_to(3), Some(300.0));
        assert_eq!(tree.path_to(3), Some(vec![0, 2, 1, 3]));
    }

    #[test]
    fn unreachable_node_is_none() {
        let mut graph = diamond();
        graph.insert_node(9, coord(9));
        let tree = shortest_path_tree(&graph, 0);
        assert_eq!(tree.distance_to(9), None);
        assert_eq!(tree.path_to(9), None);
    }

    #[test]
    fn start_node_is_trivial_path() {
        let tree = shortest_path_tree(&diamond(), 2);
        assert_eq!(tree.distance_to(2), Some(0.0));
        assert_eq!(tree.path_to(2), Some(vec![2]));
    }
}
