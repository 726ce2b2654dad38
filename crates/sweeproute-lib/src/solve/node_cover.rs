//! Approximate-TSP solver: visit every intersection at least once.
//!
//! A minimum spanning tree is doubled in the classic 2-approximation scheme:
//! intersections are visited in MST preorder and consecutive visits are
//! connected by in-graph shortest paths. The 2x bound holds for the metric
//! skeleton only; once the legs are routed over actual streets no global
//! bound is guaranteed.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::unionfind::UnionFind;
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::{NodeId, StreetGraph};
use crate::shortest::shortest_path_tree;
use crate::solve::Route;

pub fn solve(graph: &StreetGraph) -> Result<Route> {
    graph.ensure_connected()?;

    let start = graph.node_ids().next().ok_or(Error::DegenerateGraph)?;
    let mst = minimum_spanning_tree(graph);
    let order = preorder(&mst, start);

    // Route each consecutive visit (and the closing leg) over real streets.
    let mut nodes = vec![start];
    let mut length_m = 0.0;
    let mut stops = order.clone();
    stops.push(start);
    for pair in stops.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if from == to {
            continue;
        }
        let tree = shortest_path_tree(graph, from);
        let path = tree.path_to(to).ok_or_else(|| Error::SolverInvariant {
            message: format!("no path from {from} to {to} in a connected graph"),
        })?;
        for leg in path.windows(2) {
            let weight =
                graph
                    .edge_weight(leg[0], leg[1])
                    .ok_or_else(|| Error::SolverInvariant {
                        message: format!("shortest path uses missing edge {}-{}", leg[0], leg[1]),
                    })?;
            length_m += weight;
            // Overlapping path endpoints would repeat a node; collapse here.
            if nodes.last() != Some(&leg[1]) {
                nodes.push(leg[1]);
            }
        }
    }

    debug!(
        stops = order.len(),
        route_nodes = nodes.len(),
        length_m,
        "solved node-cover route"
    );
    Ok(Route { nodes, length_m })
}

/// Kruskal over edges sorted by (weight, endpoints); ties resolve by node id
/// so the tree is deterministic.
fn minimum_spanning_tree(graph: &StreetGraph) -> BTreeMap<NodeId, BTreeSet<NodeId>> {
    let index_of: BTreeMap<NodeId, usize> = graph
        .node_ids()
        .enumerate()
        .map(|(index, id)| (id, index))
        .collect();

    let mut edges: Vec<(f64, NodeId, NodeId)> = graph
        .edge_records()
        .map(|(a, b, record)| (record.weight, a, b))
        .collect();
    edges.sort_by(|x, y| {
        x.0.total_cmp(&y.0)
            .then_with(|| (x.1, x.2).cmp(&(y.1, y.2)))
    });

    let mut forest = UnionFind::new(index_of.len());
    let mut mst: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
    for (_, a, b) in edges {
        if forest.union(index_of[&a], index_of[&b]) {
            mst.entry(a).or_default().insert(b);
            mst.entry(b).or_default().insert(a);
        }
    }
    mst
}

/// Depth-first preorder from the smallest node id, children in ascending
/// order.
fn preorder(mst: &BTreeMap<NodeId, BTreeSet<NodeId>>, root: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut seen = BTreeSet::from([root]);
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        order.push(current);
        if let Some(children) = mst.get(&current) {
            // Reverse push so the smallest child is visited first.
            for &child in children.iter().rev() {
                if seen.insert(child) {
                    stack.push(child);
                }
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn coord(i: u64) -> Coordinate {
        Coordinate::new(i as f64 * 0.001, 0.0)
    }

    fn square() -> StreetGraph {
        let mut graph = StreetGraph::new();
        for id in 0..4 {
            graph.insert_node(id, coord(id));
        }
        graph.insert_edge(0, 1, 100.0).unwrap();
        graph.insert_edge(1, 2, 100.0).unwrap();
        graph.insert_edge(2, 3, 100.0).unwrap();
        graph.insert_edge(3, 0, 100.0).unwrap();
        graph
    }

    fn assert_visits_all(graph: &StreetGraph, route: &Route) {
        let visited: BTreeSet<NodeId> = route.nodes.iter().copied().collect();
        for id in graph.node_ids() {
            assert!(visited.contains(&id), "node {id} never visited");
        }
    }

    #[test]
    fn square_tour_is_the_cycle() {
        let graph = square();
        let route = solve(&graph).unwrap();
        assert!(route.is_closed());
        assert_visits_all(&graph, &route);
        assert!((route.length_m - 400.0).abs() < 1e-9);
        assert_eq!(route.nodes, vec![0, 1, 2, 3, 0]);
    }

    #[test]
    fn path_graph_doubles_back() {
        let mut graph = StreetGraph::new();
        for id in 0..4 {
            graph.insert_node(id, coord(id));
        }
        graph.insert_edge(0, 1, 100.0).unwrap();
        graph.insert_edge(1, 2, 100.0).unwrap();
        graph.insert_edge(2, 3, 100.0).unwrap();

        let route = solve(&graph).unwrap();
        assert!(route.is_closed());
        assert_visits_all(&graph, &route);
        assert!((route.length_m - 600.0).abs() < 1e-9);
    }

    #[test]
    fn no_immediate_repeats() {
        let mut graph = square();
        graph.insert_node(4, coord(4));
        graph.insert_edge(1, 4, 30.0).unwrap();
        let route = solve(&graph).unwrap();
        for leg in route.nodes.windows(2) {
            assert_ne!(leg[0], leg[1]);
        }
        assert_visits_all(&graph, &route);
    }

    #[test]
    fn disconnected_graph_is_rejected() {
        let mut graph = square();
        graph.insert_node(10, coord(10));
        assert!(matches!(solve(&graph), Err(Error::NotConnected { .. })));
    }

    #[test]
    fn empty_graph_is_rejected() {
        assert!(matches!(
            solve(&StreetGraph::new()),
            Err(Error::DegenerateGraph)
        ));
    }
}
