//! Cross-module solver scenarios on synthetic street grids.

use std::collections::BTreeMap;

use sweeproute_lib::geo::path_length_m;
use sweeproute_lib::sample::sample_waypoints;
use sweeproute_lib::solve::{self, SolverStrategy};
use sweeproute_lib::{prune_dead_ends, Coordinate, NodeId, StreetGraph};

/// Build an n x n grid with 100 m segments; node id = row * n + col.
fn grid(n: u64) -> StreetGraph {
    let mut graph = StreetGraph::new();
    for row in 0..n {
        for col in 0..n {
            let id = row * n + col;
            graph.insert_node(id, Coordinate::new(row as f64 * 0.0009, col as f64 * 0.0009));
        }
    }
    for row in 0..n {
        for col in 0..n {
            let id = row * n + col;
            if col + 1 < n {
                graph.insert_edge(id, id + 1, 100.0).unwrap();
            }
            if row + 1 < n {
                graph.insert_edge(id, id + n, 100.0).unwrap();
            }
        }
    }
    graph
}

fn edge_traversals(nodes: &[NodeId]) -> BTreeMap<(NodeId, NodeId), u32> {
    let mut counts = BTreeMap::new();
    for leg in nodes.windows(2) {
        let key = if leg[0] <= leg[1] {
            (leg[0], leg[1])
        } else {
            (leg[1], leg[0])
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

#[test]
fn three_by_three_grid_edge_cover_is_exactly_optimal() {
    // The 3x3 grid has four odd intersections (the edge midpoints), all at
    // pairwise shortest-path distance 200. Any perfect matching costs 400,
    // so the optimal tour is 1200 + 400.
    let graph = grid(3);
    assert_eq!(graph.odd_nodes(), vec![1, 3, 5, 7]);

    let route = solve::solve(&graph, SolverStrategy::EdgeCover).unwrap();
    assert!(route.is_closed());
    assert!((route.length_m - 1600.0).abs() < 1e-9);

    let counts = edge_traversals(&route.nodes);
    for (a, b, _) in graph.edge_records() {
        assert!(counts[&(a, b)] >= 1, "edge {a}-{b} skipped");
    }
}

#[test]
fn five_by_five_grid_edge_cover_covers_everything() {
    let graph = grid(5);
    let route = solve::solve(&graph, SolverStrategy::EdgeCover).unwrap();
    assert!(route.is_closed());
    assert!(route.length_m >= graph.base_weight());

    let counts = edge_traversals(&route.nodes);
    let mut traversed_weight = 0.0;
    for (a, b, record) in graph.edge_records() {
        let times = counts.get(&(a, b)).copied().unwrap_or(0);
        assert!(times >= 1, "edge {a}-{b} skipped");
        traversed_weight += record.weight * f64::from(times);
    }
    // Every traversal is a real edge, so the walk length decomposes exactly.
    assert!((traversed_weight - route.length_m).abs() < 1e-6);
}

#[test]
fn node_cover_visits_every_grid_intersection() {
    let graph = grid(4);
    let route = solve::solve(&graph, SolverStrategy::NodeCover).unwrap();
    assert!(route.is_closed());
    for id in graph.node_ids() {
        assert!(route.nodes.contains(&id), "node {id} skipped");
    }
    for leg in route.nodes.windows(2) {
        assert_ne!(leg[0], leg[1], "immediate repeat in tour");
    }
}

#[test]
fn solvers_are_deterministic() {
    let graph = grid(4);
    for strategy in [SolverStrategy::EdgeCover, SolverStrategy::NodeCover] {
        let first = solve::solve(&graph, strategy).unwrap();
        let second = solve::solve(&graph, strategy).unwrap();
        assert_eq!(first.nodes, second.nodes);
    }
}

#[test]
fn pruning_then_solving_drops_spur_weight() {
    let mut graph = grid(3);
    // Hang a two-hop spur off a corner.
    graph.insert_node(100, Coordinate::new(-0.0009, 0.0));
    graph.insert_node(101, Coordinate::new(-0.0018, 0.0));
    graph.insert_edge(0, 100, 80.0).unwrap();
    graph.insert_edge(100, 101, 80.0).unwrap();

    let pruned = prune_dead_ends(&graph);
    assert_eq!(pruned.node_count(), 9);

    let route = solve::solve(&pruned, SolverStrategy::EdgeCover).unwrap();
    assert!((route.length_m - 1600.0).abs() < 1e-9);
}

#[test]
fn sampled_route_waypoints_keep_spacing_on_real_coordinates() {
    let graph = grid(5);
    let route = solve::solve(&graph, SolverStrategy::EdgeCover).unwrap();
    let coords = route.coordinates(&graph).unwrap();
    assert!(path_length_m(&coords) > 0.0);

    let waypoints = sample_waypoints(&coords, 150.0);
    assert_eq!(waypoints[0], coords[0]);
    assert!(waypoints.len() < coords.len());
}
