//! Chinese-Postman style solver: traverse every street segment at least once.
//!
//! Odd-degree intersections are paired up by an exact minimum-weight perfect
//! matching over their shortest-path distances; the matched paths are
//! duplicated to make every degree even, after which a Hierholzer walk yields
//! the closed route. The resulting length is exactly the sum of all segment
//! lengths plus the matched shortest-path distances.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::{edge_key, NodeId, StreetGraph};
use crate::shortest::{shortest_path_tree, ShortestPathTree};
use crate::solve::{matching, Route};

pub fn solve(graph: &StreetGraph) -> Result<Route> {
    graph.ensure_connected()?;

    let mut augmented = graph.clone();
    let odd = augmented.odd_nodes();
    if !odd.is_empty() {
        // Handshake lemma: any finite graph has evenly many odd nodes.
        if odd.len() % 2 != 0 {
            return Err(Error::OddParity { count: odd.len() });
        }
        augment_to_even(&mut augmented, &odd)?;
    }

    let nodes = eulerian_circuit(&augmented)?;
    let length_m = augmented.total_weight();
    debug!(
        odd_nodes = odd.len(),
        route_nodes = nodes.len(),
        length_m,
        "solved edge-cover route"
    );
    Ok(Route { nodes, length_m })
}

/// Duplicate shortest paths between matched odd nodes until every degree is
/// even.
fn augment_to_even(graph: &mut StreetGraph, odd: &[NodeId]) -> Result<()> {
    let trees: Vec<ShortestPathTree> = odd
        .iter()
        .map(|&node| shortest_path_tree(graph, node))
        .collect();

    let n = odd.len();
    let mut dist = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            dist[i][j] = trees[i]
                .distance_to(odd[j])
                .ok_or_else(|| Error::SolverInvariant {
                    message: format!(
                        "no path between odd nodes {} and {} in a connected graph",
                        odd[i], odd[j]
                    ),
                })?;
        }
    }

    let pairs = matching::min_weight_perfect_matching(&dist)?;
    for (i, j) in pairs {
        let path = trees[i]
            .path_to(odd[j])
            .ok_or_else(|| Error::SolverInvariant {
                message: format!("matched pair {}-{} has no path", odd[i], odd[j]),
            })?;
        for leg in path.windows(2) {
            graph.duplicate_edge(leg[0], leg[1])?;
        }
    }
    Ok(())
}

/// Hierholzer's algorithm over an all-even graph, honouring multiplicity.
///
/// Neighbours are tried in ascending id order, so the circuit is
/// deterministic for a fixed input.
fn eulerian_circuit(graph: &StreetGraph) -> Result<Vec<NodeId>> {
    let start = graph.node_ids().next().ok_or(Error::DegenerateGraph)?;

    let mut remaining: BTreeMap<(NodeId, NodeId), u32> = graph
        .edge_records()
        .map(|(a, b, record)| ((a, b), record.multiplicity))
        .collect();

    let mut stack = vec![start];
    let mut circuit = Vec::new();
    while let Some(&current) = stack.last() {
        let next = graph
            .neighbours(current)
            .map(|(neighbour, _)| neighbour)
            .find(|&neighbour| remaining[&edge_key(current, neighbour)] > 0);
        match next {
            Some(neighbour) => {
                let uses = remaining
                    .get_mut(&edge_key(current, neighbour))
                    .expect("edge present in remaining map");
                *uses -= 1;
                stack.push(neighbour);
            }
            None => {
                circuit.push(current);
                stack.pop();
            }
        }
    }
    circuit.reverse();

    if remaining.values().any(|&uses| uses > 0) {
        return Err(Error::SolverInvariant {
            message: "eulerian walk ended with untraversed edges".to_string(),
        });
    }
    Ok(circuit)
}
