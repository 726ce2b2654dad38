use tracing::debug;

use crate::graph::StreetGraph;

/// Strip dead-end spurs from a street network.
///
/// Repeatedly removes every node with at most one incident edge (counting
/// multiplicity) until none remains, so the result has minimum degree 2 or
/// is empty. Removing one layer of dead ends can expose the next, and can
/// strand a former hub with no edges at all, so the pass iterates to a
/// fixed point. The result may be empty when the whole network degenerates;
/// callers must treat that as a terminal condition, not an error of this
/// function.
///
/// The fixed point does not depend on removal order within a pass, and the
/// function is idempotent.
pub fn prune_dead_ends(graph: &StreetGraph) -> StreetGraph {
    let mut pruned = graph.clone();
    let mut passes = 0usize;
    loop {
        let dead_ends: Vec<_> = pruned
            .node_ids()
            .filter(|&id| pruned.degree(id) <= 1)
            .collect();
        if dead_ends.is_empty() {
            break;
        }
        passes += 1;
        for id in dead_ends {
            pruned.remove_node(id);
        }
    }
    debug!(
        passes,
        nodes_before = graph.node_count(),
        nodes_after = pruned.node_count(),
        "pruned dead ends"
    );
    pruned
}
