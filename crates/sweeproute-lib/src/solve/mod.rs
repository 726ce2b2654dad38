//! Route solvers.
//!
//! Two interchangeable strategies share the same contract: take a pruned,
//! connected street graph and return a closed walk. [`edge_cover`] drives
//! every street segment at least once (Chinese-Postman style);
//! [`node_cover`] visits every intersection at least once (approximate TSP).

pub mod edge_cover;
pub mod matching;
pub mod node_cover;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::graph::{NodeId, StreetGraph};

/// Closed walk over a street graph, first node equal to last.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Traversed node ids in order.
    pub nodes: Vec<NodeId>,
    /// Total walk length in meters.
    pub length_m: f64,
}

impl Route {
    /// Resolve the walk into coordinates against the graph it was solved on.
    pub fn coordinates(&self, graph: &StreetGraph) -> Result<Vec<Coordinate>> {
        self.nodes
            .iter()
            .map(|&id| {
                graph.coordinate(id).ok_or_else(|| Error::SolverInvariant {
                    message: format!("route references unknown node {id}"),
                })
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(first), Some(last)) => first == last,
            _ => false,
        }
    }
}

/// Which coverage objective the solver optimises for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStrategy {
    /// Cover every street segment (drive every street).
    EdgeCover,
    /// Cover every intersection (visit every corner).
    NodeCover,
}

impl Default for SolverStrategy {
    fn default() -> Self {
        Self::EdgeCover
    }
}

impl fmt::Display for SolverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EdgeCover => write!(f, "edge-cover"),
            Self::NodeCover => write!(f, "node-cover"),
        }
    }
}

impl FromStr for SolverStrategy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "edge-cover" | "edge_cover" => Ok(Self::EdgeCover),
            "node-cover" | "node_cover" => Ok(Self::NodeCover),
            other => Err(Error::InvalidRequest {
                message: format!(
                    "unknown strategy {other:?}, expected \"edge-cover\" or \"node-cover\""
                ),
            }),
        }
    }
}

/// Solve a coverage route with the selected strategy.
///
/// The graph must be non-empty and connected; both strategies check the
/// precondition and fail rather than repair it.
pub fn solve(graph: &StreetGraph, strategy: SolverStrategy) -> Result<Route> {
    match strategy {
        SolverStrategy::EdgeCover => edge_cover::solve(graph),
        SolverStrategy::NodeCover => node_cover::solve(graph),
    }
}
