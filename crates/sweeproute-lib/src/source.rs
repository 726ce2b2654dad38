//! Street-graph sources.
//!
//! The pipeline is written against the [`StreetSource`] trait so the actual
//! network fetch can be swapped or mocked. [`OverpassSource`] queries the
//! Overpass API for drivable streets around a point; [`FixtureSource`] loads
//! a serde graph document, used by tests and the CLI's offline path.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::graph::{NodeId, StreetGraph};

/// Default Overpass API endpoint.
pub const DEFAULT_OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Road classes and access restrictions excluded from the drivable network.
const WAY_FILTER: &str = r#"["highway"]["highway"!~"service|track|path|footway"]["access"!~"private"]["barrier"!~"wall|fence"]"#;

/// Anything that can produce a street graph around a center point.
pub trait StreetSource {
    fn fetch(&self, center: Coordinate, radius_m: f64) -> Result<StreetGraph>;
}

/// Serializable street-graph document, the fixture interchange format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeDocument>,
    pub edges: Vec<EdgeDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDocument {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: f64,
}

impl GraphDocument {
    pub fn from_graph(graph: &StreetGraph) -> Self {
        let nodes = graph
            .node_ids()
            .filter_map(|id| {
                graph
                    .coordinate(id)
                    .map(|coord| NodeDocument {
                        id,
                        lat: coord.lat,
                        lon: coord.lon,
                    })
            })
            .collect();
        let edges = graph
            .edge_records()
            .map(|(a, b, record)| EdgeDocument {
                a,
                b,
                weight: record.weight,
            })
            .collect();
        Self { nodes, edges }
    }

    pub fn into_graph(self) -> Result<StreetGraph> {
        let mut graph = StreetGraph::new();
        for node in self.nodes {
            graph.insert_node(node.id, Coordinate::new(node.lat, node.lon));
        }
        for edge in self.edges {
            graph.insert_edge(edge.a, edge.b, edge.weight)?;
        }
        Ok(graph)
    }
}

/// In-memory source backed by a graph document; ignores center and radius.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    graph: StreetGraph,
}

impl FixtureSource {
    pub fn new(graph: StreetGraph) -> Self {
        Self { graph }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: GraphDocument = serde_json::from_str(json)?;
        Ok(Self::new(document.into_graph()?))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl StreetSource for FixtureSource {
    fn fetch(&self, _center: Coordinate, _radius_m: f64) -> Result<StreetGraph> {
        if self.graph.is_empty() {
            return Err(Error::EmptyNetwork);
        }
        Ok(self.graph.clone())
    }
}

/// Street source backed by the Overpass API.
pub struct OverpassSource {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl OverpassSource {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_OVERPASS_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("sweeproute/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn query(center: Coordinate, radius_m: f64) -> String {
        format!(
            "[out:json][timeout:90];\nway(around:{radius:.0},{lat:.6},{lon:.6}){filter};\n(._;>;);\nout body;",
            radius = radius_m,
            lat = center.lat,
            lon = center.lon,
            filter = WAY_FILTER,
        )
    }
}

impl StreetSource for OverpassSource {
    fn fetch(&self, center: Coordinate, radius_m: f64) -> Result<StreetGraph> {
        info!(
            lat = center.lat,
            lon = center.lon,
            radius_m,
            "fetching street network from overpass"
        );
        let payload: OverpassPayload = self
            .client
            .post(&self.endpoint)
            .body(Self::query(center, radius_m))
            .send()?
            .error_for_status()?
            .json()?;
        graph_from_overpass(payload)
    }
}

#[derive(Debug, Deserialize)]
struct OverpassPayload {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    nodes: Option<Vec<u64>>,
}

/// Assemble a street graph from an Overpass response.
///
/// Way node chains become edges weighted by haversine length; fragments
/// disconnected from the main network are dropped, matching the behaviour
/// of radius-truncated network fetchers.
fn graph_from_overpass(payload: OverpassPayload) -> Result<StreetGraph> {
    let mut coordinates: BTreeMap<NodeId, Coordinate> = BTreeMap::new();
    for element in &payload.elements {
        if element.kind == "node" {
            if let (Some(id), Some(lat), Some(lon)) = (element.id, element.lat, element.lon) {
                coordinates.insert(id, Coordinate::new(lat, lon));
            }
        }
    }

    let mut graph = StreetGraph::new();
    for (&id, &coord) in &coordinates {
        graph.insert_node(id, coord);
    }
    let mut skipped = 0usize;
    for element in &payload.elements {
        if element.kind != "way" {
            continue;
        }
        let Some(chain) = &element.nodes else {
            continue;
        };
        for pair in chain.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b {
                continue;
            }
            match (coordinates.get(&a), coordinates.get(&b)) {
                (Some(ca), Some(cb)) => {
                    graph.insert_edge(a, b, ca.distance_to(cb))?;
                }
                _ => skipped += 1,
            }
        }
    }

    let main = graph.largest_component();
    debug!(
        nodes = main.node_count(),
        edges = main.edge_count(),
        skipped_segments = skipped,
        "assembled street graph"
    );
    if main.is_empty() {
        return Err(Error::EmptyNetwork);
    }
    Ok(main)
}
