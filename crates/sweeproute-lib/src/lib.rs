//! Sweeproute library entry points.
//!
//! This crate holds everything needed to plan a street-coverage route: fetch
//! a drivable network around a point, prune dead-end spurs, solve a closed
//! coverage walk (every segment or every intersection), sample it into
//! link-sized waypoint batches and export the artifacts. Higher-level
//! consumers (CLI, service) should only depend on the functions exported
//! here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod enrich;
pub mod error;
pub mod export;
pub mod geo;
pub mod graph;
pub mod pipeline;
pub mod prune;
pub mod sample;
pub mod shortest;
pub mod solve;
pub mod source;

pub use enrich::{enrich_waypoints, Address, NominatimGeocoder, ReverseGeocoder};
pub use error::{Error, Result};
pub use export::WaypointRow;
pub use geo::Coordinate;
pub use graph::{NodeId, StreetGraph};
pub use pipeline::{plan_route, write_artifacts, ArtifactReport, CoveragePlan, PlanConfig};
pub use prune::prune_dead_ends;
pub use solve::{Route, SolverStrategy};
pub use source::{FixtureSource, GraphDocument, OverpassSource, StreetSource};
