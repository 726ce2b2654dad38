//! End-to-end planning pipeline: fetch, prune, solve, sample, export.
//!
//! One synchronous, deterministic pass per request. Callers own the graph
//! for the duration of the call and nothing is shared across requests.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::export::{self, WaypointRow};
use crate::geo::Coordinate;
use crate::prune::prune_dead_ends;
use crate::sample::{
    batch_waypoints, sample_waypoints, DEFAULT_BATCH_CAPACITY, DEFAULT_SPACING_M,
};
use crate::solve::{self, Route, SolverStrategy};
use crate::source::StreetSource;

/// Planning parameters for one coverage request.
#[derive(Debug, Clone)]
pub struct PlanConfig {
    pub center: Coordinate,
    pub radius_m: f64,
    pub strategy: SolverStrategy,
    pub spacing_m: f64,
    pub batch_capacity: usize,
}

impl PlanConfig {
    pub fn new(center: Coordinate, radius_m: f64) -> Self {
        Self {
            center,
            radius_m,
            strategy: SolverStrategy::default(),
            spacing_m: DEFAULT_SPACING_M,
            batch_capacity: DEFAULT_BATCH_CAPACITY,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.center.lat)
            || !(-180.0..=180.0).contains(&self.center.lon)
        {
            return Err(Error::InvalidRequest {
                message: format!(
                    "center ({}, {}) is outside valid coordinate ranges",
                    self.center.lat, self.center.lon
                ),
            });
        }
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(Error::InvalidRequest {
                message: format!("radius must be positive, got {}", self.radius_m),
            });
        }
        if !self.spacing_m.is_finite() || self.spacing_m <= 0.0 {
            return Err(Error::InvalidRequest {
                message: format!("waypoint spacing must be positive, got {}", self.spacing_m),
            });
        }
        if self.batch_capacity == 0 {
            return Err(Error::InvalidRequest {
                message: "batch capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Solved coverage route with its sampled and batched waypoint views.
#[derive(Debug, Clone)]
pub struct CoveragePlan {
    pub route: Route,
    /// Full, non-sampled coordinate sequence of the walk.
    pub coordinates: Vec<Coordinate>,
    /// Sampled waypoints, spaced per the configured threshold.
    pub waypoints: Vec<Coordinate>,
    pub batches: Vec<Vec<Coordinate>>,
    /// One map deep link per batch.
    pub links: Vec<String>,
}

impl CoveragePlan {
    pub fn length_m(&self) -> f64 {
        self.route.length_m
    }
}

/// Run the full planning pipeline against a street source.
pub fn plan_route(source: &dyn StreetSource, config: &PlanConfig) -> Result<CoveragePlan> {
    config.validate()?;

    let raw = source.fetch(config.center, config.radius_m)?;
    info!(
        nodes = raw.node_count(),
        edges = raw.edge_count(),
        "street network fetched"
    );

    let pruned = prune_dead_ends(&raw);
    if pruned.is_empty() {
        return Err(Error::DegenerateGraph);
    }

    let route = solve::solve(&pruned, config.strategy)?;
    if route.nodes.is_empty() {
        return Err(Error::EmptyRoute);
    }
    let coordinates = route.coordinates(&pruned)?;
    let waypoints = sample_waypoints(&coordinates, config.spacing_m);
    let batches = batch_waypoints(&waypoints, config.batch_capacity);
    let links = export::maps_deep_links(&batches);

    info!(
        strategy = %config.strategy,
        length_m = route.length_m,
        waypoints = waypoints.len(),
        links = links.len(),
        "coverage route planned"
    );
    Ok(CoveragePlan {
        route,
        coordinates,
        waypoints,
        batches,
        links,
    })
}

/// Where each produced artifact landed, plus per-artifact failures.
///
/// A failed artifact never discards the ones already written.
#[derive(Debug, Clone, Default)]
pub struct ArtifactReport {
    pub csv: Option<PathBuf>,
    pub kmz: Option<PathBuf>,
    pub overlay: Option<PathBuf>,
    pub failures: Vec<String>,
}

impl ArtifactReport {
    pub fn paths(&self) -> Vec<&Path> {
        [&self.csv, &self.kmz, &self.overlay]
            .into_iter()
            .flatten()
            .map(PathBuf::as_path)
            .collect()
    }
}

/// Write the CSV table, KMZ polyline and SVG overlay under `dir`.
pub fn write_artifacts(
    plan: &CoveragePlan,
    rows: &[WaypointRow],
    dir: &Path,
    route_name: &str,
) -> Result<ArtifactReport> {
    std::fs::create_dir_all(dir)?;
    let mut report = ArtifactReport::default();

    let csv_path = dir.join(export::CSV_FILE_NAME);
    match export::write_waypoint_csv(&csv_path, rows) {
        Ok(()) => report.csv = Some(csv_path),
        Err(error) => {
            warn!(%error, "waypoint csv export failed");
            report.failures.push(format!("csv: {error}"));
        }
    }

    let kmz_path = dir.join(export::KMZ_FILE_NAME);
    match export::write_kmz(&kmz_path, route_name, &plan.coordinates) {
        Ok(()) => report.kmz = Some(kmz_path),
        Err(error) => {
            warn!(%error, "kmz export failed");
            report.failures.push(format!("kmz: {error}"));
        }
    }

    let overlay_path = dir.join(export::OVERLAY_FILE_NAME);
    match export::write_overlay_svg(&overlay_path, &plan.coordinates) {
        Ok(()) => report.overlay = Some(overlay_path),
        Err(error) => {
            warn!(%error, "overlay export failed");
            report.failures.push(format!("overlay: {error}"));
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::enrich_waypoints;
    use crate::source::FixtureSource;

    /// Square block with a pendant spur, about 100 m per side.
    const FIXTURE: &str = r#"{
        "nodes": [
            {"id": 1, "lat": 0.0000, "lon": 0.0000},
            {"id": 2, "lat": 0.0009, "lon": 0.0000},
            {"id": 3, "lat": 0.0009, "lon": 0.0009},
            {"id": 4, "lat": 0.0000, "lon": 0.0009},
            {"id": 5, "lat": 0.0000, "lon": 0.0018}
        ],
        "edges": [
            {"a": 1, "b": 2, "weight": 100.0},
            {"a": 2, "b": 3, "weight": 100.0},
            {"a": 3, "b": 4, "weight": 100.0},
            {"a": 4, "b": 1, "weight": 100.0},
            {"a": 4, "b": 5, "weight": 100.0}
        ]
    }"#;

    fn fixture_source() -> FixtureSource {
        FixtureSource::from_json(FIXTURE).unwrap()
    }

    fn config() -> PlanConfig {
        PlanConfig::new(Coordinate::new(0.0004, 0.0004), 500.0)
    }

    #[test]
    fn plans_pruned_square() {
        let plan = plan_route(&fixture_source(), &config()).unwrap();
        // The pendant spur is pruned; the square needs no augmentation.
        assert!((plan.length_m() - 400.0).abs() < 1e-9);
        assert!(plan.route.is_closed());
        assert_eq!(plan.coordinates.len(), 5);
        assert!(!plan.waypoints.is_empty());
        assert_eq!(plan.links.len(), plan.batches.len());
    }

    #[test]
    fn batches_never_exceed_capacity() {
        let mut cfg = config();
        cfg.spacing_m = 1.0;
        cfg.batch_capacity = 2;
        let plan = plan_route(&fixture_source(), &cfg).unwrap();
        assert!(plan.batches.iter().all(|batch| batch.len() <= 2));
        assert!(plan.links.len() >= 2);
    }

    #[test]
    fn degenerate_network_is_fatal() {
        // A bare path prunes away completely.
        let source = FixtureSource::from_json(
            r#"{"nodes": [
                    {"id": 1, "lat": 0.0, "lon": 0.0},
                    {"id": 2, "lat": 0.001, "lon": 0.0}
                ],
                "edges": [{"a": 1, "b": 2, "weight": 100.0}]}"#,
        )
        .unwrap();
        assert!(matches!(
            plan_route(&source, &config()),
            Err(Error::DegenerateGraph)
        ));
    }

    #[test]
    fn star_network_is_degenerate_not_a_zero_length_route() {
        // Every street is a dead end around one hub; after pruning nothing
        // remains and planning must fail instead of returning a trivial
        // single-node route.
        let source = FixtureSource::from_json(
            r#"{"nodes": [
                    {"id": 1, "lat": 0.0, "lon": 0.0},
                    {"id": 2, "lat": 0.001, "lon": 0.0},
                    {"id": 3, "lat": 0.0, "lon": 0.001},
                    {"id": 4, "lat": -0.001, "lon": 0.0}
                ],
                "edges": [
                    {"a": 1, "b": 2, "weight": 100.0},
                    {"a": 1, "b": 3, "weight": 100.0},
                    {"a": 1, "b": 4, "weight": 100.0}
                ]}"#,
        )
        .unwrap();
        assert!(matches!(
            plan_route(&source, &config()),
            Err(Error::DegenerateGraph)
        ));
    }

    #[test]
    fn invalid_config_is_rejected_before_fetch() {
        let mut cfg = config();
        cfg.radius_m = -5.0;
        assert!(matches!(
            plan_route(&fixture_source(), &cfg),
            Err(Error::InvalidRequest { .. })
        ));

        let mut cfg = config();
        cfg.center = Coordinate::new(123.0, 0.0);
        assert!(matches!(
            plan_route(&fixture_source(), &cfg),
            Err(Error::InvalidRequest { .. })
        ));
    }

    #[test]
    fn artifacts_land_in_the_target_directory() {
        let plan = plan_route(&fixture_source(), &config()).unwrap();
        let rows = enrich_waypoints(None, &plan.waypoints);
        let dir = tempfile::tempdir().unwrap();
        let report = write_artifacts(&plan, &rows, dir.path(), "test route").unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(report.paths().len(), 3);
        for path in report.paths() {
            assert!(path.exists(), "missing artifact {path:?}");
        }
    }

    #[test]
    fn one_failing_exporter_does_not_discard_the_others() {
        let plan = plan_route(&fixture_source(), &config()).unwrap();
        let rows = enrich_waypoints(None, &plan.waypoints);
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the CSV path makes that exporter fail.
        std::fs::create_dir_all(dir.path().join(crate::export::CSV_FILE_NAME)).unwrap();

        let report = write_artifacts(&plan, &rows, dir.path(), "test route").unwrap();

        assert!(report.csv.is_none());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].starts_with("csv:"), "{:?}", report.failures);
        for path in [&report.kmz, &report.overlay] {
            let path = path.as_deref().expect("artifact written");
            assert!(path.exists(), "missing artifact {path:?}");
        }
    }
}
