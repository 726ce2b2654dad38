//! HTTP handlers and router assembly.
//!
//! Handlers are thin: parse and validate the request, hand the work to
//! `sweeproute-lib` on a blocking task, format the response. Planning
//! results are reported through the job registry, never inline.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

use sweeproute_lib::sample::{DEFAULT_BATCH_CAPACITY, DEFAULT_SPACING_M};
use sweeproute_lib::{
    enrich_waypoints, plan_route, write_artifacts, Coordinate, PlanConfig, ReverseGeocoder,
    SolverStrategy,
};

use crate::jobs::JobResult;
use crate::problem::ProblemDetails;
use crate::state::AppState;

/// Body of `POST /api/v1/routes`.
#[derive(Debug, Deserialize)]
pub struct SubmitRouteRequest {
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
    #[serde(default)]
    pub strategy: SolverStrategy,
    #[serde(default = "default_spacing")]
    pub spacing_m: f64,
    #[serde(default = "default_batch_capacity")]
    pub batch_capacity: usize,
}

fn default_spacing() -> f64 {
    DEFAULT_SPACING_M
}

fn default_batch_capacity() -> usize {
    DEFAULT_BATCH_CAPACITY
}

#[derive(Debug, Serialize)]
struct SubmitRouteResponse {
    job_id: String,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Assemble the service router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/routes", post(submit_route))
        .route("/api/v1/routes/{id}", get(job_status))
        .nest_service("/static", ServeDir::new(state.artifact_root()))
        .route("/health/live", get(health_live))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handle `POST /api/v1/routes`: validate, register a job, return its id
/// immediately while the pipeline runs on a blocking worker.
async fn submit_route(
    State(state): State<AppState>,
    Json(request): Json<SubmitRouteRequest>,
) -> Response {
    let config = PlanConfig {
        center: Coordinate::new(request.lat, request.lon),
        radius_m: request.radius_m,
        strategy: request.strategy,
        spacing_m: request.spacing_m,
        batch_capacity: request.batch_capacity,
    };
    if let Err(error) = config.validate() {
        return ProblemDetails::bad_request(error.to_string()).into_response();
    }

    let job_id = state.jobs().create();
    info!(
        job_id = %job_id,
        lat = request.lat,
        lon = request.lon,
        radius_m = request.radius_m,
        strategy = %config.strategy,
        "route job submitted"
    );

    let worker_state = state.clone();
    let worker_id = job_id.clone();
    tokio::task::spawn_blocking(move || run_job(worker_state, worker_id, config));

    (StatusCode::ACCEPTED, Json(SubmitRouteResponse { job_id })).into_response()
}

/// Handle `GET /api/v1/routes/{id}`.
async fn job_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if Uuid::parse_str(&id).is_err() {
        return ProblemDetails::bad_request(format!("'{id}' is not a valid job id"))
            .into_response();
    }
    match state.jobs().get(&id) {
        Some(status) => (StatusCode::OK, Json(status)).into_response(),
        None => ProblemDetails::job_not_found(&id).into_response(),
    }
}

/// Liveness probe handler; no external dependencies.
async fn health_live() -> impl IntoResponse {
    let status = HealthStatus {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };
    (StatusCode::OK, Json(status))
}

/// Run the whole pipeline for one job and record its terminal state.
fn run_job(state: AppState, job_id: String, config: PlanConfig) {
    match execute_job(&state, &job_id, &config) {
        Ok(result) => {
            info!(job_id = %job_id, length_m = result.length_m, "route job done");
            state.jobs().complete(&job_id, result);
        }
        Err(err) => {
            error!(job_id = %job_id, error = %err, "route job failed");
            state.jobs().fail(&job_id, err.to_string());
        }
    }
}

fn execute_job(
    state: &AppState,
    job_id: &str,
    config: &PlanConfig,
) -> sweeproute_lib::Result<JobResult> {
    let plan = plan_route(state.source(), config)?;
    let geocoder = state.geocoder().map(|g| g as &dyn ReverseGeocoder);
    let rows = enrich_waypoints(geocoder, &plan.waypoints);

    let dir = state.artifact_root().join(job_id);
    let report = write_artifacts(&plan, &rows, &dir, "coverage route")?;
    let artifacts = report
        .paths()
        .into_iter()
        .filter_map(|path| path.file_name())
        .map(|name| format!("/static/{job_id}/{}", name.to_string_lossy()))
        .collect();

    Ok(JobResult {
        length_m: plan.length_m(),
        waypoints: plan.waypoints.len(),
        links: plan.links.clone(),
        artifacts,
        export_failures: report.failures,
    })
}
