//! Street-coverage route planning HTTP microservice.
//!
//! Thin HTTP glue over `sweeproute-lib`: submitting a route registers a job
//! and runs the planning pipeline on a blocking worker; callers poll the job
//! until it reaches a terminal state and then fetch the artifacts.
//!
//! # Endpoints
//!
//! - `POST /api/v1/routes` - Submit a coverage request, returns `{job_id}`
//! - `GET /api/v1/routes/{id}` - Poll job status (`in_progress`/`done`/`error`)
//! - `GET /static/{job_id}/{artifact}` - Fetch a produced artifact
//! - `GET /health/live` - Liveness probe

#![deny(warnings)]

pub mod jobs;
pub mod logging;
pub mod problem;
pub mod routes;
pub mod state;

pub use jobs::{JobRegistry, JobResult, JobStatus, DEFAULT_JOB_CAPACITY};
pub use logging::{init_logging, LogFormat};
pub use problem::{
    ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST, PROBLEM_JOB_NOT_FOUND,
};
pub use routes::{build_router, SubmitRouteRequest};
pub use state::AppState;
