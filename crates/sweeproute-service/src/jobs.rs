//! In-memory job registry.
//!
//! Jobs are keyed by UUID and move from `in_progress` to exactly one
//! terminal state. The registry is capacity bounded: once full, the oldest
//! terminal job is evicted on insert. Running jobs are never evicted, so the
//! registry can temporarily exceed capacity under a burst of submissions.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use uuid::Uuid;

/// Default maximum number of retained jobs.
pub const DEFAULT_JOB_CAPACITY: usize = 256;

/// Result payload of a finished planning job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    /// Total route length in meters.
    pub length_m: f64,
    /// Number of sampled waypoints.
    pub waypoints: usize,
    /// Map deep links, one per waypoint batch.
    pub links: Vec<String>,
    /// Relative URLs of the produced artifacts.
    pub artifacts: Vec<String>,
    /// Per-artifact export failures, empty when everything was written.
    pub export_failures: Vec<String>,
}

/// Caller-visible job state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    InProgress,
    Done { result: JobResult },
    Error { message: String },
}

impl JobStatus {
    fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::InProgress)
    }
}

#[derive(Debug)]
struct RegistryInner {
    capacity: usize,
    /// Insertion order, oldest first; drives eviction.
    order: VecDeque<String>,
    jobs: BTreeMap<String, JobStatus>,
}

/// Shared, capacity-bounded job store.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl JobRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                capacity: capacity.max(1),
                order: VecDeque::new(),
                jobs: BTreeMap::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        self.inner.lock().expect("job registry lock poisoned")
    }

    /// Register a new in-progress job, evicting the oldest terminal job when
    /// at capacity. Returns the job id.
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut inner = self.lock();
        while inner.jobs.len() >= inner.capacity {
            let Some(position) = inner
                .order
                .iter()
                .position(|old| inner.jobs.get(old).is_some_and(JobStatus::is_terminal))
            else {
                break;
            };
            if let Some(old) = inner.order.remove(position) {
                inner.jobs.remove(&old);
            }
        }
        inner.order.push_back(id.clone());
        inner.jobs.insert(id.clone(), JobStatus::InProgress);
        id
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.lock().jobs.get(id).cloned()
    }

    pub fn complete(&self, id: &str, result: JobResult) {
        self.lock()
            .jobs
            .entry(id.to_string())
            .and_modify(|status| *status = JobStatus::Done { result });
    }

    pub fn fail(&self, id: &str, message: impl Into<String>) {
        let message = message.into();
        self.lock()
            .jobs
            .entry(id.to_string())
            .and_modify(|status| *status = JobStatus::Error { message });
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_JOB_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> JobResult {
        JobResult {
            length_m: 400.0,
            waypoints: 4,
            links: vec!["https://example.test/1".to_string()],
            artifacts: vec!["/static/x/waypoints.csv".to_string()],
            export_failures: Vec::new(),
        }
    }

    #[test]
    fn jobs_move_to_terminal_states() {
        let registry = JobRegistry::new(8);
        let id = registry.create();
        assert_eq!(registry.get(&id), Some(JobStatus::InProgress));

        registry.complete(&id, result());
        assert!(matches!(registry.get(&id), Some(JobStatus::Done { .. })));

        let other = registry.create();
        registry.fail(&other, "boom");
        assert_eq!(
            registry.get(&other),
            Some(JobStatus::Error {
                message: "boom".to_string()
            })
        );
    }

    #[test]
    fn unknown_id_is_none() {
        let registry = JobRegistry::new(8);
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn terminal_jobs_are_evicted_at_capacity() {
        let registry = JobRegistry::new(2);
        let first = registry.create();
        registry.fail(&first, "old");
        let second = registry.create();
        registry.complete(&second, result());

        let third = registry.create();
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&first).is_none(), "oldest terminal evicted");
        assert!(registry.get(&second).is_some());
        assert!(registry.get(&third).is_some());
    }

    #[test]
    fn running_jobs_are_never_evicted() {
        let registry = JobRegistry::new(2);
        let first = registry.create();
        let second = registry.create();
        let third = registry.create();

        assert_eq!(registry.len(), 3, "capacity exceeded rather than evicting");
        for id in [&first, &second, &third] {
            assert_eq!(registry.get(id), Some(JobStatus::InProgress));
        }
    }

    #[test]
    fn status_serializes_with_tag() {
        let done = JobStatus::Done { result: result() };
        let json = serde_json::to_string(&done).unwrap();
        assert!(json.contains("\"status\":\"done\""));
        assert!(json.contains("\"length_m\":400.0"));

        let json = serde_json::to_string(&JobStatus::InProgress).unwrap();
        assert!(json.contains("\"status\":\"in_progress\""));
    }
}
