//! Shared application state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sweeproute_lib::{ReverseGeocoder, StreetSource};

use crate::jobs::JobRegistry;

struct StateInner {
    jobs: JobRegistry,
    source: Arc<dyn StreetSource + Send + Sync>,
    geocoder: Option<Arc<dyn ReverseGeocoder + Send + Sync>>,
    artifact_root: PathBuf,
}

/// Cheaply cloneable handle passed to every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn StreetSource + Send + Sync>,
        geocoder: Option<Arc<dyn ReverseGeocoder + Send + Sync>>,
        artifact_root: PathBuf,
    ) -> Self {
        Self {
            inner: Arc::new(StateInner {
                jobs: JobRegistry::default(),
                source,
                geocoder,
                artifact_root,
            }),
        }
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.inner.jobs
    }

    pub fn source(&self) -> &(dyn StreetSource + Send + Sync) {
        self.inner.source.as_ref()
    }

    pub fn geocoder(&self) -> Option<&(dyn ReverseGeocoder + Send + Sync)> {
        self.inner.geocoder.as_deref()
    }

    pub fn artifact_root(&self) -> &Path {
        &self.inner.artifact_root
    }
}
