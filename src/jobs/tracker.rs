use std::collections::HashMap;
use std::sync::Arc;

use jiff::Timestamp;
use serde::Serialize;
use tokio::sync::RwLock;

/// Why a job is being tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedState {
    /// The job has an installed recurring trigger
    Scheduled,
    /// A one-shot run of the job is executing right now
    Executing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackedJob {
    pub state: TrackedState,
    pub since: Timestamp,
}

/// Set of job ids the engine is currently responsible for
///
/// Cloning yields another handle onto the same set, so both trigger paths and
/// every cron callback observe the same state.
#[derive(Clone, Default)]
pub struct InFlightTracker {
    jobs: Arc<RwLock<HashMap<String, TrackedJob>>>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `job_id`, replacing any previous marker
    pub async fn insert(&self, job_id: &str, state: TrackedState) {
        let marker = TrackedJob {
            state,
            since: Timestamp::now(),
        };
        self.jobs.write().await.insert(job_id.to_string(), marker);
    }

    pub async fn remove(&self, job_id: &str) -> Option<TrackedJob> {
        self.jobs.write().await.remove(job_id)
    }

    pub async fn contains(&self, job_id: &str) -> bool {
        self.jobs.read().await.contains_key(job_id)
    }

    pub async fn get(&self, job_id: &str) -> Option<TrackedJob> {
        self.jobs.read().await.get(job_id).copied()
    }

    /// Tracked ids, sorted
    pub async fn job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.jobs.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
