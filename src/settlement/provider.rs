//! Core settlement provider trait and types.

use crate::error::AppResult;
use crate::jobs::JobRun;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Body submitted for a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementPayload {
    pub job_id: String,
    pub run_id: Uuid,
    pub value: Option<JsonValue>,
    pub finished_at: Option<Timestamp>,
}

impl From<&JobRun> for SettlementPayload {
    fn from(run: &JobRun) -> Self {
        Self {
            job_id: run.job_id.clone(),
            run_id: run.id,
            value: run.result.data.clone(),
            finished_at: run.finished_at,
        }
    }
}

/// Outcome of an accepted submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    /// Provider that accepted the submission
    pub provider: String,
    /// HTTP status code or provider-specific status
    pub status_code: Option<u16>,
    /// Response body, if any
    pub response: Option<String>,
    /// Time taken for the operation in milliseconds
    pub duration_ms: u64,
}

/// Collaborator that publishes the result of a completed run
///
/// All providers must be Send + Sync; the notifier shares one instance
/// between every trigger.
#[async_trait]
pub trait SettlementProvider: Send + Sync {
    /// Submit a completed run. An `Err` means the result was not accepted.
    async fn submit(&self, run: &JobRun) -> AppResult<SettlementReceipt>;

    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Validates provider configuration (optional, default no-op)
    async fn validate_config(&self) -> AppResult<()> {
        Ok(())
    }
}
