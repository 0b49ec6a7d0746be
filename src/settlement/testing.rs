use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::provider::{SettlementProvider, SettlementReceipt};
use crate::error::{AppError, AppResult};
use crate::jobs::JobRun;

/// Provider that remembers every run it was asked to settle
#[derive(Clone, Default)]
pub struct RecordingProvider {
    pub submitted: Arc<Mutex<Vec<JobRun>>>,
    pub reject: bool,
}

impl RecordingProvider {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub async fn count(&self) -> usize {
        self.submitted.lock().await.len()
    }
}

#[async_trait]
impl SettlementProvider for RecordingProvider {
    async fn submit(&self, run: &JobRun) -> AppResult<SettlementReceipt> {
        self.submitted.lock().await.push(run.clone());
        if self.reject {
            return Err(AppError::settlement(self.name(), "rejected"));
        }
        Ok(SettlementReceipt {
            provider: self.name().to_string(),
            status_code: Some(200),
            response: None,
            duration_ms: 0,
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
