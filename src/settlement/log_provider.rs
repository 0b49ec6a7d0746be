use async_trait::async_trait;

use super::provider::{SettlementPayload, SettlementProvider, SettlementReceipt};
use crate::error::AppResult;
use crate::jobs::JobRun;

/// Provider that only writes the settled result to the log
#[derive(Debug, Default)]
pub struct LogProvider;

impl LogProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SettlementProvider for LogProvider {
    async fn submit(&self, run: &JobRun) -> AppResult<SettlementReceipt> {
        let payload = SettlementPayload::from(run);
        let value = payload
            .value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default();
        tracing::info!(
            job_id = %payload.job_id,
            run_id = %payload.run_id,
            value = %value,
            "Settled job run"
        );

        Ok(SettlementReceipt {
            provider: self.name().to_string(),
            status_code: None,
            response: None,
            duration_ms: 0,
        })
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
