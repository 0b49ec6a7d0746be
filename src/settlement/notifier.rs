use std::sync::Arc;

use serde::Serialize;

use super::provider::{SettlementProvider, SettlementReceipt};
use crate::jobs::{JobRun, RunStatus};

/// Which trigger path produced the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Cron,
    OneShot,
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerSource::Cron => write!(f, "cron"),
            TriggerSource::OneShot => write!(f, "one_shot"),
        }
    }
}

/// What happens when a submission fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPolicy {
    /// Log the failure and drop the result; no retry, the run stays Completed
    #[default]
    LogAndDrop,
}

#[derive(Debug)]
pub enum NotifyOutcome {
    Submitted(SettlementReceipt),
    Failed(String),
    /// The run did not complete, nothing was submitted
    Skipped,
}

impl NotifyOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, NotifyOutcome::Submitted(_))
    }
}

/// Hands completed runs to the settlement provider and reports the outcome
#[derive(Clone)]
pub struct CompletionNotifier {
    provider: Arc<dyn SettlementProvider>,
    policy: SubmissionPolicy,
}

impl CompletionNotifier {
    pub fn new(provider: Arc<dyn SettlementProvider>) -> Self {
        Self {
            provider,
            policy: SubmissionPolicy::default(),
        }
    }

    pub fn policy(&self) -> SubmissionPolicy {
        self.policy
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Report a finished run, submitting it if it completed
    pub async fn notify(&self, run: &JobRun, source: TriggerSource) -> NotifyOutcome {
        match run.status {
            RunStatus::Errored => {
                tracing::error!(
                    job_id = %run.job_id,
                    run_id = %run.id,
                    %source,
                    error = run.error_message().unwrap_or_default(),
                    "Job run execution error"
                );
                NotifyOutcome::Skipped
            }
            RunStatus::Completed => {
                tracing::info!(
                    job_id = %run.job_id,
                    run_id = %run.id,
                    %source,
                    result = ?run.result.data,
                    "Finished job run execution"
                );
                self.submit(run, source).await
            }
            status => {
                tracing::warn!(job_id = %run.job_id, run_id = %run.id, %status, "Job run not finished, nothing to settle");
                NotifyOutcome::Skipped
            }
        }
    }

    async fn submit(&self, run: &JobRun, source: TriggerSource) -> NotifyOutcome {
        let provider = self.provider.name();
        match self.provider.submit(run).await {
            Ok(receipt) => {
                tracing::info!(
                    job_id = %run.job_id,
                    run_id = %run.id,
                    %source,
                    provider,
                    duration_ms = receipt.duration_ms,
                    "Settlement submission succeeded"
                );
                NotifyOutcome::Submitted(receipt)
            }
            Err(e) => match self.policy {
                SubmissionPolicy::LogAndDrop => {
                    tracing::error!(
                        job_id = %run.job_id,
                        run_id = %run.id,
                        %source,
                        provider,
                        error = %e,
                        "Settlement submission failed, result dropped"
                    );
                    NotifyOutcome::Failed(e.to_string())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobSpec, RunResult, Schedule, TaskSpec};
    use crate::settlement::testing::RecordingProvider;
    use serde_json::json;

    fn finished_run(result: RunResult) -> JobRun {
        let job = JobSpec::new(
            "job-1",
            Schedule::run_at("2020-01-01 00:00:00"),
            vec![TaskSpec::new("noop", json!(null))],
        );
        let mut run = job.new_run();
        run.task_runs[0].apply_result(result.clone());
        run.task_runs[0] = run.task_runs[0].clone().mark_completed();
        run.apply_result(result.mark_completed());
        run
    }

    #[tokio::test]
    async fn test_completed_run_is_submitted() {
        let provider = RecordingProvider::default();
        let notifier = CompletionNotifier::new(Arc::new(provider.clone()));

        let run = finished_run(RunResult::with_value(json!(42)));
        assert_eq!(run.status, RunStatus::Completed);

        let outcome = notifier.notify(&run, TriggerSource::OneShot).await;
        assert!(outcome.is_submitted());
        assert_eq!(provider.count().await, 1);
    }

    #[tokio::test]
    async fn test_errored_run_is_not_submitted() {
        let provider = RecordingProvider::default();
        let notifier = CompletionNotifier::new(Arc::new(provider.clone()));

        let run = finished_run(RunResult::with_error("rate limit"));
        assert_eq!(run.status, RunStatus::Errored);

        let outcome = notifier.notify(&run, TriggerSource::Cron).await;
        assert!(matches!(outcome, NotifyOutcome::Skipped));
        assert_eq!(provider.count().await, 0);
    }

    #[tokio::test]
    async fn test_rejected_submission_is_dropped() {
        let provider = RecordingProvider::rejecting();
        let notifier = CompletionNotifier::new(Arc::new(provider.clone()));
        assert_eq!(notifier.policy(), SubmissionPolicy::LogAndDrop);

        let run = finished_run(RunResult::with_value(json!(1)));
        let outcome = notifier.notify(&run, TriggerSource::Cron).await;

        assert!(matches!(outcome, NotifyOutcome::Failed(ref msg) if msg.contains("rejected")));
        // Attempted exactly once, never retried
        assert_eq!(provider.count().await, 1);
        assert_eq!(run.status, RunStatus::Completed);
    }
}
