use std::sync::Arc;

use crate::jobs::dispatcher::start_task;
use crate::jobs::models::JobRun;
use crate::jobs::registry::RunnerRegistry;
use crate::jobs::types::RunStatus;

/// Drives a job run through its task chain
#[derive(Clone)]
pub struct JobRunExecutor {
    registry: Arc<RunnerRegistry>,
}

impl JobRunExecutor {
    pub fn new(registry: Arc<RunnerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RunnerRegistry {
        &self.registry
    }

    /// Execute every unfinished task in order, stopping at the first error.
    ///
    /// Runs that are already terminal, or have nothing left to execute, come
    /// back unchanged.
    pub async fn execute(&self, mut job_run: JobRun) -> JobRun {
        if job_run.status.is_terminal() {
            tracing::debug!(run_id = %job_run.id, status = %job_run.status, "Job run already finished");
            return job_run;
        }

        let offset = job_run.first_unfinished();
        if offset == job_run.task_runs.len() {
            return job_run;
        }

        job_run.status = RunStatus::InProgress;
        tracing::info!(run_id = %job_run.id, job_id = %job_run.job_id, "Starting job run");

        let mut carried = job_run.carried_result();
        for index in offset..job_run.task_runs.len() {
            let task_run = job_run.task_runs[index].clone();
            let task_run_id = task_run.id;
            tracing::debug!(run_id = %job_run.id, %task_run_id, task_kind = %task_run.task.kind, "Starting task run");

            let task_run = start_task(&self.registry, task_run, carried).await.mark_completed();
            carried = task_run.result.clone();
            let status = task_run.status;
            job_run.task_runs[index] = task_run;

            if carried.has_error() {
                tracing::debug!(
                    run_id = %job_run.id,
                    %task_run_id,
                    error = carried.error_message.as_deref().unwrap_or_default(),
                    "Task run errored, skipping remaining tasks"
                );
                break;
            }
            tracing::debug!(run_id = %job_run.id, %task_run_id, %status, "Finished task run");
        }

        job_run.apply_result(carried);
        job_run
    }
}
