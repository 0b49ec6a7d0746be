use crate::jobs::models::TaskRun;
use crate::jobs::registry::RunnerRegistry;
use crate::jobs::types::{RunResult, RunStatus};

/// Resolve a task run's runner and perform it against `input`.
///
/// Only `task_run` is mutated. A resolution failure errors the task without
/// invoking anything; otherwise the runner's output decides the terminal
/// status.
pub async fn start_task(registry: &RunnerRegistry, mut task_run: TaskRun, input: RunResult) -> TaskRun {
    let runner = match registry.resolve(&task_run.task) {
        Ok(runner) => runner,
        Err(e) => {
            tracing::warn!(
                task_run_id = %task_run.id,
                task_kind = %task_run.task.kind,
                error = %e,
                "Task runner resolution failed"
            );
            task_run.advance(RunStatus::Errored);
            task_run.result = RunResult::with_error(e.to_string());
            return task_run;
        }
    };

    task_run.advance(RunStatus::InProgress);
    let output = runner.perform(input).await;
    task_run.apply_result(output);
    task_run
}
