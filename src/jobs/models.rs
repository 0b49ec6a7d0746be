use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::jobs::types::{RunResult, RunStatus};

/// Format of one-shot `run_at` timestamps, read as UTC
pub const RUN_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Job definitions
// ============================================================================

/// When a job runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Recurring, six-field cron expression with seconds
    Cron { expression: String },
    /// Once, not before the given `YYYY-MM-DD HH:MM:SS` instant
    RunAt { timestamp: String },
}

impl Schedule {
    pub fn cron(expression: impl Into<String>) -> Self {
        Schedule::Cron {
            expression: expression.into(),
        }
    }

    pub fn run_at(timestamp: impl Into<String>) -> Self {
        Schedule::RunAt {
            timestamp: timestamp.into(),
        }
    }

    /// Build a one-shot schedule from an instant
    pub fn run_at_instant(instant: Timestamp) -> Self {
        let civil = instant.to_zoned(TimeZone::UTC).datetime();
        Schedule::run_at(civil.strftime(RUN_AT_FORMAT).to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Schedule::Cron { .. } => "cron",
            Schedule::RunAt { .. } => "run_at",
        }
    }
}

/// Parse a one-shot timestamp in [`RUN_AT_FORMAT`]
pub fn parse_run_at(value: &str) -> Result<Timestamp, jiff::Error> {
    let civil = DateTime::strptime(RUN_AT_FORMAT, value.trim())?;
    Ok(civil.to_zoned(TimeZone::UTC)?.timestamp())
}

/// One task template in a job's chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TaskSpec {
    #[validate(length(min = 1, message = "task kind cannot be empty"))]
    pub kind: String,
    #[serde(default)]
    pub params: JsonValue,
}

impl TaskSpec {
    pub fn new(kind: impl Into<String>, params: JsonValue) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }
}

/// Immutable job definition: a schedule plus an ordered task chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct JobSpec {
    #[validate(length(min = 1, message = "job id cannot be empty"))]
    pub id: String,
    pub schedule: Schedule,
    #[validate(length(min = 1, message = "a job needs at least one task"), nested)]
    pub tasks: Vec<TaskSpec>,
}

impl JobSpec {
    pub fn new(id: impl Into<String>, schedule: Schedule, tasks: Vec<TaskSpec>) -> Self {
        Self {
            id: id.into(),
            schedule,
            tasks,
        }
    }

    /// Fresh run with one unstarted task run per template
    pub fn new_run(&self) -> JobRun {
        self.new_run_with(self.schedule.clone())
    }

    /// Fresh run whose schedule overrides the job's own
    pub fn new_run_with(&self, schedule: Schedule) -> JobRun {
        JobRun {
            id: Uuid::new_v4(),
            job_id: self.id.clone(),
            schedule,
            task_runs: self.tasks.iter().cloned().map(TaskRun::new).collect(),
            status: RunStatus::Unstarted,
            result: RunResult::empty(),
            created_at: Timestamp::now(),
            finished_at: None,
        }
    }
}

// ============================================================================
// Runs
// ============================================================================

/// One task's execution within a job run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRun {
    pub id: Uuid,
    pub task: TaskSpec,
    pub status: RunStatus,
    pub result: RunResult,
}

impl TaskRun {
    pub fn new(task: TaskSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            task,
            status: RunStatus::Unstarted,
            result: RunResult::empty(),
        }
    }

    /// Move to `next` if that is a forward transition
    pub fn advance(&mut self, next: RunStatus) -> bool {
        if self.status.can_advance_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    /// Record a runner's output; its status decides this task's status
    pub fn apply_result(&mut self, result: RunResult) {
        if self.status.is_terminal() {
            return;
        }
        self.advance(result.status);
        self.result = result;
    }

    /// Finalize a task that finished without error
    pub fn mark_completed(mut self) -> Self {
        if self.status.is_runnable() && self.advance(RunStatus::Completed) {
            self.result = self.result.mark_completed();
        }
        self
    }
}

/// One execution of a [`JobSpec`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRun {
    pub id: Uuid,
    pub job_id: String,
    pub schedule: Schedule,
    pub task_runs: Vec<TaskRun>,
    pub status: RunStatus,
    pub result: RunResult,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
}

impl JobRun {
    /// Index of the first task run not yet in a terminal state
    pub fn first_unfinished(&self) -> usize {
        self.task_runs
            .iter()
            .position(|tr| !tr.status.is_terminal())
            .unwrap_or(self.task_runs.len())
    }

    /// Suffix of task runs that still have to execute
    pub fn unfinished_task_runs(&self) -> &[TaskRun] {
        &self.task_runs[self.first_unfinished()..]
    }

    /// Result the next unfinished task receives as input
    pub fn carried_result(&self) -> RunResult {
        match self.first_unfinished() {
            0 => self
                .task_runs
                .first()
                .map(|tr| tr.result.clone())
                .unwrap_or_default(),
            offset => self.task_runs[offset - 1].result.clone(),
        }
    }

    pub fn all_tasks_completed(&self) -> bool {
        self.task_runs.iter().all(|tr| tr.status.is_completed())
    }

    /// Apply the last processed task's result to the run as a whole
    pub fn apply_result(&mut self, result: RunResult) {
        self.status = if result.has_error() {
            RunStatus::Errored
        } else if self.all_tasks_completed() {
            RunStatus::Completed
        } else {
            RunStatus::InProgress
        };
        self.result = RunResult {
            status: self.status,
            ..result
        };
        if self.status.is_terminal() {
            self.finished_at = Some(Timestamp::now());
        }
    }

    /// Error message of an errored run
    pub fn error_message(&self) -> Option<&str> {
        self.result.error_message.as_deref()
    }

    /// One-shot instant this run is gated on
    pub fn scheduled_instant(&self) -> Option<Result<Timestamp, jiff::Error>> {
        match &self.schedule {
            Schedule::RunAt { timestamp } => Some(parse_run_at(timestamp)),
            Schedule::Cron { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn three_task_job() -> JobSpec {
        JobSpec::new(
            "job-1",
            Schedule::cron("0 * * * * *"),
            vec![
                TaskSpec::new("constant", json!({ "value": 10 })),
                TaskSpec::new("multiply", json!({ "times": 2 })),
                TaskSpec::new("noop", JsonValue::Null),
            ],
        )
    }

    #[test]
    fn test_new_run_preserves_template_order() {
        let job = three_task_job();
        let run = job.new_run();

        assert_eq!(run.job_id, "job-1");
        assert_eq!(run.status, RunStatus::Unstarted);
        let kinds: Vec<_> = run.task_runs.iter().map(|tr| tr.task.kind.as_str()).collect();
        assert_eq!(kinds, vec!["constant", "multiply", "noop"]);
        assert!(run.task_runs.iter().all(|tr| tr.status == RunStatus::Unstarted));
    }

    #[test]
    fn test_new_run_with_overrides_schedule() {
        let job = three_task_job();
        let run = job.new_run_with(Schedule::run_at("2020-01-01 00:00:00"));
        assert_eq!(run.schedule, Schedule::run_at("2020-01-01 00:00:00"));
        assert_eq!(job.schedule, Schedule::cron("0 * * * * *"));
    }

    #[test]
    fn test_unfinished_suffix_and_carried_result() {
        let mut run = three_task_job().new_run();
        assert_eq!(run.unfinished_task_runs().len(), 3);
        assert_eq!(run.carried_result(), RunResult::empty());

        run.task_runs[0].apply_result(RunResult::with_value(json!(10)));
        run.task_runs[0] = run.task_runs[0].clone().mark_completed();

        assert_eq!(run.first_unfinished(), 1);
        assert_eq!(run.unfinished_task_runs().len(), 2);
        assert_eq!(run.carried_result().value(), Some(&json!(10)));
    }

    #[test]
    fn test_task_run_never_regresses() {
        let mut tr = TaskRun::new(TaskSpec::new("noop", JsonValue::Null));
        assert!(tr.advance(RunStatus::InProgress));
        tr.apply_result(RunResult::with_error("boom"));
        assert_eq!(tr.status, RunStatus::Errored);

        assert!(!tr.advance(RunStatus::InProgress));
        let tr = tr.mark_completed();
        assert_eq!(tr.status, RunStatus::Errored);
        assert_eq!(tr.result.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_apply_result_completed_only_when_chain_done() {
        let mut run = three_task_job().new_run();
        run.task_runs[0].apply_result(RunResult::with_value(json!(1)));
        run.task_runs[0] = run.task_runs[0].clone().mark_completed();

        run.apply_result(RunResult::with_value(json!(1)).mark_completed());
        assert_eq!(run.status, RunStatus::InProgress);
        assert!(run.finished_at.is_none());

        run.apply_result(RunResult::with_error("nope"));
        assert_eq!(run.status, RunStatus::Errored);
        assert_eq!(run.error_message(), Some("nope"));
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_parse_run_at() {
        let ts = parse_run_at("2024-03-01 12:30:00").unwrap();
        assert_eq!(ts.to_string(), "2024-03-01T12:30:00Z");

        assert!(parse_run_at("next tuesday").is_err());
        assert!(parse_run_at("2024-13-01 00:00:00").is_err());
    }

    #[test]
    fn test_run_at_instant_round_trips_through_format() {
        let instant: Timestamp = "2031-07-04T08:15:30Z".parse().unwrap();
        let schedule = Schedule::run_at_instant(instant);
        assert_eq!(schedule, Schedule::run_at("2031-07-04 08:15:30"));
    }

    #[test]
    fn test_job_spec_validation() {
        assert!(three_task_job().validate().is_ok());

        let empty = JobSpec::new("", Schedule::cron("* * * * * *"), vec![]);
        let errors = empty.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("id"));
        assert!(fields.contains_key("tasks"));
    }

    #[test]
    fn test_schedule_deserializes_tagged() {
        let schedule: Schedule =
            serde_json::from_value(json!({ "type": "run_at", "timestamp": "2024-01-01 00:00:00" }))
                .unwrap();
        assert_eq!(schedule.kind(), "run_at");
    }
}
