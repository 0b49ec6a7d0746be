use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Status shared by job runs and task runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Unstarted,
    InProgress,
    Completed,
    Errored,
}

impl RunStatus {
    /// Completed and Errored never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Errored)
    }

    /// A run that has not failed or finished can still be marked completed
    pub fn is_runnable(&self) -> bool {
        matches!(self, RunStatus::Unstarted | RunStatus::InProgress)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, RunStatus::Errored)
    }

    fn rank(&self) -> u8 {
        match self {
            RunStatus::Unstarted => 0,
            RunStatus::InProgress => 1,
            RunStatus::Completed | RunStatus::Errored => 2,
        }
    }

    /// Whether moving from `self` to `next` is a forward transition
    pub fn can_advance_to(&self, next: RunStatus) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Unstarted => write!(f, "unstarted"),
            RunStatus::InProgress => write!(f, "in_progress"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Errored => write!(f, "errored"),
        }
    }
}

/// Payload produced by a task and carried into the next one.
///
/// Holds either a value or an error message. Use the constructors rather than
/// filling the fields by hand so the two never coexist.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RunResult {
    /// Seed input for the first task of a chain
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_value(value: JsonValue) -> Self {
        Self {
            status: RunStatus::InProgress,
            data: Some(value),
            error_message: None,
        }
    }

    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Errored,
            data: None,
            error_message: Some(message.into()),
        }
    }

    pub fn has_error(&self) -> bool {
        self.status.is_errored()
    }

    pub fn value(&self) -> Option<&JsonValue> {
        self.data.as_ref()
    }

    /// Mark a non-errored result as completed
    pub fn mark_completed(mut self) -> Self {
        if self.status.is_runnable() {
            self.status = RunStatus::Completed;
        }
        self
    }
}

/// Capability every task kind implements
#[async_trait]
pub trait TaskRunner: Send + Sync + std::fmt::Debug {
    /// Kind tag this runner is registered under
    fn kind() -> &'static str
    where
        Self: Sized;

    /// Run the task against the upstream result
    async fn perform(&self, input: RunResult) -> RunResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_predicates() {
        assert!(!RunStatus::Unstarted.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Errored.is_terminal());

        assert!(RunStatus::InProgress.is_runnable());
        assert!(!RunStatus::Errored.is_runnable());
        assert!(!RunStatus::Completed.is_runnable());
    }

    #[test]
    fn test_status_only_advances() {
        assert!(RunStatus::Unstarted.can_advance_to(RunStatus::InProgress));
        assert!(RunStatus::InProgress.can_advance_to(RunStatus::Completed));
        assert!(RunStatus::Unstarted.can_advance_to(RunStatus::Errored));
        assert!(!RunStatus::InProgress.can_advance_to(RunStatus::Unstarted));
        assert!(!RunStatus::Completed.can_advance_to(RunStatus::Errored));
        assert!(!RunStatus::Errored.can_advance_to(RunStatus::Completed));
    }

    #[test]
    fn test_result_constructors_never_mix() {
        let ok = RunResult::with_value(json!(10));
        assert_eq!(ok.value(), Some(&json!(10)));
        assert!(ok.error_message.is_none());
        assert!(!ok.has_error());

        let err = RunResult::with_error("rate limit");
        assert!(err.data.is_none());
        assert_eq!(err.error_message.as_deref(), Some("rate limit"));
        assert!(err.has_error());
    }

    #[test]
    fn test_mark_completed_keeps_errors() {
        assert_eq!(
            RunResult::with_value(json!(1)).mark_completed().status,
            RunStatus::Completed
        );
        assert_eq!(
            RunResult::with_error("boom").mark_completed().status,
            RunStatus::Errored
        );
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&RunStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
