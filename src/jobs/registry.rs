use std::collections::HashMap;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::jobs::error::{JobError, JobResult};
use crate::jobs::models::{JobSpec, TaskSpec};
use crate::jobs::runners::{ConstantRunner, HttpGetRunner, JsonParseRunner, MultiplyRunner, NoopRunner};
use crate::jobs::types::TaskRunner;

type RunnerFactory = Box<dyn Fn(JsonValue) -> JobResult<Box<dyn TaskRunner>> + Send + Sync>;

/// Registry mapping task kinds to runner constructors
pub struct RunnerRegistry {
    factories: HashMap<String, RunnerFactory>,
}

impl RunnerRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in task kind
    pub fn with_builtin_runners() -> Self {
        let mut registry = Self::new();
        registry
            .register::<NoopRunner>()
            .register::<ConstantRunner>()
            .register::<MultiplyRunner>()
            .register::<JsonParseRunner>()
            .register::<HttpGetRunner>();
        registry
    }

    /// Register a runner type under its kind tag
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: TaskRunner + DeserializeOwned + 'static,
    {
        let factory: RunnerFactory = Box::new(|params: JsonValue| {
            // Kinds without parameters are written with no `params` at all
            let params = if params.is_null() {
                JsonValue::Object(Default::default())
            } else {
                params
            };
            let runner: T =
                serde_json::from_value(params).map_err(|e| JobError::InvalidTaskParams {
                    kind: T::kind().to_string(),
                    message: e.to_string(),
                })?;
            Ok(Box::new(runner) as Box<dyn TaskRunner>)
        });

        self.factories.insert(T::kind().to_string(), factory);
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Build the runner for a task specification
    pub fn resolve(&self, task: &TaskSpec) -> JobResult<Box<dyn TaskRunner>> {
        let factory = self
            .factories
            .get(&task.kind)
            .ok_or_else(|| JobError::UnknownTaskKind(task.kind.clone()))?;

        factory(task.params.clone())
    }

    /// Resolve every task of a job up front
    pub fn validate_job(&self, job: &JobSpec) -> JobResult<()> {
        for task in &job.tasks {
            self.resolve(task)?;
        }
        Ok(())
    }
}

impl Default for RunnerRegistry {
    fn default() -> Self {
        Self::with_builtin_runners()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::models::Schedule;
    use serde_json::json;

    #[test]
    fn test_builtin_kinds() {
        let registry = RunnerRegistry::with_builtin_runners();
        assert_eq!(
            registry.kinds(),
            vec!["constant", "http_get", "json_parse", "multiply", "noop"]
        );
    }

    #[test]
    fn test_resolve_unknown_kind() {
        let registry = RunnerRegistry::with_builtin_runners();
        let err = registry
            .resolve(&TaskSpec::new("ethtx", JsonValue::Null))
            .unwrap_err();
        assert!(matches!(err, JobError::UnknownTaskKind(ref kind) if kind == "ethtx"));
        assert_eq!(err.to_string(), "Unknown task kind: ethtx");
    }

    #[test]
    fn test_resolve_bad_params() {
        let registry = RunnerRegistry::with_builtin_runners();
        let err = registry
            .resolve(&TaskSpec::new("multiply", json!({ "times": "lots" })))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidTaskParams { ref kind, .. } if kind == "multiply"));
    }

    #[test]
    fn test_resolve_without_params() {
        let registry = RunnerRegistry::with_builtin_runners();
        assert!(registry.resolve(&TaskSpec::new("noop", JsonValue::Null)).is_ok());
    }

    #[test]
    fn test_validate_job() {
        let registry = RunnerRegistry::with_builtin_runners();
        let good = JobSpec::new(
            "good",
            Schedule::cron("0 * * * * *"),
            vec![TaskSpec::new("constant", json!({ "value": 1 }))],
        );
        assert!(registry.validate_job(&good).is_ok());

        let bad = JobSpec::new(
            "bad",
            Schedule::cron("0 * * * * *"),
            vec![
                TaskSpec::new("constant", json!({ "value": 1 })),
                TaskSpec::new("missing", JsonValue::Null),
            ],
        );
        assert!(registry.validate_job(&bad).is_err());
    }
}
