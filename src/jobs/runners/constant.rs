use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::jobs::types::{RunResult, TaskRunner};

/// Emits a fixed value, ignoring its input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantRunner {
    pub value: JsonValue,
}

#[async_trait]
impl TaskRunner for ConstantRunner {
    fn kind() -> &'static str
    where
        Self: Sized,
    {
        "constant"
    }

    async fn perform(&self, _input: RunResult) -> RunResult {
        RunResult::with_value(self.value.clone())
    }
}
