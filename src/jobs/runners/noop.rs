use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::jobs::types::{RunResult, TaskRunner};

/// Passes its input through unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoopRunner {}

#[async_trait]
impl TaskRunner for NoopRunner {
    fn kind() -> &'static str
    where
        Self: Sized,
    {
        "noop"
    }

    async fn perform(&self, input: RunResult) -> RunResult {
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_noop_passes_input_through() {
        let input = RunResult::with_value(json!({ "price": "1.23" }));
        assert_eq!(NoopRunner {}.perform(input.clone()).await, input);
    }
}
