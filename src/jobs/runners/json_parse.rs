use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::jobs::types::{RunResult, TaskRunner};

/// Walks a key path into JSON input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonParseRunner {
    pub path: Vec<String>,
}

impl JsonParseRunner {
    fn extract(&self, input: &JsonValue) -> Result<JsonValue, String> {
        // Raw HTTP bodies arrive as strings
        let parsed;
        let mut current = match input {
            JsonValue::String(s) => {
                parsed = serde_json::from_str::<JsonValue>(s)
                    .map_err(|e| format!("input is not valid JSON: {}", e))?;
                &parsed
            }
            other => other,
        };

        for key in &self.path {
            let next = match current {
                JsonValue::Object(map) => map.get(key),
                JsonValue::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| {
                format!("no value at path '{}' (missing '{}')", self.path.join("."), key)
            })?;
        }

        Ok(current.clone())
    }
}

#[async_trait]
impl TaskRunner for JsonParseRunner {
    fn kind() -> &'static str
    where
        Self: Sized,
    {
        "json_parse"
    }

    async fn perform(&self, input: RunResult) -> RunResult {
        let Some(value) = input.value() else {
            return RunResult::with_error("json_parse requires an input value");
        };

        match self.extract(value) {
            Ok(found) => RunResult::with_value(found),
            Err(message) => RunResult::with_error(message),
        }
    }
}
