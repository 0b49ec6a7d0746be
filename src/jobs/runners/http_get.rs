use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::external::client::HTTP_CLIENT;
use crate::jobs::types::{RunResult, TaskRunner};

/// Fetches a URL and emits the response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpGetRunner {
    pub url: String,
}

impl HttpGetRunner {
    async fn fetch(&self) -> Result<JsonValue, String> {
        let response = HTTP_CLIENT
            .get(&self.url)
            .send()
            .await
            .map_err(|e| format!("GET {} failed: {}", self.url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("GET {} body unreadable: {}", self.url, e))?;

        if !status.is_success() {
            return Err(format!("GET {} returned {}: {}", self.url, status, body));
        }

        Ok(serde_json::from_str(&body).unwrap_or(JsonValue::String(body)))
    }
}

#[async_trait]
impl TaskRunner for HttpGetRunner {
    fn kind() -> &'static str
    where
        Self: Sized,
    {
        "http_get"
    }

    async fn perform(&self, _input: RunResult) -> RunResult {
        tracing::debug!(url = %self.url, "Fetching task input");
        match self.fetch().await {
            Ok(body) => RunResult::with_value(body),
            Err(message) => RunResult::with_error(message),
        }
    }
}
