//! Webhook settlement provider implementation.
//!
//! Posts completed runs to a configured URL using the global `HTTP_CLIENT`.

use super::provider::{SettlementPayload, SettlementProvider, SettlementReceipt};
use crate::config::settings::WebhookSettings;
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;
use crate::jobs::JobRun;
use async_trait::async_trait;
use reqwest::{Method, Url};
use std::time::{Duration, Instant};

/// Webhook settlement provider
///
/// Sends the [`SettlementPayload`] of a completed run as JSON. Any non-2xx
/// response counts as a rejected submission.
pub struct WebhookProvider {
    config: WebhookSettings,
}

impl WebhookProvider {
    pub fn new(config: WebhookSettings) -> Self {
        Self { config }
    }

    /// Parses HTTP method string into reqwest Method
    fn parse_method(&self) -> AppResult<Method> {
        self.config
            .method
            .to_uppercase()
            .parse()
            .map_err(|_| AppError::Validation {
                field: "settlement.webhook.method".to_string(),
                reason: format!("Invalid HTTP method: {}", self.config.method),
            })
    }
}

#[async_trait]
impl SettlementProvider for WebhookProvider {
    async fn submit(&self, run: &JobRun) -> AppResult<SettlementReceipt> {
        let start = Instant::now();

        let method = self.parse_method()?;
        let mut request = HTTP_CLIENT
            .request(method, &self.config.url)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .json(&SettlementPayload::from(run));

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::settlement(self.name(), e.to_string()))?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let status = response.status();
        let body = response.text().await.ok();

        if !status.is_success() {
            return Err(AppError::settlement(
                self.name(),
                format!(
                    "endpoint returned {}: {}",
                    status,
                    body.as_deref().unwrap_or_default()
                ),
            ));
        }

        Ok(SettlementReceipt {
            provider: self.name().to_string(),
            status_code: Some(status.as_u16()),
            response: body,
            duration_ms,
        })
    }

    fn name(&self) -> &'static str {
        "webhook"
    }

    /// Checks that the URL is http(s) and the method parses
    async fn validate_config(&self) -> AppResult<()> {
        let url = Url::parse(&self.config.url).map_err(|_| AppError::Validation {
            field: "settlement.webhook.url".to_string(),
            reason: "Invalid URL format".to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Validation {
                field: "settlement.webhook.url".to_string(),
                reason: "Only HTTP and HTTPS URLs are allowed".to_string(),
            });
        }

        self.parse_method()?;

        Ok(())
    }
}
