//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use std::collections::HashSet;

use validator::Validate;

use crate::config::error::ConfigError;
use crate::config::settings::{
    FileSettings, LoggerSettings, SettlementProviderKind, SettlementSettings, Settings,
};
use crate::jobs::{JobSpec, Schedule, models::parse_run_at};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl FileSettings {
    /// Validate file settings
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()?;

        Ok(())
    }
}

impl SettlementSettings {
    /// Validate settlement settings
    ///
    /// The webhook block is only checked when the webhook provider is
    /// selected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider != SettlementProviderKind::Webhook {
            return Ok(());
        }

        let url = self.webhook.url.trim();
        if url.is_empty() {
            return Err(ConfigError::validation(
                "settlement.webhook.url",
                "Webhook URL is required when the webhook provider is selected.",
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::ValidationError {
                field: "settlement.webhook.url".to_string(),
                message: format!("Webhook URL must use http or https: {}", url),
            });
        }
        if self.webhook.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "settlement.webhook.timeout_seconds",
                "Webhook timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

/// Shape checks for one job; task kinds are checked against the runner
/// registry at registration time.
fn validate_job(index: usize, job: &JobSpec) -> Result<(), ConfigError> {
    job.validate()
        .map_err(|e| ConfigError::job(index, "", e.to_string()))?;

    match &job.schedule {
        Schedule::Cron { expression } if expression.trim().is_empty() => Err(ConfigError::job(
            index,
            ".schedule.expression",
            format!("Job '{}' has an empty cron expression.", job.id),
        )),
        Schedule::RunAt { timestamp } => parse_run_at(timestamp).map(|_| ()).map_err(|e| {
            ConfigError::job(
                index,
                ".schedule.timestamp",
                format!(
                    "Job '{}' has an invalid timestamp '{}': {}. Expected YYYY-MM-DD HH:MM:SS (UTC).",
                    job.id, timestamp, e
                ),
            )
        }),
        Schedule::Cron { .. } => Ok(()),
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// This method validates all sub-configurations and returns the first
    /// validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logger.validate()?;
        self.settlement.validate()?;

        let mut seen = HashSet::new();
        for (index, job) in self.jobs.iter().enumerate() {
            validate_job(index, job)?;
            if !seen.insert(job.id.as_str()) {
                return Err(ConfigError::job(
                    index,
                    ".id",
                    format!("Duplicate job id '{}'.", job.id),
                ));
            }
        }

        Ok(())
    }
}
