use crate::config::error::ConfigError;
use crate::jobs::JobError;
use thiserror::Error;

/// Application-wide error type.
///
/// Job-layer and configuration errors convert into it automatically, and
/// anything unexpected is carried as an `anyhow` source.
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Job engine error
    #[error(transparent)]
    Job(#[from] JobError),

    /// Settlement submission was rejected or could not be delivered
    #[error("Settlement via {provider} failed: {message}")]
    Settlement { provider: String, message: String },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn settlement(provider: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Settlement {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "settings".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::from(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
