//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{CheckCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};

/// Execute a CLI command with the given settings
///
/// A missing subcommand runs `serve`.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
        Some(Commands::Check) => CheckCommandHandler::new(settings).execute().await,
    }
}

/// Validate command arguments before execution
fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|msg| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason: msg,
    })
}
