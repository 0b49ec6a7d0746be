//! Serve command handler
//!
//! Handles the serve command including dry-run validation and engine startup.

use super::check::CheckCommandHandler;
use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::server::Server;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    /// Create a new serve command handler
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the serve command with optional dry-run support
    ///
    /// # Arguments
    /// * `dry_run` - If true, validates configuration and exits without starting the engine
    ///
    /// # Errors
    /// - Configuration or job validation errors
    /// - Engine startup errors (if not dry-run)
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            self.validate_only().await
        } else {
            Server::new(self.config.clone()).run().await?;
            Ok(())
        }
    }

    /// Validate configuration without starting the engine
    pub async fn validate_only(&self) -> AppResult<()> {
        CheckCommandHandler::new(self.config.clone()).execute().await?;

        println!(
            "✓ Engine {}, due one-shot jobs {} at startup",
            if self.config.engine.enabled { "enabled" } else { "disabled" },
            if self.config.engine.run_due_on_start { "run" } else { "skipped" },
        );
        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &Settings {
        &self.config
    }
}
