//! Check command handler
//!
//! Validates the loaded configuration and every job definition without
//! installing anything.

use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::jobs::RunnerRegistry;
use crate::jobs::scheduler::check_job;

/// Handler for the check command
pub struct CheckCommandHandler {
    config: Settings,
    registry: RunnerRegistry,
}

impl CheckCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self {
            config,
            registry: RunnerRegistry::with_builtin_runners(),
        }
    }

    /// Validate configuration, then every configured job
    ///
    /// Every job is checked so all problems are reported in one pass; the
    /// call fails if any job failed.
    pub async fn execute(&self) -> AppResult<()> {
        self.config.validate()?;
        println!("✓ Configuration is valid");
        println!("✓ Settlement provider: {:?}", self.config.settlement.provider);

        let failures = self.check_jobs();
        if failures > 0 {
            println!("  Available task kinds: {}", self.registry.kinds().join(", "));
            return Err(AppError::Validation {
                field: "jobs".to_string(),
                reason: format!(
                    "{} of {} job(s) failed validation",
                    failures,
                    self.config.jobs.len()
                ),
            });
        }

        println!("✓ {} job(s) validated", self.config.jobs.len());
        Ok(())
    }

    fn check_jobs(&self) -> usize {
        let mut failures = 0;
        for job in &self.config.jobs {
            match check_job(&self.registry, job) {
                Ok(()) => println!(
                    "✓ Job '{}' ({}, {} task(s))",
                    job.id,
                    job.schedule.kind(),
                    job.tasks.len()
                ),
                Err(e) => {
                    failures += 1;
                    println!("✗ Job '{}': {}", job.id, e);
                }
            }
        }
        failures
    }

    /// Get the configuration
    pub fn config(&self) -> &Settings {
        &self.config
    }
}
