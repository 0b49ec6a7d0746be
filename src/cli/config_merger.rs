//! Configuration merger for CLI arguments and config files
//!
//! This module handles merging CLI argument overrides with file-based configuration,
//! implementing the configuration precedence logic.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, settings::Settings};
use std::path::Path;

/// Configuration merger that handles CLI argument integration with file-based configuration
///
/// CLI arguments override configuration file values.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    /// Create a new configuration merger with base configuration
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration for `cli`
    ///
    /// `--config` selects a single file; otherwise the layered loader runs,
    /// with `--env` taking precedence over `ORACLE_APP_ENV`.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let environment = cli.env.clone().map(Environment::from);
        Self::from_config_path(cli.config.as_deref(), environment)
    }

    /// Create a configuration merger by loading configuration from the specified path or default loader
    ///
    /// # Errors
    /// Returns ConfigError if configuration loading or validation fails
    pub fn from_config_path(
        config_path: Option<&Path>,
        environment: Option<Environment>,
    ) -> Result<Self, ConfigError> {
        let loader = if let Some(path) = config_path {
            Self::validate_config_file_access(path)?;
            ConfigLoader::for_file(path)
        } else {
            ConfigLoader::new()?
        };

        let loader = match environment {
            Some(environment) => loader.with_environment(environment),
            None => loader,
        };

        Ok(Self::new(loader.load()?))
    }

    /// Validate that the configuration file is accessible and readable
    fn validate_config_file_access(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ValidationError {
                field: "config_file".to_string(),
                message: format!("Configuration file does not exist: '{}'", path.display()),
            });
        }

        if !path.is_file() {
            return Err(ConfigError::ValidationError {
                field: "config_file".to_string(),
                message: format!("Configuration path is not a file: '{}'", path.display()),
            });
        }

        match std::fs::File::open(path) {
            Ok(_) => Ok(()),
            Err(e) => Err(ConfigError::ValidationError {
                field: "config_file".to_string(),
                message: format!("Cannot read configuration file '{}': {}", path.display(), e),
            }),
        }
    }

    /// Merge CLI arguments with the base configuration
    ///
    /// CLI arguments have highest priority; the loaded configuration is the base.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        self.apply_global_overrides(&mut config, cli);

        if let Some(ref command) = cli.command {
            self.apply_command_overrides(&mut config, command);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply global CLI argument overrides
    fn apply_global_overrides(&self, config: &mut Settings, cli: &Cli) {
        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }
    }

    /// Apply command-specific CLI argument overrides
    fn apply_command_overrides(&self, config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve { log_level, .. } => {
                // Takes precedence over --verbose/--quiet
                if let Some(level) = log_level {
                    config.logger.level = level.clone().into();
                }
            }
            Commands::Check => {}
        }
    }

    /// Get the current configuration (useful for inspection)
    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parser::Cli;
    use crate::jobs::{JobSpec, Schedule, TaskSpec};
    use clap::Parser;
    use serde_json::json;

    #[test]
    fn test_configuration_merger_new() {
        let base_config = Settings::default();
        let merger = ConfigurationMerger::new(base_config.clone());
        assert_eq!(merger.config(), &base_config);
    }

    #[test]
    fn test_configuration_merger_merge_verbose_flag() {
        let merger = ConfigurationMerger::new(Settings::default());

        let cli = Cli::try_parse_from(["oracle-rs", "--verbose"]).unwrap();
        let merged_config = merger.merge_cli_args(&cli).unwrap();

        assert_eq!(merged_config.logger.level, "debug");
    }

    #[test]
    fn test_configuration_merger_merge_quiet_flag() {
        let merger = ConfigurationMerger::new(Settings::default());

        let cli = Cli::try_parse_from(["oracle-rs", "--quiet", "check"]).unwrap();
        let merged_config = merger.merge_cli_args(&cli).unwrap();

        assert_eq!(merged_config.logger.level, "error");
    }

    #[test]
    fn test_configuration_merger_command_log_level_overrides_global() {
        let merger = ConfigurationMerger::new(Settings::default());

        let cli = Cli::try_parse_from(["oracle-rs", "--verbose", "serve", "--log-level", "warn"])
            .unwrap();
        let merged_config = merger.merge_cli_args(&cli).unwrap();

        assert_eq!(merged_config.logger.level, "warn");
    }

    #[test]
    fn test_configuration_merger_revalidates() {
        let duplicate = JobSpec::new(
            "dup",
            Schedule::cron("0 * * * * *"),
            vec![TaskSpec::new("noop", json!(null))],
        );
        let merger = ConfigurationMerger::new(Settings {
            jobs: vec![duplicate.clone(), duplicate],
            ..Default::default()
        });

        let cli = Cli::try_parse_from(["oracle-rs", "serve"]).unwrap();
        assert!(merger.merge_cli_args(&cli).is_err());
    }

    #[test]
    fn test_from_config_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let result = ConfigurationMerger::from_config_path(Some(&path), None);
        assert!(matches!(result, Err(ConfigError::ValidationError { field, .. }) if field == "config_file"));
    }
}
