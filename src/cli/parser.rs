//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Scheduled oracle job engine
#[derive(Parser, Debug)]
#[command(name = "oracle-rs")]
#[command(about = "Scheduled oracle job engine")]
#[command(long_about = "
oracle-rs runs chains of oracle tasks (fetch, parse, transform) on cron
schedules or at a fixed instant, and hands every completed result to a
settlement provider.

EXAMPLES:
    # Run the engine with the layered configuration in ./config
    oracle-rs serve

    # Use a single configuration file
    oracle-rs --config /path/to/config.toml serve

    # Run with production settings and debug logging
    oracle-rs --env production serve --log-level debug

    # Validate configuration and every job definition, then exit
    oracle-rs check
    oracle-rs serve --dry-run

For more information about configuration options, see the documentation.
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered configuration
    /// directory. The file must exist and be readable.
    ///
    /// Example: --config /etc/oracle-rs/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `{environment}.toml` layer is loaded.
    ///
    /// Available values: development (dev), staging (stage), production (prod), test
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    ///
    /// Increases log output to debug level. Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Reduces log output to error level only. Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the job engine (default)
    ///
    /// Registers every configured cron job, executes due one-shot jobs, arms
    /// the rest, and runs until Ctrl+C or SIGTERM.
    ///
    /// Examples:
    ///   oracle-rs serve                    # Start with defaults
    ///   oracle-rs serve --log-level trace  # Trace every task run
    ///   oracle-rs serve --dry-run          # Validate config without starting
    Serve {
        /// Log level override
        ///
        /// Overrides both configuration file settings and global --verbose/--quiet flags.
        ///
        /// Available levels: error, warn, info, debug, trace
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        ///
        /// Returns exit code 0 if valid, non-zero if invalid.
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate configuration and job definitions
    ///
    /// Loads the configuration, then checks that every job's schedule parses
    /// and every task kind resolves with its parameters.
    Check,
}

/// Environment options
#[derive(ValueEnum, Clone, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
    #[value(name = "test")]
    Test,
}

/// Log level options
#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Validate argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        if let Some(Commands::Serve { log_level: Some(_), .. }) = self.command
            && self.quiet
        {
            return Err("Cannot use --quiet together with serve --log-level".to_string());
        }

        Ok(())
    }

    /// Get detailed help for validation errors
    pub fn get_validation_help() -> &'static str {
        r#"
Common validation errors and solutions:

Configuration file validation:
  - File must exist and be readable
  - File must be in TOML format
  - Example: --config /path/to/config.toml

Job validation:
  - Cron expressions have six fields, seconds first: "0 */5 * * * *"
  - One-shot timestamps use YYYY-MM-DD HH:MM:SS in UTC
  - Every task kind must be one of: constant, http_get, json_parse, multiply, noop

For more help, use: oracle-rs help <subcommand>
"#
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
            Environment::Test => crate::config::Environment::Test,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_flag() {
        let result = Cli::try_parse_from(["oracle-rs", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["oracle-rs", "--version"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["oracle-rs"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from(["oracle-rs", "serve", "--log-level", "warning", "--dry-run"])
            .unwrap();
        if let Some(Commands::Serve { log_level, dry_run }) = cli.command {
            assert!(matches!(log_level, Some(LogLevel::Warn)));
            assert!(dry_run);
        } else {
            panic!("Expected Serve command");
        }
    }

    #[test]
    fn test_check_command() {
        let cli = Cli::try_parse_from(["oracle-rs", "--env", "prod", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
        assert!(matches!(cli.env, Some(Environment::Production)));
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let result = Cli::try_parse_from(["oracle-rs", "--verbose", "--quiet"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_quiet_with_log_level_rejected() {
        let cli = Cli::try_parse_from(["oracle-rs", "--quiet", "serve", "--log-level", "debug"])
            .unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_environment_conversion() {
        let env: crate::config::Environment = Environment::Staging.into();
        assert_eq!(env, crate::config::Environment::Staging);
    }
}
