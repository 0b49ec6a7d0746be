//! Oracle-RS Library
//!
//! Scheduled oracle job engine: task chains executed on cron schedules or at
//! a fixed instant, with completed results handed to a settlement provider.

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod error;
pub mod external;
pub mod jobs;
pub mod logger;
pub mod server;
pub mod settlement;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
