//! Process-level plumbing shared by BloodLink binaries: layered
//! configuration and logging setup.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{default_logging_config, AppConfig, AppSection, CliArgs, LoggingConfig, Section};
