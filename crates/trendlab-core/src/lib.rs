//! Shared foundation for the trendlab workspace.
//!
//! Holds the domain model every crate speaks, the collaborator ports the
//! engine is written against, environment-driven application configuration,
//! the business-context file, and per-source usage counters. This crate has
//! no I/O of its own beyond reading config files.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod context;
pub mod model;
pub mod ports;
pub mod usage;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use context::{load_business_context, BusinessContext, Pillar};
pub use usage::{SourceUsage, UsageSnapshot};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read business context file {path}: {source}")]
    ContextFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse business context file: {0}")]
    ContextFileParse(#[source] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}
