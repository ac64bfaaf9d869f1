//! Tululu-Harvest: a resilient catalog harvester
//!
//! This crate walks the paginated catalog of an online library, resolves every
//! catalog entry to a book record, and downloads the book text and cover image,
//! tolerating transient network failures and telling "book does not exist"
//! apart from "request failed".

pub mod config;
pub mod crawler;
pub mod output;

use thiserror::Error;

/// Main error type for Tululu-Harvest operations
///
/// Per-item failures never surface here: they are reported as
/// [`crawler::SkipReason`] values inside the run report.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Tululu-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_harvest, HarvestReport, Harvester, SkipReason};
