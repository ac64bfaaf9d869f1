//! Configuration module for Tululu-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The resulting [`Config`] is passed explicitly into every component at
//! construction; nothing reads configuration from global state.
//!
//! # Example
//!
//! ```no_run
//! use tululu_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Walking category {} from page {}", config.site.category, config.pages.start);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DownloadConfig, HttpConfig, ImageFailurePolicy, OutputConfig, PagesConfig,
    RetryConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
