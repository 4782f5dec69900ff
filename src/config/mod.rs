//! Configuration management for tubefetch
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//!
//! # Usage
//!
//! ```no_run
//! use tubefetch::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Gate capacity: {}", config.downloads.max_concurrent);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `TUBEFETCH__<section>__<key>`:
//! - `TUBEFETCH__SERVER__BIND_ADDR=127.0.0.1:9000`
//! - `TUBEFETCH__DOWNLOADS__MAX_CONCURRENT=5`
//! - `TUBEFETCH__MEDIA__BINARY=/opt/yt-dlp`
//!
//! # Configuration File
//!
//! Read from `config/tubefetch.toml` unless `TUBEFETCH_CONFIG` points elsewhere.

mod models;
mod sources;
mod validation;

pub use models::{Config, DownloadConfig, MediaConfig, ServerConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment) and validate it.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path and validate it.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
