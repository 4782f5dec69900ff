use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "TUBEFETCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/tubefetch.toml";
const ENV_PREFIX: &str = "TUBEFETCH";
const ENV_SEPARATOR: &str = "__";

/// Path of the TOML file: `TUBEFETCH_CONFIG` or the default location.
pub fn default_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    load_from_sources(default_path())
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // TUBEFETCH__DOWNLOADS__MAX_CONCURRENT -> downloads.max_concurrent
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.downloads.max_concurrent, 3);
        assert_eq!(config.downloads.max_duration_secs, 3600);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "127.0.0.1:9000"

[downloads]
download_dir = "/srv/videos"
max_concurrent = 8
max_duration_secs = 600
container_format = "mkv"

[media]
binary = "/usr/local/bin/yt-dlp"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.downloads.download_dir, PathBuf::from("/srv/videos"));
        assert_eq!(config.downloads.max_concurrent, 8);
        assert_eq!(config.downloads.max_duration_secs, 600);
        assert_eq!(config.downloads.container_format, "mkv");
        assert_eq!(config.media.binary, PathBuf::from("/usr/local/bin/yt-dlp"));
    }

    // Environment overrides are not exercised here: mutating process env is
    // unsafe under edition 2024 and races with parallel tests.
}
