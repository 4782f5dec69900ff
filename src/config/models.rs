use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::worker::DEFAULT_FORMAT_SELECTOR;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub downloads: DownloadConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

/// Download admission and output settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Created at startup if absent
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Gate capacity (K)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Longer media is rejected before any data is fetched
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
    #[serde(default = "default_container_format")]
    pub container_format: String,
    #[serde(default = "default_format_selector")]
    pub format_selector: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_concurrent: default_max_concurrent(),
            max_duration_secs: default_max_duration_secs(),
            container_format: default_container_format(),
            format_selector: default_format_selector(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_max_concurrent() -> usize {
    3
}

fn default_max_duration_secs() -> u64 {
    3600 // 1 hour
}

fn default_container_format() -> String {
    "mp4".to_string()
}

fn default_format_selector() -> String {
    DEFAULT_FORMAT_SELECTOR.to_string()
}

/// External extractor settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
        }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8000");
        assert_eq!(config.downloads.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.downloads.max_concurrent, 3);
        assert_eq!(config.downloads.max_duration_secs, 3600);
        assert_eq!(config.downloads.container_format, "mp4");
        assert_eq!(config.media.binary, PathBuf::from("yt-dlp"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[downloads]
max_concurrent = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.downloads.max_concurrent, 5);
        assert_eq!(config.downloads.max_duration_secs, 3600);
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8000");
    }
}
