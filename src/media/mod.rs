//! Media-fetch collaborator
//!
//! The extraction, format negotiation, and transcoding work is delegated to an
//! external extractor. This module only defines the seam the worker talks to:
//!
//! - [`MediaFetcher::probe`] - metadata-only query, nothing downloaded
//! - [`MediaFetcher::fetch`] - download a single item to an output template
//!
//! [`YtDlp`] is the production implementation; tests substitute their own.

pub mod mock;
mod ytdlp;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use mock::MockFetcher;
pub use ytdlp::YtDlp;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to launch extractor: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),

    #[error("unreadable extractor output: {0}")]
    Parse(String),
}

/// Metadata returned by a probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub title: String,
    pub duration_seconds: Option<f64>,
}

/// Parameters for a download-mode call.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Output path template; the extractor substitutes `%(ext)s`.
    pub output_template: PathBuf,
    /// Target container the result is normalized to (e.g. `mp4`).
    pub container_format: String,
    /// Extractor format preference, best combined stream first.
    pub format_selector: String,
    /// Never expand a URL into multiple downloads.
    pub no_playlist: bool,
    /// Correlates progress log lines with the originating request.
    pub request_id: String,
}

/// Result of a completed fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMedia {
    pub title: String,
    pub output_path: Option<PathBuf>,
}

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeResult, MediaError>;

    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedMedia, MediaError>;
}
