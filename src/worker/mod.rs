//! Download dispatch worker
//!
//! Runs accepted requests in the background: acquire a gate slot, probe,
//! enforce the duration ceiling, derive a unique output name, fetch, release.
//! Outcomes never reach the original caller; they are logged and counted.

pub mod filename;
mod runner;

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::media::MediaError;

pub use runner::{DEFAULT_FORMAT_SELECTOR, Dispatcher};

const UNEXPECTED_MESSAGE: &str =
    "An unexpected error occurred during download. Please try again later.";

/// One accepted submission. Immutable once created.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub request_id: String,
    pub client_address: String,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, client_address: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_id: new_request_id(),
            client_address: client_address.into(),
        }
    }
}

/// Short id used to correlate log lines of one request.
pub fn new_request_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to fetch video info: {0}")]
    ProbeFailed(#[source] MediaError),

    #[error("video duration ({actual}s) exceeds the allowed limit ({limit}s)")]
    DurationExceeded { actual: u64, limit: u64 },

    #[error("failed to download video: {0}")]
    FetchFailed(#[source] MediaError),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl DispatchError {
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::ProbeFailed(_) => "PROBE_FAILED",
            DispatchError::DurationExceeded { .. } => "DURATION_EXCEEDED",
            DispatchError::FetchFailed(_) => "FETCH_FAILED",
            DispatchError::Unexpected(_) => "UNEXPECTED_FAILURE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// Result of one dispatch, recorded server-side only.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl DownloadOutcome {
    pub fn success(title: String, output_path: Option<PathBuf>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: format!("Successfully downloaded {title}"),
            error_kind: None,
            title: Some(title),
            output_path,
        }
    }

    pub fn failure(err: &DispatchError) -> Self {
        // internals of unexpected failures stay in the server log
        let message = match err {
            DispatchError::Unexpected(_) => UNEXPECTED_MESSAGE.to_string(),
            other => other.to_string(),
        };
        Self {
            status: OutcomeStatus::Error,
            message,
            error_kind: Some(err.kind()),
            title: None,
            output_path: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}
