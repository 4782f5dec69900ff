//! Wire models for the HTTP surface.
//!
//! `POST /download` takes a form-encoded [`DownloadForm`] and always answers
//! with a [`StatusResponse`]:
//!
//! ```json
//! { "status": "processing", "message": "Download initiated for ..." }
//! ```
//!
//! The eventual download outcome is never reported back; `processing` only
//! means the request was admitted.

use serde::{Deserialize, Serialize};

use crate::observability::MetricsSnapshot;

#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    pub youtube_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Processing,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: ResponseStatus,
    pub message: String,
}

impl StatusResponse {
    pub fn processing(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Processing,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GateStatus {
    pub capacity: usize,
    pub in_use: usize,
    pub max_duration_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub downloads: GateStatus,
    pub metrics: MetricsSnapshot,
}
