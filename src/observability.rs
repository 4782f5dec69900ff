//! Observability (in-process counters, tracing setup)

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    requests_accepted: AtomicU64,
    rejected_invalid: AtomicU64,
    rejected_saturated: AtomicU64,
    downloads_succeeded: AtomicU64,
    downloads_failed: AtomicU64,
}

impl Metrics {
    pub fn request_accepted(&self) {
        self.requests_accepted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "requests_accepted", "Metric incremented");
    }

    pub fn rejected_invalid(&self) {
        self.rejected_invalid.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "rejected_invalid", "Metric incremented");
    }

    pub fn rejected_saturated(&self) {
        self.rejected_saturated.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "rejected_saturated", "Metric incremented");
    }

    pub fn download_succeeded(&self) {
        self.downloads_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "downloads_succeeded", "Metric incremented");
    }

    pub fn download_failed(&self) {
        self.downloads_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "downloads_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_accepted: self.requests_accepted.load(Ordering::Relaxed),
            rejected_invalid: self.rejected_invalid.load(Ordering::Relaxed),
            rejected_saturated: self.rejected_saturated.load(Ordering::Relaxed),
            downloads_succeeded: self.downloads_succeeded.load(Ordering::Relaxed),
            downloads_failed: self.downloads_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_accepted: u64,
    pub rejected_invalid: u64,
    pub rejected_saturated: u64,
    pub downloads_succeeded: u64,
    pub downloads_failed: u64,
}
