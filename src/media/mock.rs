//! Scripted fetcher for development and tests

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{FetchOptions, FetchedMedia, MediaError, MediaFetcher, ProbeResult};

/// Fetcher that never touches the network. Probe and fetch results are fixed
/// at construction; calls and output templates are recorded.
#[derive(Debug)]
pub struct MockFetcher {
    title: String,
    duration_seconds: Option<f64>,
    probe_error: Option<String>,
    fetch_error: Option<String>,
    #[cfg(test)]
    panic_on_fetch: bool,
    fetch_delay: Duration,
    probe_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    templates: Mutex<Vec<PathBuf>>,
}

impl MockFetcher {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            duration_seconds: None,
            probe_error: None,
            fetch_error: None,
            #[cfg(test)]
            panic_on_fetch: false,
            fetch_delay: Duration::ZERO,
            probe_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            templates: Mutex::new(Vec::new()),
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn failing_probe(mut self, message: impl Into<String>) -> Self {
        self.probe_error = Some(message.into());
        self
    }

    pub fn failing_fetch(mut self, message: impl Into<String>) -> Self {
        self.fetch_error = Some(message.into());
        self
    }

    /// Unit-test only: makes `fetch` panic to exercise worker containment.
    #[cfg(test)]
    pub(crate) fn panicking_fetch(mut self) -> Self {
        self.panic_on_fetch = true;
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Output templates passed to `fetch`, in call order.
    pub fn templates(&self) -> Vec<PathBuf> {
        self.templates
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn probe(&self, url: &str) -> Result<ProbeResult, MediaError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        tracing::info!(url, "Mock probe");

        if let Some(message) = &self.probe_error {
            return Err(MediaError::Failed(message.clone()));
        }

        Ok(ProbeResult {
            title: self.title.clone(),
            duration_seconds: self.duration_seconds,
        })
    }

    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchedMedia, MediaError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut templates) = self.templates.lock() {
            templates.push(options.output_template.clone());
        }
        tracing::info!(url, template = %options.output_template.display(), "Mock fetch");

        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }

        #[cfg(test)]
        if self.panic_on_fetch {
            panic!("mock fetch panicked");
        }

        if let Some(message) = &self.fetch_error {
            return Err(MediaError::Failed(message.clone()));
        }

        let output_path = options
            .output_template
            .to_str()
            .map(|t| {
                PathBuf::from(
                    t.replace("%(ext)s", &options.container_format)
                        .replace("%%", "%"),
                )
            });

        Ok(FetchedMedia {
            title: self.title.clone(),
            output_path,
        })
    }
}
