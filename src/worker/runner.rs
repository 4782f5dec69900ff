//! Dispatcher - runs one accepted download from gate slot to outcome

use std::path::PathBuf;
use std::sync::Arc;

use bon::Builder;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{DispatchError, DownloadOutcome, DownloadRequest, filename};
use crate::gate::AdmissionGate;
use crate::media::{FetchOptions, FetchedMedia, MediaFetcher};
use crate::observability::Metrics;

/// Best combined mp4 video+audio, falling back to the best single stream.
pub const DEFAULT_FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Everything a dispatch needs, constructed once and shared.
#[derive(Builder)]
pub struct Dispatcher {
    gate: AdmissionGate,
    fetcher: Arc<dyn MediaFetcher>,
    #[builder(into)]
    download_dir: PathBuf,
    #[builder(default = 3600)]
    max_duration_secs: u64,
    #[builder(into, default = "mp4".to_string())]
    container_format: String,
    #[builder(into, default = DEFAULT_FORMAT_SELECTOR.to_string())]
    format_selector: String,
    #[builder(default)]
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Runs `request` in the background. Panics inside the dispatch are
    /// reported as unexpected failures. The outcome is logged and counted;
    /// the handle may be dropped.
    pub fn spawn(self: &Arc<Self>, request: DownloadRequest) -> JoinHandle<DownloadOutcome> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let request = Arc::new(request);

            let inner = {
                let this = Arc::clone(&this);
                let request = Arc::clone(&request);
                tokio::spawn(async move { this.dispatch(&request).await })
            };

            let outcome = match inner.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    error!(
                        request_id = %request.request_id,
                        url = %request.url,
                        error = %join_err,
                        "Download task aborted"
                    );
                    DownloadOutcome::failure(&DispatchError::Unexpected(join_err.to_string()))
                }
            };

            this.record(&request, &outcome);
            outcome
        })
    }

    /// Processes a single request to completion. Never retries.
    pub async fn dispatch(&self, request: &DownloadRequest) -> DownloadOutcome {
        match self.run(request).await {
            Ok(media) => DownloadOutcome::success(media.title, media.output_path),
            Err(err) => {
                warn!(
                    request_id = %request.request_id,
                    url = %request.url,
                    kind = err.kind(),
                    error = %err,
                    "Download failed"
                );
                DownloadOutcome::failure(&err)
            }
        }
    }

    async fn run(&self, request: &DownloadRequest) -> Result<FetchedMedia, DispatchError> {
        // Held until this function returns, whichever way it returns.
        let _slot = self
            .gate
            .enter()
            .await
            .map_err(|e| DispatchError::Unexpected(e.to_string()))?;

        info!(
            request_id = %request.request_id,
            url = %request.url,
            in_use = self.gate.in_use(),
            "Starting download"
        );

        let probe = self
            .fetcher
            .probe(&request.url)
            .await
            .map_err(DispatchError::ProbeFailed)?;

        if let Some(duration) = probe.duration_seconds {
            if duration > self.max_duration_secs as f64 {
                return Err(DispatchError::DurationExceeded {
                    actual: duration.ceil() as u64,
                    limit: self.max_duration_secs,
                });
            }
        }

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| {
                DispatchError::Unexpected(format!(
                    "cannot create {}: {e}",
                    self.download_dir.display()
                ))
            })?;

        let options = FetchOptions {
            output_template: filename::output_template(&self.download_dir, &probe.title),
            container_format: self.container_format.clone(),
            format_selector: self.format_selector.clone(),
            no_playlist: true,
            request_id: request.request_id.clone(),
        };

        self.fetcher
            .fetch(&request.url, &options)
            .await
            .map_err(DispatchError::FetchFailed)
    }

    fn record(&self, request: &DownloadRequest, outcome: &DownloadOutcome) {
        if outcome.is_success() {
            self.metrics.download_succeeded();
            info!(
                request_id = %request.request_id,
                client = %request.client_address,
                title = outcome.title.as_deref().unwrap_or_default(),
                path = ?outcome.output_path,
                "Finished download"
            );
        } else {
            self.metrics.download_failed();
            info!(
                request_id = %request.request_id,
                client = %request.client_address,
                kind = outcome.error_kind.unwrap_or_default(),
                message = %outcome.message,
                "Download ended with error"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockFetcher;
    use crate::worker::OutcomeStatus;
    use std::time::Duration;
    use tempfile::TempDir;

    const URL: &str = "https://youtu.be/AAAAAAAAAAA";

    fn dispatcher(fetcher: Arc<MockFetcher>, dir: &TempDir, capacity: usize) -> Arc<Dispatcher> {
        Arc::new(
            Dispatcher::builder()
                .gate(AdmissionGate::new(capacity))
                .fetcher(fetcher)
                .download_dir(dir.path().join("downloads"))
                .max_duration_secs(3600)
                .build(),
        )
    }

    #[tokio::test]
    async fn test_successful_dispatch() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new("My: Clip").with_duration(120.0));
        let dispatcher = dispatcher(fetcher.clone(), &dir, 3);

        let outcome = dispatcher.dispatch(&DownloadRequest::new(URL, "127.0.0.1")).await;

        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.title.as_deref(), Some("My: Clip"));
        assert_eq!(fetcher.fetch_calls(), 1);
        assert!(dir.path().join("downloads").is_dir());

        let template = &fetcher.templates()[0];
        let name = template.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("My_ Clip_"));
        assert!(name.ends_with(".%(ext)s"));
        assert_eq!(dispatcher.gate().in_use(), 0);
    }

    #[tokio::test]
    async fn test_duration_over_limit_skips_fetch() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new("long").with_duration(4000.0));
        let dispatcher = dispatcher(fetcher.clone(), &dir, 3);

        let outcome = dispatcher.dispatch(&DownloadRequest::new(URL, "127.0.0.1")).await;

        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.error_kind, Some("DURATION_EXCEEDED"));
        assert_eq!(fetcher.probe_calls(), 1);
        assert_eq!(fetcher.fetch_calls(), 0);
        assert_eq!(dispatcher.gate().in_use(), 0);
    }

    #[tokio::test]
    async fn test_duration_at_limit_is_allowed() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new("exact").with_duration(3600.0));
        let dispatcher = dispatcher(fetcher.clone(), &dir, 3);

        let outcome = dispatcher.dispatch(&DownloadRequest::new(URL, "127.0.0.1")).await;

        assert!(outcome.is_success());
        assert_eq!(fetcher.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_fractional_duration_over_limit() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new("barely").with_duration(3600.5));
        let dispatcher = dispatcher(fetcher.clone(), &dir, 3);

        let outcome = dispatcher.dispatch(&DownloadRequest::new(URL, "127.0.0.1")).await;

        assert_eq!(outcome.error_kind, Some("DURATION_EXCEEDED"));
        assert!(outcome.message.contains("3601s"));
        assert_eq!(fetcher.fetch_calls(), 0);
        assert_eq!(dispatcher.gate().in_use(), 0);
    }

    #[tokio::test]
    async fn test_unknown_duration_is_allowed() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new("live"));
        let dispatcher = dispatcher(fetcher.clone(), &dir, 3);

        let outcome = dispatcher.dispatch(&DownloadRequest::new(URL, "127.0.0.1")).await;

        assert!(outcome.is_success());
        assert_eq!(fetcher.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_probe_failure_is_terminal() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new("x").failing_probe("Video unavailable"));
        let dispatcher = dispatcher(fetcher.clone(), &dir, 3);

        let outcome = dispatcher.dispatch(&DownloadRequest::new(URL, "127.0.0.1")).await;

        assert_eq!(outcome.error_kind, Some("PROBE_FAILED"));
        assert!(outcome.message.contains("Video unavailable"));
        assert_eq!(fetcher.probe_calls(), 1);
        assert_eq!(fetcher.fetch_calls(), 0);
        assert_eq!(dispatcher.gate().in_use(), 0);
    }

    #[tokio::test]
    async fn test_failing_fetch_releases_slot() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new("x").failing_fetch("HTTP Error 403"));
        let dispatcher = dispatcher(fetcher.clone(), &dir, 2);
        let before = dispatcher.gate().available();

        let outcome = dispatcher.dispatch(&DownloadRequest::new(URL, "127.0.0.1")).await;

        assert_eq!(outcome.error_kind, Some("FETCH_FAILED"));
        assert!(outcome.message.contains("HTTP Error 403"));
        assert_eq!(fetcher.fetch_calls(), 1);
        assert_eq!(dispatcher.gate().available(), before);
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_unexpected_and_releases_slot() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new("x").panicking_fetch());
        let dispatcher = dispatcher(fetcher.clone(), &dir, 1);

        let outcome = dispatcher
            .spawn(DownloadRequest::new(URL, "127.0.0.1"))
            .await
            .unwrap();

        assert_eq!(outcome.error_kind, Some("UNEXPECTED_FAILURE"));
        assert_eq!(dispatcher.gate().in_use(), 0);
        assert_eq!(dispatcher.metrics().snapshot().downloads_failed, 1);
    }

    #[tokio::test]
    async fn test_spawn_records_success_metric() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(MockFetcher::new("clip"));
        let dispatcher = dispatcher(fetcher, &dir, 1);

        let outcome = dispatcher
            .spawn(DownloadRequest::new(URL, "127.0.0.1"))
            .await
            .unwrap();

        assert!(outcome.is_success());
        let snapshot = dispatcher.metrics().snapshot();
        assert_eq!(snapshot.downloads_succeeded, 1);
        assert_eq!(snapshot.downloads_failed, 0);
    }

    #[tokio::test]
    async fn test_concurrent_same_title_get_distinct_names() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(
            MockFetcher::new("Same Title").with_fetch_delay(Duration::from_millis(20)),
        );
        let dispatcher = dispatcher(fetcher.clone(), &dir, 2);

        let a = dispatcher.spawn(DownloadRequest::new(URL, "10.0.0.1"));
        let b = dispatcher.spawn(DownloadRequest::new(URL, "10.0.0.2"));
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert!(a.is_success() && b.is_success());
        let templates = fetcher.templates();
        assert_eq!(templates.len(), 2);
        assert_ne!(templates[0], templates[1]);
        assert_ne!(a.output_path, b.output_path);
    }

    #[tokio::test]
    async fn test_dispatches_beyond_capacity_wait_for_slot() {
        let dir = TempDir::new().unwrap();
        let fetcher =
            Arc::new(MockFetcher::new("clip").with_fetch_delay(Duration::from_millis(50)));
        let dispatcher = dispatcher(fetcher.clone(), &dir, 1);

        let first = dispatcher.spawn(DownloadRequest::new(URL, "10.0.0.1"));
        let second = dispatcher.spawn(DownloadRequest::new(URL, "10.0.0.2"));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(dispatcher.gate().is_saturated());
        assert_eq!(fetcher.fetch_calls(), 1);

        assert!(first.await.unwrap().is_success());
        assert!(second.await.unwrap().is_success());
        assert_eq!(fetcher.fetch_calls(), 2);
        assert_eq!(dispatcher.gate().in_use(), 0);
    }
}
