use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{health, index, submit_download},
    state::AppState,
};
use crate::config::Config;
use crate::gate::AdmissionGate;
use crate::media::YtDlp;
use crate::worker::Dispatcher;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Routes with state attached; shared by `run` and the integration tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/download", post(submit_download))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Wires the gate, the yt-dlp fetcher and the dispatcher from `config`.
pub fn build_state(config: Config) -> Result<AppState, AnyError> {
    let downloads = &config.downloads;

    info!(path = %downloads.download_dir.display(), "Preparing download directory");
    std::fs::create_dir_all(&downloads.download_dir).map_err(|e| {
        format!(
            "Failed to create download directory {}: {}",
            downloads.download_dir.display(),
            e
        )
    })?;

    let gate = AdmissionGate::new(downloads.max_concurrent);
    let fetcher = Arc::new(YtDlp::new(config.media.binary.clone()));

    let dispatcher = Dispatcher::builder()
        .gate(gate)
        .fetcher(fetcher)
        .download_dir(downloads.download_dir.clone())
        .max_duration_secs(downloads.max_duration_secs)
        .container_format(downloads.container_format.clone())
        .format_selector(downloads.format_selector.clone())
        .build();

    Ok(AppState::new(config, dispatcher))
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    let address = config.server.bind_addr;
    info!(
        max_concurrent = config.downloads.max_concurrent,
        max_duration_secs = config.downloads.max_duration_secs,
        binary = %config.media.binary.display(),
        "Starting tubefetch"
    );

    let state = build_state(config)?;
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "tubefetch listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    // In-flight downloads are not awaited; they die with the runtime.
    info!("Shutdown signal received");
}
