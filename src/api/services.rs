use axum::{
    Json,
    extract::{Form, State, rejection::FormRejection},
    http::{Extensions, StatusCode},
    response::{Html, IntoResponse},
};
use tracing::{info, warn};

use super::{
    models::{DownloadForm, GateStatus, HealthResponse, StatusResponse},
    state::AppState,
    validation::{EXPECTED_URL_FORMAT, validate_video_url},
};
use crate::api::error::ApiError;
use crate::worker::{DownloadRequest, new_request_id};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Submission page (GET /)
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Download submission endpoint (POST /download)
///
/// Admission happens here, synchronously:
/// 1. Parse the form and validate the URL shape (400 on failure)
/// 2. Non-blocking saturation check on the gate (429 when full)
/// 3. Hand the request to the dispatcher and answer 202 right away
///
/// The saturation check is advisory. Two requests can both pass it and then
/// queue on the gate inside the worker; the worker's blocking acquire is what
/// bounds concurrency.
pub async fn submit_download(
    State(state): State<AppState>,
    extensions: Extensions,
    form: Result<Form<DownloadForm>, FormRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = new_request_id();
    let client = super::utils::client_address(&extensions);

    let Form(form) = form.map_err(|rejection| {
        state.metrics().rejected_invalid();
        warn!(%request_id, %client, error = %rejection.body_text(), "Malformed download form");
        ApiError::InvalidUrl(EXPECTED_URL_FORMAT.to_string())
    })?;
    let url = form.youtube_url.trim();

    info!(%request_id, %client, url, "Received download request");

    if let Err(err) = validate_video_url(url) {
        state.metrics().rejected_invalid();
        warn!(%request_id, %client, url, error = %err, "Invalid video URL");
        return Err(ApiError::InvalidUrl(EXPECTED_URL_FORMAT.to_string()));
    }

    if state.gate().is_saturated() {
        state.metrics().rejected_saturated();
        warn!(%request_id, %client, in_use = state.gate().in_use(), "Download capacity reached");
        return Err(ApiError::CapacitySaturated);
    }

    let request = DownloadRequest {
        url: url.to_string(),
        request_id,
        client_address: client,
    };
    let message = format!(
        "Download initiated for {}. This process runs in the background.",
        request.url
    );

    // Fire and forget: the outcome is only logged.
    drop(state.dispatcher.spawn(request));
    state.metrics().request_accepted();

    Ok((StatusCode::ACCEPTED, Json(StatusResponse::processing(message))))
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let gate = state.gate();
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        downloads: GateStatus {
            capacity: gate.capacity(),
            in_use: gate.in_use(),
            max_duration_secs: state.config.downloads.max_duration_secs,
        },
        metrics: state.metrics().snapshot(),
    };

    (StatusCode::OK, Json(response))
}
