use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::StatusResponse;

/// Errors surfaced synchronously to the HTTP caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("Server is currently busy with other downloads. Please try again shortly.")]
    CapacitySaturated,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ApiError::CapacitySaturated => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        (status, Json(StatusResponse::error(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::InvalidUrl("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::CapacitySaturated.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
