//! API utility functions
//!
//! Pure helpers for request processing, kept out of services.rs so they can
//! be unit tested without a router.

use std::net::SocketAddr;

use axum::{extract::ConnectInfo, http::Extensions};

/// Peer address recorded by `into_make_service_with_connect_info`, or
/// `"unknown"` when the service was built without it (e.g. in tests).
pub fn client_address(extensions: &Extensions) -> String {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
