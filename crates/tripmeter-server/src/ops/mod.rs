//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/hello`   : smoke-test greeting
//! - `/metrics` : Prometheus text format, unauthenticated

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use tripmeter_core::error::TripmeterError;
use tripmeter_core::metrics::{render, CONTENT_TYPE};

use crate::app_state::AppState;
use crate::error::ApiError;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn hello() -> impl IntoResponse {
    "Hello World!"
}

/// Render the registry. The 500 branch is defensive: rendering into a
/// `String` does not fail today.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match render(&state.registry().snapshot()) {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics exposition failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn not_found(uri: Uri) -> ApiError {
    TripmeterError::NotFound(format!("no route for {}", uri.path())).into()
}
