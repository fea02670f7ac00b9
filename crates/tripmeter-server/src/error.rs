//! HTTP mapping for `TripmeterError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use tripmeter_core::error::{ClientCode, TripmeterError};

/// Handler error: renders as `{"code": ..., "msg": ...}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub TripmeterError);

impl From<TripmeterError> for ApiError {
    fn from(e: TripmeterError) -> Self {
        Self(e)
    }
}

fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
        ClientCode::NotFound => StatusCode::NOT_FOUND,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = status_for(code);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = json!({
            "code": code.as_str(),
            "msg": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
