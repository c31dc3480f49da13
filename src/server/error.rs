use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures `/ask` reports with an error status. Relay failures are not here:
/// they are answered with 200 and the `[ERROR]` text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Question cannot be empty.")]
    EmptyQuestion,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmptyQuestion => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
