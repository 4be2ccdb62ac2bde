use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Request errors the poll adapter reports without touching the broker.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("text is required")]
    MissingText,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::MissingText => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
