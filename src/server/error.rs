//! HTTP error mapping for the kiosk API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("admin session required")]
    Unauthorized,

    #[error("target domain is not allowed")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("upstream request timed out")]
    UpstreamTimeout,

    // Storage failures are retryable from the kiosk's point of view: the
    // front-end shows a soft banner with a retry action, never a crash
    #[error("storage unavailable: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::UpstreamTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
