use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::frame_decoder::FrameDecodeError;
use crate::services::session_store::SessionLimitReached;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),
    #[error("Session not found")]
    SessionNotFound,
    #[error(transparent)]
    SessionLimit(#[from] SessionLimitReached),
    #[error("Pose estimation model is not loaded")]
    ModelUnavailable,
    #[error("Image decoding failed: {0}")]
    Decode(#[from] FrameDecodeError),
    #[error("Pose estimation failed: {0}")]
    Inference(anyhow::Error),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"),
            ApiError::SessionNotFound => (StatusCode::NOT_FOUND, "Session not found"),
            ApiError::SessionLimit(_) => (StatusCode::SERVICE_UNAVAILABLE, "Session limit reached"),
            ApiError::ModelUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "Model not loaded"),
            ApiError::Decode(_) => (StatusCode::BAD_REQUEST, "Failed to decode image"),
            ApiError::Inference(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Pose estimation failed"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        if status.is_server_error() {
            tracing::error!("{}: {:#}", error_message, self);
        }

        let body = Json(json!({
            "success": false,
            "error": error_message,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::InvalidRequest(rejection.body_text())
        }
    }
}
