use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::generation::GenerationError;
use crate::services::ypareo::YpareoError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Failure reported by the Yparéo API; the upstream status is relayed.
    Upstream {
        status: u16,
        detail: String,
    },
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

impl From<YpareoError> for ApiError {
    fn from(error: YpareoError) -> Self {
        match error.upstream_status() {
            Some(status) => ApiError::Upstream { status, detail: error.to_string() },
            None => ApiError::internal(error, "Yparéo request failed"),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::UnknownTemplate => ApiError::BadRequest(error.to_string()),
            GenerationError::Reference(reference) => reference.into(),
            GenerationError::Other(other) => {
                ApiError::internal(format!("{other:#}"), "bulletin generation failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Upstream { status, detail } => {
                tracing::error!(status, error = %detail, "Upstream error");
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, Json(ErrorResponse { status: status.as_u16(), detail }))
                    .into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
        }
    }
}
