//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use narrate_compiler::{CompileError, ErrorKind, Stage};
use narrate_models::ValidationError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Compile(err) => match err.kind {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Compile(err) => err.kind.code(),
            ApiError::MalformedBody(_) | ApiError::PayloadTooLarge(_) => ErrorKind::Validation.code(),
            ApiError::Timeout(_) => ErrorKind::Timeout.code(),
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn stage(&self) -> Option<Stage> {
        match self {
            ApiError::Compile(err) => Some(err.stage),
            ApiError::MalformedBody(_) | ApiError::PayloadTooLarge(_) => Some(Stage::Validate),
            ApiError::Timeout(_) | ApiError::Internal(_) => None,
        }
    }

    fn scene_id(&self) -> Option<String> {
        match self {
            ApiError::Compile(err) => err.scene_id.clone(),
            _ => None,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Compile(CompileError::validation(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(rejection.body_text())
        } else {
            Self::MalformedBody(rejection.body_text())
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    detail: String,
    code: &'static str,
    stage: Option<Stage>,
    scene_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
            stage: self.stage(),
            scene_id: self.scene_id(),
        };

        (status, Json(body)).into_response()
    }
}
