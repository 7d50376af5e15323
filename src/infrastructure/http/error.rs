//! HTTP Error Handling
//!
//! 错误以真实 HTTP 状态码返回，响应体为 `{"detail": "..."}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "Bad request");
                msg
            }
            ApiError::NotFound(msg) => {
                tracing::warn!(error = %msg, "Resource not found");
                msg
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                msg
            }
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::UnknownVoice(_) | ApplicationError::ValidationError(_) => {
                ApiError::BadRequest(e.to_string())
            }
            ApplicationError::StorageError(msg) | ApplicationError::InternalError(msg) => {
                ApiError::Internal(msg)
            }
        }
    }
}
