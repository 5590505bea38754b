//! Maps `AppError` onto HTTP responses.
//!
//! Error bodies look like `{ "code": "...", "message": "...", "data": { "status": 409 } }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::AppError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(..) => StatusCode::NOT_FOUND,
        AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Gone(_) => StatusCode::GONE,
        AppError::ThumbnailCopy(_) | AppError::Internal(_) | AppError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = match &self.0 {
            AppError::ThumbnailCopy(_) => "We were not able to copy the symbol".to_string(),
            AppError::Storage(_) | AppError::Internal(_) => "internal service error".to_string(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }

        let body = json!({
            "code": self.0.code(),
            "message": message,
            "data": { "status": status.as_u16() },
        });
        (status, Json(body)).into_response()
    }
}
