use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use queuedesk_core::{CoreError, RepoError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => AppError::ValidationError(e.to_string()),
            CoreError::NotFound(what) => AppError::NotFoundError(format!("{} not found", what)),
            e @ CoreError::InvalidTransition { .. } => AppError::ConflictError(e.to_string()),
        }
    }
}

/// Repository errors are boxed; domain errors inside keep their status code.
impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err.downcast::<CoreError>() {
            Ok(core) => AppError::from(*core),
            Err(other) => AppError::InternalServerError(other.to_string()),
        }
    }
}
