use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use studio::TaskManagerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    TaskManager(#[from] TaskManagerError),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Not Found: {0}")]
    NotFound(String),
}

/// Error envelope returned by every failing handler
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error_type: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::TaskManager(err) => match err {
                TaskManagerError::NotFound(_) => (StatusCode::NOT_FOUND, "TaskNotFound"),
                TaskManagerError::InvalidSeed => (StatusCode::BAD_REQUEST, "InvalidPersona"),
            },
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
        };

        let message = match &self {
            ApiError::TaskManager(err) => err.to_string(),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
        };

        tracing::debug!("{}: {}", error_type, message);

        let body = ErrorBody {
            success: false,
            error_type,
            message,
        };
        (status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::from(TaskManagerError::NotFound(Uuid::new_v4())).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(TaskManagerError::InvalidSeed).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let bad = ApiError::BadRequest("nope".into()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }
}
