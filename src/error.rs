use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// `NotFound` for an entity referenced by id, with a uniform message shape.
    pub fn not_found(entity: &str, id: i64) -> Self {
        AppError::NotFound(format!("{entity} {id} not found"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => {
                tracing::warn!(reason = %msg, "request rejected");
                (StatusCode::NOT_FOUND, msg)
            }
            AppError::Validation(msg) => {
                tracing::warn!(reason = %msg, "request rejected");
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Database(_) => {
                tracing::error!(error = %self, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found("user", 42);
        assert_eq!(err.to_string(), "Not found: user 42 not found");
    }

    #[test]
    fn test_status_mapping() {
        let resp = AppError::not_found("film", 1).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp =
            AppError::Validation("sort key must be 'likes' or 'year'".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::Internal("unsupported operation".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
