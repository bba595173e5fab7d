use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::error::ErrorKind;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

/// Message returned for anything that escapes the typed error path.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred on the server.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body or query failed validation before reaching the store.
    #[error("{0}")]
    Validation(String),

    /// The store rejected a write because of an integrity constraint.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unexpected database error occurred: {0}")]
    Database(sqlx::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    return AppError::Conflict(format!(
                        "Product write failed due to integrity constraint: {}",
                        db_err.message()
                    ));
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Database(e) => error!(error = %e, "Database error"),
            other => warn!(status = status.as_u16(), "{}", other),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Fallback for panics caught by `CatchPanicLayer`; the payload is logged, never echoed.
pub fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %detail, "Unhandled failure while serving request");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": UNEXPECTED_ERROR })),
    )
        .into_response()
}
