use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

// 2067 = SQLite unique constraint, 23505 = PostgreSQL unique violation
const UNIQUE_VIOLATION_CODES: [&str; 2] = ["2067", "23505"];
// 1811 = SQLite RAISE(ABORT) from a trigger, 23P01 = PostgreSQL exclusion violation
const OVERLAP_VIOLATION_CODES: [&str; 2] = ["1811", "23P01"];

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Payment provider failure: {0}")]
    Upstream(String),
    #[error("Not configured: {0}")]
    Configuration(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, AppError::Database(e) if db_code_in(e, &UNIQUE_VIOLATION_CODES))
    }
}

fn db_code_in(e: &sqlx::Error, codes: &[&str]) -> bool {
    e.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| codes.contains(&code.as_ref()))
}

/// True when the storage layer rejected a booking row because it overlaps an active one.
pub fn is_overlap_violation(e: &sqlx::Error) -> bool {
    if db_code_in(e, &OVERLAP_VIOLATION_CODES) {
        return true;
    }
    e.as_database_error()
        .is_some_and(|db_err| db_err.message().contains("booking_overlap"))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if db_code_in(e, &UNIQUE_VIOLATION_CODES) {
                    return (
                        StatusCode::CONFLICT,
                        Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                    ).into_response();
                }
                if is_overlap_violation(e) {
                    return (
                        StatusCode::CONFLICT,
                        Json(json!({ "error": "Time slot is no longer available" }))
                    ).into_response();
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Upstream(msg) => {
                error!("Payment provider failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::Configuration(msg) => {
                error!("Component not configured: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
