pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every error the API returns.
///
/// ```json
/// {
///   "code": 1008,
///   "error": "CONFLICT",
///   "message": "Email already registered: ana@example.cl"
/// }
/// ```
///
/// `details` is only present for validation failures and holds the
/// per-field errors.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: i32,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }
}

/// Error type handlers return; each domain error converts into it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalServerError(String),

    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),
}

impl AppError {
    /// Status and error code this error is rendered with
    pub fn classify(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Database(e) => classify_db(e),
            AppError::Json(e) => (e.status(), ErrorCode::JsonExtraction),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError),
            AppError::InvalidUuid(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidUuid),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadRequest),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
            AppError::InternalServerError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError)
            }
            AppError::PaymentGateway(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::PaymentGateway)
            }
        }
    }
}

/// Constraint violations are client errors: a duplicate key, or a row that is
/// still referenced by another table.
fn classify_db(error: &DbErr) -> (StatusCode, ErrorCode) {
    match error.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            return (StatusCode::CONFLICT, ErrorCode::DatabaseUniqueViolation);
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            return (StatusCode::CONFLICT, ErrorCode::DatabaseForeignKeyViolation);
        }
        _ => {}
    }

    match error {
        DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::DatabaseNotFound),
        DbErr::ConnectionAcquire(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::DatabasePoolTimeout)
        }
        DbErr::Conn(_) => (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::DatabaseError),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseUnhandled),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();

        if status.is_server_error() {
            tracing::error!(error_code = code.code(), status = %status, "{}", self);
        } else {
            tracing::info!(error_code = code.code(), status = %status, "{}", self);
        }

        let details = match &self {
            AppError::Validation(e) => serde_json::to_value(e).ok(),
            _ => None,
        };

        // Server-side failures and database details never reach the client
        let message = match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg,
            AppError::Json(e) => e.body_text(),
            _ => code.default_message().to_string(),
        };

        let body = ErrorResponse {
            details,
            ..ErrorResponse::new(code, message)
        };

        (status, Json(body)).into_response()
    }
}
