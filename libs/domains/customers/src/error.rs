use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_orders::OrderError;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CustomerError {
    #[error("Customer not found: {0}")]
    NotFound(Uuid),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Orders(#[from] OrderError),

    #[error(transparent)]
    Database(#[from] DbErr),
}

pub type CustomerResult<T> = Result<T, CustomerError>;

impl From<CustomerError> for AppError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::NotFound(id) => AppError::NotFound(format!("Customer {} not found", id)),
            CustomerError::EmailTaken(email) => {
                AppError::Conflict(format!("Email already registered: {}", email))
            }
            CustomerError::InvalidCredentials => {
                AppError::Unauthorized("Invalid credentials".to_string())
            }
            CustomerError::Validation(msg) => AppError::BadRequest(msg),
            CustomerError::Internal(msg) => AppError::InternalServerError(msg),
            CustomerError::Orders(e) => e.into(),
            CustomerError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for CustomerError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CustomerError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                CustomerError::EmailTaken("a@b.cl".into()),
                StatusCode::CONFLICT,
            ),
            (CustomerError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (CustomerError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                CustomerError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
