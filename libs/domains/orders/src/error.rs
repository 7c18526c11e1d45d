use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0} not found")]
    NotFound(String),

    /// A checkout or payment rule was broken
    #[error("{0}")]
    InvalidOrder(String),

    #[error("Order already processed")]
    AlreadyProcessed,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<reqwest::Error> for OrderError {
    fn from(err: reqwest::Error) -> Self {
        OrderError::Gateway(err.to_string())
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            OrderError::InvalidOrder(msg) => AppError::BadRequest(msg),
            OrderError::AlreadyProcessed => {
                AppError::BadRequest("Order already processed".to_string())
            }
            OrderError::Conflict(msg) => AppError::Conflict(msg),
            OrderError::Gateway(msg) => AppError::PaymentGateway(msg),
            OrderError::Validation(msg) => AppError::BadRequest(msg),
            OrderError::Internal(msg) => AppError::InternalServerError(msg),
            OrderError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for OrderError {
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
            (OrderError::NotFound("Order".into()), StatusCode::NOT_FOUND),
            (
                OrderError::InvalidOrder("Insufficient stock for Mouse".into()),
                StatusCode::BAD_REQUEST,
            ),
            (OrderError::AlreadyProcessed, StatusCode::BAD_REQUEST),
            (OrderError::Conflict("shipped".into()), StatusCode::CONFLICT),
            (
                OrderError::Gateway("timeout".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                OrderError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
