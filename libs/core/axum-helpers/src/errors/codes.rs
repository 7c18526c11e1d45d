//! Error codes carried in every [`ErrorResponse`](super::ErrorResponse).
//!
//! Clients match on the `SCREAMING_SNAKE_CASE` name; logs and dashboards use
//! the number. Ranges: 1xxx request problems, 2xxx database, 6xxx upstream
//! services.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! assert_eq!(ErrorCode::Conflict.as_str(), "CONFLICT");
//! assert_eq!(ErrorCode::Conflict.code(), 1008);
//! ```

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidUuid,
    JsonExtraction,
    NotFound,
    InternalError,
    Unauthorized,
    Forbidden,
    Conflict,
    /// A business rule rejected the request (stock, payment state, discount)
    BadRequest,
    MethodNotAllowed,

    DatabaseNotFound,
    /// Connection lost or refused
    DatabaseError,
    DatabasePoolTimeout,
    DatabaseUniqueViolation,
    DatabaseForeignKeyViolation,
    DatabaseUnhandled,

    /// Webpay could not be reached or answered with an error
    PaymentGateway,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn code(&self) -> i32 {
        self.entry().0
    }

    /// Message shown when the error itself must not leak details
    pub fn default_message(&self) -> &'static str {
        self.entry().1
    }

    fn entry(&self) -> (i32, &'static str) {
        match self {
            Self::ValidationError => (1001, "Request validation failed"),
            Self::InvalidUuid => (1002, "Invalid UUID format"),
            Self::JsonExtraction => (1003, "Failed to parse request body"),
            Self::NotFound => (1004, "Resource not found"),
            Self::InternalError => (1005, "An internal server error occurred"),
            Self::Unauthorized => (1006, "Authentication required"),
            Self::Forbidden => (1007, "Access forbidden"),
            Self::Conflict => (1008, "Resource already exists"),
            Self::BadRequest => (1010, "Bad request"),
            Self::MethodNotAllowed => (1012, "The HTTP method is not allowed for this resource"),

            Self::DatabaseNotFound => (2001, "Database record not found"),
            Self::DatabaseError => (2003, "Database error occurred"),
            Self::DatabasePoolTimeout => (2013, "Database connection pool timed out"),
            Self::DatabaseUniqueViolation => (2017, "Resource already exists"),
            Self::DatabaseForeignKeyViolation => (2018, "Resource is referenced by other records"),
            Self::DatabaseUnhandled => (2099, "Unhandled database error"),

            Self::PaymentGateway => (6001, "Payment gateway is unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_follow_serde() {
        for code in [
            ErrorCode::ValidationError,
            ErrorCode::InvalidUuid,
            ErrorCode::MethodNotAllowed,
            ErrorCode::DatabaseForeignKeyViolation,
            ErrorCode::PaymentGateway,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            assert_eq!(code.to_string(), code.as_str());
        }
    }

    #[test]
    fn test_numbers_by_range() {
        assert_eq!(ErrorCode::ValidationError.code(), 1001);
        assert_eq!(ErrorCode::Conflict.code(), 1008);
        assert_eq!(ErrorCode::DatabaseUniqueViolation.code(), 2017);
        assert_eq!(ErrorCode::PaymentGateway.code(), 6001);
    }

    #[test]
    fn test_parse_from_client_payload() {
        let code: ErrorCode = serde_json::from_str("\"BAD_REQUEST\"").unwrap();
        assert_eq!(code, ErrorCode::BadRequest);
        assert_eq!(code.default_message(), "Bad request");
    }
}
