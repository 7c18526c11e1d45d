use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Still referenced: {0}")]
    InUse(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn category_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("Category {}", id))
    }

    pub fn product_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("Product {}", id))
    }

    /// Translate constraint violations raised by the database into domain errors
    pub(crate) fn from_write(err: DbErr, what: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Duplicate(what.into()),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => Self::InUse(what.into()),
            _ => Self::Database(err),
        }
    }

    /// Like [`from_write`](Self::from_write), but the only foreign key on a
    /// product row is its category.
    pub(crate) fn from_product_write(err: DbErr, slug: &str, category_id: Uuid) -> Self {
        match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => Self::UnknownCategory(category_id),
            _ => Self::from_write(err, format!("product {}", slug)),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            CatalogError::Duplicate(what) => AppError::Conflict(format!("Already exists: {}", what)),
            CatalogError::InUse(what) => AppError::Conflict(format!("Still referenced: {}", what)),
            CatalogError::UnknownCategory(id) => {
                AppError::BadRequest(format!("Category {} does not exist", id))
            }
            CatalogError::Validation(msg) => AppError::BadRequest(msg),
            CatalogError::Internal(msg) => AppError::InternalServerError(msg),
            CatalogError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
