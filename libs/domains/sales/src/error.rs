use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SaleError {
    #[error("Sale not found: {0}")]
    NotFound(Uuid),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Insufficient stock for product {product}: requested {requested}")]
    InsufficientStock { product: Uuid, requested: i64 },

    /// Sale insert failed after stock was reserved; the cause is logged.
    #[error("Sale create failed")]
    CreateFailed,

    #[error("Database error: {0}")]
    Database(String),
}

pub type SaleResult<T> = Result<T, SaleError>;

impl From<SaleError> for AppError {
    fn from(err: SaleError) -> Self {
        match err {
            SaleError::NotFound(id) => AppError::NotFound(format!("Sale {} not found", id)),
            SaleError::ProductNotFound(id) => {
                AppError::NotFound(format!("Product {} not found", id))
            }
            SaleError::Validation(msg) => AppError::BadRequest(msg),
            SaleError::InvalidId(raw) => AppError::BadRequest(format!("Invalid id: {}", raw)),
            err @ (SaleError::InsufficientStock { .. } | SaleError::CreateFailed) => {
                AppError::BadRequest(err.to_string())
            }
            SaleError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl IntoResponse for SaleError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for SaleError {
    fn from(err: mongodb::error::Error) -> Self {
        SaleError::Database(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for SaleError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        SaleError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for SaleError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        SaleError::Database(err.to_string())
    }
}
