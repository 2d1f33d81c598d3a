//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has already passed `Validate::validate`.
///
/// Malformed JSON is rejected with axum's status (400/415/422); shape
/// violations are rejected with 400 and per-field details.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct CreateSale {
///     #[validate(range(min = 1))]
///     quantity: i64,
/// }
///
/// async fn create_sale(ValidatedJson(payload): ValidatedJson<CreateSale>) { /* ... */ }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::JsonExtractorRejection(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::ValidationError(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}
