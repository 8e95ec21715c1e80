/// Request extractors that reject with [`ApiError`]
///
/// Axum's stock extractors answer bad input with plain-text bodies. These
/// wrappers turn every rejection into the standard error envelope.

use crate::error::ApiError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// `Path<T>` with envelope rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Query<T>` with envelope rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// JSON body that has passed its `validator` rules
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
