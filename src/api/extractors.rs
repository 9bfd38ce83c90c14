//! Request extractors that reject with [`AppError`] so every failure renders
//! through the error envelope.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::domain::entities::User;
use crate::domain::query::QueryParams;
use crate::error::AppError;

pub const NOT_LOGGED_IN: &str = "You are not logged in! Please log in to get access.";

/// JSON body whose rejection is reported as a 400 error envelope.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text(), Value::Null))?;
        Ok(Self(value))
    }
}

/// JSON body that must also pass its `validator` rules.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// The principal attached by [`crate::api::middleware::auth::protect`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::unauthorized(NOT_LOGGED_IN))
    }
}

/// Raw list query (`?price[gte]=500&sort=-price&page=2`).
///
/// Bracketed operators and repeated keys do not fit a typed `Query<T>`, so the
/// query string is parsed into [`QueryParams`] directly.
#[derive(Debug, Clone, Default)]
pub struct ListParams(pub QueryParams);

impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(QueryParams::parse(parts.uri.query().unwrap_or_default())))
    }
}

/// Parses a path id, rejecting malformed values with 400.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request(format!("Invalid id: {raw}"), Value::Null))
}
