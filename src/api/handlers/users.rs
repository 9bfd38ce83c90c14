//! Profile and admin user management handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

use crate::api::dto::envelope::{ApiResponse, CREATED, FOUND, UPDATED};
use crate::api::dto::users::{CreateUserRequest, UpdateProfileRequest};
use crate::api::extractors::{CurrentUser, ListParams, ValidatedJson, parse_id};
use crate::domain::entities::UserPatch;
use crate::error::AppError;
use crate::state::AppState;

/// `GET /api/v1/users/me`
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    Ok(Json(ApiResponse::new(FOUND, state.user_service.me(&user)?)))
}

/// Updates the signed-in user's name, email or photo.
///
/// # Endpoint
///
/// `PATCH /api/v1/users/update-me`
///
/// # Response Codes
///
/// - **200 OK**: Profile updated
/// - **400 Bad Request**: Password fields supplied or validation failed
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let patch = payload.into_patch()?;
    let updated = state.user_service.update_me(&user, patch).await?;
    Ok(Json(ApiResponse::new(UPDATED, updated)))
}

/// Deactivates the signed-in user's account.
///
/// # Endpoint
///
/// `DELETE /api/v1/users/delete-me`
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, AppError> {
    state.user_service.delete_me(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists users. Admin only.
///
/// # Endpoint
///
/// `GET /api/v1/users?sort=name&page=1&limit=10`
pub async fn list_users(
    State(state): State<AppState>,
    ListParams(params): ListParams,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let users = state.user_service.find_many(&params).await?;
    Ok(Json(ApiResponse::list(users)))
}

/// Creates an account with an explicit role. Admin only.
///
/// # Endpoint
///
/// `POST /api/v1/users`
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let user = state
        .auth_service
        .register(&payload.name, &payload.email, &payload.password, payload.role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(CREATED, state.user_service.me(&user)?)),
    ))
}

/// `GET /api/v1/users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let user = state.user_service.find_by_id(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::new(FOUND, user)))
}

/// Updates profile fields or the role of any user. Passwords cannot be set
/// here.
///
/// # Endpoint
///
/// `PATCH /api/v1/users/{id}`
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<UserPatch>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let user = state.user_service.update(parse_id(&id)?, patch).await?;
    Ok(Json(ApiResponse::new(UPDATED, user)))
}

/// `DELETE /api/v1/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.user_service.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
