//! Review handlers, mounted both at `/reviews` and under `/tours/{tourId}`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

use crate::api::dto::envelope::{ApiResponse, CREATED, FOUND, UPDATED};
use crate::api::extractors::{CurrentUser, ListParams, ValidatedJson, parse_id};
use crate::domain::entities::{NewReview, ReviewPatch};
use crate::error::AppError;
use crate::state::AppState;

/// Lists reviews with filtering, sorting, field selection and pagination.
///
/// # Endpoint
///
/// `GET /api/v1/reviews?rating[gte]=4&sort=-createdAt`
pub async fn list_reviews(
    State(state): State<AppState>,
    ListParams(params): ListParams,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let reviews = state.review_service.find_many(&params, None).await?;
    Ok(Json(ApiResponse::list(reviews)))
}

/// `GET /api/v1/tours/{tourId}/reviews`
pub async fn list_tour_reviews(
    State(state): State<AppState>,
    Path(tour_id): Path<String>,
    ListParams(params): ListParams,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let tour = parse_id(&tour_id)?;
    let reviews = state.review_service.find_many(&params, Some(tour)).await?;
    Ok(Json(ApiResponse::list(reviews)))
}

/// Creates a review authored by the signed-in user.
///
/// # Endpoint
///
/// `POST /api/v1/reviews`
///
/// # Request Body
///
/// ```json
/// { "review": "Amazing!", "rating": 5, "tour": "..." }
/// ```
///
/// # Response Codes
///
/// - **201 Created**: Review stored and tour ratings recomputed
/// - **400 Bad Request**: Validation failed or the user already reviewed the tour
/// - **404 Not Found**: Tour does not exist
pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<NewReview>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let review = state.review_service.create(payload, None, &user).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(CREATED, review))))
}

/// Same as [`create_review`], with `tour` taken from the route when the body
/// omits it.
///
/// # Endpoint
///
/// `POST /api/v1/tours/{tourId}/reviews`
pub async fn create_tour_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tour_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<NewReview>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let tour = parse_id(&tour_id)?;
    let review = state.review_service.create(payload, Some(tour), &user).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(CREATED, review))))
}

/// `GET /api/v1/reviews/{id}`
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let review = state.review_service.find_by_id(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::new(FOUND, review)))
}

/// Updates a review. Only its author or an admin may do this.
///
/// # Endpoint
///
/// `PATCH /api/v1/reviews/{id}`
pub async fn update_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<ReviewPatch>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let review = state
        .review_service
        .update(parse_id(&id)?, patch, &user)
        .await?;
    Ok(Json(ApiResponse::new(UPDATED, review)))
}

/// `DELETE /api/v1/reviews/{id}`
pub async fn delete_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.review_service.delete(parse_id(&id)?, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
