//! Tour handlers: CRUD, aliases, analytics and geospatial queries.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

use crate::api::dto::envelope::{ApiResponse, CREATED, FOUND, UPDATED};
use crate::api::extractors::{ListParams, ValidatedJson, parse_id};
use crate::domain::entities::{NewTour, TourPatch};
use crate::domain::geo::{DistanceUnit, GeoPoint};
use crate::error::AppError;
use crate::state::AppState;

/// Lists tours with filtering, sorting, field selection and pagination.
///
/// # Endpoint
///
/// `GET /api/v1/tours`
///
/// # Query Parameters
///
/// - `difficulty=easy`, `price[lt]=1500`, `duration[gte]=5`: filters
/// - `sort=-ratingsAverage,price`: sort keys, `-` for descending
/// - `fields=name,price`: projection
/// - `page=2&limit=10`: pagination
pub async fn list_tours(
    State(state): State<AppState>,
    ListParams(params): ListParams,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let tours = state.tour_service.find_many(&params).await?;
    Ok(Json(ApiResponse::list(tours)))
}

/// Five best-rated tours, cheapest first among equals.
///
/// # Endpoint
///
/// `GET /api/v1/tours/top-five-best`
pub async fn top_five_tours(
    State(state): State<AppState>,
    ListParams(params): ListParams,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let tours = state.tour_service.top_five(&params).await?;
    Ok(Json(ApiResponse::list(tours)))
}

/// Rating and price statistics of highly rated tours, grouped by difficulty.
///
/// # Endpoint
///
/// `GET /api/v1/tours/tour-stats`
///
/// # Response
///
/// ```json
/// {
///   "message": "Documents received successfully",
///   "results": 1,
///   "data": [
///     { "difficulty": "easy", "numTours": 4, "numRatings": 24, "avgRating": 4.7,
///       "avgPrice": 1272, "minPrice": 397, "maxPrice": 1997 }
///   ]
/// }
/// ```
pub async fn tour_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let stats = state.tour_service.stats().await?;
    Ok(Json(ApiResponse::list(stats)))
}

/// Tour starts per month of `year`.
///
/// # Endpoint
///
/// `GET /api/v1/tours/monthly-plan/{year}`
pub async fn monthly_plan(
    State(state): State<AppState>,
    Path(year): Path<String>,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let year: i32 = year
        .parse()
        .map_err(|_| AppError::bad_request(format!("Invalid year: {year}"), Value::Null))?;

    let plan = state.tour_service.monthly_plan(year).await?;
    Ok(Json(ApiResponse::list(plan)))
}

/// Tours starting within a radius of a point.
///
/// # Endpoint
///
/// `GET /api/v1/tours/tours-within/{distance}/center/{latlng}/unit/{unit}`
///
/// `latlng` is `"34.11,-118.11"`; `unit` is `mi` or `km`.
pub async fn tours_within(
    State(state): State<AppState>,
    Path((distance, latlng, unit)): Path<(String, String, String)>,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let distance: f64 = distance.parse().map_err(|_| {
        AppError::bad_request(format!("Invalid distance: {distance}"), Value::Null)
    })?;
    let center = GeoPoint::parse_lat_lng(&latlng)?;
    let unit: DistanceUnit = unit.parse()?;

    let tours = state.tour_service.within(distance, center, unit).await?;
    Ok(Json(ApiResponse::list(tours)))
}

/// Distance from a point to every tour's start, nearest first.
///
/// # Endpoint
///
/// `GET /api/v1/tours/distances/{latlng}/unit/{unit}`
pub async fn tour_distances(
    State(state): State<AppState>,
    Path((latlng, unit)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<Value>>>, AppError> {
    let center = GeoPoint::parse_lat_lng(&latlng)?;
    let unit: DistanceUnit = unit.parse()?;

    let distances = state.tour_service.distances(center, unit).await?;
    Ok(Json(ApiResponse::list(distances)))
}

/// A tour with its guides and reviews.
///
/// # Endpoint
///
/// `GET /api/v1/tours/{id}`
pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let tour = state.tour_service.detail(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::new(FOUND, tour)))
}

/// Creates a tour.
///
/// # Endpoint
///
/// `POST /api/v1/tours`
///
/// # Response Codes
///
/// - **201 Created**: Tour stored
/// - **400 Bad Request**: Validation failed or the name is taken
pub async fn create_tour(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<NewTour>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let tour = state.tour_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(CREATED, tour))))
}

/// `PATCH /api/v1/tours/{id}`
pub async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<TourPatch>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let tour = state.tour_service.update(parse_id(&id)?, patch).await?;
    Ok(Json(ApiResponse::new(UPDATED, tour)))
}

/// `DELETE /api/v1/tours/{id}`
pub async fn delete_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.tour_service.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
