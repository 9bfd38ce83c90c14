//! API route configuration.
//!
//! Public and protected methods share paths, so access control is attached
//! per method with [`authenticated`] and [`restricted`] rather than per router.

use crate::api::handlers::{auth, reviews, tours, users};
use crate::api::middleware::auth::{authenticated, restricted};
use crate::domain::entities::Role;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

pub const ADMIN: &[Role] = &[Role::Admin];
pub const TOUR_EDITORS: &[Role] = &[Role::Admin, Role::LeadGuide, Role::Guide];
pub const TOUR_MANAGERS: &[Role] = &[Role::Admin, Role::LeadGuide];

/// Routes mounted under `/api/v1`.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes(state))
        .nest("/tours", tour_routes(state))
        .nest("/reviews", review_routes(state))
}

/// # Endpoints
///
/// - `POST   /signup`, `POST /login`, `POST /forgot-password` - Public
/// - `PATCH  /reset-password/{token}` - Public, token from the reset email
/// - `PATCH  /update-password`, `GET /me`, `PATCH /update-me`,
///   `DELETE /delete-me` - Signed in
/// - `GET|POST /`, `GET|PATCH|DELETE /{id}` - Admin
fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password/{token}", patch(auth::reset_password))
        .route(
            "/update-password",
            authenticated(state, patch(auth::update_password)),
        )
        .route("/me", authenticated(state, get(users::get_me)))
        .route("/update-me", authenticated(state, patch(users::update_me)))
        .route("/delete-me", authenticated(state, delete(users::delete_me)))
        .route(
            "/",
            restricted(state, ADMIN, get(users::list_users).post(users::create_user)),
        )
        .route(
            "/{id}",
            restricted(
                state,
                ADMIN,
                get(users::get_user)
                    .patch(users::update_user)
                    .delete(users::delete_user),
            ),
        )
}

/// # Endpoints
///
/// - `GET    /`, `GET /{id}` - Public
/// - `POST   /`, `PATCH /{id}` - Guides, lead guides and admins
/// - `DELETE /{id}` - Lead guides and admins
/// - `GET    /top-five-best`, `/tour-stats`, `/monthly-plan/{year}` - Admin
/// - `GET    /tours-within/{distance}/center/{latlng}/unit/{unit}` - Public
/// - `GET    /distances/{latlng}/unit/{unit}` - Public
/// - `GET|POST /{id}/reviews` - Reviews of one tour; posting requires sign-in
fn tour_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(tours::list_tours).merge(restricted(state, TOUR_EDITORS, post(tours::create_tour))),
        )
        .route(
            "/top-five-best",
            restricted(state, ADMIN, get(tours::top_five_tours)),
        )
        .route("/tour-stats", restricted(state, ADMIN, get(tours::tour_stats)))
        .route(
            "/monthly-plan/{year}",
            restricted(state, ADMIN, get(tours::monthly_plan)),
        )
        .route(
            "/tours-within/{distance}/center/{latlng}/unit/{unit}",
            get(tours::tours_within),
        )
        .route("/distances/{latlng}/unit/{unit}", get(tours::tour_distances))
        .route(
            "/{id}",
            get(tours::get_tour)
                .merge(restricted(state, TOUR_EDITORS, patch(tours::update_tour)))
                .merge(restricted(state, TOUR_MANAGERS, delete(tours::delete_tour))),
        )
        .route(
            "/{id}/reviews",
            get(reviews::list_tour_reviews)
                .merge(authenticated(state, post(reviews::create_tour_review))),
        )
}

/// # Endpoints
///
/// - `GET    /`, `GET /{id}` - Public
/// - `POST   /`, `PATCH /{id}`, `DELETE /{id}` - Signed in; changes are
///   limited to the review's author and admins
fn review_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(reviews::list_reviews).merge(authenticated(state, post(reviews::create_review))),
        )
        .route(
            "/{id}",
            get(reviews::get_review).merge(authenticated(
                state,
                patch(reviews::update_review).delete(reviews::delete_review),
            )),
        )
}
