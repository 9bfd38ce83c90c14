//! Session authentication and role-based access control.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use axum_auth::AuthBearer;
use axum_extra::extract::CookieJar;

use crate::api::extractors::{CurrentUser, NOT_LOGGED_IN};
use crate::domain::entities::Role;
use crate::{error::AppError, state::AppState};

/// Cookie that carries the session token for browser clients.
pub const SESSION_COOKIE: &str = "jwt";

pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action";

/// Authenticates the request and attaches the signed-in [`User`] to it.
///
/// # Token Sources
///
/// ```text
/// Authorization: Bearer <token>
/// Cookie: jwt=<token>
/// ```
///
/// The header wins when both are present.
///
/// # Errors
///
/// - `401 Unauthorized` if no token is supplied
/// - `403 Forbidden` if the token is invalid or expired, its user no longer
///   exists, or the password changed after the token was issued
///
/// [`User`]: crate::domain::entities::User
pub async fn protect(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let token = match AuthBearer::from_request_parts(&mut parts, &()).await {
        Ok(AuthBearer(token)) => Some(token),
        Err(_) => CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string()),
    }
    .filter(|token| !token.is_empty())
    .ok_or_else(|| AppError::unauthorized(NOT_LOGGED_IN))?;

    let user = st.auth_service.authenticate(&token).await?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Rejects principals whose role is not in the allow-list.
///
/// Must run inside [`protect`].
pub async fn restrict_to(
    State(roles): State<&'static [Role]>,
    CurrentUser(user): CurrentUser,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.has_role(roles) {
        tracing::debug!(user = %user.id, role = %user.role, "Role not allowed");
        return Err(AppError::forbidden(PERMISSION_DENIED));
    }

    Ok(next.run(req).await)
}

/// Requires a signed-in user for every method of `route`.
pub fn authenticated(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(state.clone(), protect))
}

/// Requires a signed-in user holding one of `roles`.
///
/// ```rust,ignore
/// .route("/tours/{id}", get(get_tour).merge(restricted(&state, STAFF, patch(update_tour))))
/// ```
pub fn restricted(
    state: &AppState,
    roles: &'static [Role],
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    authenticated(
        state,
        route.route_layer(middleware::from_fn_with_state(roles, restrict_to)),
    )
}
