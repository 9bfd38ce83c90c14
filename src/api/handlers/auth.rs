//! Signup, login and password management handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::Value;

use crate::api::dto::auth::{
    AuthResponse, ForgotPasswordRequest, LOGGED_IN, LoginRequest, ResetPasswordRequest,
    SignupRequest, TOKEN_SENT, UpdatePasswordRequest, UserData,
};
use crate::api::dto::envelope::ApiResponse;
use crate::api::extractors::{CurrentUser, JsonBody, ValidatedJson};
use crate::api::middleware::auth::SESSION_COOKIE;
use crate::application::services::Session;
use crate::error::AppError;
use crate::state::AppState;

pub const MISSING_CREDENTIALS: &str = "Please provide email and password!";

/// Sets the session cookie and renders the signed-in user.
fn session_response(
    state: &AppState,
    session: Session,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .http_only(true)
        .secure(state.cookie_secure)
        .path("/")
        .max_age(time::Duration::days(state.jwt_expires_in_days));

    let user = state.user_service.me(&session.user)?;

    Ok((
        CookieJar::new().add(cookie),
        Json(AuthResponse {
            message: LOGGED_IN,
            token: session.token,
            data: UserData { user },
        }),
    ))
}

/// Creates an account and signs it in.
///
/// # Endpoint
///
/// `POST /api/v1/users/signup`
///
/// # Response Codes
///
/// - **201 Created**: Account created, `jwt` cookie set
/// - **400 Bad Request**: Validation failed or email already registered
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let session = state
        .auth_service
        .signup(&payload.name, &payload.email, &payload.password)
        .await?;

    let (jar, body) = session_response(&state, session)?;
    Ok((StatusCode::CREATED, jar, body))
}

/// Signs in with email and password.
///
/// # Endpoint
///
/// `POST /api/v1/users/login`
///
/// # Response Codes
///
/// - **200 OK**: Signed in, `jwt` cookie set
/// - **400 Bad Request**: Email or password missing
/// - **401 Unauthorized**: Incorrect email or password
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(AppError::bad_request(MISSING_CREDENTIALS, Value::Null));
    };
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::bad_request(MISSING_CREDENTIALS, Value::Null));
    }

    let session = state.auth_service.login(&email, &password).await?;
    session_response(&state, session)
}

/// Emails a single-use password reset link.
///
/// # Endpoint
///
/// `POST /api/v1/users/forgot-password`
///
/// # Response Codes
///
/// - **200 OK**: Reset email sent
/// - **404 Not Found**: No user with that email
/// - **500 Internal Server Error**: The email could not be delivered
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state.auth_service.forgot_password(&payload.email).await?;
    Ok(Json(ApiResponse::new(TOKEN_SENT, Value::Null)))
}

/// Sets a new password using a reset token and signs the user in.
///
/// # Endpoint
///
/// `PATCH /api/v1/users/reset-password/{token}`
///
/// # Response Codes
///
/// - **200 OK**: Password changed, `jwt` cookie set
/// - **400 Bad Request**: Token invalid or expired, or validation failed
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let session = state
        .auth_service
        .reset_password(&token, &payload.password)
        .await?;
    session_response(&state, session)
}

/// Changes the signed-in user's password after checking the current one.
///
/// # Endpoint
///
/// `PATCH /api/v1/users/update-password`
///
/// # Response Codes
///
/// - **200 OK**: Password changed, fresh `jwt` cookie set
/// - **401 Unauthorized**: Current password is wrong
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<UpdatePasswordRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let session = state
        .auth_service
        .update_password(&user, &payload.password_current, &payload.password)
        .await?;
    session_response(&state, session)
}
