//! DTOs for signup, login and password endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::utils::validation::validate_password_strength;

/// Signup request body.
///
/// ```json
/// { "name": "Jonas", "email": "jonas@example.com", "password": "Pass1234!", "passwordConfirm": "Pass1234!" }
/// ```
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_signup_confirmation"))]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Please tell us your name"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    pub password_confirm: String,
}

fn validate_signup_confirmation(req: &SignupRequest) -> Result<(), ValidationError> {
    confirm(&req.password, &req.password_confirm)
}

/// Both fields are optional so a missing one yields a readable error
/// rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_reset_confirmation"))]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    pub password_confirm: String,
}

fn validate_reset_confirmation(req: &ResetPasswordRequest) -> Result<(), ValidationError> {
    confirm(&req.password, &req.password_confirm)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_update_confirmation"))]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Please provide your current password"))]
    pub password_current: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
    pub password_confirm: String,
}

fn validate_update_confirmation(req: &UpdatePasswordRequest) -> Result<(), ValidationError> {
    confirm(&req.password, &req.password_confirm)
}

fn confirm(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password == confirmation {
        Ok(())
    } else {
        Err(ValidationError::new("password_confirm").with_message("Passwords are not the same!".into()))
    }
}

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: Value,
}

pub const LOGGED_IN: &str = "Logged In";
pub const TOKEN_SENT: &str = "Token sent to email!";

/// Response of every endpoint that signs the user in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub data: UserData,
}
