mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tourify::domain::entities::Role;

// ─── SIGNUP ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_signup_success() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/v1/users/signup")
        .json(&json!({
            "name": "Laura Wilson",
            "email": "Laura@Example.com",
            "password": "Secret123!",
            "passwordConfirm": "Secret123!"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let cookie = response.cookie("jwt");
    assert!(cookie.http_only().unwrap_or(false));

    let json = response.json::<Value>();
    assert_eq!(json["message"], "Logged In");
    assert_eq!(cookie.value(), json["token"].as_str().unwrap());
    assert_eq!(json["data"]["user"]["email"], "laura@example.com");
    assert_eq!(json["data"]["user"]["role"], "user");
    assert!(json["data"]["user"].get("password").is_none());
    assert!(json["data"]["user"].get("passwordResetToken").is_none());
}

#[tokio::test]
async fn test_signup_weak_password() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/v1/users/signup")
        .json(&json!({
            "name": "Laura Wilson",
            "email": "laura@example.com",
            "password": "password",
            "passwordConfirm": "password"
        }))
        .await;

    response.assert_status_bad_request();
    let json = response.json::<Value>();
    assert_eq!(json["status"], "fail");
}

#[tokio::test]
async fn test_signup_password_mismatch() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/v1/users/signup")
        .json(&json!({
            "name": "Laura Wilson",
            "email": "laura@example.com",
            "password": "Secret123!",
            "passwordConfirm": "Secret123?"
        }))
        .await;

    response.assert_status_bad_request();
    let message = response.json::<Value>()["message"].as_str().unwrap().to_string();
    assert!(message.contains("Passwords are not the same!"));
}

#[tokio::test]
async fn test_signup_duplicate_email() {
    let app = common::spawn_app();
    common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;

    let response = app
        .server
        .post("/api/v1/users/signup")
        .json(&json!({
            "name": "Other Laura",
            "email": "laura@example.com",
            "password": "Secret123!",
            "passwordConfirm": "Secret123!"
        }))
        .await;

    response.assert_status_bad_request();
    let message = response.json::<Value>()["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Duplicate value for email"));
}

#[tokio::test]
async fn test_signup_malformed_json() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/v1/users/signup")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["status"], "fail");
}

// ─── LOGIN ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let app = common::spawn_app();
    common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;

    let response = app
        .server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "laura@example.com", "password": common::PASSWORD }))
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert!(json["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(json["data"]["user"]["name"], "Laura");
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "laura@example.com" }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(
        response.json::<Value>()["message"],
        "Please provide email and password!"
    );
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_email() {
    let app = common::spawn_app();
    common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;

    let wrong_password = app
        .server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "laura@example.com", "password": "Wrong123!" }))
        .await;
    wrong_password.assert_status_unauthorized();
    assert_eq!(
        wrong_password.json::<Value>()["message"],
        "Incorrect email or password"
    );

    let unknown = app
        .server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "nobody@example.com", "password": common::PASSWORD }))
        .await;
    unknown.assert_status_unauthorized();
    assert_eq!(
        unknown.json::<Value>()["message"],
        "Incorrect email or password"
    );
}

// ─── ACCESS CONTROL ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = common::spawn_app();

    let response = app.server.get("/api/v1/users/me").await;

    response.assert_status_unauthorized();
    assert_eq!(
        response.json::<Value>()["message"],
        "You are not logged in! Please log in to get access."
    );
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let app = common::spawn_app();

    let response = app
        .server
        .get("/api/v1/users/me")
        .add_header("Authorization", "Bearer not.a.token")
        .await;

    response.assert_status_forbidden();
    assert_eq!(
        response.json::<Value>()["message"],
        "Invalid token. Please log in again."
    );
}

#[tokio::test]
async fn test_protected_route_with_cookie() {
    let app = common::spawn_app();
    let session = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;

    let response = app
        .server
        .get("/api/v1/users/me")
        .add_header("Cookie", format!("jwt={}", session.token))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["email"], "laura@example.com");
}

// ─── PASSWORD RESET ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let app = common::spawn_app();
    common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;

    app.server
        .post("/api/v1/users/forgot-password")
        .json(&json!({ "email": "laura@example.com" }))
        .await
        .assert_status_ok();

    assert_eq!(app.mailer.count(), 1);
    let token = app.mailer.last_reset_token().unwrap();

    let reset = app
        .server
        .patch(&format!("/api/v1/users/reset-password/{token}"))
        .json(&json!({ "password": "Changed123!", "passwordConfirm": "Changed123!" }))
        .await;
    reset.assert_status_ok();
    assert!(reset.json::<Value>()["token"].is_string());

    // The token works once.
    let again = app
        .server
        .patch(&format!("/api/v1/users/reset-password/{token}"))
        .json(&json!({ "password": "Another123!", "passwordConfirm": "Another123!" }))
        .await;
    again.assert_status_bad_request();
    assert_eq!(
        again.json::<Value>()["message"],
        "Token is invalid or has expired"
    );

    app.server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "laura@example.com", "password": "Changed123!" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let app = common::spawn_app();

    let response = app
        .server
        .post("/api/v1/users/forgot-password")
        .json(&json!({ "email": "nobody@example.com" }))
        .await;

    response.assert_status_not_found();
    assert_eq!(app.mailer.count(), 0);
}

#[tokio::test]
async fn test_forgot_password_delivery_failure_clears_token() {
    let (server, state) = common::spawn_app_with_failing_mailer();
    let session = common::create_user(&state, "Laura", "laura@example.com", Role::User).await;

    let response = server
        .post("/api/v1/users/forgot-password")
        .json(&json!({ "email": "laura@example.com" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json = response.json::<Value>();
    assert_eq!(json["status"], "error");
    assert_eq!(
        json["message"],
        "There was an error sending the email. Try again later!"
    );

    let users = tourify::domain::repositories::Collection::<tourify::domain::entities::User>::new(
        state.store.clone(),
    );
    let stored = users.find_by_id(session.user.id).await.unwrap().unwrap();
    assert!(stored.password_reset_token.is_none());
    assert!(stored.password_reset_expires.is_none());
}

#[tokio::test]
async fn test_invalid_reset_token() {
    let app = common::spawn_app();

    let response = app
        .server
        .patch("/api/v1/users/reset-password/deadbeef")
        .json(&json!({ "password": "Changed123!", "passwordConfirm": "Changed123!" }))
        .await;

    response.assert_status_bad_request();
}

// ─── UPDATE PASSWORD ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_password_wrong_current() {
    let app = common::spawn_app();
    let session = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;

    let response = app
        .server
        .patch("/api/v1/users/update-password")
        .add_header("Authorization", common::bearer(&session.token))
        .json(&json!({
            "passwordCurrent": "Wrong123!",
            "password": "Changed123!",
            "passwordConfirm": "Changed123!"
        }))
        .await;

    response.assert_status_unauthorized();
    assert_eq!(
        response.json::<Value>()["message"],
        "Your current password is wrong."
    );
}

#[tokio::test]
async fn test_update_password_invalidates_older_tokens() {
    let app = common::spawn_app();
    let session = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;
    let old_token = app
        .state
        .auth_service
        .tokens()
        .issue_at(session.user.id, Utc::now() - Duration::seconds(30))
        .unwrap();

    let response = app
        .server
        .patch("/api/v1/users/update-password")
        .add_header("Authorization", common::bearer(&old_token))
        .json(&json!({
            "passwordCurrent": common::PASSWORD,
            "password": "Changed123!",
            "passwordConfirm": "Changed123!"
        }))
        .await;
    response.assert_status_ok();
    let fresh_token = response.json::<Value>()["token"].as_str().unwrap().to_string();

    let stale = app
        .server
        .get("/api/v1/users/me")
        .add_header("Authorization", common::bearer(&old_token))
        .await;
    stale.assert_status_forbidden();
    assert_eq!(
        stale.json::<Value>()["message"],
        "User recently changed password. Please log in again."
    );

    app.server
        .get("/api/v1/users/me")
        .add_header("Authorization", common::bearer(&fresh_token))
        .await
        .assert_status_ok();
}
