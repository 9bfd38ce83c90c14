#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{Value, json};
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use tourify::application::services::Session;
use tourify::config::AuthSettings;
use tourify::domain::entities::{NewTour, Role, User};
use tourify::infrastructure::mail::{Email, MailError, Mailer};
use tourify::infrastructure::persistence::{MemoryDocumentStore, PgDocumentStore};
use tourify::routes::app_router;
use tourify::state::AppState;

pub const TEST_SECRET: &str = "integration-test-signing-secret-0123456789";
pub const PASSWORD: &str = "Test1234!";

/// Keeps every email it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    /// Reset token from the most recent email.
    pub fn last_reset_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let html = &sent.last()?.html_body;
        let rest = html.split("/reset-password/").nth(1)?;
        rest.split('"').next().map(str::to_string)
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: Email) -> Result<(), MailError> {
        Err(MailError::Rejected(503))
    }
}

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expires_in_days: 90,
        cookie_secure: false,
        public_url: "http://localhost:3000".to_string(),
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

/// Full router on an empty in-memory store.
pub fn spawn_app() -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(
        Arc::new(MemoryDocumentStore::new()),
        mailer.clone(),
        &auth_settings(),
    );
    let server = TestServer::new(app_router(state.clone(), None)).unwrap();

    TestApp {
        server,
        state,
        mailer,
    }
}

/// Full router whose mailer always fails.
pub fn spawn_app_with_failing_mailer() -> (TestServer, AppState) {
    let state = AppState::new(
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(FailingMailer),
        &auth_settings(),
    );
    let server = TestServer::new(app_router(state.clone(), None)).unwrap();
    (server, state)
}

/// Services backed by PostgreSQL.
pub fn pg_state(pool: PgPool) -> AppState {
    AppState::new(
        Arc::new(PgDocumentStore::new(Arc::new(pool))),
        Arc::new(RecordingMailer::default()),
        &auth_settings(),
    )
}

/// Registers an account with `role` and returns it with a session token.
pub async fn create_user(state: &AppState, name: &str, email: &str, role: Role) -> Session {
    let user = state
        .auth_service
        .register(name, email, PASSWORD, role)
        .await
        .unwrap();
    let token = state.auth_service.tokens().issue(user.id).unwrap();
    Session { user, token }
}

pub async fn admin(state: &AppState) -> Session {
    create_user(state, "Admin", "admin@example.com", Role::Admin).await
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn tour_payload(name: &str, price: f64, difficulty: &str) -> Value {
    json!({
        "name": name,
        "duration": 5,
        "maxGroupSize": 10,
        "difficulty": difficulty,
        "price": price,
        "summary": "A tour used in tests",
        "imageCover": "cover.jpg",
        "startDates": ["2026-06-01T09:00:00Z"],
        "startLocation": {
            "type": "Point",
            "coordinates": [-115.570154, 51.178456],
            "description": "Banff, CAN"
        }
    })
}

/// Inserts a tour directly through the service and returns its id.
pub async fn create_tour(state: &AppState, payload: Value) -> String {
    let input: NewTour = serde_json::from_value(payload).unwrap();
    let tour = state.tour_service.create(input).await.unwrap();
    tour["id"].as_str().unwrap().to_string()
}

pub fn user_id(user: &User) -> String {
    user.id.to_string()
}
