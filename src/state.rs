//! Shared application state.

use std::sync::Arc;

use crate::application::services::{
    AuthService, PasswordService, ReviewService, SessionTokens, TourService, UserService,
};
use crate::config::AuthSettings;
use crate::domain::repositories::{Collection, DocumentStore};
use crate::infrastructure::mail::Mailer;

/// Services and settings handed to every handler. Built once at startup and
/// read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub auth_service: Arc<AuthService>,
    pub tour_service: Arc<TourService>,
    pub review_service: Arc<ReviewService>,
    pub user_service: Arc<UserService>,
    pub cookie_secure: bool,
    pub jwt_expires_in_days: i64,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, mailer: Arc<dyn Mailer>, auth: &AuthSettings) -> Self {
        let users = Collection::new(store.clone());
        let tours = Collection::new(store.clone());
        let reviews = Collection::new(store.clone());

        let review_service = ReviewService::new(reviews, tours.clone(), users.clone());
        let tour_service = TourService::new(tours, review_service.clone(), users.clone());

        let auth_service = AuthService::new(
            users.clone(),
            PasswordService::new(),
            SessionTokens::new(&auth.jwt_secret, auth.jwt_expires_in_days),
            mailer,
            &auth.public_url,
        );

        Self {
            store,
            auth_service: Arc::new(auth_service),
            tour_service: Arc::new(tour_service),
            review_service: Arc::new(review_service),
            user_service: Arc::new(UserService::new(users)),
            cookie_secure: auth.cookie_secure,
            jwt_expires_in_days: auth.jwt_expires_in_days,
        }
    }
}
