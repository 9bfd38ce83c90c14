//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating collection calls,
//! credential handling, and business rules. Services provide a clean API for
//! HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::auth_service::AuthService`] - Signup, login, session tokens and password resets
//! - [`services::resource_service::ResourceService`] - Generic CRUD over any resource
//! - [`services::tour_service::TourService`] - Tours, analytics and geospatial queries
//! - [`services::review_service::ReviewService`] - Reviews and tour rating aggregates
//! - [`services::user_service::UserService`] - Profile self-service and user administration

pub mod services;
