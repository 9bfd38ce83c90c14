//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod auth;
pub mod fallback;
pub mod health;
pub mod reviews;
pub mod tours;
pub mod users;

pub use fallback::fallback_handler;
pub use health::health_handler;
