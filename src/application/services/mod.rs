//! Business logic services for the application layer.

pub mod auth_service;
pub mod password_service;
pub mod populate;
pub mod reset_token;
pub mod resource_service;
pub mod review_service;
pub mod session_tokens;
pub mod tour_service;
pub mod user_service;

pub use auth_service::{AuthService, Session};
pub use password_service::PasswordService;
pub use resource_service::ResourceService;
pub use review_service::ReviewService;
pub use session_tokens::{Claims, SessionTokens, TokenError};
pub use tour_service::TourService;
pub use user_service::UserService;
