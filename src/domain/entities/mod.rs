//! Core business entities.
//!
//! - [`Tour`] - A bookable tour with embedded locations
//! - [`Review`] - A user's rating of a tour
//! - [`User`] - An account with a [`Role`]

pub mod review;
pub mod tour;
pub mod user;

pub use review::{NewReview, Review, ReviewPatch};
pub use tour::{DEFAULT_RATINGS_AVERAGE, Difficulty, Location, NewTour, PointKind, Tour, TourPatch};
pub use user::{NewUser, Role, User, UserPatch};
