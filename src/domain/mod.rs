//! Domain layer containing business entities and logic.
//!
//! This module implements the core domain logic following Clean Architecture principles.
//! It defines entities, the document and query model, and repository interfaces
//! independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Tours, reviews and users
//! - [`document`] - Document traits shared by every stored entity
//! - [`query`] - Filters, sorting, projection and the request query builder
//! - [`pipeline`] - Aggregation stages used for statistics
//! - [`geo`] - Spherical distance helpers
//! - [`repositories`] - Data access trait definitions
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic is encapsulated in services (see [`crate::application::services`])

pub mod document;
pub mod entities;
pub mod geo;
pub mod pipeline;
pub mod query;
pub mod repositories;
