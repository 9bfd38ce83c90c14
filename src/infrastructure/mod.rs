//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain and application
//! layers, providing concrete implementations for data persistence and
//! outbound mail.
//!
//! # Modules
//!
//! - [`persistence`] - Document stores (PostgreSQL and in-memory)
//! - [`mail`] - Mail delivery abstractions (HTTP relay and log-only implementations)

pub mod mail;
pub mod persistence;
