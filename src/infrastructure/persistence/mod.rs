//! Document store implementations.
//!
//! Concrete implementations of the domain [`DocumentStore`] contract.
//!
//! # Stores
//!
//! - [`PgDocumentStore`] - PostgreSQL JSONB tables, queries built with SQLx
//! - [`MemoryDocumentStore`] - In-process collections for tests and local runs

pub mod memory_store;
pub mod pg_document_store;

pub use memory_store::MemoryDocumentStore;
pub use pg_document_store::PgDocumentStore;

use crate::config::Config;
use crate::domain::repositories::DocumentStore;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Opens the store selected by `DATABASE_URL`.
///
/// `memory://` selects the in-process store. Any other URL opens a
/// PostgreSQL pool and applies pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    if config.is_memory_store() {
        tracing::warn!("Using in-memory document store; data is lost on exit");
        return Ok(Arc::new(MemoryDocumentStore::new()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations applied");

    Ok(Arc::new(PgDocumentStore::new(Arc::new(pool))))
}
