//! Storage contract for JSON document collections.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::document::{CollectionSpec, FieldPath};
use crate::domain::geo::GeoPoint;
use crate::domain::pipeline::Pipeline;
use crate::domain::query::{DocumentQuery, Filter};
use crate::error::AppError;

/// Document store over named collections.
///
/// Documents are JSON objects with a UUID `id`. Stores enforce the unique
/// keys declared by each [`CollectionSpec`], maintain the `__v` revision
/// counter and apply every single-document write atomically.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgDocumentStore`] - PostgreSQL JSONB tables
/// - [`crate::infrastructure::persistence::MemoryDocumentStore`] - In-process store for tests and local runs
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_one(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
    ) -> Result<Option<Value>, AppError>;

    /// Runs a query: filter, then sort (ties broken by `id`), then skip/limit,
    /// then projection.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_many(
        &self,
        collection: &CollectionSpec,
        query: &DocumentQuery,
    ) -> Result<Vec<Value>, AppError>;

    async fn count(&self, collection: &CollectionSpec, filter: &Filter) -> Result<u64, AppError>;

    /// Inserts a new document and returns it as stored, with `__v` set to 0.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when a unique key collides.
    async fn insert(&self, collection: &CollectionSpec, document: Value)
    -> Result<Value, AppError>;

    /// Merges `changes` into the top level of the first document matching
    /// `filter` and bumps its revision. `id` and `__v` cannot be changed.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(doc))` with the updated document
    /// - `Ok(None)` if nothing matched
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] when a unique key collides.
    async fn update_one(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
        changes: Map<String, Value>,
    ) -> Result<Option<Value>, AppError>;

    /// Deletes the first document matching `filter` and returns it.
    async fn delete_one(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
    ) -> Result<Option<Value>, AppError>;

    /// Deletes every matching document and returns how many were removed.
    async fn delete_many(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
    ) -> Result<u64, AppError>;

    async fn aggregate(
        &self,
        collection: &CollectionSpec,
        pipeline: &Pipeline,
    ) -> Result<Vec<Value>, AppError>;

    /// Returns documents matching `filter` whose GeoJSON point at `field`
    /// exists, paired with their distance from `center` in metres, nearest first.
    async fn geo_near(
        &self,
        collection: &CollectionSpec,
        field: &FieldPath,
        center: GeoPoint,
        filter: &Filter,
    ) -> Result<Vec<(Value, f64)>, AppError>;

    /// Checks connectivity.
    async fn ping(&self) -> Result<(), AppError>;
}
