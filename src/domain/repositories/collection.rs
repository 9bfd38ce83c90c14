//! Typed access to one collection of a [`DocumentStore`].

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::document::{Document, FieldPath};
use crate::domain::geo::GeoPoint;
use crate::domain::pipeline::Pipeline;
use crate::domain::query::{Filter, Query};
use crate::domain::repositories::DocumentStore;
use crate::error::AppError;

/// Collection of `T` documents. Every read is narrowed by [`Document::scope`].
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    _document: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _document: PhantomData,
        }
    }
}

fn decode<T: DeserializeOwned>(doc: Value) -> Result<T, AppError> {
    Ok(serde_json::from_value(doc)?)
}

impl<T: Document> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _document: PhantomData,
        }
    }

    fn scoped(filter: Filter) -> Filter {
        T::scope().and(filter)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, AppError> {
        self.find_one(Filter::by_id(id)).await
    }

    pub async fn find_one(&self, filter: Filter) -> Result<Option<T>, AppError> {
        self.store
            .find_one(&T::COLLECTION, &Self::scoped(filter))
            .await?
            .map(decode)
            .transpose()
    }

    /// Runs `query` and returns the (possibly projected) raw documents.
    pub async fn find_documents(&self, query: Query<T>) -> Result<Vec<Value>, AppError> {
        let mut query = query.into_document_query();
        query.filter = Self::scoped(query.filter);
        self.store.find_many(&T::COLLECTION, &query).await
    }

    pub async fn find_all(&self, filter: Filter) -> Result<Vec<T>, AppError> {
        self.find_documents(Query::all().matching(filter))
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn count(&self, filter: Filter) -> Result<u64, AppError> {
        self.store
            .count(&T::COLLECTION, &Self::scoped(filter))
            .await
    }

    pub async fn insert(&self, document: &T) -> Result<T, AppError> {
        let value = serde_json::to_value(document)?;
        decode(self.store.insert(&T::COLLECTION, value).await?)
    }

    pub async fn update_by_id(
        &self,
        id: Uuid,
        changes: Map<String, Value>,
    ) -> Result<Option<T>, AppError> {
        self.store
            .update_one(&T::COLLECTION, &Self::scoped(Filter::by_id(id)), changes)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<Option<T>, AppError> {
        self.store
            .delete_one(&T::COLLECTION, &Self::scoped(Filter::by_id(id)))
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn aggregate(&self, pipeline: Pipeline) -> Result<Vec<Value>, AppError> {
        let pipeline = pipeline.with_leading_match(T::scope());
        self.store.aggregate(&T::COLLECTION, &pipeline).await
    }

    /// Documents with a point at `field`, nearest to `center` first, with
    /// distances in metres.
    pub async fn geo_near(
        &self,
        field: &str,
        center: GeoPoint,
    ) -> Result<Vec<(Value, f64)>, AppError> {
        self.store
            .geo_near(
                &T::COLLECTION,
                &FieldPath::new(field),
                center,
                &Self::scoped(Filter::new()),
            )
            .await
    }
}
