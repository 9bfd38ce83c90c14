//! Generic create/read/update/delete over any [`Resource`].

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::document::Resource;
use crate::domain::query::{Filter, Query, QueryBuilder, QueryParams};
use crate::domain::repositories::Collection;
use crate::error::AppError;

/// CRUD service shared by tours, reviews and users.
///
/// List reads run the request parameters through [`QueryBuilder`]; nested
/// routes narrow them further with a parent filter.
pub struct ResourceService<T> {
    collection: Collection<T>,
}

impl<T> Clone for ResourceService<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
        }
    }
}

impl<T: Resource> ResourceService<T> {
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    fn not_found() -> AppError {
        AppError::not_found(format!("No {} found with that ID", T::LABEL))
    }

    /// Serializes `item` into its response shape.
    pub fn present(item: &T) -> Result<Value, AppError> {
        Ok(T::present(serde_json::to_value(item)?))
    }

    /// Lists documents matching `params` within `parent`, already shaped
    /// for a response.
    pub async fn find_many(
        &self,
        params: &QueryParams,
        parent: Filter,
    ) -> Result<Vec<Value>, AppError> {
        let query = QueryBuilder::new(Query::<T>::all().matching(parent), params)
            .filter()
            .sort()
            .limit_fields()
            .paginate()
            .build();

        let docs = self.collection.find_documents(query).await?;
        Ok(docs.into_iter().map(T::present).collect())
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no visible document has this id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<T, AppError> {
        self.collection
            .find_by_id(id)
            .await?
            .ok_or_else(Self::not_found)
    }

    pub async fn create(&self, input: T::Create) -> Result<T, AppError> {
        let item = T::create(input, Uuid::new_v4(), Utc::now())?;
        let created = self.collection.insert(&item).await?;

        tracing::debug!(collection = T::COLLECTION.name, id = %created.id(), "Document created");
        Ok(created)
    }

    /// Applies `patch` and writes back only the fields it changed.
    pub async fn update_by_id(&self, id: Uuid, patch: T::Update) -> Result<T, AppError> {
        let current = self.find_by_id(id).await?;

        let mut updated = current.clone();
        updated.apply(patch)?;

        let changes = changed_fields(
            serde_json::to_value(&current)?,
            serde_json::to_value(&updated)?,
        );
        if changes.is_empty() {
            return Ok(current);
        }

        self.update_fields(id, changes).await
    }

    /// Writes raw top-level `changes` to the document with this id.
    pub async fn update_fields(&self, id: Uuid, changes: Map<String, Value>) -> Result<T, AppError> {
        self.collection
            .update_by_id(id, changes)
            .await?
            .ok_or_else(Self::not_found)
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<T, AppError> {
        let deleted = self
            .collection
            .delete_by_id(id)
            .await?
            .ok_or_else(Self::not_found)?;

        tracing::debug!(collection = T::COLLECTION.name, id = %id, "Document deleted");
        Ok(deleted)
    }
}

/// Top-level fields whose value differs between `before` and `after`.
fn changed_fields(before: Value, after: Value) -> Map<String, Value> {
    let (Value::Object(before), Value::Object(after)) = (before, after) else {
        return Map::new();
    };

    after
        .into_iter()
        .filter(|(key, value)| before.get(key) != Some(value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{NewReview, Review, ReviewPatch};
    use crate::infrastructure::persistence::MemoryDocumentStore;
    use serde_json::json;
    use std::sync::Arc;

    fn service() -> ResourceService<Review> {
        ResourceService::new(Collection::new(Arc::new(MemoryDocumentStore::new())))
    }

    fn new_review(tour: Uuid, rating: u8) -> NewReview {
        NewReview {
            review: "Great tour".to_string(),
            rating,
            tour: Some(tour),
            user: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_changed_fields() {
        let changes = changed_fields(
            json!({ "a": 1, "b": "x", "c": null }),
            json!({ "a": 1, "b": "y", "c": 2 }),
        );

        assert_eq!(Value::Object(changes), json!({ "b": "y", "c": 2 }));
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let service = service();
        let tour = Uuid::new_v4();

        let created = service.create(new_review(tour, 4)).await.unwrap();
        let found = service.find_by_id(created.id).await.unwrap();
        assert_eq!(found.rating, 4);

        let updated = service
            .update_by_id(
                created.id,
                ReviewPatch {
                    review: None,
                    rating: Some(2),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.rating, 2);
        assert_eq!(updated.review, "Great tour");

        service.delete_by_id(created.id).await.unwrap();
        let err = service.find_by_id(created.id).await.unwrap_err();
        assert_eq!(err.to_string(), "No review found with that ID");
    }

    #[tokio::test]
    async fn test_find_many_with_parent_filter() {
        let service = service();
        let (tour_a, tour_b) = (Uuid::new_v4(), Uuid::new_v4());

        for rating in [3, 5] {
            service.create(new_review(tour_a, rating)).await.unwrap();
        }
        service.create(new_review(tour_b, 1)).await.unwrap();

        let params = QueryParams::parse("sort=rating");
        let docs = service
            .find_many(&params, Filter::new().eq("tour", tour_a.to_string()))
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["rating"], 3);
        assert_eq!(docs[1]["rating"], 5);
        assert!(docs[0].get("__v").is_none());
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let err = service().delete_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
