//! In-process document store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::document::{CollectionSpec, FieldPath, VERSION_KEY};
use crate::domain::geo::GeoPoint;
use crate::domain::pipeline::{Pipeline, run_stages};
use crate::domain::query::{DocumentQuery, Filter, compare_documents};
use crate::domain::repositories::DocumentStore;
use crate::error::AppError;

/// Document store holding every collection in memory.
///
/// Evaluates queries with the same domain evaluators the Postgres store
/// mirrors in SQL, so handlers behave identically on both.
///
/// # Use Cases
///
/// - Integration tests
/// - Local runs with `DATABASE_URL=memory://`
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<&'static str, Vec<Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        debug!("Using in-memory document store");
        Self::default()
    }
}

fn unique_values<'a>(doc: &'a Value, fields: &[&str]) -> Option<Vec<&'a Value>> {
    fields
        .iter()
        .map(|field| doc.get(*field).filter(|v| !v.is_null()))
        .collect()
}

/// Rejects `candidate` if it collides with a document other than itself.
fn check_unique(spec: &CollectionSpec, docs: &[Value], candidate: &Value) -> Result<(), AppError> {
    let candidate_id = candidate.get("id");
    for fields in spec.unique_keys {
        let Some(values) = unique_values(candidate, fields) else {
            continue;
        };
        let collides = docs.iter().any(|other| {
            other.get("id") != candidate_id
                && unique_values(other, fields).is_some_and(|existing| existing == values)
        });
        if collides {
            return Err(AppError::duplicate(fields));
        }
    }
    Ok(())
}

fn sanitize_changes(mut changes: Map<String, Value>) -> Map<String, Value> {
    changes.remove("id");
    changes.remove(VERSION_KEY);
    changes
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_one(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
    ) -> Result<Option<Value>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection.name)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn find_many(
        &self,
        collection: &CollectionSpec,
        query: &DocumentQuery,
    ) -> Result<Vec<Value>, AppError> {
        let mut matched: Vec<Value> = {
            let collections = self.collections.read().await;
            collections
                .get(collection.name)
                .map(|docs| {
                    docs.iter()
                        .filter(|d| query.filter.matches(d))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        matched.sort_by(|a, b| compare_documents(a, b, &query.sort));

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| query.projection.apply(doc))
            .collect())
    }

    async fn count(&self, collection: &CollectionSpec, filter: &Filter) -> Result<u64, AppError> {
        let collections = self.collections.read().await;
        let count = collections
            .get(collection.name)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn insert(
        &self,
        collection: &CollectionSpec,
        mut document: Value,
    ) -> Result<Value, AppError> {
        let Value::Object(map) = &mut document else {
            return Err(AppError::internal("Documents must be JSON objects"));
        };
        if !map.get("id").is_some_and(Value::is_string) {
            return Err(AppError::internal("Documents must carry a string id"));
        }
        map.insert(VERSION_KEY.to_string(), Value::from(0));

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.name).or_default();

        if docs.iter().any(|d| d.get("id") == document.get("id")) {
            return Err(AppError::duplicate(&["id"]));
        }
        check_unique(collection, docs, &document)?;

        docs.push(document.clone());
        Ok(document)
    }

    async fn update_one(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
        changes: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let changes = sanitize_changes(changes);

        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection.name) else {
            return Ok(None);
        };
        let Some(index) = docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };

        let mut updated = docs[index].clone();
        if let Value::Object(map) = &mut updated {
            map.extend(changes);
            let version = map.get(VERSION_KEY).and_then(Value::as_u64).unwrap_or(0);
            map.insert(VERSION_KEY.to_string(), Value::from(version + 1));
        }
        check_unique(collection, docs, &updated)?;

        docs[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_one(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
    ) -> Result<Option<Value>, AppError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection.name) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|d| filter.matches(d))
            .map(|index| docs.remove(index)))
    }

    async fn delete_many(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
    ) -> Result<u64, AppError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection.name) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }

    async fn aggregate(
        &self,
        collection: &CollectionSpec,
        pipeline: &Pipeline,
    ) -> Result<Vec<Value>, AppError> {
        let (leading, rest) = pipeline.split_leading_match();
        let leading = leading.cloned().unwrap_or_default();
        let docs = self
            .find_many(
                collection,
                &DocumentQuery {
                    filter: leading,
                    ..DocumentQuery::default()
                },
            )
            .await?;
        Ok(run_stages(rest, docs))
    }

    async fn geo_near(
        &self,
        collection: &CollectionSpec,
        field: &FieldPath,
        center: GeoPoint,
        filter: &Filter,
    ) -> Result<Vec<(Value, f64)>, AppError> {
        let collections = self.collections.read().await;
        let mut near: Vec<(Value, f64)> = collections
            .get(collection.name)
            .map(|docs| {
                docs.iter()
                    .filter(|d| filter.matches(d))
                    .filter_map(|doc| {
                        let point = field.resolve(doc).and_then(GeoPoint::from_geojson)?;
                        Some((doc.clone(), center.distance_meters(&point)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        near.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(near)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
