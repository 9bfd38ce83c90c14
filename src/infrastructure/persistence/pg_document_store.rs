//! PostgreSQL implementation of the document store.
//!
//! Each collection is a table `(id uuid primary key, doc jsonb, version int)`.
//! Filters, sort order and page windows compile to SQL through
//! [`sqlx::QueryBuilder`] with every value bound as a parameter; projection and
//! pipeline stages after the leading match run in process.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::document::{CollectionSpec, FieldPath, VERSION_KEY};
use crate::domain::geo::GeoPoint;
use crate::domain::pipeline::{Pipeline, run_stages};
use crate::domain::query::{Comparison, Condition, DocumentQuery, Filter, SortKey};
use crate::domain::repositories::DocumentStore;
use crate::error::AppError;

/// Stored document with the revision counter folded in.
const DOC_WITH_VERSION: &str = "doc || jsonb_build_object('__v', version)";

/// PostgreSQL document store.
pub struct PgDocumentStore {
    pool: Arc<PgPool>,
}

impl PgDocumentStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Maps unique violations on a collection's declared keys to a
    /// duplicate-value error naming the fields.
    fn map_error(collection: &CollectionSpec, e: sqlx::Error) -> AppError {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
            && let Some(fields) = db
                .constraint()
                .and_then(|name| collection.unique_key_for_index(name))
        {
            return AppError::duplicate(fields);
        }
        AppError::from(e)
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn push_path(qb: &mut QueryBuilder<'_, Postgres>, path: &FieldPath) {
    qb.push("(doc #> ")
        .push_bind(path.segments().to_vec())
        .push(")");
}

fn push_text_as_float(qb: &mut QueryBuilder<'_, Postgres>, path: &FieldPath) {
    qb.push("(doc #>> ")
        .push_bind(path.segments().to_vec())
        .push(")::float8");
}

/// Equality that also matches arrays containing the value.
fn push_equals(qb: &mut QueryBuilder<'_, Postgres>, path: &FieldPath, value: &Value) {
    qb.push("(");
    push_path(qb, path);
    qb.push(" = ").push_bind(Json(value.clone())).push(" OR ");
    push_path(qb, path);
    qb.push(" @> jsonb_build_array(")
        .push_bind(Json(value.clone()))
        .push("::jsonb))");
}

fn is_id(path: &FieldPath) -> bool {
    path.segments() == ["id"]
}

fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, condition: &Condition) {
    match condition {
        Condition::Compare {
            field,
            op: Comparison::Eq,
            value,
        } if is_id(field) => match value.as_str().and_then(|s| Uuid::parse_str(s).ok()) {
            Some(id) => {
                qb.push("id = ").push_bind(id);
            }
            None => {
                qb.push("FALSE");
            }
        },
        Condition::Compare {
            field,
            op: Comparison::Eq,
            value,
        } => {
            qb.push("COALESCE(");
            push_equals(qb, field, value);
            qb.push(", FALSE)");
        }
        Condition::Compare {
            field,
            op: Comparison::Ne,
            value,
        } => {
            qb.push("NOT COALESCE(");
            push_equals(qb, field, value);
            qb.push(", FALSE)");
        }
        Condition::Compare { field, op, value } => {
            qb.push("COALESCE((jsonb_typeof(");
            push_path(qb, field);
            qb.push(") = jsonb_typeof(")
                .push_bind(Json(value.clone()))
                .push("::jsonb) AND ");
            push_path(qb, field);
            qb.push(" ")
                .push(op.sql_operator())
                .push(" ")
                .push_bind(Json(value.clone()))
                .push("::jsonb), FALSE)");
        }
        Condition::In { field, values } => {
            if values.is_empty() {
                qb.push("FALSE");
                return;
            }
            qb.push("COALESCE((");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                push_equals(qb, field, value);
            }
            qb.push("), FALSE)");
        }
        Condition::Within {
            field,
            center,
            radius,
        } => {
            let coordinates = field.child("coordinates");
            let (lng, lat) = (coordinates.child("0"), coordinates.child("1"));

            qb.push("COALESCE(2 * asin(LEAST(1.0, sqrt(power(sin(radians((");
            push_text_as_float(qb, &lat);
            qb.push(" - ").push_bind(center.lat).push(") / 2)), 2) + cos(radians(");
            qb.push_bind(center.lat).push(")) * cos(radians(");
            push_text_as_float(qb, &lat);
            qb.push(")) * power(sin(radians((");
            push_text_as_float(qb, &lng);
            qb.push(" - ").push_bind(center.lng).push(") / 2)), 2)))) <= ");
            qb.push_bind(*radius).push(", FALSE)");
        }
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    if filter.is_empty() {
        qb.push("TRUE");
        return;
    }
    for (i, condition) in filter.conditions().iter().enumerate() {
        if i > 0 {
            qb.push(" AND ");
        }
        push_condition(qb, condition);
    }
}

/// Missing values sort first ascending and last descending; `id` breaks ties.
fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, sort: &[SortKey]) {
    qb.push(" ORDER BY ");
    for key in sort {
        push_path(qb, &key.field);
        qb.push(if key.descending {
            " DESC NULLS LAST, "
        } else {
            " ASC NULLS FIRST, "
        });
    }
    qb.push("id ASC");
}

fn select_query(collection: &CollectionSpec, filter: &Filter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {DOC_WITH_VERSION} FROM {} WHERE ",
        collection.name
    ));
    push_where(&mut qb, filter);
    qb
}

fn find_many_query(
    collection: &CollectionSpec,
    query: &DocumentQuery,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = select_query(collection, &query.filter);
    push_order_by(&mut qb, &query.sort);
    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(to_i64(limit));
    }
    if query.skip > 0 {
        qb.push(" OFFSET ").push_bind(to_i64(query.skip));
    }
    qb
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_one(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
    ) -> Result<Option<Value>, AppError> {
        let mut qb = select_query(collection, filter);
        qb.push(" LIMIT 1");

        let row: Option<Json<Value>> = qb
            .build_query_scalar()
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn find_many(
        &self,
        collection: &CollectionSpec,
        query: &DocumentQuery,
    ) -> Result<Vec<Value>, AppError> {
        let mut qb = find_many_query(collection, query);

        let rows: Vec<Json<Value>> = qb
            .build_query_scalar()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|Json(doc)| query.projection.apply(doc))
            .collect())
    }

    async fn count(&self, collection: &CollectionSpec, filter: &Filter) -> Result<u64, AppError> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE ", collection.name));
        push_where(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn insert(
        &self,
        collection: &CollectionSpec,
        mut document: Value,
    ) -> Result<Value, AppError> {
        let id = document
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| AppError::internal("Documents must carry a UUID id"))?;

        if let Value::Object(map) = &mut document {
            map.remove(VERSION_KEY);
        }

        let sql = format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2) RETURNING {DOC_WITH_VERSION}",
            collection.name
        );

        let Json(stored) = sqlx::query_scalar::<_, Json<Value>>(&sql)
            .bind(id)
            .bind(Json(document))
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| Self::map_error(collection, e))?;

        Ok(stored)
    }

    async fn update_one(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
        mut changes: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        changes.remove("id");
        changes.remove(VERSION_KEY);

        let mut qb = QueryBuilder::new(format!("UPDATE {} SET doc = doc || ", collection.name));
        qb.push_bind(Json(Value::Object(changes)))
            .push(format!(
                ", version = version + 1 WHERE id = (SELECT id FROM {} WHERE ",
                collection.name
            ));
        push_where(&mut qb, filter);
        qb.push(" LIMIT 1 FOR UPDATE) RETURNING ")
            .push(DOC_WITH_VERSION);

        let row: Option<Json<Value>> = qb
            .build_query_scalar()
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| Self::map_error(collection, e))?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn delete_one(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
    ) -> Result<Option<Value>, AppError> {
        let mut qb = QueryBuilder::new(format!(
            "DELETE FROM {0} WHERE id = (SELECT id FROM {0} WHERE ",
            collection.name
        ));
        push_where(&mut qb, filter);
        qb.push(" LIMIT 1) RETURNING ").push(DOC_WITH_VERSION);

        let row: Option<Json<Value>> = qb
            .build_query_scalar()
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn delete_many(
        &self,
        collection: &CollectionSpec,
        filter: &Filter,
    ) -> Result<u64, AppError> {
        let mut qb = QueryBuilder::new(format!("DELETE FROM {} WHERE ", collection.name));
        push_where(&mut qb, filter);

        let result = qb.build().execute(self.pool.as_ref()).await?;
        Ok(result.rows_affected())
    }

    async fn aggregate(
        &self,
        collection: &CollectionSpec,
        pipeline: &Pipeline,
    ) -> Result<Vec<Value>, AppError> {
        let (leading, rest) = pipeline.split_leading_match();
        let filter = leading.cloned().unwrap_or_default();

        let mut qb = select_query(collection, &filter);
        let rows: Vec<Json<Value>> = qb
            .build_query_scalar()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(run_stages(
            rest,
            rows.into_iter().map(|Json(doc)| doc).collect(),
        ))
    }

    async fn geo_near(
        &self,
        collection: &CollectionSpec,
        field: &FieldPath,
        center: GeoPoint,
        filter: &Filter,
    ) -> Result<Vec<(Value, f64)>, AppError> {
        let mut qb = select_query(collection, filter);
        qb.push(" AND ");
        push_path(&mut qb, &field.child("coordinates"));
        qb.push(" IS NOT NULL");

        let rows: Vec<Json<Value>> = qb
            .build_query_scalar()
            .fetch_all(self.pool.as_ref())
            .await?;

        let mut near: Vec<(Value, f64)> = rows
            .into_iter()
            .filter_map(|Json(doc)| {
                let point = field.resolve(&doc).and_then(GeoPoint::from_geojson)?;
                let distance = center.distance_meters(&point);
                Some((doc, distance))
            })
            .collect();

        near.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(near)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::Projection;

    const TOURS: CollectionSpec = CollectionSpec {
        name: "tours",
        unique_keys: &[&["name"]],
    };

    fn where_sql(filter: &Filter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("");
        push_where(&mut qb, filter);
        qb.sql().to_string()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert_eq!(where_sql(&Filter::new()), "TRUE");
    }

    #[test]
    fn test_id_equality_uses_primary_key() {
        assert_eq!(where_sql(&Filter::by_id(Uuid::new_v4())), "id = $1");
        assert_eq!(where_sql(&Filter::new().eq("id", "not-a-uuid")), "FALSE");
    }

    #[test]
    fn test_values_are_bound_not_inlined() {
        let sql = where_sql(&Filter::new().eq("name", "x' OR 1=1 --"));
        assert!(!sql.contains("OR 1=1"));
        assert!(sql.starts_with("COALESCE(((doc #> $1) = $2"));
    }

    #[test]
    fn test_range_comparison_checks_json_type() {
        let sql = where_sql(&Filter::new().gte("price", 500).ne("secretTour", true));
        assert!(sql.contains("jsonb_typeof((doc #> $1)) = jsonb_typeof($2::jsonb)"));
        assert!(sql.contains(">= $4::jsonb"));
        assert!(sql.contains(" AND NOT COALESCE("));
    }

    #[test]
    fn test_empty_membership_matches_nothing() {
        assert_eq!(where_sql(&Filter::new().is_in("difficulty", vec![])), "FALSE");
    }

    #[test]
    fn test_find_many_query_orders_and_windows() {
        let query = DocumentQuery {
            filter: Filter::new(),
            sort: SortKey::parse_list("-ratingsAverage,price"),
            projection: Projection::All,
            skip: 20,
            limit: Some(10),
        };

        let qb = find_many_query(&TOURS, &query);
        assert_eq!(
            qb.sql(),
            "SELECT doc || jsonb_build_object('__v', version) FROM tours WHERE TRUE \
             ORDER BY (doc #> $1) DESC NULLS LAST, (doc #> $2) ASC NULLS FIRST, id ASC \
             LIMIT $3 OFFSET $4"
        );
    }
}
