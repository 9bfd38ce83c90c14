//! Declarative document queries and the request-parameter query builder.
//!
//! A [`Query`] describes a filter, sort order, projection and page window
//! over one collection. Both document stores evaluate the same structures:
//! the in-memory store through [`Filter::matches`], [`compare_documents`]
//! and [`Projection::apply`], the Postgres store by compiling them to SQL.
//!
//! [`QueryBuilder`] derives a query from list-endpoint parameters:
//!
//! ```text
//! ?difficulty=easy&price[lt]=1500&sort=-ratingsAverage,price&fields=name,price&page=2&limit=5
//! ```

use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

use crate::domain::document::{FieldPath, VERSION_KEY};
use crate::domain::geo::GeoPoint;

/// Parameters consumed by sort, projection and pagination instead of filtering.
pub const RESERVED_PARAMS: [&str; 4] = ["page", "sort", "limit", "fields"];
pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const DEFAULT_SORT: &str = "-createdAt";

// ── Request parameters ──────────────────────────────────────────────────────

/// A raw query-string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// `key=value`
    Single(String),
    /// `key=a&key=b`
    Many(Vec<String>),
    /// `key[gte]=5&key[lt]=10`
    Operators(BTreeMap<String, String>),
}

/// Query-string parameters grouped by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    /// Parses an `application/x-www-form-urlencoded` query string.
    pub fn parse(raw: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            params.push(&key, value.into_owned());
        }
        params
    }

    fn push(&mut self, key: &str, value: String) {
        if let Some((field, rest)) = key.split_once('[')
            && let Some(op) = rest.strip_suffix(']')
            && !field.is_empty()
            && !op.is_empty()
        {
            match self.0.entry(field.to_string()) {
                Entry::Occupied(entry) => {
                    let slot = entry.into_mut();
                    *slot = match std::mem::replace(slot, ParamValue::Many(Vec::new())) {
                        ParamValue::Operators(mut ops) => {
                            ops.insert(op.to_string(), value);
                            ParamValue::Operators(ops)
                        }
                        _ => ParamValue::Operators(BTreeMap::from([(op.to_string(), value)])),
                    };
                }
                Entry::Vacant(entry) => {
                    entry.insert(ParamValue::Operators(BTreeMap::from([(
                        op.to_string(),
                        value,
                    )])));
                }
            }
            return;
        }

        match self.0.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                *slot = match std::mem::replace(slot, ParamValue::Many(Vec::new())) {
                    ParamValue::Single(first) => ParamValue::Many(vec![first, value]),
                    ParamValue::Many(mut values) => {
                        values.push(value);
                        ParamValue::Many(values)
                    }
                    ParamValue::Operators(_) => ParamValue::Single(value),
                };
            }
            Entry::Vacant(entry) => {
                entry.insert(ParamValue::Single(value));
            }
        }
    }

    /// Sets `key` to a single value, replacing whatever was there.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0
            .insert(key.to_string(), ParamValue::Single(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Returns a scalar value. Repeated keys yield the last occurrence.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            ParamValue::Single(value) => Some(value),
            ParamValue::Many(values) => values.last().map(String::as_str),
            ParamValue::Operators(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Casts a raw parameter to a number, then a boolean, falling back to a string.
pub fn cast_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>()
        && let Some(number) = Number::from_f64(float)
    {
        return Value::Number(number);
    }
    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

// ── Filter ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    /// Maps a bracket operator (`price[gte]`) to a comparison.
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "eq" => Some(Comparison::Eq),
            "ne" => Some(Comparison::Ne),
            "gt" => Some(Comparison::Gt),
            "gte" => Some(Comparison::Gte),
            "lt" => Some(Comparison::Lt),
            "lte" => Some(Comparison::Lte),
            _ => None,
        }
    }

    pub fn sql_operator(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Gte => ordering != Ordering::Less,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Lte => ordering != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Equality matches array fields containing the value. Range comparisons
    /// only match values of the same JSON type.
    Compare {
        field: FieldPath,
        op: Comparison,
        value: Value,
    },
    In {
        field: FieldPath,
        values: Vec<Value>,
    },
    /// GeoJSON point field within `radius` radians of `center`.
    Within {
        field: FieldPath,
        center: GeoPoint,
        radius: f64,
    },
}

impl Condition {
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Condition::Compare { field, op, value } => {
                let actual = field.resolve(doc);
                match op {
                    Comparison::Eq => actual.is_some_and(|a| loosely_equal(a, value)),
                    Comparison::Ne => !actual.is_some_and(|a| loosely_equal(a, value)),
                    range => actual
                        .and_then(|a| compare_same_type(a, value))
                        .is_some_and(|ordering| range.holds(ordering)),
                }
            }
            Condition::In { field, values } => field
                .resolve(doc)
                .is_some_and(|a| values.iter().any(|v| loosely_equal(a, v))),
            Condition::Within {
                field,
                center,
                radius,
            } => field
                .resolve(doc)
                .and_then(GeoPoint::from_geojson)
                .is_some_and(|point| center.angular_distance(&point) <= *radius),
        }
    }
}

fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    json_eq(actual, expected)
        || matches!(actual, Value::Array(items) if items.iter().any(|item| json_eq(item, expected)))
}

fn compare_same_type(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Conjunction of conditions. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::new().eq("id", id.to_string())
    }

    pub fn compare(mut self, field: &str, op: Comparison, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Compare {
            field: FieldPath::new(field),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.compare(field, Comparison::Eq, value)
    }

    pub fn ne(self, field: &str, value: impl Into<Value>) -> Self {
        self.compare(field, Comparison::Ne, value)
    }

    pub fn gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.compare(field, Comparison::Gte, value)
    }

    pub fn lt(self, field: &str, value: impl Into<Value>) -> Self {
        self.compare(field, Comparison::Lt, value)
    }

    pub fn is_in(mut self, field: &str, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In {
            field: FieldPath::new(field),
            values,
        });
        self
    }

    pub fn within(mut self, field: &str, center: GeoPoint, radius: f64) -> Self {
        self.conditions.push(Condition::Within {
            field: FieldPath::new(field),
            center,
            radius,
        });
        self
    }

    pub fn and(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

// ── Sort ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: FieldPath,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        Self {
            field: FieldPath::new(field),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: FieldPath::new(field),
            descending: true,
        }
    }

    /// Parses `"-ratingsAverage,price"`. A leading `-` means descending.
    pub fn parse_list(raw: &str) -> Vec<SortKey> {
        raw.split(',')
            .map(str::trim)
            .filter_map(|part| match part.strip_prefix('-') {
                Some(field) if !field.is_empty() => Some(SortKey::desc(field)),
                Some(_) => None,
                None if !part.is_empty() => Some(SortKey::asc(part)),
                None => None,
            })
            .collect()
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::Bool(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

/// Total order over optional JSON values. Missing values sort first,
/// then `null`, strings, numbers, booleans, arrays and objects.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => compare_same_type(x, y)
            .unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Orders two documents by `keys`, breaking ties by `id`.
pub fn compare_documents(a: &Value, b: &Value, keys: &[SortKey]) -> Ordering {
    keys.iter()
        .map(|key| {
            let ordering = compare_values(key.field.resolve(a), key.field.resolve(b));
            if key.descending {
                ordering.reverse()
            } else {
                ordering
            }
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or_else(|| compare_values(a.get("id"), b.get("id")))
}

// ── Projection ──────────────────────────────────────────────────────────────

/// Top-level field selection applied to result documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    /// Keep only these fields (and `id`).
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl Projection {
    /// The projection used when a request names no fields.
    pub fn default_exclusions() -> Self {
        Projection::Exclude(vec![VERSION_KEY.to_string()])
    }

    /// Parses `"name,price"` (include) or `"-description,-images"` (exclude).
    /// Mixed lists keep only the included fields.
    pub fn parse(raw: &str) -> Self {
        let fields: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty() && *f != "-")
            .collect();

        if fields.is_empty() {
            return Self::default_exclusions();
        }

        if fields.iter().all(|f| f.starts_with('-')) {
            Projection::Exclude(fields.iter().map(|f| f[1..].to_string()).collect())
        } else {
            Projection::Include(
                fields
                    .iter()
                    .filter(|f| !f.starts_with('-'))
                    .map(|f| f.split('.').next().unwrap_or(f).to_string())
                    .collect(),
            )
        }
    }

    pub fn apply(&self, doc: Value) -> Value {
        match (self, doc) {
            (Projection::Include(fields), Value::Object(map)) => Value::Object(
                map.into_iter()
                    .filter(|(key, _)| key == "id" || fields.iter().any(|f| f == key))
                    .collect(),
            ),
            (Projection::Exclude(fields), Value::Object(mut map)) => {
                for field in fields {
                    map.remove(field);
                }
                Value::Object(map)
            }
            (_, doc) => doc,
        }
    }
}

// ── Queries ─────────────────────────────────────────────────────────────────

/// Untyped query as executed by a document store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub filter: Filter,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Default for DocumentQuery {
    fn default() -> Self {
        Self {
            filter: Filter::new(),
            sort: Vec::new(),
            projection: Projection::All,
            skip: 0,
            limit: None,
        }
    }
}

/// A query over the collection of `T`. Building a query performs no I/O.
pub struct Query<T> {
    inner: DocumentQuery,
    _resource: PhantomData<fn() -> T>,
}

impl<T> Query<T> {
    /// Every document of `T`.
    pub fn all() -> Self {
        Self {
            inner: DocumentQuery::default(),
            _resource: PhantomData,
        }
    }

    /// Narrows the query with `filter` (conjunction).
    pub fn matching(mut self, filter: Filter) -> Self {
        self.inner.filter = self.inner.filter.and(filter);
        self
    }

    pub fn sort_by(mut self, keys: Vec<SortKey>) -> Self {
        self.inner.sort = keys;
        self
    }

    pub fn select(mut self, projection: Projection) -> Self {
        self.inner.projection = projection;
        self
    }

    pub fn window(mut self, skip: u64, limit: u64) -> Self {
        self.inner.skip = skip;
        self.inner.limit = Some(limit);
        self
    }

    pub fn document_query(&self) -> &DocumentQuery {
        &self.inner
    }

    pub fn into_document_query(self) -> DocumentQuery {
        self.inner
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _resource: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Query").field(&self.inner).finish()
    }
}

/// Applies list-endpoint parameters to a query in four independent stages.
///
/// ```rust,ignore
/// let query = QueryBuilder::new(Query::<Tour>::all(), &params)
///     .filter()
///     .sort()
///     .limit_fields()
///     .paginate()
///     .build();
/// ```
pub struct QueryBuilder<'p, T> {
    query: Query<T>,
    params: &'p QueryParams,
}

impl<'p, T> QueryBuilder<'p, T> {
    pub fn new(query: Query<T>, params: &'p QueryParams) -> Self {
        Self { query, params }
    }

    /// Turns every non-reserved parameter into a condition.
    ///
    /// `key=v` is equality, repeated keys become membership and
    /// `key[gte|gt|lte|lt|ne]=v` become comparisons. Unknown bracket
    /// operators address a nested field (`a[b]=v` matches `a.b == v`).
    pub fn filter(mut self) -> Self {
        let mut filter = Filter::new();

        for (key, value) in self.params.iter() {
            if RESERVED_PARAMS.contains(&key) {
                continue;
            }
            filter = match value {
                ParamValue::Single(raw) => filter.eq(key, cast_value(raw)),
                ParamValue::Many(raws) => {
                    filter.is_in(key, raws.iter().map(|raw| cast_value(raw)).collect())
                }
                ParamValue::Operators(ops) => {
                    ops.iter()
                        .fold(filter, |filter, (op, raw)| match Comparison::from_operator(op) {
                            Some(comparison) => filter.compare(key, comparison, cast_value(raw)),
                            None => filter.eq(&format!("{key}.{op}"), cast_value(raw)),
                        })
                }
            };
        }

        self.query = self.query.matching(filter);
        self
    }

    /// Orders by `sort`, defaulting to newest first.
    pub fn sort(mut self) -> Self {
        let keys = self
            .params
            .get_str("sort")
            .map(SortKey::parse_list)
            .filter(|keys| !keys.is_empty())
            .unwrap_or_else(|| SortKey::parse_list(DEFAULT_SORT));

        self.query = self.query.sort_by(keys);
        self
    }

    /// Selects `fields`, defaulting to hiding the revision counter.
    pub fn limit_fields(mut self) -> Self {
        let projection = self
            .params
            .get_str("fields")
            .map(Projection::parse)
            .unwrap_or_else(Projection::default_exclusions);

        self.query = self.query.select(projection);
        self
    }

    /// Windows results by `page` and `limit`. Missing, non-numeric or
    /// non-positive values fall back to page 1 and 10 results.
    pub fn paginate(mut self) -> Self {
        let page = positive_param(self.params.get_str("page")).unwrap_or(DEFAULT_PAGE);
        let limit = positive_param(self.params.get_str("limit")).unwrap_or(DEFAULT_LIMIT);
        let skip = (page - 1).saturating_mul(limit);

        self.query = self.query.window(skip, limit);
        self
    }

    pub fn build(self) -> Query<T> {
        self.query
    }
}

fn positive_param(raw: Option<&str>) -> Option<u64> {
    raw?.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Item;

    fn build(raw: &str) -> DocumentQuery {
        let params = QueryParams::parse(raw);
        QueryBuilder::new(Query::<Item>::all(), &params)
            .filter()
            .sort()
            .limit_fields()
            .paginate()
            .build()
            .into_document_query()
    }

    #[test]
    fn test_parse_groups_operators_and_repeats() {
        let params = QueryParams::parse("price%5Bgte%5D=500&price[lt]=1500&difficulty=easy&difficulty=medium&sort=price");

        assert_eq!(
            params.get("price"),
            Some(&ParamValue::Operators(BTreeMap::from([
                ("gte".to_string(), "500".to_string()),
                ("lt".to_string(), "1500".to_string()),
            ])))
        );
        assert_eq!(
            params.get("difficulty"),
            Some(&ParamValue::Many(vec!["easy".to_string(), "medium".to_string()]))
        );
        assert_eq!(params.get_str("sort"), Some("price"));
    }

    #[test]
    fn test_cast_value() {
        assert_eq!(cast_value("5"), json!(5));
        assert_eq!(cast_value("4.5"), json!(4.5));
        assert_eq!(cast_value("true"), json!(true));
        assert_eq!(cast_value("easy"), json!("easy"));
        assert_eq!(cast_value("inf"), json!("inf"));
    }

    #[test]
    fn test_reserved_params_never_filter() {
        let query = build("page=2&sort=price&limit=3&fields=name");
        assert!(query.filter.is_empty());
    }

    #[test]
    fn test_operator_params_become_comparisons() {
        let query = build("duration[gte]=5&difficulty=easy&price[lt]=1500");

        assert_eq!(
            query.filter.conditions(),
            &[
                Condition::Compare {
                    field: FieldPath::new("difficulty"),
                    op: Comparison::Eq,
                    value: json!("easy"),
                },
                Condition::Compare {
                    field: FieldPath::new("duration"),
                    op: Comparison::Gte,
                    value: json!(5),
                },
                Condition::Compare {
                    field: FieldPath::new("price"),
                    op: Comparison::Lt,
                    value: json!(1500),
                },
            ]
        );
    }

    #[test]
    fn test_unknown_operator_addresses_nested_field() {
        let query = build("startLocation[address]=Miami");
        let doc = json!({ "startLocation": { "address": "Miami" } });

        assert!(query.filter.matches(&doc));
    }

    #[test]
    fn test_default_sort_projection_and_window() {
        let query = build("");

        assert_eq!(query.sort, vec![SortKey::desc("createdAt")]);
        assert_eq!(query.projection, Projection::Exclude(vec!["__v".to_string()]));
        assert_eq!(query.skip, 0);
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn test_pagination_window() {
        let query = build("page=3&limit=5");
        assert_eq!(query.skip, 10);
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn test_invalid_pagination_falls_back_to_defaults() {
        for raw in ["page=0&limit=0", "page=-2&limit=-1", "page=abc&limit=xyz", "page=2.5"] {
            let query = build(raw);
            assert_eq!(query.skip, 0, "{raw}");
            assert_eq!(query.limit, Some(10), "{raw}");
        }
    }

    #[test]
    fn test_sort_list_parsing() {
        assert_eq!(
            SortKey::parse_list("-ratingsAverage, price,,-"),
            vec![SortKey::desc("ratingsAverage"), SortKey::asc("price")]
        );
        assert_eq!(build("sort=,").sort, vec![SortKey::desc("createdAt")]);
    }

    #[test]
    fn test_projection_include_keeps_id() {
        let doc = json!({ "id": "1", "name": "Hiker", "price": 397, "__v": 0 });

        let projected = Projection::parse("name,price").apply(doc.clone());
        assert_eq!(projected, json!({ "id": "1", "name": "Hiker", "price": 397 }));

        let excluded = Projection::parse("-price,-__v").apply(doc);
        assert_eq!(excluded, json!({ "id": "1", "name": "Hiker" }));
    }

    #[test]
    fn test_filter_matches_equality_and_ranges() {
        let doc = json!({ "price": 497, "difficulty": "easy", "guides": ["a", "b"] });

        assert!(Filter::new().eq("difficulty", "easy").matches(&doc));
        assert!(Filter::new().eq("guides", "b").matches(&doc));
        assert!(!Filter::new().eq("guides", "c").matches(&doc));
        assert!(Filter::new().gte("price", 497).matches(&doc));
        assert!(!Filter::new().lt("price", 497).matches(&doc));
        assert!(!Filter::new().lt("price", "1000").matches(&doc));
        assert!(Filter::new().ne("active", false).matches(&doc));
        assert!(
            Filter::new()
                .is_in("difficulty", vec![json!("medium"), json!("easy")])
                .matches(&doc)
        );
    }

    #[test]
    fn test_filter_within_radius() {
        let doc = json!({ "startLocation": { "type": "Point", "coordinates": [-118.1, 34.1] } });
        let center = GeoPoint::new(-118.2437, 34.0522);

        assert!(Filter::new().within("startLocation", center, 0.01).matches(&doc));
        assert!(!Filter::new().within("startLocation", center, 0.0001).matches(&doc));
        assert!(!Filter::new().within("startLocation", center, 1.0).matches(&json!({})));
    }

    #[test]
    fn test_compare_documents_multi_key() {
        let a = json!({ "id": "a", "ratingsAverage": 4.8, "price": 997 });
        let b = json!({ "id": "b", "ratingsAverage": 4.8, "price": 497 });
        let c = json!({ "id": "c", "ratingsAverage": 4.9 });

        let keys = SortKey::parse_list("-ratingsAverage,price");
        let mut docs = vec![a.clone(), b.clone(), c.clone()];
        docs.sort_by(|x, y| compare_documents(x, y, &keys));

        assert_eq!(docs, vec![c, b, a]);
    }

    #[test]
    fn test_missing_values_sort_first_ascending() {
        let with = json!({ "id": "1", "price": 10 });
        let without = json!({ "id": "2" });

        let asc = [SortKey::asc("price")];
        assert_eq!(compare_documents(&without, &with, &asc), Ordering::Less);

        let desc = [SortKey::desc("price")];
        assert_eq!(compare_documents(&without, &with, &desc), Ordering::Greater);
    }
}
