//! Document model shared by every persisted resource.
//!
//! Resources are stored as camelCase JSON documents. Each document carries
//! `id` (UUID), `createdAt` (RFC 3339, millisecond precision) and a `__v`
//! revision counter that the store starts at `0` and bumps on every update.

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::domain::query::Filter;
use crate::error::AppError;

/// Revision counter key maintained by the store.
pub const VERSION_KEY: &str = "__v";

/// Static description of a collection: its name and unique keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: &'static str,
    /// Each entry is a set of top-level fields whose combined values must be
    /// unique across the collection.
    pub unique_keys: &'static [&'static [&'static str]],
}

impl CollectionSpec {
    /// Name of the backing unique index for `fields`, e.g. `reviews_tour_user_key`.
    pub fn unique_index_name(&self, fields: &[&str]) -> String {
        format!("{}_{}_key", self.name, fields.join("_"))
    }

    /// Looks up the unique key backed by the index named `index`.
    pub fn unique_key_for_index(&self, index: &str) -> Option<&'static [&'static str]> {
        self.unique_keys
            .iter()
            .copied()
            .find(|fields| self.unique_index_name(fields) == index)
    }
}

/// A dotted path into a document, e.g. `startLocation.coordinates`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path extended by one more segment.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    /// Resolves the path against a document. Numeric segments index arrays.
    pub fn resolve<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(doc, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Serde format for timestamps that are sorted on.
///
/// Always three fractional digits and a `Z` suffix, so string order is
/// chronological order.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}

/// A type persisted as a document in its own collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: CollectionSpec;

    /// Human-readable singular name used in error messages.
    const LABEL: &'static str;

    /// Fields never returned to clients.
    const PRIVATE_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> Uuid;

    /// Filter applied to every read of this collection, e.g. hiding
    /// deactivated users. The default matches everything.
    fn scope() -> Filter {
        Filter::new()
    }

    /// Shapes a stored (possibly projected) document for a response.
    fn present(mut doc: Value) -> Value {
        if let Value::Object(map) = &mut doc {
            for field in Self::PRIVATE_FIELDS {
                map.remove(*field);
            }
        }
        doc
    }
}

/// A document with generic create and update operations.
pub trait Resource: Document {
    /// Validated input for creation.
    type Create: Send + 'static;

    /// Validated partial update.
    type Update: Send + 'static;

    fn create(input: Self::Create, id: Uuid, now: DateTime<Utc>) -> Result<Self, AppError>;

    fn apply(&mut self, patch: Self::Update) -> Result<(), AppError>;
}
