//! Repository trait definitions for the domain layer.
//!
//! - [`DocumentStore`] - The storage contract implemented in
//!   `crate::infrastructure::persistence`
//! - [`Collection`] - Typed, scope-aware access to one collection
//!
//! Mock implementations are auto-generated via `mockall` for testing.

pub mod collection;
pub mod document_store;

pub use collection::Collection;
pub use document_store::DocumentStore;

#[cfg(test)]
pub use document_store::MockDocumentStore;
