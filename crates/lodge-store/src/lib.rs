//! Persistence layer for lodge domain records.
//!
//! This crate implements a uniform object store over two interchangeable
//! media. Callers see identical create/retrieve/update/delete semantics
//! regardless of which backend a process was configured with: register
//! records with `new`, make them durable with `save`, remove them with
//! `delete`, and repopulate with `reload`.
//!
//! # Storage Backends
//!
//! All backends implement the [`Storage`] trait:
//!
//! - [`FileStorage`] -- explicit in-memory resident set serialized
//!   wholesale to a single JSON medium
//! - [`RelationalStorage`] -- one long-lived SQLite session with staged
//!   writes, schema-level validation, and cascading deletes
//!
//! # Design Rules
//!
//! 1. One backend per process, selected once from [`StoreConfig`] and
//!    never swapped at runtime.
//! 2. Nothing is durable until `save`; `save` is atomic from the
//!    caller's perspective.
//! 3. A missing medium is an empty store; a malformed medium is an
//!    error, never partial data.
//! 4. Storage errors propagate to the caller; this layer never prints.
//! 5. No internal concurrency control: one session, one writer.

pub mod config;
pub mod error;
pub mod file;
pub mod index;
pub mod relational;
pub mod store;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{BackendConfig, FileConfig, RelationalConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use file::FileStorage;
pub use index::RelationIndex;
pub use relational::RelationalStorage;
pub use store::ObjectStore;
pub use traits::Storage;
