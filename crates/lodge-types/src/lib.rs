//! Foundation types for the lodge persistence layer.
//!
//! Every other lodge crate depends on `lodge-types`. It defines what a
//! persisted record *is* (an id, a kind from a closed registry, a
//! creation/update timestamp pair, and a flat set of opaque fields), plus
//! the identity key addressing scheme and the per-kind column schemas the
//! relational backend provisions from.
//!
//! # Key Types
//!
//! - [`EntityKind`] — closed registry of persistable kinds
//! - [`ObjectKey`] — the `"{kind}.{id}"` identity key
//! - [`FieldValue`] — a flat field value (text, integer, float, id list)
//! - [`Record`] — the unit of persisted data
//! - [`schema::ColumnDef`] — typed, bounded column definitions per kind

pub mod error;
pub mod key;
pub mod kind;
pub mod record;
pub mod schema;
pub mod value;

pub use error::TypeError;
pub use key::ObjectKey;
pub use kind::{EntityKind, ALL_KINDS};
pub use record::{Record, CLASS_FIELD, TIMESTAMP_FORMAT};
pub use value::FieldValue;
