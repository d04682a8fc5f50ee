use std::collections::BTreeMap;

use lodge_types::{EntityKind, ObjectKey, Record};

use crate::error::StoreResult;

/// Backend contract for record persistence.
///
/// All implementations must satisfy these invariants:
/// - `all` never fails on an empty match; it returns an empty mapping.
/// - `new` registers without any durability guarantee; registering the
///   same key twice overwrites.
/// - `save` is atomic from the caller's perspective: either the whole
///   batch reaches the medium or none of it does, and failures surface.
/// - `delete(None)` is a no-op, never an error. Deleting an absent
///   record is likewise a no-op.
/// - `reload` treats a missing medium as an empty store but surfaces a
///   malformed medium as an error, never partial data.
/// - Errors are propagated, never swallowed; backends never print.
pub trait Storage: Send {
    /// Every resident record keyed by identity key, optionally filtered
    /// to one kind.
    fn all(&self, kind: Option<EntityKind>) -> StoreResult<BTreeMap<ObjectKey, Record>>;

    /// Register a record into the resident set / active session.
    fn new(&mut self, record: Record) -> StoreResult<()>;

    /// Flush every pending registration and deletion to the medium.
    fn save(&mut self) -> StoreResult<()>;

    /// Remove a record; durable after the next `save`.
    fn delete(&mut self, record: Option<&Record>) -> StoreResult<()>;

    /// (Re)populate from the medium, discarding unsaved state.
    fn reload(&mut self) -> StoreResult<()>;

    /// Release backend resources.
    fn close(&mut self) -> StoreResult<()>;
}
