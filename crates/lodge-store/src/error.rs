use lodge_types::{EntityKind, TypeError};

/// Errors from persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The medium exists but cannot be interpreted as a record mapping.
    #[error("malformed medium {path}: {reason}")]
    MalformedMedium { path: String, reason: String },

    /// A serialized entry whose reconstructed identity key differs from
    /// the key it was stored under.
    #[error("stored key {stored} does not match reconstructed key {reconstructed}")]
    KeyMismatch {
        stored: String,
        reconstructed: String,
    },

    /// The kind has no relational mapping (file-backend only).
    #[error("kind {0} has no relational mapping")]
    Unmapped(EntityKind),

    /// A record failed to reconstruct (unknown tag, bad timestamp, ...).
    #[error("record error: {0}")]
    Record(#[from] TypeError),

    /// Serialization or deserialization failure on the file medium.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the file medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the relational medium.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
