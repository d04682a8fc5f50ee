/// Errors from constructing or reconstructing foundation types.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// A type tag outside the closed kind registry.
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    /// A textual identity key that is not `"{kind}.{id}"`.
    #[error("invalid identity key: {0}")]
    InvalidKey(String),

    /// A serialized record missing one of its reserved fields.
    #[error("missing reserved field: {0}")]
    MissingField(&'static str),

    /// A timestamp field that does not parse in the fixed text form.
    #[error("invalid timestamp {value:?} in field {field}")]
    InvalidTimestamp { field: &'static str, value: String },

    /// A field value the flat model cannot represent (nested structure,
    /// boolean, null).
    #[error("unsupported value for field {0}")]
    UnsupportedValue(String),
}
