use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDateTime, Timelike, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::TypeError;
use crate::key::ObjectKey;
use crate::kind::EntityKind;
use crate::value::FieldValue;

/// Reserved field carrying the type tag in the serialized form.
pub const CLASS_FIELD: &str = "__class__";

/// Fixed text form for timestamps in the serialized medium.
///
/// ISO 8601 with microseconds, e.g. `2017-09-28T21:05:54.119427`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Accepts the fixed form with or without the fractional part.
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// The unit of persisted data: an id, a kind, a timestamp pair, and a flat
/// set of kind-specific fields the storage layer never interprets.
///
/// A record's `id` and `kind` are fixed at construction; `updated_at` is
/// refreshed by every mutation. A record's lifetime as a value may exceed
/// its presence in a store; callers can hold one after deleting it.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    kind: EntityKind,
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Construct a fresh record: new UUIDv4 id, both timestamps set to now.
    pub fn new(kind: EntityKind) -> Self {
        let now = now_utc();
        Self {
            kind,
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            fields: BTreeMap::new(),
        }
    }

    /// Reassemble a record from already-validated parts. Used by storage
    /// backends when materializing from a medium.
    pub fn from_parts(
        kind: EntityKind,
        id: impl Into<String>,
        created_at: NaiveDateTime,
        updated_at: NaiveDateTime,
        fields: BTreeMap<String, FieldValue>,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            created_at,
            updated_at,
            fields,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The identity key `(kind, id)`.
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.kind, self.id.clone())
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Set a field and refresh `updated_at`.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
        self.touch();
    }

    /// Builder-style `set` for constructing records in one expression.
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Refresh `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = now_utc();
    }

    /// Flatten to the serialized form: every field, plus the reserved type
    /// tag and both timestamps in the fixed text form.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(CLASS_FIELD.into(), Value::String(self.kind.tag().into()));
        map.insert("id".into(), Value::String(self.id.clone()));
        map.insert(
            "created_at".into(),
            Value::String(self.created_at.format(TIMESTAMP_FORMAT).to_string()),
        );
        map.insert(
            "updated_at".into(),
            Value::String(self.updated_at.format(TIMESTAMP_FORMAT).to_string()),
        );
        for (name, value) in &self.fields {
            // FieldValue serializes untagged into a plain JSON scalar/list.
            if let Ok(v) = serde_json::to_value(value) {
                map.insert(name.clone(), v);
            }
        }
        map
    }

    /// Reconstruct from the serialized form.
    ///
    /// Rejects unknown type tags, missing reserved fields, malformed
    /// timestamps, and values the flat model cannot hold.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, TypeError> {
        let tag = reserved_str(map, CLASS_FIELD)?;
        let kind = EntityKind::from_tag(tag)?;
        let id = reserved_str(map, "id")?.to_string();
        let created_at = timestamp_field(map, "created_at")?;
        let updated_at = timestamp_field(map, "updated_at")?;

        let mut fields = BTreeMap::new();
        for (name, value) in map {
            if matches!(name.as_str(), CLASS_FIELD | "id" | "created_at" | "updated_at") {
                continue;
            }
            let field = serde_json::from_value::<FieldValue>(value.clone())
                .map_err(|_| TypeError::UnsupportedValue(name.clone()))?;
            fields.insert(name.clone(), field);
        }

        Ok(Self {
            kind,
            id,
            created_at,
            updated_at,
            fields,
        })
    }
}

/// Now, truncated to microseconds so a value survives the fixed text form
/// unchanged.
fn now_utc() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

/// Render a timestamp in the fixed text form.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp from the fixed text form (fractional part optional).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TypeError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_PARSE_FORMAT).map_err(|_| {
        TypeError::InvalidTimestamp {
            field: "timestamp",
            value: raw.to_string(),
        }
    })
}

fn reserved_str<'m>(map: &'m Map<String, Value>, name: &'static str) -> Result<&'m str, TypeError> {
    map.get(name)
        .and_then(Value::as_str)
        .ok_or(TypeError::MissingField(name))
}

fn timestamp_field(map: &Map<String, Value>, field: &'static str) -> Result<NaiveDateTime, TypeError> {
    let raw = reserved_str(map, field)?;
    parse_timestamp(raw).map_err(|_| TypeError::InvalidTimestamp {
        field,
        value: raw.to_string(),
    })
}

impl fmt::Display for Record {
    /// `[Kind] (id) {serialized fields}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dict = serde_json::to_string(&Value::Object(self.to_map())).map_err(|_| fmt::Error)?;
        write!(f, "[{}] ({}) {}", self.kind, self.id, dict)
    }
}
