use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::kind::EntityKind;

/// Identity key addressing a single record: the `(kind, id)` pair.
///
/// Rendered as `"{kind}.{id}"` everywhere a textual key is needed: the
/// serialized medium, the command interpreter, log lines. Keys are unique
/// across the whole store regardless of kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub kind: EntityKind,
    pub id: String,
}

impl ObjectKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.id)
    }
}

impl FromStr for ObjectKey {
    type Err = TypeError;

    /// Parse `"{kind}.{id}"`. The kind must be in the closed registry and
    /// the id must be non-empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, id) = s
            .split_once('.')
            .ok_or_else(|| TypeError::InvalidKey(s.to_string()))?;
        if id.is_empty() {
            return Err(TypeError::InvalidKey(s.to_string()));
        }
        let kind = EntityKind::from_tag(tag)?;
        Ok(Self::new(kind, id))
    }
}
