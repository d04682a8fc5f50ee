use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The closed set of persistable entity kinds.
///
/// Every record carries exactly one kind, fixed at construction. The tag
/// strings (`"User"`, `"BaseModel"`, ...) are what the serialized medium
/// stores in its reserved type field; parsing an unknown tag is an explicit
/// error, never a silent default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Generic base record with no kind-specific fields. File-backend only.
    Base,
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

/// All kinds, in registry order.
pub const ALL_KINDS: [EntityKind; 7] = [
    EntityKind::Base,
    EntityKind::User,
    EntityKind::State,
    EntityKind::City,
    EntityKind::Amenity,
    EntityKind::Place,
    EntityKind::Review,
];

impl EntityKind {
    /// The tag string stored in the medium's reserved type field.
    pub fn tag(&self) -> &'static str {
        match self {
            EntityKind::Base => "BaseModel",
            EntityKind::User => "User",
            EntityKind::State => "State",
            EntityKind::City => "City",
            EntityKind::Amenity => "Amenity",
            EntityKind::Place => "Place",
            EntityKind::Review => "Review",
        }
    }

    /// Look a tag up in the closed registry.
    ///
    /// Returns `Err(TypeError::UnknownKind)` for anything outside it.
    pub fn from_tag(tag: &str) -> Result<Self, TypeError> {
        ALL_KINDS
            .iter()
            .copied()
            .find(|k| k.tag() == tag)
            .ok_or_else(|| TypeError::UnknownKind(tag.to_string()))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EntityKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_roundtrip_for_every_kind() {
        for kind in ALL_KINDS {
            assert_eq!(EntityKind::from_tag(kind.tag()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = EntityKind::from_tag("Spaceship").unwrap_err();
        assert!(matches!(err, TypeError::UnknownKind(t) if t == "Spaceship"));
    }

    #[test]
    fn tag_is_case_sensitive() {
        assert!(EntityKind::from_tag("user").is_err());
        assert!(EntityKind::from_tag("USER").is_err());
    }

    #[test]
    fn display_matches_tag() {
        assert_eq!(EntityKind::Place.to_string(), "Place");
        assert_eq!(EntityKind::Base.to_string(), "BaseModel");
    }
}
