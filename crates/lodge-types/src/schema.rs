//! Per-kind column definitions.
//!
//! The storage layer treats record fields as opaque, but the relational
//! backend needs typed, bounded columns to provision schema, and the
//! command interpreter needs them to coerce textual input. Both read from
//! this one table.

use crate::kind::EntityKind;

/// Join table linking places to amenities in the relational medium.
pub const PLACE_AMENITY_TABLE: &str = "place_amenity";

/// Field on a Place record holding its linked amenity ids.
pub const AMENITY_IDS_FIELD: &str = "amenity_ids";

/// Column value type, with text carrying its maximum length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Text(u32),
    Integer,
    Float,
}

/// One kind-specific column.
#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    /// The kind this column's value references, for foreign-key columns.
    pub references: Option<EntityKind>,
}

const fn text(name: &'static str, len: u32) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Text(len),
        nullable: false,
        references: None,
    }
}

const fn text_opt(name: &'static str, len: u32) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Text(len),
        nullable: true,
        references: None,
    }
}

const fn integer(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Integer,
        nullable: false,
        references: None,
    }
}

const fn float_opt(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Float,
        nullable: true,
        references: None,
    }
}

const fn foreign(name: &'static str, to: EntityKind) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Text(60),
        nullable: false,
        references: Some(to),
    }
}

const USER_COLUMNS: [ColumnDef; 4] = [
    text("email", 128),
    text("password", 128),
    text_opt("first_name", 128),
    text_opt("last_name", 128),
];

const STATE_COLUMNS: [ColumnDef; 1] = [text("name", 128)];

const CITY_COLUMNS: [ColumnDef; 2] = [text("name", 128), foreign("state_id", EntityKind::State)];

const AMENITY_COLUMNS: [ColumnDef; 1] = [text("name", 128)];

const PLACE_COLUMNS: [ColumnDef; 10] = [
    foreign("city_id", EntityKind::City),
    foreign("user_id", EntityKind::User),
    text("name", 128),
    text_opt("description", 1024),
    integer("number_rooms"),
    integer("number_bathrooms"),
    integer("max_guest"),
    integer("price_by_night"),
    float_opt("latitude"),
    float_opt("longitude"),
];

const REVIEW_COLUMNS: [ColumnDef; 3] = [
    foreign("place_id", EntityKind::Place),
    foreign("user_id", EntityKind::User),
    text("text", 1024),
];

impl EntityKind {
    /// The relational table backing this kind, if it has one.
    ///
    /// `Base` has no relational mapping and lives only in the file medium.
    pub fn table(&self) -> Option<&'static str> {
        match self {
            EntityKind::Base => None,
            EntityKind::User => Some("users"),
            EntityKind::State => Some("states"),
            EntityKind::City => Some("cities"),
            EntityKind::Amenity => Some("amenities"),
            EntityKind::Place => Some("places"),
            EntityKind::Review => Some("reviews"),
        }
    }

    /// Kind-specific columns, excluding id and the timestamp pair.
    pub fn columns(&self) -> &'static [ColumnDef] {
        match self {
            EntityKind::Base => &[],
            EntityKind::User => &USER_COLUMNS,
            EntityKind::State => &STATE_COLUMNS,
            EntityKind::City => &CITY_COLUMNS,
            EntityKind::Amenity => &AMENITY_COLUMNS,
            EntityKind::Place => &PLACE_COLUMNS,
            EntityKind::Review => &REVIEW_COLUMNS,
        }
    }

    /// Look a column up by field name.
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns().iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ALL_KINDS;

    #[test]
    fn only_base_lacks_a_table() {
        for kind in ALL_KINDS {
            assert_eq!(kind.table().is_none(), kind == EntityKind::Base);
        }
    }

    #[test]
    fn foreign_keys_point_at_mapped_kinds() {
        for kind in ALL_KINDS {
            for col in kind.columns() {
                if let Some(to) = col.references {
                    assert!(to.table().is_some(), "{}.{} references unmapped kind", kind, col.name);
                    assert_eq!(col.ty, ColumnType::Text(60));
                }
            }
        }
    }

    #[test]
    fn place_integer_columns() {
        let place = EntityKind::Place;
        for name in ["number_rooms", "number_bathrooms", "max_guest", "price_by_night"] {
            let col = place.column(name).unwrap();
            assert_eq!(col.ty, ColumnType::Integer);
            assert!(!col.nullable);
        }
        assert_eq!(place.column("latitude").unwrap().ty, ColumnType::Float);
    }

    #[test]
    fn column_lookup_misses_unknown_names() {
        assert!(EntityKind::State.column("population").is_none());
    }
}
