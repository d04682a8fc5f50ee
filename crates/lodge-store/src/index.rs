use std::collections::{BTreeSet, HashMap};

use lodge_types::schema::AMENITY_IDS_FIELD;
use lodge_types::{EntityKind, FieldValue, ObjectKey, Record};

/// Secondary mapping from a referenced record to the set of records whose
/// foreign-key fields point at it.
///
/// Maintained alongside the file backend's resident set on every
/// registration and deletion, and rebuilt wholesale on reload, so
/// relationship lookups never scan the whole store. Covers the scalar
/// foreign-key columns declared in the schema plus the Place→Amenity
/// link list.
#[derive(Debug, Default)]
pub struct RelationIndex {
    referrers: HashMap<ObjectKey, BTreeSet<ObjectKey>>,
}

impl RelationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track every reference the record holds.
    pub fn insert(&mut self, record: &Record) {
        let key = record.key();
        for target in references_of(record) {
            self.referrers.entry(target).or_default().insert(key.clone());
        }
    }

    /// Drop every reference the record holds.
    pub fn remove(&mut self, record: &Record) {
        let key = record.key();
        for target in references_of(record) {
            if let Some(set) = self.referrers.get_mut(&target) {
                set.remove(&key);
                if set.is_empty() {
                    self.referrers.remove(&target);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.referrers.clear();
    }

    /// Rebuild from scratch over a full resident set.
    pub fn rebuild<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) {
        self.clear();
        for record in records {
            self.insert(record);
        }
    }

    /// Keys of every record referencing `target`, in key order.
    pub fn referrers(&self, target: &ObjectKey) -> Vec<ObjectKey> {
        self.referrers
            .get(target)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Every key a record references through its foreign-key fields.
fn references_of(record: &Record) -> Vec<ObjectKey> {
    let mut out = Vec::new();
    for col in record.kind().columns() {
        let Some(target_kind) = col.references else {
            continue;
        };
        if let Some(FieldValue::Text(id)) = record.get(col.name) {
            out.push(ObjectKey::new(target_kind, id.clone()));
        }
    }
    if record.kind() == EntityKind::Place {
        if let Some(FieldValue::List(ids)) = record.get(AMENITY_IDS_FIELD) {
            for id in ids {
                out.push(ObjectKey::new(EntityKind::Amenity, id.clone()));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_in(state_id: &str) -> Record {
        Record::new(EntityKind::City)
            .with("name", "Fresno".into())
            .with("state_id", state_id.into())
    }

    #[test]
    fn insert_tracks_foreign_keys() {
        let state = Record::new(EntityKind::State).with("name", "California".into());
        let city = city_in(state.id());

        let mut index = RelationIndex::new();
        index.insert(&city);

        assert_eq!(index.referrers(&state.key()), vec![city.key()]);
    }

    #[test]
    fn remove_untracks() {
        let state = Record::new(EntityKind::State);
        let city = city_in(state.id());

        let mut index = RelationIndex::new();
        index.insert(&city);
        index.remove(&city);

        assert!(index.referrers(&state.key()).is_empty());
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let state = Record::new(EntityKind::State);
        let old_city = city_in(state.id());
        let new_city = city_in(state.id());

        let mut index = RelationIndex::new();
        index.insert(&old_city);
        index.rebuild([&new_city]);

        assert_eq!(index.referrers(&state.key()), vec![new_city.key()]);
    }

    #[test]
    fn amenity_links_are_indexed() {
        let amenity = Record::new(EntityKind::Amenity).with("name", "Wifi".into());
        let place = Record::new(EntityKind::Place)
            .with("name", "Cabin".into())
            .with(AMENITY_IDS_FIELD, FieldValue::List(vec![amenity.id().to_string()]));

        let mut index = RelationIndex::new();
        index.insert(&place);

        assert_eq!(index.referrers(&amenity.key()), vec![place.key()]);
    }

    #[test]
    fn multiple_referrers_sort_by_key() {
        let user = Record::new(EntityKind::User);
        let a = Record::new(EntityKind::Place).with("user_id", user.id().into());
        let b = Record::new(EntityKind::Review).with("user_id", user.id().into());

        let mut index = RelationIndex::new();
        index.insert(&a);
        index.insert(&b);

        let refs = index.referrers(&user.key());
        assert_eq!(refs.len(), 2);
        assert!(refs.windows(2).all(|w| w[0] <= w[1]));
    }
}
