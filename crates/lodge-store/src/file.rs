use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::debug;

use lodge_types::{EntityKind, ObjectKey, Record};

use crate::config::FileConfig;
use crate::error::{StoreError, StoreResult};
use crate::index::RelationIndex;
use crate::traits::Storage;

/// Serialized-file backend: an explicit in-memory resident set, flushed
/// wholesale to a single JSON medium on every `save`.
///
/// The resident set is the sole source of truth between loads. The medium
/// is one flat JSON object mapping identity keys to each record's
/// serialized field mapping. Deletes do not cascade: removing a record
/// leaves any records referencing it dangling.
pub struct FileStorage {
    path: PathBuf,
    objects: BTreeMap<ObjectKey, Record>,
    index: RelationIndex,
}

impl FileStorage {
    pub fn new(config: &FileConfig) -> Self {
        Self {
            path: config.path.clone(),
            objects: BTreeMap::new(),
            index: RelationIndex::new(),
        }
    }

    /// Number of resident records.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Keys of every resident record referencing `target`, via the
    /// relation index (no scan over the resident set).
    pub fn referrers(&self, target: &ObjectKey) -> Vec<ObjectKey> {
        self.index.referrers(target)
    }

    fn malformed(&self, reason: impl Into<String>) -> StoreError {
        StoreError::MalformedMedium {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl Storage for FileStorage {
    fn all(&self, kind: Option<EntityKind>) -> StoreResult<BTreeMap<ObjectKey, Record>> {
        let matches = self
            .objects
            .iter()
            .filter(|(key, _)| kind.map_or(true, |k| key.kind == k))
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect();
        Ok(matches)
    }

    fn new(&mut self, record: Record) -> StoreResult<()> {
        let key = record.key();
        if let Some(old) = self.objects.remove(&key) {
            self.index.remove(&old);
        }
        self.index.insert(&record);
        self.objects.insert(key, record);
        Ok(())
    }

    fn save(&mut self) -> StoreResult<()> {
        let mut medium = Map::new();
        for (key, record) in &self.objects {
            medium.insert(key.to_string(), Value::Object(record.to_map()));
        }

        // Write to a sibling temp file and rename so a failed write never
        // truncates the existing medium.
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
        serde_json::to_writer(&mut tmp, &Value::Object(medium))?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(objects = self.objects.len(), path = %self.path.display(), "medium persisted");
        Ok(())
    }

    fn delete(&mut self, record: Option<&Record>) -> StoreResult<()> {
        let Some(record) = record else {
            return Ok(());
        };
        if let Some(old) = self.objects.remove(&record.key()) {
            self.index.remove(&old);
        }
        Ok(())
    }

    fn reload(&mut self) -> StoreResult<()> {
        if !self.path.exists() {
            self.objects.clear();
            self.index.clear();
            debug!(path = %self.path.display(), "medium absent, starting empty");
            return Ok(());
        }

        let raw = fs::read_to_string(&self.path)?;
        let medium: Map<String, Value> =
            serde_json::from_str(&raw).map_err(|e| self.malformed(e.to_string()))?;

        // Reconstruct into a fresh set so a malformed entry never leaves
        // partial data resident.
        let mut objects = BTreeMap::new();
        for (stored_key, value) in &medium {
            let entry = value
                .as_object()
                .ok_or_else(|| self.malformed(format!("entry {stored_key} is not a mapping")))?;
            let record = Record::from_map(entry)?;
            let key = record.key();
            if key.to_string() != *stored_key {
                return Err(StoreError::KeyMismatch {
                    stored: stored_key.clone(),
                    reconstructed: key.to_string(),
                });
            }
            objects.insert(key, record);
        }

        self.index.rebuild(objects.values());
        debug!(objects = objects.len(), path = %self.path.display(), "medium loaded");
        self.objects = objects;
        Ok(())
    }

    fn close(&mut self) -> StoreResult<()> {
        self.reload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodge_types::FieldValue;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> FileStorage {
        FileStorage::new(&FileConfig {
            path: dir.path().join("file.json"),
        })
    }

    fn california() -> Record {
        Record::new(EntityKind::State).with("name", "California".into())
    }

    // -----------------------------------------------------------------------
    // Round-trip
    // -----------------------------------------------------------------------

    #[test]
    fn new_then_save_then_all_contains_record() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        let state = california();
        let key = state.key();

        storage.new(state.clone()).unwrap();
        storage.save().unwrap();

        let all = storage.all(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[&key], state);
    }

    #[test]
    fn reload_after_save_reproduces_resident_set() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        let place = Record::new(EntityKind::Place)
            .with("name", "My little house".into())
            .with("number_rooms", FieldValue::Int(4))
            .with("latitude", FieldValue::Float(37.773972));
        let user = Record::new(EntityKind::User).with("email", "a@b.c".into());

        storage.new(place).unwrap();
        storage.new(user).unwrap();
        storage.save().unwrap();
        let before = storage.all(None).unwrap();

        storage.reload().unwrap();
        assert_eq!(storage.all(None).unwrap(), before);
    }

    #[test]
    fn reload_survives_a_second_process_view() {
        let dir = TempDir::new().unwrap();
        let state = california();
        let key = state.key();
        {
            let mut writer = storage_in(&dir);
            writer.new(state.clone()).unwrap();
            writer.save().unwrap();
        }

        let mut reader = storage_in(&dir);
        reader.reload().unwrap();
        let all = reader.all(Some(EntityKind::State)).unwrap();
        assert_eq!(all[&key].get("name"), Some(&"California".into()));
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    #[test]
    fn delete_then_save_removes_key() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        let state = california();

        storage.new(state.clone()).unwrap();
        storage.save().unwrap();
        storage.delete(Some(&state)).unwrap();
        storage.save().unwrap();

        assert!(storage.all(Some(EntityKind::State)).unwrap().is_empty());
        storage.reload().unwrap();
        assert!(storage.all(None).unwrap().is_empty());
    }

    #[test]
    fn second_delete_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        let state = california();

        storage.new(state.clone()).unwrap();
        storage.delete(Some(&state)).unwrap();
        storage.delete(Some(&state)).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn delete_none_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        storage.new(california()).unwrap();
        storage.delete(None).unwrap();
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn delete_does_not_cascade() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        let state = california();
        let city = Record::new(EntityKind::City)
            .with("name", "Fresno".into())
            .with("state_id", state.id().into());

        storage.new(state.clone()).unwrap();
        storage.new(city.clone()).unwrap();
        storage.delete(Some(&state)).unwrap();

        // The city stays resident with a dangling state_id.
        assert_eq!(storage.len(), 1);
        assert!(storage.all(Some(EntityKind::City)).unwrap().contains_key(&city.key()));
    }

    // -----------------------------------------------------------------------
    // Filtering
    // -----------------------------------------------------------------------

    #[test]
    fn all_filters_by_kind() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        storage.new(california()).unwrap();
        storage.new(Record::new(EntityKind::User)).unwrap();

        let states = storage.all(Some(EntityKind::State)).unwrap();
        assert_eq!(states.len(), 1);
        assert!(states.keys().all(|k| k.kind == EntityKind::State));

        let union = storage.all(None).unwrap();
        assert_eq!(union.len(), 2);
    }

    #[test]
    fn registering_same_key_twice_overwrites() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        let mut state = california();
        storage.new(state.clone()).unwrap();

        state.set("name", "Nevada".into());
        storage.new(state.clone()).unwrap();

        let all = storage.all(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[&state.key()].get("name"), Some(&"Nevada".into()));
    }

    // -----------------------------------------------------------------------
    // Reload failure policy
    // -----------------------------------------------------------------------

    #[test]
    fn reload_with_missing_medium_is_empty_not_error() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        storage.reload().unwrap();
        assert!(storage.all(None).unwrap().is_empty());
    }

    #[test]
    fn reload_with_malformed_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.json");
        fs::write(&path, "{ not json").unwrap();

        let mut storage = FileStorage::new(&FileConfig { path });
        assert!(matches!(
            storage.reload(),
            Err(StoreError::MalformedMedium { .. })
        ));
    }

    #[test]
    fn reload_rejects_unknown_tag() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.json");
        fs::write(
            &path,
            r#"{"Spaceship.1": {"__class__": "Spaceship", "id": "1",
                "created_at": "2020-01-01T00:00:00.000000",
                "updated_at": "2020-01-01T00:00:00.000000"}}"#,
        )
        .unwrap();

        let mut storage = FileStorage::new(&FileConfig { path });
        assert!(matches!(storage.reload(), Err(StoreError::Record(_))));
    }

    #[test]
    fn reload_rejects_mismatched_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.json");
        let record = california();
        let mut medium = Map::new();
        medium.insert("State.wrong-id".into(), Value::Object(record.to_map()));
        fs::write(&path, serde_json::to_string(&medium).unwrap()).unwrap();

        let mut storage = FileStorage::new(&FileConfig { path });
        assert!(matches!(
            storage.reload(),
            Err(StoreError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn reload_discards_unsaved_state() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        storage.new(california()).unwrap();
        storage.save().unwrap();
        storage.new(Record::new(EntityKind::User)).unwrap();

        storage.reload().unwrap();
        let all = storage.all(None).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.keys().all(|k| k.kind == EntityKind::State));
    }

    // -----------------------------------------------------------------------
    // Relation index
    // -----------------------------------------------------------------------

    #[test]
    fn index_follows_registrations_and_reloads() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        let state = california();
        let city = Record::new(EntityKind::City)
            .with("name", "Fresno".into())
            .with("state_id", state.id().into());

        storage.new(state.clone()).unwrap();
        storage.new(city.clone()).unwrap();
        assert_eq!(storage.referrers(&state.key()), vec![city.key()]);

        storage.save().unwrap();
        storage.reload().unwrap();
        assert_eq!(storage.referrers(&state.key()), vec![city.key()]);

        storage.delete(Some(&city)).unwrap();
        assert!(storage.referrers(&state.key()).is_empty());
    }

    #[test]
    fn close_reloads_from_medium() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage_in(&dir);
        storage.new(california()).unwrap();
        storage.save().unwrap();
        storage.new(Record::new(EntityKind::User)).unwrap();

        storage.close().unwrap();
        assert_eq!(storage.len(), 1);
    }
}
