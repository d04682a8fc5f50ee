use std::collections::BTreeMap;

use tracing::debug;

use lodge_types::{EntityKind, ObjectKey, Record};

use crate::config::{BackendConfig, StoreConfig};
use crate::error::StoreResult;
use crate::file::FileStorage;
use crate::relational::RelationalStorage;
use crate::traits::Storage;

/// Single point of access to the persistence layer.
///
/// Selects exactly one backend from configuration at construction and
/// delegates every operation to it; the backend is never swapped at
/// runtime. An `ObjectStore` is an explicitly constructed value: build
/// one at startup and pass it by reference to whatever consumes it.
pub struct ObjectStore {
    backend: Box<dyn Storage>,
}

impl ObjectStore {
    /// Select the configured backend and perform the initial load.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let mut backend: Box<dyn Storage> = match &config.backend {
            BackendConfig::File(file) => {
                debug!(path = %file.path.display(), "file backend selected");
                Box::new(FileStorage::new(file))
            }
            BackendConfig::Relational(db) => {
                debug!("relational backend selected");
                Box::new(RelationalStorage::open(db)?)
            }
        };
        backend.reload()?;
        Ok(Self { backend })
    }

    /// Open from the process environment (see [`crate::config`]).
    pub fn from_env() -> StoreResult<Self> {
        Self::open(&StoreConfig::from_env())
    }

    /// Every resident record, optionally filtered to one kind.
    pub fn all(&self, kind: Option<EntityKind>) -> StoreResult<BTreeMap<ObjectKey, Record>> {
        self.backend.all(kind)
    }

    /// Register a record; durable after the next [`save`](Self::save).
    pub fn new(&mut self, record: Record) -> StoreResult<()> {
        self.backend.new(record)
    }

    /// Flush pending registrations and deletions to the medium.
    pub fn save(&mut self) -> StoreResult<()> {
        self.backend.save()
    }

    /// Remove a record; `None` is a no-op.
    pub fn delete(&mut self, record: Option<&Record>) -> StoreResult<()> {
        self.backend.delete(record)
    }

    /// (Re)populate from the medium, discarding unsaved state.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.backend.reload()
    }

    /// Release backend resources.
    pub fn close(&mut self) -> StoreResult<()> {
        self.backend.close()
    }

    /// Look one record up by identity key. An absent key is `Ok(None)`,
    /// never an error.
    pub fn get(&self, key: &ObjectKey) -> StoreResult<Option<Record>> {
        Ok(self.all(Some(key.kind))?.remove(key))
    }

    /// Number of resident records, optionally of one kind.
    pub fn count(&self, kind: Option<EntityKind>) -> StoreResult<usize> {
        Ok(self.all(kind)?.len())
    }
}
