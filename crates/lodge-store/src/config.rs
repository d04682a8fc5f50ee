use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Backend switch: `"db"` selects the relational backend, anything else
/// (or unset) the file backend.
pub const ENV_STORAGE: &str = "LODGE_STORAGE";
/// Path of the JSON medium for the file backend.
pub const ENV_FILE_PATH: &str = "LODGE_FILE_PATH";
/// Path of the SQLite database for the relational backend. Unset means
/// an in-memory database.
pub const ENV_DB_PATH: &str = "LODGE_DB_PATH";
/// When set to `"test"`, the relational backend drops and recreates its
/// schema at startup instead of reusing it.
pub const ENV_RUNTIME: &str = "LODGE_ENV";

/// Configuration for the serialized-file backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileConfig {
    /// Path of the single JSON medium.
    pub path: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("file.json"),
        }
    }
}

/// Configuration for the relational backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RelationalConfig {
    /// SQLite database path; `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    /// Drop and recreate schema at startup (test runs).
    pub drop_existing: bool,
}

/// Which backend a store runs on. Selected once per process; never
/// swapped at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BackendConfig {
    File(FileConfig),
    Relational(RelationalConfig),
}

/// Startup configuration for an [`ObjectStore`](crate::ObjectStore).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: BackendConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::File(FileConfig::default()),
        }
    }
}

impl StoreConfig {
    /// File backend at the given path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendConfig::File(FileConfig { path: path.into() }),
        }
    }

    /// Relational backend at the given path (`None` for in-memory).
    pub fn relational(path: Option<PathBuf>) -> Self {
        Self {
            backend: BackendConfig::Relational(RelationalConfig {
                path,
                drop_existing: false,
            }),
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an injected variable lookup.
    ///
    /// Keeps selection logic testable without mutating process-global
    /// environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend = if lookup(ENV_STORAGE).as_deref() == Some("db") {
            BackendConfig::Relational(RelationalConfig {
                path: lookup(ENV_DB_PATH).map(PathBuf::from),
                drop_existing: lookup(ENV_RUNTIME).as_deref() == Some("test"),
            })
        } else {
            BackendConfig::File(FileConfig {
                path: lookup(ENV_FILE_PATH)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| FileConfig::default().path),
            })
        };
        Self { backend }
    }
}
