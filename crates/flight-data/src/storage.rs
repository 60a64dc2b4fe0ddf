//! Key-value persistence for small JSON records.
//!
//! Each record lives under a well-known key and is wrapped in a versioned
//! envelope: `{"version": 1, "data": ...}`. Two backends:
//!
//! - `JsonFileStore`: one `<key>.json` file per record in a directory
//! - `MemoryStore`: process-local, for tests and ephemeral sessions

use crate::error::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Current on-disk schema version for every record.
pub const SCHEMA_VERSION: u32 = 1;

/// Application directory name under the platform data dir.
pub const APP_DIR_NAME: &str = "nearby-flights";

/// Raw storage backend. Values are opaque JSON documents.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> StorageResult<Option<Value>>;
    fn save(&self, key: &str, value: &Value) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    data: Value,
}

/// Load and decode a versioned record.
///
/// Returns `Ok(None)` when nothing is stored under `key`.
pub fn load_record<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> StorageResult<Option<T>> {
    let Some(raw) = store.load(key)? else {
        return Ok(None);
    };
    let envelope: Envelope = serde_json::from_value(raw)?;
    if envelope.version != SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion {
            key: key.to_string(),
            found: envelope.version,
        });
    }
    Ok(Some(serde_json::from_value(envelope.data)?))
}

/// Encode and store a record under `key` with the current schema version.
pub fn save_record<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    record: &T,
) -> StorageResult<()> {
    let envelope = Envelope {
        version: SCHEMA_VERSION,
        data: serde_json::to_value(record)?,
    };
    store.save(key, &serde_json::to_value(envelope)?)
}

// =============================================================================
// File backend
// =============================================================================

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory for the application, if one can be determined.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join(APP_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> StorageResult<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, key: &str, value: &Value) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        // Write to a sibling file first so a crash never leaves half a record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Memory backend
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.entries().get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> StorageResult<()> {
        self.entries().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}
