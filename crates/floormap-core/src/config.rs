//! Configuration storage abstraction.
//!
//! The editor and the HTTP service never touch a concrete backend. They are
//! handed something implementing [`ConfigStorage`]:
//! - `MemoryConfigStorage` for tests and embedding
//! - `FileConfigStorage` for Linux (one JSON file per key)
//!
//! Keys are plain strings. Values are JSON documents.

use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::codec;
use crate::model::MapConfig;

/// Fixed key of the map configuration persisted by the editor.
pub const MAP_CONFIG_KEY: &str = "floor1_map_config";

/// Key prefix for per-facility map configurations.
pub const FACILITY_KEY_PREFIX: &str = "facility-map.";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested configuration was not found.
    #[error("Configuration not found: {0}")]
    NotFound(String),
    /// Failed to read configuration.
    #[error("Read error: {0}")]
    ReadError(String),
    /// Failed to write configuration.
    #[error("Write error: {0}")]
    WriteError(String),
    /// Configuration data or key is invalid.
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Storage is not available.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Abstract key/value configuration storage.
///
/// All methods are synchronous and may block on I/O. The HTTP layer runs
/// them on the blocking thread pool.
pub trait ConfigStorage: Send + Sync {
    /// Read the raw JSON stored under `key`.
    fn read(&self, key: &str) -> Result<String, ConfigError>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), ConfigError>;

    /// Check if a key exists.
    fn has_key(&self, key: &str) -> Result<bool, ConfigError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete_key(&self, key: &str) -> Result<(), ConfigError>;

    /// List all stored keys.
    fn list_keys(&self) -> Result<Vec<String>, ConfigError>;
}

impl<S: ConfigStorage + ?Sized> ConfigStorage for Arc<S> {
    fn read(&self, key: &str) -> Result<String, ConfigError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        (**self).write(key, value)
    }

    fn has_key(&self, key: &str) -> Result<bool, ConfigError> {
        (**self).has_key(key)
    }

    fn delete_key(&self, key: &str) -> Result<(), ConfigError> {
        (**self).delete_key(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, ConfigError> {
        (**self).list_keys()
    }
}

/// Load and deserialize a value by key.
pub fn load_value<T, S>(storage: &S, key: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    S: ConfigStorage + ?Sized,
{
    let json = storage.read(key)?;
    serde_json::from_str(&json).map_err(|e| ConfigError::InvalidData(e.to_string()))
}

/// Serialize and save a value by key.
pub fn save_value<T, S>(storage: &S, key: &str, value: &T) -> Result<(), ConfigError>
where
    T: Serialize + ?Sized,
    S: ConfigStorage + ?Sized,
{
    let json = serde_json::to_string(value).map_err(|e| ConfigError::WriteError(e.to_string()))?;
    storage.write(key, &json)
}

/// Load a map configuration, running the same validation as imports.
pub fn load_map_config<S>(storage: &S, key: &str) -> Result<MapConfig, ConfigError>
where
    S: ConfigStorage + ?Sized,
{
    let json = storage.read(key)?;
    codec::import_config(json.as_bytes()).map_err(|e| ConfigError::InvalidData(e.to_string()))
}

/// Save a map configuration, fully overwriting the previous value.
pub fn save_map_config<S>(storage: &S, key: &str, config: &MapConfig) -> Result<(), ConfigError>
where
    S: ConfigStorage + ?Sized,
{
    save_value(storage, key, config)
}

fn facility_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid facility id regex"))
}

/// Check a facility identifier and build its storage key.
pub fn facility_key(facility_id: &str) -> Result<String, ConfigError> {
    if facility_id_pattern().is_match(facility_id) {
        Ok(format!("{}{}", FACILITY_KEY_PREFIX, facility_id))
    } else {
        Err(ConfigError::InvalidData(format!(
            "invalid facility id: {:?}",
            facility_id
        )))
    }
}

// ============================================================================
// Facility map handlers (framework-agnostic)
// ============================================================================

/// Per-facility map configuration logic shared by any HTTP framework.
pub struct FacilityMaps;

impl FacilityMaps {
    /// Fetch the map configuration of a facility.
    pub fn fetch_config<S: ConfigStorage + ?Sized>(
        storage: &S,
        facility_id: &str,
    ) -> Result<MapConfig, ConfigError> {
        let key = facility_key(facility_id)?;
        load_map_config(storage, &key)
    }

    /// Replace the map configuration of a facility.
    pub fn save_config<S: ConfigStorage + ?Sized>(
        storage: &S,
        facility_id: &str,
        config: &MapConfig,
    ) -> Result<(), ConfigError> {
        let key = facility_key(facility_id)?;
        codec::validate(config).map_err(|e| ConfigError::InvalidData(e.to_string()))?;
        save_map_config(storage, &key, config)
    }

    /// Delete the map configuration of a facility.
    pub fn delete_config<S: ConfigStorage + ?Sized>(
        storage: &S,
        facility_id: &str,
    ) -> Result<(), ConfigError> {
        let key = facility_key(facility_id)?;
        if !storage.has_key(&key)? {
            return Err(ConfigError::NotFound(facility_id.to_string()));
        }
        storage.delete_key(&key)
    }

    /// List facility ids that have a stored map, sorted.
    pub fn list_facilities<S: ConfigStorage + ?Sized>(
        storage: &S,
    ) -> Result<Vec<String>, ConfigError> {
        let mut ids: Vec<String> = storage
            .list_keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(FACILITY_KEY_PREFIX).map(String::from))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

// ============================================================================
// In-memory storage
// ============================================================================

/// In-memory storage, used by tests and single-session embedding.
#[derive(Debug, Default)]
pub struct MemoryConfigStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryConfigStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> ConfigError {
    ConfigError::StorageUnavailable("storage lock poisoned".to_string())
}

impl ConfigStorage for MemoryConfigStorage {
    fn read(&self, key: &str) -> Result<String, ConfigError> {
        let data = self.data.read().map_err(poisoned)?;
        data.get(key)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.data
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn has_key(&self, key: &str) -> Result<bool, ConfigError> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.contains_key(key))
    }

    fn delete_key(&self, key: &str) -> Result<(), ConfigError> {
        self.data.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>, ConfigError> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.keys().cloned().collect())
    }
}

// ============================================================================
// File storage
// ============================================================================

/// File-based storage: each key is stored as `<dir>/<key>.json`.
///
/// Each write goes to its own temporary file in the same directory and is
/// renamed over the target. Concurrent writers to one key never share a
/// temporary path. Readers see either the previous or the new document.
/// Temporary files start with a dot and never end in `.json`, so they are
/// not listed as keys.
#[derive(Debug, Clone)]
pub struct FileConfigStorage {
    dir: PathBuf,
}

fn storage_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9_.-]*$").expect("valid key regex"))
}

impl FileConfigStorage {
    /// Open (and create if needed) a storage directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            ConfigError::StorageUnavailable(format!("{}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        if !storage_key_pattern().is_match(key) {
            return Err(ConfigError::InvalidData(format!("invalid key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl ConfigStorage for FileConfigStorage {
    fn read(&self, key: &str) -> Result<String, ConfigError> {
        let path = self.path_for(key)?;
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(key.to_string()),
            _ => ConfigError::ReadError(format!("{}: {}", path.display(), e)),
        })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&tmp, value).and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(ConfigError::WriteError(format!("{}: {}", path.display(), e)));
        }
        debug!(key, path = %path.display(), "Wrote configuration");
        Ok(())
    }

    fn has_key(&self, key: &str) -> Result<bool, ConfigError> {
        let path = self.path_for(key)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ConfigError::ReadError(format!("{}: {}", path.display(), e))),
        }
    }

    fn delete_key(&self, key: &str) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::WriteError(format!("{}: {}", path.display(), e))),
        }
    }

    fn list_keys(&self) -> Result<Vec<String>, ConfigError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", self.dir.display(), e)))?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let name = entry.file_name();
            if let Some(key) = name.to_str().and_then(|n| n.strip_suffix(".json")) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }
}
