//! Key-value backends.
//!
//! The overlay persists one process-wide mapping `URL -> [record]`. Hosts
//! provide it through [`KeyValueStore`]; this module ships an in-memory
//! backend and a JSON file backend.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{StorageError, StorageResult};

/// The persisted mapping, keyed by normalized page URL.
pub type Mapping = serde_json::Map<String, Value>;

/// Host capability for persisting the annotation mapping.
pub trait KeyValueStore {
    /// Liveness probe. Callers check this before every operation so a
    /// vanished host context degrades to a no-op instead of a failure.
    fn is_alive(&self) -> bool;

    fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    fn set(&mut self, key: &str, value: Value) -> StorageResult<()>;

    fn remove(&mut self, key: &str) -> StorageResult<()>;

    fn get_all(&self) -> StorageResult<Mapping>;

    /// Overwrites the whole mapping.
    fn replace_all(&mut self, mapping: Mapping) -> StorageResult<()>;
}

/// In-memory store. `invalidate` simulates the host context going away.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Mapping,
    alive: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mapping::new(),
            alive: true,
        }
    }

    pub fn with_entries(entries: Mapping) -> Self {
        Self {
            entries,
            alive: true,
        }
    }

    pub fn invalidate(&mut self) {
        self.alive = false;
    }

    pub fn revive(&mut self) {
        self.alive = true;
    }

    fn ensure_alive(&self) -> StorageResult<()> {
        if self.alive {
            Ok(())
        } else {
            Err(StorageError::ContextInvalidated)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn is_alive(&self) -> bool {
        self.alive
    }

    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        self.ensure_alive()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> StorageResult<()> {
        self.ensure_alive()?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.ensure_alive()?;
        self.entries.remove(key);
        Ok(())
    }

    fn get_all(&self) -> StorageResult<Mapping> {
        self.ensure_alive()?;
        Ok(self.entries.clone())
    }

    fn replace_all(&mut self, mapping: Mapping) -> StorageResult<()> {
        self.ensure_alive()?;
        self.entries = mapping;
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Every operation re-reads the file, so several processes sharing it see
/// each other's writes; the last writer of a key wins. Writes go to a
/// temporary sibling first and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Opens (without reading) the store at `path`, creating its directory.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Opens the store at the platform default location.
    pub fn open_default() -> StorageResult<Self> {
        Self::open(default_store_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StorageResult<Mapping> {
        if !self.path.exists() {
            return Ok(Mapping::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Mapping::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(mapping) => Ok(mapping),
            other => Err(StorageError::Corrupted(format!(
                "{} holds {} instead of an object",
                self.path.display(),
                if other.is_array() { "an array" } else { "a scalar" }
            ))),
        }
    }

    fn write(&self, mapping: &Mapping) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(mapping)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn is_alive(&self) -> bool {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
            _ => true,
        }
    }

    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> StorageResult<()> {
        let mut mapping = self.read()?;
        mapping.insert(key.to_string(), value);
        self.write(&mapping)
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let mut mapping = self.read()?;
        if mapping.remove(key).is_some() {
            self.write(&mapping)?;
        }
        Ok(())
    }

    fn get_all(&self) -> StorageResult<Mapping> {
        self.read()
    }

    fn replace_all(&mut self, mapping: Mapping) -> StorageResult<()> {
        self.write(&mapping)
    }
}

/// Default annotation store location: `<data dir>/deepoverlay/annotations.json`.
pub fn default_store_path() -> StorageResult<PathBuf> {
    let base = dirs::data_local_dir().ok_or_else(|| {
        StorageError::DataDirectory("no local data directory on this platform".to_string())
    })?;
    Ok(base.join("deepoverlay").join("annotations.json"))
}
