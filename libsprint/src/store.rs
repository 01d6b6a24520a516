//! Durable key-value storage for the editing session
//!
//! The session state is a flat map of string keys to string values:
//!
//! - `code`: the current code text (or `code:<teamID>` when scoped per team)
//! - `teamID`, `teamName`: the identity established by register/join
//!
//! `FileStore` keeps the map in one JSON file and writes through on every
//! mutation. The file is shared by the TUI and the CLIs, so every read and
//! every read-modify-write starts from what is on disk. `MemoryStore` backs
//! tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, StoreError};

pub const CODE_KEY: &str = "code";
pub const TEAM_ID_KEY: &str = "teamID";
pub const TEAM_NAME_KEY: &str = "teamName";

/// Trait for session storage backends
///
/// Writes are synchronous and last-write-wins. Implementations must be safe
/// to share between the editor and the submission controller.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Name of the backend for diagnostics
    fn backend_name(&self) -> &str;
}

/// JSON file store
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating nothing until the first write
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not a JSON
    /// object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path)?;

        tracing::debug!("Opened session store at {} ({} keys)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Lock the cached map and bring it up to date with the file
    fn lock_fresh(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        *entries = read_entries(&self.path)?;
        Ok(entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::Io)?;
            }
        }

        let json = serde_json::to_string_pretty(entries).map_err(StoreError::Corrupt)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(StoreError::Io)?;
        std::fs::rename(&tmp_path, &self.path).map_err(StoreError::Io)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock_fresh()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock_fresh()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.lock_fresh()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

/// Current contents of the store file; a missing or empty file is an empty map
fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(StoreError::Io(e).into()),
    };
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&content).map_err(StoreError::Corrupt)?)
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|count| *count).unwrap_or(0)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        *self.writes.lock().map_err(|_| StoreError::Poisoned)? += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
