//! Durable key-value storage for the session pair.
//!
//! DESIGN
//! ======
//! `FileStore` is a JSON object on disk, rewritten on every mutation. A
//! missing or unreadable file reads as empty so a corrupt store degrades to
//! "logged out" rather than an error loop.
//!
//! Store calls are synchronous and `FileStore` uses blocking `std::fs`. The
//! guard and the client call them from async tasks on every request, poll
//! tick and termination; that is fine for a two-key file of a few hundred
//! bytes. A store backed by anything slower must not block and should cache
//! in memory instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::GuardError;

/// String key-value storage shared between the login flow and the guard.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set_item(&self, key: &str, value: &str) -> Result<(), GuardError>;

    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn remove_item(&self, key: &str) -> Result<(), GuardError>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), GuardError> {
        self.items
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), GuardError> {
        self.items
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "session file unreadable; treating as empty");
                return BTreeMap::new();
            }
        };
        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!(error = %e, path = %self.path.display(), "session file corrupt; treating as empty");
            BTreeMap::new()
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), GuardError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(items)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn mutate<F>(&self, f: F) -> Result<(), GuardError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut items = self.read_all();
        if f(&mut items) {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.read_all().remove(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), GuardError> {
        self.mutate(|items| {
            items.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), GuardError> {
        self.mutate(|items| items.remove(key).is_some())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
