//! File-backed key-value store for native builds
//!
//! The whole key space is one JSON object on disk. Every mutation rewrites
//! it through a sibling temp file and a rename so a crash never leaves a
//! half-written store behind.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::error::StoreError;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let items = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                StoreError::Unavailable(format!("{} is not a store file: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        log::info!("Opened store at {}", path.display());
        Ok(Self {
            path,
            items: RefCell::new(items),
        })
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut next = self.items.borrow().clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *self.items.borrow_mut() = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if !self.items.borrow().contains_key(key) {
            return Ok(());
        }
        let mut next = self.items.borrow().clone();
        next.remove(key);
        self.persist(&next)?;
        *self.items.borrow_mut() = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saves").join("store.json");
        {
            let store = FileStore::open(&path).unwrap();
            store.set("boardGame_settings", r#"{"difficulty":"hard"}"#).unwrap();
            store.set("other", "x").unwrap();
            store.remove("other").unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(
            store.get("boardGame_settings").unwrap().as_deref(),
            Some(r#"{"difficulty":"hard"}"#)
        );
        assert_eq!(store.get("other").unwrap(), None);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_rejects_garbage_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Unavailable(_))
        ));
    }
}
