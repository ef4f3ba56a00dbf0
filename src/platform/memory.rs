//! In-memory key-value store

use std::cell::RefCell;
use std::collections::HashMap;

use super::KeyValueStore;
use crate::error::StoreError;

/// Process-lifetime store backed by a `HashMap`.
///
/// An optional capacity (sum of key and value byte lengths) reproduces the
/// quota failures of browser storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    /// Unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once `capacity` bytes would be exceeded
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: RefCell::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }

    /// Bytes currently in use
    pub fn used_bytes(&self) -> usize {
        self.items
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(capacity) = self.capacity {
            let replaced = self
                .items
                .borrow()
                .get(key)
                .map(|old| key.len() + old.len())
                .unwrap_or(0);
            let needed = self.used_bytes() - replaced + key.len() + value.len();
            if needed > capacity {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    capacity,
                });
            }
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert!(store.contains("a").unwrap());
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert!(!store.contains("a").unwrap());
    }

    #[test]
    fn test_quota_rejects_without_partial_write() {
        let store = MemoryStore::with_capacity(10);
        store.set("k", "12345").unwrap();
        let err = store.set("k2", "1234567").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { needed: 15, .. }));
        assert_eq!(store.get("k2").unwrap(), None);
        assert_eq!(store.used_bytes(), 6);
    }

    #[test]
    fn test_quota_counts_replaced_value_once() {
        let store = MemoryStore::with_capacity(10);
        store.set("k", "123456789").unwrap();
        // Overwriting shrinks usage rather than adding to it
        store.set("k", "1").unwrap();
        assert_eq!(store.used_bytes(), 2);
    }
}
