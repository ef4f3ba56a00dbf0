//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, memory or a JSON file natively)
//! - Wall-clock time
//! - Deferred tasks (setTimeout on web, a virtual-time queue natively)

pub mod clock;
#[cfg(not(target_arch = "wasm32"))]
pub mod file;
pub mod memory;
pub mod timer;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use clock::{Clock, ManualClock, SystemClock};
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
pub use memory::MemoryStore;
pub use timer::{ManualTimer, TaskHandle, Timer};
#[cfg(target_arch = "wasm32")]
pub use web::{BrowserTimer, LocalStorage};

use crate::error::StoreError;

/// Synchronous string-keyed storage shared by every manager.
///
/// Mirrors the browser `Storage` interface: methods take `&self` and
/// implementations use interior mutability.
pub trait KeyValueStore {
    /// Value stored under `key`, `None` if never written or removed.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Whether `key` currently holds a value.
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}
