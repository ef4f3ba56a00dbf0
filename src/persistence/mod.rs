//! Storage namespace and JSON encoding shared by the record managers
//!
//! Each [`Partition`] owns exactly one store key holding one JSON payload.
//! An absent key is the valid "never saved" state.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::consts;
use crate::error::{PersistError, Result};
use crate::platform::KeyValueStore;

/// Untyped JSON object, the default shape of game snapshots and history entries
pub type JsonObject = Map<String, Value>;

/// The four logical slots of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    UserData,
    GameState,
    GameHistory,
    Settings,
}

impl Partition {
    pub const ALL: [Partition; 4] = [
        Partition::UserData,
        Partition::GameState,
        Partition::GameHistory,
        Partition::Settings,
    ];

    /// Store key holding this partition's payload
    pub fn key(&self) -> &'static str {
        match self {
            Partition::UserData => consts::USER_DATA_KEY,
            Partition::GameState => consts::GAME_STATE_KEY,
            Partition::GameHistory => consts::GAME_HISTORY_KEY,
            Partition::Settings => consts::SETTINGS_KEY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::UserData => "user data",
            Partition::GameState => "game state",
            Partition::GameHistory => "game history",
            Partition::Settings => "settings",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode the partition's payload.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    partition: Partition,
) -> Result<T> {
    let json = store
        .get(partition.key())?
        .ok_or(PersistError::Missing(partition))?;
    serde_json::from_str(&json).map_err(|source| PersistError::Corrupt { partition, source })
}

/// Encode `value` and replace the partition's payload.
///
/// Encoding happens before the store is touched, so a failure never leaves
/// a partial write.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    partition: Partition,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_string(value).map_err(PersistError::Encode)?;
    store.set(partition.key(), &json)?;
    Ok(())
}

/// Drop the partition's payload. Idempotent.
pub fn remove(store: &dyn KeyValueStore, partition: Partition) -> Result<()> {
    store.remove(partition.key())?;
    Ok(())
}

/// Whether the partition's key exists, without decoding it.
pub fn exists(store: &dyn KeyValueStore, partition: Partition) -> Result<bool> {
    Ok(store.contains(partition.key())?)
}

/// Read, treating an absent partition as `T::default()`.
pub fn read_or_default<T: DeserializeOwned + Default>(
    store: &dyn KeyValueStore,
    partition: Partition,
) -> Result<T> {
    match read_json(store, partition) {
        Err(PersistError::Missing(_)) => Ok(T::default()),
        other => other,
    }
}

/// Recover from a read failure: log it and fall back to `fallback`.
pub fn recover<T>(partition: Partition, result: Result<T>, fallback: impl FnOnce() -> T) -> T {
    match result {
        Ok(value) => value,
        Err(PersistError::Missing(_)) => {
            log::debug!("No {} stored yet", partition);
            fallback()
        }
        Err(e) => {
            log::warn!("Ignoring unreadable {}: {}", partition, e);
            fallback()
        }
    }
}

/// Serialize `value` into a JSON object and overwrite `stamps` on it.
pub fn stamp<T: Serialize + ?Sized>(
    partition: Partition,
    value: &T,
    stamps: impl IntoIterator<Item = (&'static str, Value)>,
) -> Result<JsonObject> {
    let Value::Object(mut object) = serde_json::to_value(value).map_err(PersistError::Encode)?
    else {
        return Err(PersistError::NotAnObject(partition));
    };
    for (field, stamp) in stamps {
        object.insert(field.to_string(), stamp);
    }
    Ok(object)
}

/// Remove a stamped field from a stored object.
pub fn take_field<S: DeserializeOwned>(
    partition: Partition,
    object: &mut JsonObject,
    field: &str,
) -> Result<S> {
    let value = object.remove(field).unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|source| PersistError::Corrupt { partition, source })
}

/// Decode what is left of a stored object once its stamps are removed.
pub fn from_object<T: DeserializeOwned>(partition: Partition, object: JsonObject) -> Result<T> {
    serde_json::from_value(Value::Object(object))
        .map_err(|source| PersistError::Corrupt { partition, source })
}
