//! Completed-game history
//!
//! Persisted to LocalStorage, newest first, capped at the configured limit
//! (50 by default). Recording a game is best-effort: failures are logged and
//! never reach the caller.

use std::marker::PhantomData;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::PersistConfig;
use crate::error::Result;
use crate::persistence::{self, JsonObject, Partition};
use crate::platform::clock::iso_timestamp;
use crate::platform::{Clock, KeyValueStore};

const COMPLETED_AT_FIELD: &str = "completedAt";
const ID_FIELD: &str = "id";

/// A single history entry
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedGame<T> {
    pub game: T,
    /// ISO-8601 completion time
    pub completed_at: String,
    /// Milliseconds since the epoch at completion, bumped to stay unique
    pub id: i64,
}

pub struct GameHistoryManager<T = JsonObject> {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    limit: usize,
    _game: PhantomData<T>,
}

impl<T> GameHistoryManager<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        Self::with_config(store, clock, &PersistConfig::default())
    }

    pub fn with_config(
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
        config: &PersistConfig,
    ) -> Self {
        Self {
            store,
            clock,
            limit: config.history_limit,
            _game: PhantomData,
        }
    }

    /// Record a finished game at the front of the history
    pub fn add_game_to_history(&self, game: &T) {
        if let Err(e) = self.try_add_game_to_history(game) {
            log::error!("Failed to record game in history: {}", e);
        }
    }

    /// Record a finished game, returning the id it was stored under
    pub fn try_add_game_to_history(&self, game: &T) -> Result<i64> {
        // An unreadable history is replaced rather than blocking new entries
        let mut entries: Vec<JsonObject> = persistence::recover(
            Partition::GameHistory,
            persistence::read_json(&*self.store, Partition::GameHistory),
            Vec::new,
        );
        let before = entries.len();
        entries.retain(|entry| Self::decode_entry(entry.clone()).is_ok());
        if entries.len() < before {
            log::warn!("Dropping {} unreadable history entries", before - entries.len());
        }

        let now = self.clock.now();
        let newest_id = entries
            .first()
            .and_then(|entry| entry.get(ID_FIELD))
            .and_then(Value::as_i64);
        let id = match newest_id {
            Some(newest) if newest >= now.timestamp_millis() => {
                newest.checked_add(1).unwrap_or(now.timestamp_millis())
            }
            _ => now.timestamp_millis(),
        };

        let entry = persistence::stamp(
            Partition::GameHistory,
            game,
            [
                (COMPLETED_AT_FIELD, Value::String(iso_timestamp(now))),
                (ID_FIELD, Value::from(id)),
            ],
        )?;
        entries.insert(0, entry);
        entries.truncate(self.limit);

        persistence::write_json(&*self.store, Partition::GameHistory, &entries)?;
        log::info!("Game {} added to history ({} entries)", id, entries.len());
        Ok(id)
    }

    /// All entries, newest first; empty if none or unreadable
    pub fn get_history(&self) -> Vec<CompletedGame<T>> {
        persistence::recover(Partition::GameHistory, self.load_history(), Vec::new)
    }

    /// Decode the stored history. A malformed payload is an error; single
    /// malformed entries are skipped, the same ones the next append drops.
    pub fn load_history(&self) -> Result<Vec<CompletedGame<T>>> {
        let entries: Vec<JsonObject> =
            persistence::read_json(&*self.store, Partition::GameHistory)?;
        Ok(entries
            .into_iter()
            .filter_map(|object| match Self::decode_entry(object) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping history entry: {}", e);
                    None
                }
            })
            .collect())
    }

    fn decode_entry(mut object: JsonObject) -> Result<CompletedGame<T>> {
        let completed_at =
            persistence::take_field(Partition::GameHistory, &mut object, COMPLETED_AT_FIELD)?;
        let id = persistence::take_field(Partition::GameHistory, &mut object, ID_FIELD)?;
        let game = persistence::from_object(Partition::GameHistory, object)?;
        Ok(CompletedGame {
            game,
            completed_at,
            id,
        })
    }

    /// Most recently completed game
    pub fn latest(&self) -> Option<CompletedGame<T>> {
        self.get_history().into_iter().next()
    }

    /// Forget every recorded game. Safe to call when empty.
    pub fn clear_history(&self) {
        match persistence::remove(&*self.store, Partition::GameHistory) {
            Ok(()) => log::info!("Game history cleared"),
            Err(e) => log::error!("Failed to clear game history: {}", e),
        }
    }
}
