//! Current-game snapshot with debounced auto-save
//!
//! At most one snapshot exists. Every save overwrites it wholesale and
//! stamps it with the save time and the schema version.
//!
//! `auto_save` is a trailing-edge debounce: each call replaces the pending
//! state and restarts the quiet interval, so a burst of calls produces a
//! single write of the last state once the burst stops.
//!
//! ```text
//! idle    --auto_save-->      pending (timer started)
//! pending --auto_save-->      pending (timer restarted)
//! pending --timer elapses-->  idle    (state written)
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::PersistConfig;
use crate::error::Result;
use crate::persistence::{self, JsonObject, Partition};
use crate::platform::clock::iso_timestamp;
use crate::platform::{Clock, KeyValueStore, TaskHandle, Timer};

const TIMESTAMP_FIELD: &str = "timestamp";
const VERSION_FIELD: &str = "version";

/// A loaded snapshot: the game state plus the stamps added on save
#[derive(Debug, Clone, PartialEq)]
pub struct SavedGame<T> {
    pub state: T,
    /// ISO-8601 save time
    pub timestamp: String,
    pub version: String,
}

/// Debounce slot: the armed timer and the state it will write
struct PendingSave<T> {
    handle: TaskHandle,
    state: T,
}

/// What a deferred write needs, shared between the manager and its task
struct Writer {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    version: String,
}

impl Writer {
    fn write<T: Serialize>(&self, state: &T) -> Result<()> {
        let snapshot = persistence::stamp(
            Partition::GameState,
            state,
            [
                (TIMESTAMP_FIELD, Value::String(iso_timestamp(self.clock.now()))),
                (VERSION_FIELD, Value::String(self.version.clone())),
            ],
        )?;
        persistence::write_json(&*self.store, Partition::GameState, &snapshot)
    }
}

pub struct GameStateManager<T = JsonObject> {
    writer: Rc<Writer>,
    timer: Rc<dyn Timer>,
    delay: Duration,
    pending: Rc<RefCell<Option<PendingSave<T>>>>,
}

impl<T> GameStateManager<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>, timer: Rc<dyn Timer>) -> Self {
        Self::with_config(store, clock, timer, &PersistConfig::default())
    }

    pub fn with_config(
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
        timer: Rc<dyn Timer>,
        config: &PersistConfig,
    ) -> Self {
        Self {
            writer: Rc::new(Writer {
                store,
                clock,
                version: config.schema_version.clone(),
            }),
            timer,
            delay: config.auto_save_delay(),
            pending: Rc::new(RefCell::new(None)),
        }
    }

    /// Stamp and write `state` as the current snapshot
    pub fn save_game_state(&self, state: &T) -> bool {
        match self.try_save_game_state(state) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save game: {}", e);
                false
            }
        }
    }

    pub fn try_save_game_state(&self, state: &T) -> Result<()> {
        self.writer.write(state)?;
        log::info!("Game saved");
        Ok(())
    }

    /// The stored snapshot, `None` if absent or unreadable
    pub fn load_game_state(&self) -> Option<SavedGame<T>> {
        persistence::recover(Partition::GameState, self.try_load_game_state().map(Some), || None)
    }

    pub fn try_load_game_state(&self) -> Result<SavedGame<T>> {
        let mut object: JsonObject =
            persistence::read_json(&*self.writer.store, Partition::GameState)?;
        let timestamp =
            persistence::take_field(Partition::GameState, &mut object, TIMESTAMP_FIELD)?;
        let version = persistence::take_field(Partition::GameState, &mut object, VERSION_FIELD)?;
        let state = persistence::from_object(Partition::GameState, object)?;
        Ok(SavedGame {
            state,
            timestamp,
            version,
        })
    }

    /// Whether a snapshot key exists. Does not check that it decodes.
    pub fn has_saved_game(&self) -> bool {
        persistence::exists(&*self.writer.store, Partition::GameState).unwrap_or_else(|e| {
            log::warn!("Could not check for saved game: {}", e);
            false
        })
    }

    /// Delete the snapshot. Safe to call when none exists.
    ///
    /// A pending auto-save is left armed and will recreate the snapshot when
    /// it fires; call [`GameStateManager::cancel_auto_save`] first to discard it.
    pub fn clear_game_state(&self) {
        match persistence::remove(&*self.writer.store, Partition::GameState) {
            Ok(()) => log::info!("Saved game cleared"),
            Err(e) => log::error!("Failed to clear saved game: {}", e),
        }
    }

    /// Debounced save: write `state` once no further call arrives for the
    /// quiet interval.
    pub fn auto_save(&self, state: T) {
        if let Some(previous) = self.pending.borrow_mut().take() {
            self.timer.cancel(previous.handle);
        }

        let writer = Rc::clone(&self.writer);
        let slot = Rc::downgrade(&self.pending);
        let task = Box::new(move || {
            // Manager dropped: nothing left to write
            let Some(slot) = slot.upgrade() else { return };
            let Some(pending) = slot.borrow_mut().take() else {
                return;
            };
            match writer.write(&pending.state) {
                Ok(()) => log::info!("Game auto-saved"),
                Err(e) => log::error!("Auto-save failed: {}", e),
            }
        });

        match self.timer.schedule(self.delay, task) {
            Ok(handle) => *self.pending.borrow_mut() = Some(PendingSave { handle, state }),
            Err(e) => log::error!("Could not schedule auto-save: {}", e),
        }
    }

    /// Whether a debounced write is waiting to fire
    pub fn has_pending_auto_save(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Drop the pending auto-save without writing. Returns whether one was pending.
    pub fn cancel_auto_save(&self) -> bool {
        match self.pending.borrow_mut().take() {
            Some(pending) => {
                self.timer.cancel(pending.handle);
                true
            }
            None => false,
        }
    }

    /// Write the pending auto-save now instead of waiting for the quiet
    /// interval. Returns false if nothing was pending or the write failed.
    pub fn flush_auto_save(&self) -> bool {
        let Some(pending) = self.pending.borrow_mut().take() else {
            return false;
        };
        self.timer.cancel(pending.handle);
        self.save_game_state(&pending.state)
    }
}
