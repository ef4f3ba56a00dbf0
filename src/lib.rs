//! Board Persist - client-side persistence for a board game
//!
//! Core modules:
//! - `platform`: Key-value storage, clock and timer backends (browser/native)
//! - `persistence`: Storage namespace and JSON encoding shared by the managers
//! - `users`: Accounts and authentication
//! - `game_state`: Current-game snapshot with debounced auto-save
//! - `history`: Bounded log of completed games
//! - `settings`: Player preferences with defaulting

pub mod config;
pub mod error;
pub mod game_state;
pub mod history;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod users;

pub use config::PersistConfig;
pub use error::{PersistError, Result, StoreError};
pub use game_state::{GameStateManager, SavedGame};
pub use history::{CompletedGame, GameHistoryManager};
pub use persistence::{JsonObject, Partition};
pub use platform::{Clock, KeyValueStore, Timer};
pub use settings::{Difficulty, Settings, SettingsManager, SettingsPatch};
pub use users::{Stats, User, UserManager};

use std::rc::Rc;

use platform::{MemoryStore, SystemClock};

/// Persistence configuration constants
pub mod consts {
    /// Store keys, one per partition
    pub const USER_DATA_KEY: &str = "boardGame_userData";
    pub const GAME_STATE_KEY: &str = "boardGame_gameState";
    pub const GAME_HISTORY_KEY: &str = "boardGame_gameHistory";
    pub const SETTINGS_KEY: &str = "boardGame_settings";

    /// Version tag stamped on game snapshots
    pub const SCHEMA_VERSION: &str = "1.0";
    /// Completed games kept in history
    pub const MAX_HISTORY_ENTRIES: usize = 50;
    /// Quiet interval before an auto-save is written
    pub const AUTO_SAVE_DELAY_MS: u64 = 2000;
}

/// The four record managers over one shared store
pub struct Persistence<G = JsonObject, H = JsonObject> {
    pub users: UserManager,
    pub games: GameStateManager<G>,
    pub history: GameHistoryManager<H>,
    pub settings: SettingsManager,
}

impl<G, H> Persistence<G, H>
where
    G: serde::Serialize + serde::de::DeserializeOwned + 'static,
    H: serde::Serialize + serde::de::DeserializeOwned,
{
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
        timer: Rc<dyn Timer>,
        config: &PersistConfig,
    ) -> Self {
        Self {
            users: UserManager::new(store.clone()),
            games: GameStateManager::with_config(store.clone(), clock.clone(), timer, config),
            history: GameHistoryManager::with_config(store.clone(), clock, config),
            settings: SettingsManager::new(store),
        }
    }

    /// Memory-backed managers driven by a manual timer; auto-saves fire
    /// only when the returned timer is advanced.
    pub fn in_memory() -> (Self, Rc<platform::ManualTimer>) {
        let timer = Rc::new(platform::ManualTimer::new());
        let persistence = Self::new(
            Rc::new(MemoryStore::new()),
            Rc::new(SystemClock),
            timer.clone(),
            &PersistConfig::default(),
        );
        (persistence, timer)
    }

    /// Managers over a JSON file that survives restarts
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_file(
        path: impl AsRef<std::path::Path>,
        config: &PersistConfig,
    ) -> std::result::Result<Self, StoreError> {
        let store = platform::FileStore::open(path)?;
        Ok(Self::new(
            Rc::new(store),
            Rc::new(SystemClock),
            Rc::new(platform::ManualTimer::new()),
            config,
        ))
    }

    /// Managers over `window.localStorage` with `setTimeout` auto-saves
    #[cfg(target_arch = "wasm32")]
    pub fn browser(config: &PersistConfig) -> std::result::Result<Self, StoreError> {
        let store = platform::LocalStorage::open()?;
        Ok(Self::new(
            Rc::new(store),
            Rc::new(SystemClock),
            Rc::new(platform::BrowserTimer::new()),
            config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn object(value: serde_json::Value) -> JsonObject {
        match value {
            serde_json::Value::Object(map) => map,
            _ => JsonObject::new(),
        }
    }

    #[test]
    fn test_managers_use_disjoint_partitions() {
        let (p, timer): (Persistence, _) = Persistence::in_memory();
        p.users.save_user(User::new("alice", "pw"));
        p.games.save_game_state(&object(json!({"turn": 1})));
        p.history.add_game_to_history(&object(json!({"winner": "alice"})));
        p.settings.save_settings(&json!({"difficulty": "easy"}));

        p.games.clear_game_state();
        p.history.clear_history();
        assert!(p.users.get_user("alice").is_some());
        assert_eq!(p.settings.load_settings().difficulty, Difficulty::Easy);

        p.games.auto_save(object(json!({"turn": 2})));
        timer.advance(Duration::from_millis(consts::AUTO_SAVE_DELAY_MS));
        assert_eq!(
            p.games.load_game_state().unwrap().state.get("turn"),
            Some(&json!(2))
        );
    }
}
