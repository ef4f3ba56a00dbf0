//! Player preferences
//!
//! Persisted separately from game saves in LocalStorage. Loading always
//! yields a complete record: stored fields override the defaults one by one
//! and unknown stored fields are carried along.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::persistence::{self, Partition};
use crate::platform::KeyValueStore;

/// AI difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub sound_enabled: bool,
    pub auto_save: bool,
    pub difficulty: Difficulty,
    /// Stored fields this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            auto_save: true,
            difficulty: Difficulty::Medium,
            extra: BTreeMap::new(),
        }
    }
}

/// Recognised overrides; `None` leaves the current value alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_save: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl Settings {
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(sound_enabled) = patch.sound_enabled {
            self.sound_enabled = sound_enabled;
        }
        if let Some(auto_save) = patch.auto_save {
            self.auto_save = auto_save;
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
    }
}

pub struct SettingsManager {
    store: Rc<dyn KeyValueStore>,
}

impl SettingsManager {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write `settings` as given. Partial records are fine: missing fields
    /// fall back to defaults on load. Failures are only logged.
    pub fn save_settings<S: Serialize + ?Sized>(&self, settings: &S) {
        match self.try_save_settings(settings) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::error!("Failed to save settings: {}", e),
        }
    }

    pub fn try_save_settings<S: Serialize + ?Sized>(&self, settings: &S) -> Result<()> {
        persistence::write_json(&*self.store, Partition::Settings, settings)
    }

    /// Stored settings over the defaults; the defaults alone if nothing
    /// readable is stored
    pub fn load_settings(&self) -> Settings {
        persistence::recover(Partition::Settings, self.try_load_settings(), Settings::default)
    }

    pub fn try_load_settings(&self) -> Result<Settings> {
        persistence::read_json(&*self.store, Partition::Settings)
    }

    /// Load, apply `patch`, save and return the merged record
    pub fn update_settings(&self, patch: &SettingsPatch) -> Settings {
        let mut settings = self.load_settings();
        settings.apply(patch);
        self.save_settings(&settings);
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;
    use serde_json::json;

    fn manager() -> (Rc<MemoryStore>, SettingsManager) {
        let store = Rc::new(MemoryStore::new());
        (store.clone(), SettingsManager::new(store))
    }

    #[test]
    fn test_defaults_on_empty_store() {
        let (_, settings) = manager();
        let loaded = settings.load_settings();
        assert_eq!(loaded, Settings::default());
        assert_eq!(
            serde_json::to_value(&loaded).unwrap(),
            json!({"soundEnabled": true, "autoSave": true, "difficulty": "medium"})
        );
    }

    #[test]
    fn test_partial_save_merges_over_defaults() {
        let (_, settings) = manager();
        settings.save_settings(&json!({"difficulty": "hard"}));
        assert_eq!(
            serde_json::to_value(settings.load_settings()).unwrap(),
            json!({"soundEnabled": true, "autoSave": true, "difficulty": "hard"})
        );
    }

    #[test]
    fn test_extra_fields_preserved() {
        let (_, settings) = manager();
        settings.save_settings(&json!({"soundEnabled": false, "boardTheme": "walnut"}));
        let loaded = settings.load_settings();
        assert!(!loaded.sound_enabled);
        assert!(loaded.auto_save);
        assert_eq!(loaded.extra.get("boardTheme"), Some(&json!("walnut")));
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let (store, settings) = manager();
        store.set(Partition::Settings.key(), "{\"difficulty\":").unwrap();
        assert_eq!(settings.load_settings(), Settings::default());

        store
            .set(Partition::Settings.key(), r#"{"difficulty":"nightmare"}"#)
            .unwrap();
        assert_eq!(settings.load_settings(), Settings::default());
        assert!(!settings.try_load_settings().unwrap_err().is_missing());
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let store = Rc::new(MemoryStore::with_capacity(4));
        let settings = SettingsManager::new(store.clone());
        settings.save_settings(&Settings::default());
        assert_eq!(store.used_bytes(), 0);
        assert_eq!(settings.load_settings(), Settings::default());
    }

    #[test]
    fn test_update_settings() {
        let (_, settings) = manager();
        settings.save_settings(&json!({"boardTheme": "marble"}));
        let merged = settings.update_settings(&SettingsPatch {
            auto_save: Some(false),
            difficulty: Some(Difficulty::Easy),
            ..Default::default()
        });
        assert_eq!(settings.load_settings(), merged);
        assert!(!merged.auto_save);
        assert_eq!(merged.difficulty, Difficulty::Easy);
        assert_eq!(merged.extra.get("boardTheme"), Some(&json!("marble")));
    }

    #[test]
    fn test_difficulty_names_match_stored_form() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(
                serde_json::to_value(difficulty).unwrap(),
                json!(difficulty.as_str())
            );
        }
    }
}
