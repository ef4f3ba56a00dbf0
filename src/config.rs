//! Tunables of the persistence layer

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistConfig {
    /// Completed games kept in history (newest first)
    pub history_limit: usize,
    /// Quiet interval before a debounced auto-save is written
    pub auto_save_delay_ms: u64,
    /// Version tag stamped on every game snapshot
    pub schema_version: String,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            history_limit: consts::MAX_HISTORY_ENTRIES,
            auto_save_delay_ms: consts::AUTO_SAVE_DELAY_MS,
            schema_version: consts::SCHEMA_VERSION.to_string(),
        }
    }
}

impl PersistConfig {
    pub fn auto_save_delay(&self) -> Duration {
        Duration::from_millis(self.auto_save_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: PersistConfig = serde_json::from_str(r#"{"historyLimit": 5}"#).unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.auto_save_delay(), Duration::from_millis(2000));
        assert_eq!(config.schema_version, "1.0");
    }
}
