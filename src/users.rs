//! User accounts
//!
//! All accounts live in one JSON array under the user-data partition and are
//! rewritten wholesale on every change.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PersistError, Result};
use crate::persistence::{self, Partition};
use crate::platform::KeyValueStore;

/// Named numeric counters (wins, losses, ...)
pub type Stats = BTreeMap<String, f64>;

/// A stored account
///
/// `stats` is optional so a record saved without it (a password change,
/// say) leaves the stored stats alone. Stored accounts always carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// Stored and compared as-is
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    /// Fields written by other versions of the game, carried untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            stats: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_stat(mut self, name: impl Into<String>, value: f64) -> Self {
        self.stats
            .get_or_insert_with(Stats::new)
            .insert(name.into(), value);
        self
    }

    /// A single counter, if recorded
    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.as_ref()?.get(name).copied()
    }

    /// Shallow merge: fields present on `other` win, fields it leaves out
    /// (stats, extra keys) survive.
    fn merge_from(&mut self, other: User) {
        self.password = other.password;
        if let Some(stats) = other.stats {
            self.stats = Some(stats);
        }
        self.extra.extend(other.extra);
    }

    /// JSON has no encoding for NaN or infinities; serde_json would write
    /// `null` and the whole list would stop decoding.
    fn check_finite(&self) -> Result<()> {
        let bad = self
            .stats
            .iter()
            .flatten()
            .find(|(_, value)| !value.is_finite());
        match bad {
            Some((name, value)) => Err(PersistError::NonFinite {
                field: format!("{}.stats.{}", self.username, name),
                value: *value,
            }),
            None => Ok(()),
        }
    }
}

pub struct UserManager {
    store: Rc<dyn KeyValueStore>,
}

impl UserManager {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Insert `user`, or merge it into the stored account of the same name.
    /// Returns false if the list could not be read or written.
    pub fn save_user(&self, user: User) -> bool {
        match self.try_save_user(user) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save user: {}", e);
                false
            }
        }
    }

    pub fn try_save_user(&self, mut user: User) -> Result<()> {
        user.check_finite()?;
        let mut users: Vec<User> = persistence::read_or_default(&*self.store, Partition::UserData)?;
        let username = user.username.clone();
        match users.iter_mut().find(|u| u.username == user.username) {
            Some(existing) => existing.merge_from(user),
            None => {
                user.stats.get_or_insert_with(Stats::new);
                users.push(user);
            }
        }
        persistence::write_json(&*self.store, Partition::UserData, &users)?;
        log::info!("User {} saved ({} accounts)", username, users.len());
        Ok(())
    }

    /// Every stored account; empty if none or unreadable
    pub fn get_all_users(&self) -> Vec<User> {
        persistence::recover(Partition::UserData, self.load_users(), Vec::new)
    }

    pub fn load_users(&self) -> Result<Vec<User>> {
        persistence::read_json(&*self.store, Partition::UserData)
    }

    pub fn get_user(&self, username: &str) -> Option<User> {
        self.get_all_users()
            .into_iter()
            .find(|u| u.username == username)
    }

    /// The account iff both username and password match exactly
    pub fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        self.get_user(username).filter(|u| u.password == password)
    }

    /// Merge `patch` into the user's stats. Unknown users are left alone
    /// and reported as `false`.
    pub fn update_stats(&self, username: &str, patch: Stats) -> bool {
        let Some(mut user) = self.get_user(username) else {
            log::debug!("Stats update for unknown user {}", username);
            return false;
        };
        user.stats.get_or_insert_with(Stats::new).extend(patch);
        self.save_user(user)
    }

    /// Remove an account. Removing an unknown user succeeds.
    pub fn delete_user(&self, username: &str) -> bool {
        let result = persistence::read_or_default::<Vec<User>>(&*self.store, Partition::UserData)
            .and_then(|mut users| {
                let before = users.len();
                users.retain(|u| u.username != username);
                if users.len() == before {
                    return Ok(());
                }
                persistence::write_json(&*self.store, Partition::UserData, &users)
            });
        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to delete user {}: {}", username, e);
                false
            }
        }
    }
}
