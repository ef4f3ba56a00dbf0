use std::rc::Rc;
use std::time::Duration;

use board_persist::platform::{ManualClock, ManualTimer, MemoryStore};
use board_persist::{
    GameHistoryManager, GameStateManager, JsonObject, KeyValueStore, Partition, Stats, User,
    UserManager,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn user_strategy() -> impl Strategy<Value = User> {
    (
        "[a-z]{1,8}",
        "[ -~]{0,12}",
        prop::collection::btree_map("[a-z]{1,6}", 0u32..1000, 0..4),
    )
        .prop_map(|(username, password, stats)| {
            let stats: Stats = stats.into_iter().map(|(k, v)| (k, f64::from(v))).collect();
            User {
                username,
                password,
                stats: Some(stats),
                extra: Default::default(),
            }
        })
}

fn object(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

proptest! {
    #[test]
    fn saving_twice_equals_saving_once(users in prop::collection::vec(user_strategy(), 1..6)) {
        let once_store = Rc::new(MemoryStore::new());
        let twice_store = Rc::new(MemoryStore::new());
        let once = UserManager::new(once_store.clone());
        let twice = UserManager::new(twice_store.clone());

        for user in &users {
            prop_assert!(once.save_user(user.clone()));
            prop_assert!(twice.save_user(user.clone()));
            prop_assert!(twice.save_user(user.clone()));
        }

        prop_assert_eq!(once.get_all_users(), twice.get_all_users());
        prop_assert_eq!(
            once_store.get(Partition::UserData.key()).unwrap(),
            twice_store.get(Partition::UserData.key()).unwrap()
        );
    }

    #[test]
    fn saved_user_reads_back(user in user_strategy()) {
        let users = UserManager::new(Rc::new(MemoryStore::new()));
        users.save_user(user.clone());
        prop_assert_eq!(users.get_user(&user.username), Some(user));
    }

    #[test]
    fn authenticate_requires_exact_credentials(user in user_strategy(), suffix in "[a-z0-9]{1,3}") {
        let users = UserManager::new(Rc::new(MemoryStore::new()));
        users.save_user(user.clone());

        prop_assert!(users.authenticate(&user.username, &user.password).is_some());
        let wrong_password = format!("{}{}", user.password, suffix);
        let wrong_name = format!("{}{}", user.username, suffix);
        prop_assert!(users.authenticate(&user.username, &wrong_password).is_none());
        prop_assert!(users.authenticate(&wrong_name, &user.password).is_none());
    }

    #[test]
    fn history_never_exceeds_limit(count in 0usize..120) {
        let clock = Rc::new(ManualClock::from_millis(0));
        let history: GameHistoryManager =
            GameHistoryManager::new(Rc::new(MemoryStore::new()), clock.clone());
        for n in 0..count {
            history.add_game_to_history(&object(json!({"n": n})));
            clock.advance(Duration::from_millis(3));
        }

        let entries = history.get_history();
        prop_assert_eq!(entries.len(), count.min(50));
        if let Some(first) = entries.first() {
            prop_assert_eq!(first.game.get("n"), Some(&json!(count - 1)));
        }
        prop_assert!(entries.windows(2).all(|w| w[0].id > w[1].id));
    }
}

#[test]
fn sixty_games_keep_the_newest_fifty() {
    let clock = Rc::new(ManualClock::from_millis(1_700_000_000_000));
    let history: GameHistoryManager =
        GameHistoryManager::new(Rc::new(MemoryStore::new()), clock.clone());
    for n in 1..=60 {
        history.add_game_to_history(&object(json!({"game": n})));
        clock.advance(Duration::from_secs(1));
    }

    let entries = history.get_history();
    assert_eq!(entries.len(), 50);
    assert_eq!(entries[0].game.get("game"), Some(&json!(60)));
    assert_eq!(entries[49].game.get("game"), Some(&json!(11)));
}

/// Counts writes to the game-state key
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    writes: std::cell::RefCell<Vec<String>>,
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>, board_persist::StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), board_persist::StoreError> {
        if key == Partition::GameState.key() {
            self.writes.borrow_mut().push(value.to_string());
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), board_persist::StoreError> {
        self.inner.remove(key)
    }
}

#[test]
fn burst_of_auto_saves_writes_last_state_once() {
    let store = Rc::new(CountingStore::default());
    let timer = Rc::new(ManualTimer::new());
    let games: GameStateManager = GameStateManager::new(
        store.clone(),
        Rc::new(ManualClock::from_millis(0)),
        timer.clone(),
    );

    games.auto_save(object(json!({"move": "s1"})));
    timer.advance(Duration::from_millis(500));
    games.auto_save(object(json!({"move": "s2"})));

    timer.advance(Duration::from_millis(1999));
    assert!(store.writes.borrow().is_empty());

    timer.advance(Duration::from_millis(101));
    let writes = store.writes.borrow();
    assert_eq!(writes.len(), 1);
    let written: Value = serde_json::from_str(&writes[0]).unwrap();
    assert_eq!(written["move"], "s2");
    assert_eq!(written["version"], "1.0");
}

#[test]
fn saved_game_flag_tracks_save_and_clear() {
    let games: GameStateManager = GameStateManager::new(
        Rc::new(MemoryStore::new()),
        Rc::new(ManualClock::from_millis(0)),
        Rc::new(ManualTimer::new()),
    );
    let state = object(json!({"board": "rnbqkbnr/pppppppp", "turn": "w"}));

    assert!(!games.has_saved_game());
    assert!(games.save_game_state(&state));
    assert!(games.has_saved_game());
    let saved = games.load_game_state().unwrap();
    assert_eq!(saved.state, state);
    assert_eq!(saved.version, "1.0");

    games.clear_game_state();
    games.clear_game_state();
    assert!(!games.has_saved_game());
}
