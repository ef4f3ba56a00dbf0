//! Browser backends (wasm32 only)

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::KeyValueStore;
use super::timer::{Task, TaskHandle, Timer};
use crate::error::{PersistError, Result, StoreError};

fn describe(err: JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", err))
}

/// `window.localStorage`
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// Grab the window's LocalStorage, if the browser exposes one
    pub fn open() -> std::result::Result<Self, StoreError> {
        let storage = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".into()))?
            .local_storage()
            .map_err(|e| StoreError::Unavailable(describe(e)))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".into()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError::Unavailable(describe(e)))
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), StoreError> {
        // The browser does not expose its quota, so capacity is reported as 0
        self.storage.set_item(key, value).map_err(|e| {
            let quota = e
                .dyn_ref::<web_sys::DomException>()
                .is_some_and(|dom| dom.name() == "QuotaExceededError");
            if quota {
                StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed: key.len() + value.len(),
                    capacity: 0,
                }
            } else {
                StoreError::Unavailable(describe(e))
            }
        })
    }

    fn remove(&self, key: &str) -> std::result::Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StoreError::Unavailable(describe(e)))
    }
}

/// `window.setTimeout` / `window.clearTimeout`
///
/// Each scheduled closure is owned here until it is cancelled or has run,
/// so cancelled tasks (and whatever they captured) are freed.
#[derive(Default)]
pub struct BrowserTimer {
    next_key: Cell<i64>,
    /// Task key -> (timeout id, JS callback)
    live: RefCell<HashMap<i64, (i32, Closure<dyn FnMut()>)>>,
    /// Keys of tasks that have run; their closures are dropped on the next
    /// schedule or cancel, never from inside their own invocation
    fired: Rc<RefCell<Vec<i64>>>,
}

impl BrowserTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn sweep(&self) {
        let fired: Vec<i64> = self.fired.borrow_mut().drain(..).collect();
        let mut live = self.live.borrow_mut();
        for key in fired {
            live.remove(&key);
        }
    }
}

impl Timer for BrowserTimer {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TaskHandle> {
        self.sweep();
        let window =
            web_sys::window().ok_or_else(|| PersistError::Schedule("no window".into()))?;

        let key = self.next_key.get();
        self.next_key.set(key + 1);
        let fired = Rc::clone(&self.fired);
        let callback = Closure::once(move || {
            task();
            fired.borrow_mut().push(key);
        });

        let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let id = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                ms,
            )
            .map_err(|e| PersistError::Schedule(describe(e)))?;
        self.live.borrow_mut().insert(key, (id, callback));
        Ok(TaskHandle(key))
    }

    fn cancel(&self, handle: TaskHandle) {
        self.sweep();
        let Some((id, callback)) = self.live.borrow_mut().remove(&handle.0) else {
            return;
        };
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(id);
        }
        drop(callback);
    }
}
