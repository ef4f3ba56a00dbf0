//! Wall-clock time

use std::cell::Cell;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Real time. On wasm32 chrono reads `Date.now()` from the browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replays
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Clock starting at `ms` milliseconds after the Unix epoch
    pub fn from_millis(ms: i64) -> Self {
        Self::new(DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        let step = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        self.now.set(self.now.get() + step);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Format like JavaScript's `Date.toISOString()`: `2024-05-01T12:00:00.000Z`
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
