//! Time source abstraction
//!
//! All expiry math in the store compares stored timestamps against a
//! [`Clock`], never against `Utc::now()` directly. Production code uses
//! [`SystemClock`]; tests inject a [`ManualClock`] and advance it to cross
//! expiry boundaries without sleeping.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::RwLock;
use std::time::Duration;

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time source
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven time source for tests
///
/// Shared behind an `Arc`; `advance` and `set` take `&self` so the same
/// handle can be held by the store and the test body.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Create a clock frozen at the current wall-clock time
    pub fn from_system() -> Self {
        Self::at(Utc::now())
    }

    /// Move the clock forward by `step`
    pub fn advance(&self, step: Duration) {
        let delta = ChronoDuration::from_std(step).expect("clock step out of range");
        *self.now.write().unwrap() += delta;
    }

    /// Jump the clock to an absolute instant
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.write().unwrap() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap()
    }
}
