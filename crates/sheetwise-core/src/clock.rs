//! Timestamp sources

use std::cell::Cell;

use crate::model::Timestamp;

/// Provides "now" for timestamp bumps.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time in whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(chrono::Utc::now().timestamp())
    }
}

/// Deterministic clock. Every read returns the current value and then
/// advances it by `step`, so successive stamps are strictly increasing
/// unless `step` is zero.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Cell<i64>,
    step: i64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self::with_step(start, 1)
    }

    pub fn with_step(start: i64, step: i64) -> Self {
        ManualClock {
            current: Cell::new(start),
            step,
        }
    }

    /// Value the next `now()` will return.
    pub fn peek(&self) -> Timestamp {
        Timestamp(self.current.get())
    }

    pub fn set(&self, value: i64) {
        self.current.set(value);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        let value = self.current.get();
        self.current.set(value + self.step);
        Timestamp(value)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
