//! Time provider abstraction for testable timestamps

use chrono::{DateTime, Utc};
#[cfg(test)]
use std::sync::{Arc, Mutex};
#[cfg(test)]
use std::time::Duration;

/// Abstraction over wall-clock time so scan timestamps can be pinned in tests
pub trait TimeProvider: Send + Sync {
    /// Current wall-clock time in UTC
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Production time provider using the system clock
#[derive(Default, Clone)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock time provider for deterministic testing
#[derive(Clone)]
#[cfg(test)]
pub struct MockTimeProvider {
    current: Arc<Mutex<DateTime<Utc>>>,
}

#[cfg(test)]
impl MockTimeProvider {
    /// Create a mock provider frozen at the given instant
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the frozen clock by the given duration
    pub fn advance_time(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap();
        *current += chrono::Duration::from_std(duration).unwrap();
    }
}

#[cfg(test)]
impl TimeProvider for MockTimeProvider {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}
