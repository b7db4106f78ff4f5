//! Time source used for cache expiry and feed timestamps.

use chrono::{DateTime, Utc};

/// Wall-clock abstraction so expiry and timestamp synthesis are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
