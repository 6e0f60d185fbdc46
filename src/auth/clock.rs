//! Time source for nonce and token lifetimes

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Source of "now" for every time-dependent auth component
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time as unix seconds
    fn unix(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Used by tests and simulations that need to cross nonce rotation or token
/// expiry boundaries without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    seconds: AtomicI64,
}

impl ManualClock {
    pub fn new(unix_seconds: i64) -> Self {
        Self {
            seconds: AtomicI64::new(unix_seconds),
        }
    }

    /// Start at the current wall-clock second
    pub fn starting_now() -> Self {
        Self::new(Utc::now().timestamp())
    }

    pub fn advance(&self, seconds: i64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }

    pub fn set(&self, unix_seconds: i64) {
        self.seconds.store(unix_seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.seconds.load(Ordering::SeqCst), 0).unwrap_or_default()
    }

    fn unix(&self) -> i64 {
        self.seconds.load(Ordering::SeqCst)
    }
}
