//! Time sources for stamping mutating calls.
//!
//! The registry never reads the wall clock itself; the host passes the
//! current time into every mutating call. [`SystemClock`] is used in
//! production and [`FixedClock`] in tests.

use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock.
///
/// Starts at a fixed instant and only moves when [`FixedClock::advance`]
/// is called.
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock frozen at `at`.
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(at),
        }
    }

    /// Move the clock forward by `delta`. Saturates at the maximum
    /// representable instant.
    pub fn advance(&self, delta: TimeDelta) {
        if let Ok(mut current) = self.current.lock() {
            *current = current
                .checked_add_signed(delta)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.current
            .lock()
            .map_or(DateTime::<Utc>::MIN_UTC, |current| *current)
    }
}
