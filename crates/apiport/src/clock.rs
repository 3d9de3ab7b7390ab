//! Time source used for token expiry decisions.
//!
//! Production code uses [`SystemClock`]. Tests that need to move time forward
//! (for example across a token's refresh window) use `ManualClock`, available
//! with the `test-util` feature.

use chrono::{DateTime, Utc};
use std::fmt;

/// A source of the current instant.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current time.
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

#[cfg(any(test, feature = "test-util"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "test-util"))]
mod manual {
    use super::Clock;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};

    /// A clock that only moves when told to.
    ///
    /// Time starts at the instant the clock is created and advances by whole
    /// seconds through [`ManualClock::advance_secs`] or [`ManualClock::set_secs`].
    #[derive(Debug)]
    pub struct ManualClock {
        start: DateTime<Utc>,
        elapsed_secs: AtomicI64,
    }

    impl ManualClock {
        /// Create a clock frozen at the current wall-clock time.
        #[must_use]
        pub fn new() -> Self {
            Self {
                start: Utc::now(),
                elapsed_secs: AtomicI64::new(0),
            }
        }

        /// Move the clock forward.
        pub fn advance_secs(&self, secs: i64) {
            self.elapsed_secs.fetch_add(secs, Ordering::SeqCst);
        }

        /// Place the clock `secs` after its starting instant.
        pub fn set_secs(&self, secs: i64) {
            self.elapsed_secs.store(secs, Ordering::SeqCst);
        }

        /// Seconds elapsed since the starting instant.
        #[must_use]
        pub fn elapsed_secs(&self) -> i64 {
            self.elapsed_secs.load(Ordering::SeqCst)
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.start + Duration::seconds(self.elapsed_secs())
        }
    }
}
