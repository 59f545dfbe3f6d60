//! Time sources for the limiters.
//!
//! Timestamps are expressed as a [`Duration`] since the UNIX epoch so that
//! windows can be aligned to wall-clock boundaries. Backward jumps of the
//! system clock are not compensated for.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time.
pub trait Clock: Send + Sync + Debug {
    /// Current time as an offset from the UNIX epoch.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`SystemTime::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Manually driven clock.
///
/// Clones share the same underlying time, so a test can hand one clone to a
/// limiter and advance the other.
///
/// ```
/// use ip_throttler::clock::{Clock, MockClock};
/// use std::time::Duration;
///
/// let clock = MockClock::new(Duration::from_secs(600));
/// let shared = clock.clone();
///
/// shared.advance(Duration::from_secs(5));
/// assert_eq!(clock.now(), Duration::from_secs(605));
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a mock clock reading `start` since the epoch.
    pub fn new(start: Duration) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time += duration;
    }

    /// Set the clock to an absolute offset, possibly in the past.
    pub fn set(&self, now: Duration) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time = now;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Duration {
        *self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_epoch() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        std::thread::sleep(Duration::from_millis(5));
        let t2 = clock.now();

        assert!(t1 > Duration::ZERO);
        assert!(t2 >= t1);
    }

    #[test]
    fn test_mock_clock() {
        let clock = MockClock::new(Duration::from_secs(100));
        assert_eq!(clock.now(), Duration::from_secs(100));

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(100_250));

        clock.set(Duration::from_secs(7));
        assert_eq!(clock.now(), Duration::from_secs(7));
    }
}
