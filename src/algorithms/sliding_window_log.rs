//! Sliding window log.
//!
//! Exact sliding window accounting: every admitted request's timestamp is kept
//! per identifier and entries older than the window are trimmed eagerly on
//! each decision, so a log never holds more than `capacity` entries.

use super::{lock_store, new_store, RateLimiter, Store};
use crate::clock::{Clock, SystemClock};
use crate::config_validator::ConfigValidator;
use crate::error::ThrottlerResult;
use crate::rate_limit_config::{LimiterSettings, Strategy};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Admission timestamps of one identifier, oldest first.
type TimestampLog = VecDeque<Duration>;

pub struct SlidingWindowLogLimiter {
    window: Duration,
    capacity: u64,
    clock: Arc<dyn Clock>,
    logs: Store<TimestampLog>,
}

impl SlidingWindowLogLimiter {
    pub fn new(settings: LimiterSettings) -> ThrottlerResult<Self> {
        Self::with_clock(settings, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(settings: LimiterSettings, clock: Arc<dyn Clock>) -> ThrottlerResult<Self> {
        ConfigValidator::validate_duration("Window size", settings.window)?;
        Ok(Self {
            window: settings.window,
            capacity: settings.capacity,
            clock,
            logs: new_store(),
        })
    }
}

/// Drop every entry older than `threshold`.
///
/// The log is non-decreasing, so the retained entries are a suffix found by
/// binary search.
fn trim_before(log: &mut TimestampLog, threshold: Duration) {
    let expired = log.partition_point(|timestamp| *timestamp < threshold);
    log.drain(..expired);
}

impl RateLimiter for SlidingWindowLogLimiter {
    fn decide(&self, identifier: &str) -> ThrottlerResult<bool> {
        let mut logs = lock_store(&self.logs)?;
        let now = self.clock.now();

        let log = logs.entry(identifier.to_string()).or_default();
        trim_before(log, now.saturating_sub(self.window));

        if log.len() as u64 >= self.capacity {
            info!(
                identifier,
                count = log.len(),
                "Rejecting request, limit reached in current window"
            );
            return Ok(true);
        }

        log.push_back(now);
        Ok(false)
    }

    fn strategy(&self) -> Strategy {
        Strategy::SlidingWindowLog
    }

    fn tracked_identifiers(&self) -> ThrottlerResult<usize> {
        Ok(lock_store(&self.logs)?.len())
    }
}
