//! Sliding window counter.
//!
//! Approximates a sliding window with constant space per identifier: the
//! count of the previous fixed window is weighted by the share of it that
//! still overlaps the trailing window and added to the current window's count.
//!
//! ```text
//!        previous window          current window
//!   |-----------------------|-----------------------|
//!                     [======== trailing W ========]
//!                           ^ start    ^ now
//!                           |<-- f*W ->|
//!   estimate = count + previous_count * (1 - f)
//! ```
//!
//! The error against an exact log is bounded by how unevenly the previous
//! window's requests were spread.

use super::{lock_store, new_store, window_start, RateLimiter, Store};
use crate::clock::{Clock, SystemClock};
use crate::config_validator::ConfigValidator;
use crate::error::{ThrottlerError, ThrottlerResult};
use crate::rate_limit_config::{LimiterSettings, Strategy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CounterRecord {
    /// Requests admitted in the window starting at `window_start`.
    count: u64,
    /// Requests admitted in the window before it.
    previous_count: u64,
    window_start: Duration,
}

impl CounterRecord {
    fn fresh(window_start: Duration) -> Self {
        Self {
            count: 1,
            previous_count: 0,
            window_start,
        }
    }
}

pub struct SlidingWindowCounterLimiter {
    window: Duration,
    capacity: u64,
    clock: Arc<dyn Clock>,
    records: Store<CounterRecord>,
}

impl SlidingWindowCounterLimiter {
    pub fn new(settings: LimiterSettings) -> ThrottlerResult<Self> {
        Self::with_clock(settings, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(settings: LimiterSettings, clock: Arc<dyn Clock>) -> ThrottlerResult<Self> {
        ConfigValidator::validate_duration("Window size", settings.window)?;
        Ok(Self {
            window: settings.window,
            capacity: settings.capacity,
            clock,
            records: new_store(),
        })
    }

    fn reject(&self, identifier: &str, estimate: f64) -> ThrottlerResult<bool> {
        info!(
            identifier,
            count = estimate.floor() as u64,
            "Rejecting request, limit reached in current window"
        );
        Ok(true)
    }
}

/// Fraction of `window` elapsed between `start` and `now`.
///
/// Anything outside `[0, 1]` means the clock or the window arithmetic went
/// wrong; it is reported, never clamped.
fn elapsed_fraction(now: Duration, start: Duration, window: Duration) -> ThrottlerResult<f64> {
    let fraction = match now.checked_sub(start) {
        Some(elapsed) => elapsed.as_secs_f64() / window.as_secs_f64(),
        None => -((start - now).as_secs_f64() / window.as_secs_f64()),
    };

    if !(0.0..=1.0).contains(&fraction) {
        error!(
            fraction,
            now = ?now,
            window_start = ?start,
            "Window fraction outside [0, 1]"
        );
        return Err(ThrottlerError::InvariantViolation(format!(
            "window fraction {} is outside [0, 1]",
            fraction
        )));
    }

    Ok(fraction)
}

/// Requests attributed to the trailing window; compared against capacity after flooring.
fn weighted_estimate(count: u64, previous_count: u64, fraction: f64) -> f64 {
    count as f64 + previous_count as f64 * (1.0 - fraction)
}

impl RateLimiter for SlidingWindowCounterLimiter {
    fn decide(&self, identifier: &str) -> ThrottlerResult<bool> {
        let mut records = lock_store(&self.records)?;
        let now = self.clock.now();
        let current_window = window_start(now, self.window);

        let Some(record) = records.get_mut(identifier) else {
            records.insert(identifier.to_string(), CounterRecord::fresh(current_window));
            return Ok(false);
        };

        if record.window_start == current_window {
            let fraction = elapsed_fraction(now, record.window_start, self.window)?;
            let estimate = weighted_estimate(record.count, record.previous_count, fraction);
            if estimate.floor() >= self.capacity as f64 {
                return self.reject(identifier, estimate);
            }

            record.count += 1;
            return Ok(false);
        }

        if current_window.checked_sub(self.window) == Some(record.window_start) {
            // The stored window just ended: its count is now the previous window's total.
            let fraction = elapsed_fraction(now, current_window, self.window)?;
            let estimate = weighted_estimate(0, record.count, fraction);
            if estimate.floor() >= self.capacity as f64 {
                return self.reject(identifier, estimate);
            }

            *record = CounterRecord {
                count: 1,
                previous_count: record.count,
                window_start: current_window,
            };
            return Ok(false);
        }

        // Idle for two windows or more.
        *record = CounterRecord::fresh(current_window);
        Ok(false)
    }

    fn strategy(&self) -> Strategy {
        Strategy::SlidingWindowCounter
    }

    fn tracked_identifiers(&self) -> ThrottlerResult<usize> {
        Ok(lock_store(&self.records)?.len())
    }
}
