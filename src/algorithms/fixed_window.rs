//! Fixed window counter.
//!
//! Time is cut into clock-aligned windows of equal size. Two requests in the
//! same calendar window share a counter regardless of arrival order, which
//! permits bursts of up to twice the capacity around a window edge.

use super::{lock_store, new_store, window_start, RateLimiter, Store};
use crate::clock::{Clock, SystemClock};
use crate::config_validator::ConfigValidator;
use crate::error::ThrottlerResult;
use crate::rate_limit_config::{LimiterSettings, Strategy};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowRecord {
    count: u64,
    window_start: Duration,
}

pub struct FixedWindowLimiter {
    window: Duration,
    capacity: u64,
    clock: Arc<dyn Clock>,
    records: Store<WindowRecord>,
}

impl FixedWindowLimiter {
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
}

impl RateLimiter for FixedWindowLimiter {
    fn decide(&self, identifier: &str) -> ThrottlerResult<bool> {
        let mut records = lock_store(&self.records)?;
        let current_window = window_start(self.clock.now(), self.window);

        let Some(record) = records.get_mut(identifier) else {
            records.insert(
                identifier.to_string(),
                WindowRecord {
                    count: 1,
                    window_start: current_window,
                },
            );
            return Ok(false);
        };

        if record.window_start != current_window {
            *record = WindowRecord {
                count: 1,
                window_start: current_window,
            };
            return Ok(false);
        }

        if record.count >= self.capacity {
            info!(
                identifier,
                count = record.count,
                "Rejecting request, limit reached in current window"
            );
            return Ok(true);
        }

        record.count += 1;
        Ok(false)
    }

    fn strategy(&self) -> Strategy {
        Strategy::FixedWindow
    }

    fn tracked_identifiers(&self) -> ThrottlerResult<usize> {
        Ok(lock_store(&self.records)?.len())
    }
}
