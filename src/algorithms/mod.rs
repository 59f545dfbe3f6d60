//! Rate limiting algorithms module
//!
//! Four interchangeable strategies behind one capability, [`RateLimiter`]:
//!
//! - [`FixedWindowLimiter`]: clock-aligned fixed window counter
//! - [`SlidingWindowLogLimiter`]: exact sliding window over a timestamp log
//! - [`SlidingWindowCounterLimiter`]: two-window interpolation of a sliding window
//! - [`TokenBucketLimiter`]: capped balance replenished by a background task
//!
//! Each limiter guards its whole store with a single mutex. Stores grow with
//! every distinct identifier and are never evicted; an idle-identifier reaper
//! or a store sharded by identifier hash would slot in behind [`Store`]
//! without changing [`RateLimiter::decide`].

mod fixed_window;
mod sliding_window_counter;
mod sliding_window_log;
mod token_bucket;

pub use fixed_window::FixedWindowLimiter;
pub use sliding_window_counter::SlidingWindowCounterLimiter;
pub use sliding_window_log::SlidingWindowLogLimiter;
pub use token_bucket::TokenBucketLimiter;

use crate::clock::{Clock, SystemClock};
use crate::config_validator::ConfigValidator;
use crate::error::{ThrottlerError, ThrottlerResult};
use crate::rate_limit_config::{LimiterConfig, Strategy};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Trait for rate limiting algorithms
pub trait RateLimiter: Send + Sync {
    /// Record a request from `identifier` and decide on it.
    ///
    /// Returns `Ok(true)` when the limit is exceeded and the request must be
    /// rejected, `Ok(false)` when it is admitted. `Err` signals a broken
    /// invariant, never an ordinary rejection.
    fn decide(&self, identifier: &str) -> ThrottlerResult<bool>;

    /// The strategy this limiter implements.
    fn strategy(&self) -> Strategy;

    /// Number of identifiers with stored state.
    fn tracked_identifiers(&self) -> ThrottlerResult<usize>;
}

/// Per-limiter state keyed by identifier, behind one lock.
pub(crate) type Store<R> = Mutex<HashMap<String, R>>;

pub(crate) fn new_store<R>() -> Store<R> {
    Mutex::new(HashMap::new())
}

pub(crate) fn lock_store<R>(store: &Store<R>) -> ThrottlerResult<MutexGuard<'_, HashMap<String, R>>> {
    store
        .lock()
        .map_err(|_| ThrottlerError::InternalError("Failed to acquire lock on limiter store".to_string()))
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Start of the clock-aligned window containing `now`.
///
/// `window` must be non-zero; limiters are only built from validated settings.
pub(crate) fn window_start(now: Duration, window: Duration) -> Duration {
    let now_nanos = now.as_nanos();
    let floored = now_nanos - now_nanos % window.as_nanos();
    Duration::new(
        (floored / NANOS_PER_SEC) as u64,
        (floored % NANOS_PER_SEC) as u32,
    )
}

/// Build the limiter selected by `config`, reading the system clock.
///
/// A token bucket spawns its refill task, so this must run inside a tokio
/// runtime for that strategy.
pub fn build_limiter(config: &LimiterConfig) -> ThrottlerResult<Arc<dyn RateLimiter>> {
    build_limiter_with_clock(config, Arc::new(SystemClock::new()))
}

/// Build the limiter selected by `config` with an explicit time source.
pub fn build_limiter_with_clock(
    config: &LimiterConfig,
    clock: Arc<dyn Clock>,
) -> ThrottlerResult<Arc<dyn RateLimiter>> {
    ConfigValidator::validate_limiter_config(config)?;

    let settings = config.settings;
    let limiter: Arc<dyn RateLimiter> = match config.strategy {
        Strategy::FixedWindow => Arc::new(FixedWindowLimiter::with_clock(settings, clock)?),
        Strategy::SlidingWindowLog => Arc::new(SlidingWindowLogLimiter::with_clock(settings, clock)?),
        Strategy::SlidingWindowCounter => {
            Arc::new(SlidingWindowCounterLimiter::with_clock(settings, clock)?)
        }
        Strategy::TokenBucket => Arc::new(TokenBucketLimiter::new(settings)?),
    };

    tracing::info!(
        strategy = %config.strategy,
        window = ?settings.window,
        capacity = settings.capacity,
        "Rate limiter initialized"
    );

    Ok(limiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::rate_limit_config::LimiterSettings;

    #[test]
    fn test_window_start_truncates_to_multiple() {
        let window = Duration::from_secs(60);
        assert_eq!(window_start(Duration::from_secs(125), window), Duration::from_secs(120));
        assert_eq!(window_start(Duration::from_secs(120), window), Duration::from_secs(120));
        assert_eq!(window_start(Duration::from_millis(119_999), window), Duration::from_secs(60));
    }

    #[test]
    fn test_window_start_sub_second_window() {
        let window = Duration::from_millis(250);
        assert_eq!(
            window_start(Duration::from_millis(10_999), window),
            Duration::from_millis(10_750)
        );
    }

    #[test]
    fn test_build_window_limiters() {
        let clock = Arc::new(MockClock::new(Duration::from_secs(3_600)));
        for strategy in [
            Strategy::FixedWindow,
            Strategy::SlidingWindowLog,
            Strategy::SlidingWindowCounter,
        ] {
            let limiter = build_limiter_with_clock(&LimiterConfig::with_defaults(strategy), clock.clone()).unwrap();
            assert_eq!(limiter.strategy(), strategy);
            assert!(!limiter.decide("10.0.0.1").unwrap());
            assert_eq!(limiter.tracked_identifiers().unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn test_build_token_bucket_inside_runtime() {
        let limiter = build_limiter(&LimiterConfig::with_defaults(Strategy::TokenBucket)).unwrap();
        assert_eq!(limiter.strategy(), Strategy::TokenBucket);
        assert!(!limiter.decide("10.0.0.1").unwrap());
    }

    #[test]
    fn test_build_token_bucket_outside_runtime_fails() {
        let result = build_limiter(&LimiterConfig::with_defaults(Strategy::TokenBucket));
        assert!(matches!(result, Err(ThrottlerError::Configuration(_))));
    }

    #[test]
    fn test_build_rejects_zero_window() {
        let config = LimiterConfig::new(
            Strategy::FixedWindow,
            LimiterSettings::new(Duration::ZERO, 10),
        );
        assert!(matches!(build_limiter(&config), Err(ThrottlerError::Configuration(_))));
    }

    #[test]
    fn test_strategies_are_interchangeable() {
        let clock = Arc::new(MockClock::new(Duration::from_secs(3_600)));
        let limiters: Vec<Arc<dyn RateLimiter>> = [
            Strategy::FixedWindow,
            Strategy::SlidingWindowLog,
            Strategy::SlidingWindowCounter,
        ]
        .into_iter()
        .map(|strategy| {
            let config = LimiterConfig::new(strategy, LimiterSettings::new(Duration::from_secs(10), 2));
            build_limiter_with_clock(&config, clock.clone()).unwrap()
        })
        .collect();

        for limiter in limiters {
            assert!(!limiter.decide("a").unwrap());
            assert!(!limiter.decide("a").unwrap());
            assert!(limiter.decide("a").unwrap(), "{} admitted a third request", limiter.strategy());
        }
    }
}
