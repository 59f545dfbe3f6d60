use crate::error::ThrottlerError;
use crate::rate_limit_config::{LimiterConfig, Strategy};
use std::time::Duration;

/// Validates limiter configuration before any limiter is constructed
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a strategy selection together with its parameters
    pub fn validate_limiter_config(config: &LimiterConfig) -> Result<(), ThrottlerError> {
        let settings = &config.settings;
        match config.strategy {
            Strategy::TokenBucket => {
                Self::validate_duration("Refill period", settings.window)?;
                if settings.capacity == 0 {
                    return Err(ThrottlerError::Configuration(
                        "Token bucket capacity must be greater than 0".to_string(),
                    ));
                }
            }
            Strategy::FixedWindow | Strategy::SlidingWindowLog | Strategy::SlidingWindowCounter => {
                Self::validate_duration("Window size", settings.window)?;
                if settings.capacity == 0 {
                    tracing::warn!(
                        strategy = %config.strategy,
                        "Window capacity is 0, requests will be rejected"
                    );
                }
            }
        }

        Ok(())
    }

    /// Validates a window or refill duration
    pub fn validate_duration(what: &str, duration: Duration) -> Result<(), ThrottlerError> {
        if duration.is_zero() {
            return Err(ThrottlerError::Configuration(format!(
                "{} must be greater than 0",
                what
            )));
        }

        // Window arithmetic is done in nanoseconds since the epoch.
        if duration.as_nanos() > u64::MAX as u128 {
            return Err(ThrottlerError::Configuration(format!(
                "{} of {:?} is too large",
                what, duration
            )));
        }

        Ok(())
    }
}
