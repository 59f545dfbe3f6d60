//! Token bucket with background replenishment.
//!
//! Every identifier owns a balance capped at `capacity`. Admitted requests
//! take one token; a tokio task adds one token to every balance each refill
//! period. The refill sweep shares the decision lock, so the effective refill
//! cadence is the period plus the time taken to sweep every identifier.

use super::RateLimiter;
use crate::config_validator::ConfigValidator;
use crate::error::{ThrottlerError, ThrottlerResult};
use crate::rate_limit_config::{LimiterConfig, LimiterSettings, Strategy};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, trace};

/// Token balances plus the fault recorded by a failed refill sweep.
#[derive(Debug, Default)]
struct Buckets {
    balances: HashMap<String, u64>,
    fault: Option<String>,
}

pub struct TokenBucketLimiter {
    capacity: u64,
    refill_period: Duration,
    state: Arc<Mutex<Buckets>>,
    refill_task: Option<JoinHandle<()>>,
}

impl TokenBucketLimiter {
    /// Create a limiter and spawn its refill task on the current tokio runtime.
    pub fn new(settings: LimiterSettings) -> ThrottlerResult<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ThrottlerError::Configuration(format!(
                "Token bucket refill task needs a tokio runtime: {}",
                e
            ))
        })?;

        let mut limiter = Self::without_refill(settings)?;
        let task = runtime.spawn(refill_loop(
            Arc::clone(&limiter.state),
            limiter.capacity,
            limiter.refill_period,
        ));
        limiter.refill_task = Some(task);
        Ok(limiter)
    }

    /// Create a limiter whose balances only grow through [`refill`](Self::refill).
    pub fn without_refill(settings: LimiterSettings) -> ThrottlerResult<Self> {
        ConfigValidator::validate_limiter_config(&LimiterConfig::new(Strategy::TokenBucket, settings))?;

        Ok(Self {
            capacity: settings.capacity,
            refill_period: settings.window,
            state: Arc::new(Mutex::new(Buckets::default())),
            refill_task: None,
        })
    }

    /// Run one refill sweep now. Returns the number of balances that grew.
    pub fn refill(&self) -> ThrottlerResult<usize> {
        replenish(&self.state, self.capacity)
    }

    pub fn refill_period(&self) -> Duration {
        self.refill_period
    }

    fn lock_state(&self) -> ThrottlerResult<MutexGuard<'_, Buckets>> {
        lock_buckets(&self.state)
    }
}

fn lock_buckets(state: &Mutex<Buckets>) -> ThrottlerResult<MutexGuard<'_, Buckets>> {
    state
        .lock()
        .map_err(|_| ThrottlerError::InternalError("Failed to acquire lock on token buckets".to_string()))
}

/// Add one token to every balance below capacity.
///
/// A balance above capacity is recorded as a fault on the store before the
/// error is returned; the limiter refuses every later decision.
fn replenish(state: &Mutex<Buckets>, capacity: u64) -> ThrottlerResult<usize> {
    let mut buckets = lock_buckets(state)?;
    if let Some(fault) = &buckets.fault {
        return Err(ThrottlerError::InvariantViolation(fault.clone()));
    }

    let mut refilled = 0;
    let mut overflow = None;
    for (identifier, tokens) in buckets.balances.iter_mut() {
        if *tokens > capacity {
            overflow = Some(format!(
                "token balance {} for {} exceeds capacity {}",
                tokens, identifier, capacity
            ));
            break;
        }
        if *tokens < capacity {
            *tokens += 1;
            refilled += 1;
        }
    }

    if let Some(fault) = overflow {
        error!(fault = %fault, "Token bucket invariant violated");
        buckets.fault = Some(fault.clone());
        return Err(ThrottlerError::InvariantViolation(fault));
    }

    Ok(refilled)
}

async fn refill_loop(state: Arc<Mutex<Buckets>>, capacity: u64, period: Duration) {
    loop {
        tokio::time::sleep(period).await;
        match replenish(&state, capacity) {
            Ok(refilled) => trace!(refilled, "Token buckets replenished"),
            Err(e) => {
                error!(error = %e, "Stopping token bucket refill");
                return;
            }
        }
    }
}

impl Drop for TokenBucketLimiter {
    fn drop(&mut self) {
        if let Some(task) = self.refill_task.take() {
            task.abort();
        }
    }
}

impl RateLimiter for TokenBucketLimiter {
    fn decide(&self, identifier: &str) -> ThrottlerResult<bool> {
        let mut buckets = self.lock_state()?;
        if let Some(fault) = &buckets.fault {
            return Err(ThrottlerError::InvariantViolation(fault.clone()));
        }

        match buckets.balances.get_mut(identifier) {
            None => {
                // First sighting takes one token from a full bucket.
                buckets
                    .balances
                    .insert(identifier.to_string(), self.capacity - 1);
                Ok(false)
            }
            Some(tokens) if *tokens > 0 => {
                *tokens -= 1;
                Ok(false)
            }
            Some(_) => {
                info!(
                    identifier,
                    capacity = self.capacity,
                    "Rejecting request, token bucket is empty"
                );
                Ok(true)
            }
        }
    }

    fn strategy(&self) -> Strategy {
        Strategy::TokenBucket
    }

    fn tracked_identifiers(&self) -> ThrottlerResult<usize> {
        Ok(self.lock_state()?.balances.len())
    }
}
