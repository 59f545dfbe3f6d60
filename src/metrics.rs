use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleMetrics {
    pub total_requests: u64,
    pub allowed_requests: u64,
    pub throttled_requests: u64,
}

/// Counts decisions made on the limited route.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    allowed: Arc<AtomicU64>,
    throttled: Arc<AtomicU64>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, allowed: bool) {
        let counter = if allowed { &self.allowed } else { &self.throttled };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ThrottleMetrics {
        let allowed_requests = self.allowed.load(Ordering::Relaxed);
        let throttled_requests = self.throttled.load(Ordering::Relaxed);
        ThrottleMetrics {
            total_requests: allowed_requests + throttled_requests,
            allowed_requests,
            throttled_requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request_counts() {
        let metrics = MetricsCollector::new();
        metrics.record_request(true);
        metrics.record_request(true);
        metrics.record_request(false);

        let shared = metrics.clone();
        shared.record_request(false);

        assert_eq!(
            metrics.snapshot(),
            ThrottleMetrics {
                total_requests: 4,
                allowed_requests: 2,
                throttled_requests: 2,
            }
        );
    }
}
