use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Rate limit strategy enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Clock-aligned fixed window counter
    #[value(name = "fixedwindow")]
    FixedWindow,
    /// Exact sliding window over a per-identifier timestamp log
    #[value(name = "slidingwindow", alias = "slidinglog")]
    #[serde(rename = "slidingwindow")]
    SlidingWindowLog,
    /// Sliding window approximated from two adjacent fixed windows
    #[value(name = "swcounter", alias = "slidingcounter")]
    #[serde(rename = "swcounter")]
    SlidingWindowCounter,
    /// Capped token balance replenished by a background task
    #[value(name = "tokenbucket")]
    TokenBucket,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::FixedWindow,
        Strategy::SlidingWindowLog,
        Strategy::SlidingWindowCounter,
        Strategy::TokenBucket,
    ];

    /// Name used on the command line and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::FixedWindow => "fixedwindow",
            Strategy::SlidingWindowLog => "slidingwindow",
            Strategy::SlidingWindowCounter => "swcounter",
            Strategy::TokenBucket => "tokenbucket",
        }
    }

    /// Limits used by the reference deployment.
    pub fn default_settings(&self) -> LimiterSettings {
        match self {
            Strategy::FixedWindow => LimiterSettings::new(Duration::from_secs(60), 60),
            Strategy::SlidingWindowLog => LimiterSettings::new(Duration::from_secs(10), 20),
            Strategy::SlidingWindowCounter => LimiterSettings::new(Duration::from_secs(30), 60),
            Strategy::TokenBucket => LimiterSettings::new(Duration::from_secs(1), 10),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters shared by every strategy.
///
/// `window` is the window duration for the window strategies and the refill
/// period for the token bucket. `capacity` is the number of requests admitted
/// per window, or the bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterSettings {
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    pub capacity: u64,
}

impl LimiterSettings {
    pub fn new(window: Duration, capacity: u64) -> Self {
        Self { window, capacity }
    }
}

/// Explicit selection of one strategy and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterConfig {
    pub strategy: Strategy,
    #[serde(flatten)]
    pub settings: LimiterSettings,
}

impl LimiterConfig {
    pub fn new(strategy: Strategy, settings: LimiterSettings) -> Self {
        Self { strategy, settings }
    }

    /// Strategy with its reference defaults.
    pub fn with_defaults(strategy: Strategy) -> Self {
        Self::new(strategy, strategy.default_settings())
    }

    /// Replace the default window and/or capacity before construction.
    pub fn with_overrides(mut self, window: Option<Duration>, capacity: Option<u64>) -> Self {
        if let Some(window) = window {
            self.settings.window = window;
        }
        if let Some(capacity) = capacity {
            self.settings.capacity = capacity;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_defaults() {
        assert_eq!(
            Strategy::FixedWindow.default_settings(),
            LimiterSettings::new(Duration::from_secs(60), 60)
        );
        assert_eq!(
            Strategy::SlidingWindowLog.default_settings(),
            LimiterSettings::new(Duration::from_secs(10), 20)
        );
        assert_eq!(
            Strategy::SlidingWindowCounter.default_settings(),
            LimiterSettings::new(Duration::from_secs(30), 60)
        );
        assert_eq!(
            Strategy::TokenBucket.default_settings(),
            LimiterSettings::new(Duration::from_secs(1), 10)
        );
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let config = LimiterConfig::with_defaults(Strategy::SlidingWindowLog)
            .with_overrides(None, Some(5));
        assert_eq!(config.settings.window, Duration::from_secs(10));
        assert_eq!(config.settings.capacity, 5);

        let config = LimiterConfig::with_defaults(Strategy::TokenBucket)
            .with_overrides(Some(Duration::from_millis(500)), None);
        assert_eq!(config.settings.window, Duration::from_millis(500));
        assert_eq!(config.settings.capacity, 10);
    }

    #[test]
    fn test_config_deserializes_humantime_window() {
        let config: LimiterConfig = serde_json::from_value(serde_json::json!({
            "strategy": "swcounter",
            "window": "30s",
            "capacity": 60
        }))
        .unwrap();

        assert_eq!(config, LimiterConfig::with_defaults(Strategy::SlidingWindowCounter));
    }

    #[test]
    fn test_strategy_cli_names() {
        assert_eq!(
            Strategy::from_str("tokenbucket", false).unwrap(),
            Strategy::TokenBucket
        );
        assert_eq!(
            Strategy::from_str("slidinglog", false).unwrap(),
            Strategy::SlidingWindowLog
        );
        assert!(Strategy::from_str("leakybucket", false).is_err());
        assert_eq!(Strategy::SlidingWindowCounter.to_string(), "swcounter");
    }
}
