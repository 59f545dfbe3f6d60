use crate::rate_limit_config::{LimiterConfig, Strategy};
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Process configuration, from command line flags with environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "ip-throttler", version, about = "Per-client request rate limiting service")]
pub struct Config {
    /// The rate limiting algorithm to use
    #[arg(long = "limiter-algo", env = "LIMITER_ALGO", value_enum)]
    pub strategy: Strategy,

    /// Server bind address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,

    /// Window duration, or refill period for the token bucket (e.g. "30s", "500ms")
    #[arg(long, env = "LIMIT_WINDOW", value_parser = parse_duration)]
    pub window: Option<Duration>,

    /// Requests per window, or bucket capacity
    #[arg(long, env = "LIMIT_CAPACITY")]
    pub capacity: Option<u64>,

    /// Log level for this crate when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Strategy defaults with any command line overrides applied.
    pub fn limiter_config(&self) -> LimiterConfig {
        LimiterConfig::with_defaults(self.strategy).with_overrides(self.window, self.capacity)
    }
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_defaults_without_overrides() {
        let config = Config::try_parse_from(["ip-throttler", "--limiter-algo", "slidingwindow"]).unwrap();
        assert_eq!(
            config.limiter_config(),
            LimiterConfig::with_defaults(Strategy::SlidingWindowLog)
        );
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_overrides_applied() {
        let config = Config::try_parse_from([
            "ip-throttler",
            "--limiter-algo",
            "tokenbucket",
            "--window",
            "250ms",
            "--capacity",
            "3",
            "--bind-addr",
            "127.0.0.1:9000",
        ])
        .unwrap();

        let limiter = config.limiter_config();
        assert_eq!(limiter.strategy, Strategy::TokenBucket);
        assert_eq!(limiter.settings.window, Duration::from_millis(250));
        assert_eq!(limiter.settings.capacity, 3);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        assert!(Config::try_parse_from(["ip-throttler", "--limiter-algo", "leakybucket"]).is_err());
    }

    #[test]
    fn test_malformed_window_rejected() {
        assert!(parse_duration("soon").is_err());
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
    }
}
