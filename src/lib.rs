//! Per-client request admission control.
//!
//! Four interchangeable rate limiting strategies live in [`algorithms`]; the
//! remaining modules wrap the selected strategy in a small HTTP service.

pub mod algorithms;
pub mod clock;
pub mod config;
pub mod config_validator;
pub mod error;
pub mod handlers;
pub mod key_generator;
pub mod metrics;
pub mod middleware;
pub mod rate_limit_config;
pub mod response;
pub mod server;

pub use algorithms::{build_limiter, RateLimiter};
pub use config::Config;
pub use error::{ThrottlerError, ThrottlerResult};
pub use rate_limit_config::{LimiterConfig, LimiterSettings, Strategy};
pub use server::create_app;
