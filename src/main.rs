use anyhow::Result;
use clap::Parser;
use ip_throttler::algorithms::build_limiter;
use ip_throttler::config::Config;
use ip_throttler::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ip_throttler={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting throttler service");

    let limiter_config = config.limiter_config();
    tracing::info!(
        bind_addr = %config.bind_addr,
        strategy = %limiter_config.strategy,
        window = ?limiter_config.settings.window,
        capacity = limiter_config.settings.capacity,
        "Configuration loaded"
    );

    let limiter = build_limiter(&limiter_config)
        .map_err(|e| anyhow::anyhow!("Failed to create rate limiter: {}", e))?;

    Server::new(config.bind_addr, limiter)
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
