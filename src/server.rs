use crate::algorithms::RateLimiter;
use crate::error::ThrottlerResult;
use crate::handlers::{health_check, limited, metrics, unlimited, AppState, SharedState};
use crate::middleware::logging_middleware;
use axum::routing::get;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Build the router around an already constructed limiter.
///
/// The router must be served with peer-address connect info
/// (`into_make_service_with_connect_info::<SocketAddr>`).
pub fn create_app(limiter: Arc<dyn RateLimiter>) -> Router {
    let shared_state: SharedState = Arc::new(AppState::new(limiter));

    Router::new()
        .route("/limited", get(limited))
        .route("/unlimited", get(unlimited))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(shared_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

pub struct Server {
    app: Router,
    bind_addr: SocketAddr,
}

impl Server {
    pub fn new(bind_addr: SocketAddr, limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            app: create_app(limiter),
            bind_addr,
        }
    }

    pub async fn run(self) -> ThrottlerResult<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.run_on(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn run_on<F>(self, listener: TcpListener, shutdown: F) -> ThrottlerResult<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Throttler server listening on {}", listener.local_addr()?);
        tracing::info!("Rate limited endpoint available at /limited");

        axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        tracing::info!("Throttler server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
