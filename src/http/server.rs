//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the demo handlers
//! - Wire up middleware (access log, timeout, tracing)
//! - Bind server to listener and serve with connect info
//! - Shut down gracefully on signal or broadcast

use std::net::SocketAddr;
use std::time::Duration;

use axum::{routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::access_log::{AccessLogLayer, AccessLogger, SinkError};
use crate::config::AppConfig;
use crate::http::handlers;
use crate::lifecycle::signals::shutdown_signal;

/// HTTP server that writes an access log line for every request.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server whose access logger is built from `config`.
    pub fn new(config: AppConfig) -> Result<Self, SinkError> {
        let logger = if config.access_log.enabled {
            Some(AccessLogger::from_config(&config.access_log)?)
        } else {
            None
        };
        Ok(Self::build(config, logger))
    }

    /// Create a server that logs through `logger`, ignoring the configured
    /// access log output.
    pub fn with_logger(config: AppConfig, logger: AccessLogger) -> Self {
        Self::build(config, Some(logger))
    }

    fn build(config: AppConfig, logger: Option<AccessLogger>) -> Self {
        Self {
            router: Self::build_router(&config, logger),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, logger: Option<AccessLogger>) -> Router {
        let router = Router::new()
            .route("/usage", any(handlers::usage))
            .route("/denied", any(handlers::denied))
            .route("/delayed", any(handlers::delayed))
            .fallback(handlers::not_found)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        let router = match logger {
            Some(logger) => router.layer(AccessLogLayer::new(logger)),
            None => {
                tracing::info!("Access log disabled");
                router
            }
        };

        router.layer(TraceLayer::new_for_http())
    }

    /// The router with all layers applied, for driving without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a shutdown signal or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
