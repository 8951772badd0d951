//! Demo HTTP server that writes a combined-format access log.
//!
//! ```text
//!     Client Request
//!     ─────────────────▶ TraceLayer ─▶ AccessLogLayer ─▶ TimeoutLayer ─▶ handler
//!                                          │
//!                                          ▼
//!                              one line per request → sink
//!                              (stderr | stdout | file)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use combined_log::lifecycle::startup::{resolve_config, Overrides};
use combined_log::observability::logging;
use combined_log::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "combined-log")]
#[command(about = "HTTP server with Apache combined-format access logging", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, overriding the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Access log destination: stderr, stdout, or a file path.
    #[arg(short, long)]
    access_log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(
        cli.config.as_deref(),
        Overrides {
            bind_address: cli.bind,
            access_log: cli.access_log,
        },
    )?;

    logging::init(&config.observability.log_level);

    tracing::info!("combined-log v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        access_log = %config.access_log.output,
        access_log_enabled = config.access_log.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
