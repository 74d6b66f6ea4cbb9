//! trace-logger demo service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ TraceLayer ─▶ trace id middleware ─▶ request logging ─▶ handler
//!                                        │                        │               │
//!                                        ▼                        ▼               ▼
//!                                  TraceStore scope ◀──── Logger reads current trace id
//!                                                                 │
//!                                                                 ▼
//!                                                      backend (json | tracing)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use trace_logger::config::watcher::{apply_updates, ConfigWatcher};
use trace_logger::lifecycle::signals::trigger_on_signal;
use trace_logger::observability::init_subscriber;
use trace_logger::{AppConfig, AppServer, Services, Shutdown};

#[derive(Parser)]
#[command(name = "trace-logger")]
#[command(about = "Demo service for the trace-aware logging facade", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override server.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Reload trace settings when the config file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => trace_logger::config::load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    init_subscriber(&config.observability);
    tracing::info!("trace-logger v0.1.0 starting");

    let services = Services::from_config(config)?;

    tracing::info!(
        bind_address = %services.config.server.bind_address,
        request_timeout_secs = services.config.server.request_timeout_secs,
        "Configuration loaded"
    );

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            tokio::spawn(apply_updates(services.store.clone(), updates));
            Some(watcher.run()?)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&services.config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = AppServer::new(services.config.clone(), services.store.clone(), services.logger.clone());
    let server_shutdown = shutdown.subscribe();

    let server_task = tokio::spawn(server.run(listener, server_shutdown));
    trigger_on_signal(&shutdown).await;
    server_task.await??;

    services.logger.flush();
    tracing::info!("Shutdown complete");
    Ok(())
}
