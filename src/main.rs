use std::path::PathBuf;

use clap::Parser;

use healthz::config::{load_config, ServiceConfig};
use healthz::lifecycle::shutdown_signal;
use healthz::observability::{init_logging, logging::filter_directive};
use healthz::App;

/// healthz: liveness endpoint with ordered startup and shutdown
#[derive(Parser, Debug)]
#[command(name = "healthz", version, about)]
struct Args {
    /// Path to a TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level filter (e.g., "healthz=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    // Initialize tracing with priority: CLI > env > config
    let filter = filter_directive(args.log_level.as_deref(), &config.logging);
    let logger = init_logging(&filter, config.logging.format)?;

    tracing::info!("healthz v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        read_timeout_secs = config.server.read_timeout_secs,
        write_timeout_secs = config.server.write_timeout_secs,
        idle_timeout_secs = config.server.idle_timeout_secs,
        "Configuration loaded"
    );

    let app = App::new(config, &logger)?;
    app.run(shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
