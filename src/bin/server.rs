//! oracle-select Server Binary
//!
//! Starts the TCP selection service.

use std::sync::Arc;

use clap::Parser;
use oracle_select::network::Server;
use oracle_select::{Config, SelectionService};
use tracing_subscriber::{fmt, EnvFilter};

/// oracle-select Server
#[derive(Parser, Debug)]
#[command(name = "oracle-select-server")]
#[command(about = "Selects min/max indices by asking callers comparison queries")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Maximum live selection sessions
    #[arg(short = 's', long, default_value = "4096")]
    max_sessions: usize,

    /// Per-connection read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "30000")]
    read_timeout_ms: u64,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,oracle_select=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("oracle-select server v{}", oracle_select::VERSION);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .max_sessions(args.max_sessions)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let service = Arc::new(SelectionService::new(&config));

    let server = match Server::bind(config, service) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
