//! oracle-select CLI Client
//!
//! Asks the selection service for the min or max of a list of integers,
//! answering its comparison queries locally.

use clap::{Parser, Subcommand};
use oracle_select::{Client, Config, Operation};
use tracing_subscriber::{fmt, EnvFilter};

/// oracle-select CLI
#[derive(Parser, Debug)]
#[command(name = "oracle-select-cli")]
#[command(about = "Compute min/max through a remote selection service")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    server: String,

    /// Log every message exchanged with the server
    #[arg(long)]
    log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Select the smallest value
    Min {
        /// The values to select from
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<i64>,
    },

    /// Select the largest value
    Max {
        /// The values to select from
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<i64>,
    },
}

fn main() {
    let args = Args::parse();

    let default_level = if args.log { "warn,oracle_select=trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let (op, values) = match args.command {
        Commands::Min { values } => (Operation::Min, values),
        Commands::Max { values } => (Operation::Max, values),
    };

    let config = Config::builder().server_addr(&args.server).build();

    let mut client = match Client::connect(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    match client.compute_with(&values, op) {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("{} failed: {}", op, e);
            std::process::exit(1);
        }
    }
}
