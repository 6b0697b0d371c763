use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dipneg::{load_board, probe, AppConfig};
use dipneg_bridge::{LocalBridgeServer, RandomPolicy};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file (negotiator and bridge sections)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a local policy server answering with random actions
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: String,

        /// Policy seed
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Stop after this many connections
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Send a board snapshot to a bridge and print the deals it leads to
    Probe {
        /// Board snapshot (JSON)
        #[arg(long)]
        board: PathBuf,

        /// Power to negotiate as
        #[arg(long)]
        power: String,

        /// Bridge host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bridge port (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Round length in milliseconds
        #[arg(long, default_value_t = 5000)]
        round_ms: u64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match args.command {
        Command::Serve { bind, seed, limit } => {
            let server = LocalBridgeServer::bind(&bind)
                .with_context(|| format!("Failed to bind {}", bind))?;
            log::info!("Serving random policy on {}", server.local_addr()?);
            let mut policy = RandomPolicy::new(seed);
            server.serve(&mut policy, limit);
        }
        Command::Probe {
            board,
            power,
            host,
            port,
            round_ms,
        } => {
            if let Some(host) = host {
                config.bridge.host = host;
            }
            if let Some(port) = port {
                config.bridge.port = port;
            }

            let board = load_board(&board)?;
            log::info!("Probing bridge as {} in {}", power, board.turn);
            let report = probe(&board, &power, &config, Duration::from_millis(round_ms))?;

            for deal in &report.handshake {
                println!("handshake: {}", deal);
            }
            if report.deals.is_empty() {
                println!("no deals");
            }
            for deal in &report.deals {
                println!("deal: {}", deal);
            }
        }
    }

    Ok(())
}
