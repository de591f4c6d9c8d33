//! League CLI - start the Even/Odd league agents
//!
//! Commands:
//! - manager: run the league manager
//! - referee: run a referee
//! - player: run a player

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use league_manager::ManagerConfig;
use league_player::PlayerConfig;
use league_referee::RefereeConfig;

#[derive(Parser)]
#[command(name = "league")]
#[command(about = "Even/Odd tournament league agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the league manager
    Manager {
        /// JSON config file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "local-league")]
        league_id: String,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run a referee
    Referee {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "REF01")]
        referee_id: String,
        #[arg(long)]
        port: Option<u16>,
        /// League manager RPC endpoint for match reports
        #[arg(long, default_value = "http://127.0.0.1:8000/rpc")]
        manager_endpoint: String,
    },
    /// Run a player
    Player {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "P01")]
        player_id: String,
        #[arg(long)]
        port: Option<u16>,
        /// Strategy: random, fixed_even, fixed_odd, alternating, adaptive
        #[arg(long, default_value = "random")]
        strategy: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    tracing::info!("league {} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Manager {
            config,
            league_id,
            port,
        } => {
            let mut config = match config {
                Some(path) => ManagerConfig::load(&path)?,
                None => ManagerConfig::new(league_id),
            };
            if let Some(port) = port {
                config = config.with_port(port);
            }
            league_manager::run_server(config).await
        }
        Commands::Referee {
            config,
            referee_id,
            port,
            manager_endpoint,
        } => {
            let mut config = match config {
                Some(path) => RefereeConfig::load(&path)?,
                None => RefereeConfig::new(referee_id).with_manager_endpoint(manager_endpoint),
            };
            if let Some(port) = port {
                config = config.with_port(port);
            }
            league_referee::run_server(config).await
        }
        Commands::Player {
            config,
            player_id,
            port,
            strategy,
        } => {
            let mut config = match config {
                Some(path) => PlayerConfig::load(&path)?,
                None => PlayerConfig::new(player_id).with_strategy(strategy),
            };
            if let Some(port) = port {
                config = config.with_port(port);
            }
            league_player::run_server(config).await
        }
    }
}
