//! League Manager - registration, scheduling, and standings
//!
//! This crate provides the league manager agent:
//! - Referee and player registration with stable ids and tokens
//! - Round-robin schedule construction and referee assignment
//! - Round announcements with completion tracking
//! - Standings computed from reported match results

mod config;
mod handlers;
mod registry;
mod rounds;
mod standings;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::post;
use axum::Router;

pub use config::ManagerConfig;
pub use registry::{AgentRecord, AgentRegistry};
pub use rounds::{LeaguePlan, PlannedRound};
pub use standings::{StandingRow, StandingsTable};
pub use state::{LeaguePhase, ManagerState};

/// Create the router with the RPC endpoint.
pub fn create_router(state: Arc<ManagerState>) -> Router {
    Router::new()
        .route("/rpc", post(handlers::rpc_handler))
        .with_state(state)
}

/// Start the manager server and serve until shutdown.
pub async fn run_server(config: ManagerConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let league_id = config.league_id.clone();
    let state = Arc::new(ManagerState::new(config));
    let router = create_router(state);

    tracing::info!("League manager for {} starting on http://0.0.0.0:{}", league_id, addr.port());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
