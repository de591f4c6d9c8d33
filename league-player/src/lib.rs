//! League Player - strategy-driven Even/Odd participant
//!
//! This crate provides the player agent:
//! - JSON-RPC endpoint for the referee-driven match flow
//! - Pluggable choice strategies
//! - Match and outcome tracking

mod config;
mod handlers;
mod state;
mod strategy;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::post;
use axum::Router;

pub use config::PlayerConfig;
pub use state::{ActiveMatch, PlayerState};
pub use strategy::{
    strategy_from_name, AdaptiveChoice, AlternatingChoice, ChoiceStrategy, FixedChoice,
    RandomChoice,
};

/// Create the router with the RPC endpoint.
pub fn create_router(state: Arc<PlayerState>) -> Router {
    Router::new()
        .route("/rpc", post(handlers::rpc_handler))
        .with_state(state)
}

/// Start the player server and serve until shutdown.
pub async fn run_server(config: PlayerConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let player_id = config.player_id.clone();
    let state = Arc::new(PlayerState::new(config));
    let router = create_router(state);

    tracing::info!("Player {} starting on http://0.0.0.0:{}", player_id, addr.port());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
