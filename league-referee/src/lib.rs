//! League Referee - runs Even/Odd matches between two players
//!
//! This crate provides the referee agent:
//! - JSON-RPC endpoint accepting round announcements from the manager
//! - Concurrent match orchestration against player endpoints
//! - Match lifecycle registry with forward-only phase transitions
//! - Result reporting back to the manager

mod config;
mod handlers;
mod orchestrator;
mod registry;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::post;
use axum::Router;

pub use config::{RefereeConfig, TimeoutsConfig};
pub use orchestrator::MatchOrchestrator;
pub use registry::{MatchPhase, MatchRecord, MatchRegistry};
pub use state::{EndpointDirectory, RefereeState};

/// Create the router with the RPC endpoint.
pub fn create_router(state: Arc<RefereeState>) -> Router {
    Router::new()
        .route("/rpc", post(handlers::rpc_handler))
        .with_state(state)
}

/// Start the referee server and serve until shutdown.
pub async fn run_server(config: RefereeConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let referee_id = config.referee_id.clone();
    let state = Arc::new(RefereeState::new(config));
    let router = create_router(state);

    tracing::info!("Referee {} starting on http://0.0.0.0:{}", referee_id, addr.port());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
