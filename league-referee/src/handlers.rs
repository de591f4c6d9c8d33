//! JSON-RPC endpoint for the referee
//!
//! A single POST route receives every inbound frame. Parse and shape errors
//! map to the standard JSON-RPC codes; application failures carry a stable
//! E-code in the error data. Round announcements are acknowledged
//! immediately and their matches run as spawned tasks.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use league_proto::{
    methods, Envelope, LeagueError, MessageBody, RpcError, RpcRequest, RpcResponse,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::state::RefereeState;

#[derive(Debug, Deserialize)]
struct RunMatchParams {
    match_id: String,
    round_id: u32,
    player_a_id: String,
    player_b_id: String,
}

#[derive(Debug, Deserialize)]
struct GetMatchStateParams {
    match_id: String,
}

/// Entry point for every inbound RPC frame.
pub async fn rpc_handler(
    State(state): State<Arc<RefereeState>>,
    body: String,
) -> Json<RpcResponse> {
    let value: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(_) => {
            return Json(RpcResponse::error(Value::Null, RpcError::parse_error()));
        }
    };
    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(_) => {
            return Json(RpcResponse::error(Value::Null, RpcError::invalid_request()));
        }
    };

    let id = request.id.clone();
    let response = match request.method.as_str() {
        methods::HANDLE_NOTIFICATION => handle_notification(&state, request.params, id).await,
        methods::RUN_MATCH => run_match(&state, request.params, id).await,
        methods::GET_MATCH_STATE => get_match_state(&state, request.params, id),
        methods::HEALTH => RpcResponse::success(
            id,
            json!({"status": "ok", "referee_id": state.config.referee_id, "matches": state.registry.len()}),
        ),
        other => RpcResponse::error(id, RpcError::method_not_found(other)),
    };
    Json(response)
}

/// Missing or mismatched token when one is configured.
fn check_auth(state: &RefereeState, envelope: &Envelope) -> Result<(), LeagueError> {
    let Some(expected) = &state.config.auth_token else {
        return Ok(());
    };
    match &envelope.auth_token {
        None => Err(LeagueError::AuthTokenMissing),
        Some(token) if token != expected => Err(LeagueError::AuthTokenInvalid),
        Some(_) => Ok(()),
    }
}

async fn handle_notification(state: &Arc<RefereeState>, params: Value, id: Value) -> RpcResponse {
    let envelope: Envelope = match serde_json::from_value(params) {
        Ok(e) => e,
        Err(e) => {
            return RpcResponse::error(id, RpcError::invalid_params(&e.to_string()));
        }
    };
    if let Err(err) = check_auth(state, &envelope) {
        warn!(sender = %envelope.sender, error = %err, "rejected notification");
        return RpcResponse::error(id, err.to_rpc_error());
    }

    match envelope.body {
        MessageBody::RoundAnnouncement { round_id, matches } => {
            let mut accepted = 0u32;
            for assignment in matches {
                if assignment.referee_id != state.config.referee_id {
                    continue;
                }
                accepted += 1;
                let state = Arc::clone(state);
                tokio::spawn(async move {
                    state
                        .orchestrator()
                        .run_match(
                            &assignment.match_id,
                            round_id,
                            &assignment.player_a_id,
                            &assignment.player_b_id,
                        )
                        .await;
                });
            }
            info!(round_id, accepted, "round announcement accepted");
            RpcResponse::success(id, json!({"status": "ok", "matches_accepted": accepted}))
        }
        other => {
            warn!(body = ?other, "unexpected notification body");
            RpcResponse::error(
                id,
                RpcError::invalid_params("unsupported notification message_type"),
            )
        }
    }
}

/// Run one match inline and return its outcome. Mainly for manual driving
/// and tests; announcements use the spawned path instead.
async fn run_match(state: &Arc<RefereeState>, params: Value, id: Value) -> RpcResponse {
    let params: RunMatchParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => {
            return RpcResponse::error(id, RpcError::invalid_params(&e.to_string()));
        }
    };

    let outcome = state
        .orchestrator()
        .run_match(
            &params.match_id,
            params.round_id,
            &params.player_a_id,
            &params.player_b_id,
        )
        .await;
    match serde_json::to_value(&outcome) {
        Ok(value) => RpcResponse::success(id, value),
        Err(e) => RpcResponse::error(id, RpcError::internal_error(&e.to_string())),
    }
}

fn get_match_state(state: &RefereeState, params: Value, id: Value) -> RpcResponse {
    let params: GetMatchStateParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => {
            return RpcResponse::error(id, RpcError::invalid_params(&e.to_string()));
        }
    };
    match state.registry.get(&params.match_id) {
        Some(record) => match serde_json::to_value(&record) {
            Ok(value) => RpcResponse::success(id, value),
            Err(e) => RpcResponse::error(id, RpcError::internal_error(&e.to_string())),
        },
        None => RpcResponse::error(
            id,
            RpcError::invalid_params(&format!("unknown match: {}", params.match_id)),
        ),
    }
}
