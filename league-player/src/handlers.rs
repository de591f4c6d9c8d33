//! JSON-RPC endpoint for the player
//!
//! Three referee-driven methods: invitations are accepted, choices come
//! from the configured strategy, and game-over notifications feed the
//! strategy's observation hook.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use league_proto::{
    methods, Ack, Envelope, InvitationReply, LeagueError, MessageBody, ParityReply, RpcError,
    RpcRequest, RpcResponse,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::state::{ActiveMatch, PlayerState};

pub async fn rpc_handler(
    State(state): State<Arc<PlayerState>>,
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
        methods::GAME_INVITATION => game_invitation(&state, request.params, id),
        methods::CHOOSE_PARITY => choose_parity(&state, request.params, id),
        methods::NOTIFY_GAME_OVER => notify_game_over(&state, request.params, id),
        methods::HEALTH => RpcResponse::success(
            id,
            json!({
                "status": "ok",
                "player_id": state.config.player_id,
                "active_matches": state.active_count(),
                "games_played": state.games_played(),
            }),
        ),
        other => RpcResponse::error(id, RpcError::method_not_found(other)),
    };
    Json(response)
}

fn check_auth(state: &PlayerState, envelope: &Envelope) -> Result<(), LeagueError> {
    let Some(expected) = &state.config.auth_token else {
        return Ok(());
    };
    match &envelope.auth_token {
        None => Err(LeagueError::AuthTokenMissing),
        Some(token) if token != expected => Err(LeagueError::AuthTokenInvalid),
        Some(_) => Ok(()),
    }
}

/// Parse and auth-check an envelope, or produce the error response.
fn envelope_for(state: &PlayerState, params: Value, id: &Value) -> Result<Envelope, RpcResponse> {
    let envelope: Envelope = serde_json::from_value(params)
        .map_err(|e| RpcResponse::error(id.clone(), RpcError::invalid_params(&e.to_string())))?;
    if let Err(err) = check_auth(state, &envelope) {
        warn!(sender = %envelope.sender, error = %err, "rejected call");
        return Err(RpcResponse::error(id.clone(), err.to_rpc_error()));
    }
    Ok(envelope)
}

fn game_invitation(state: &PlayerState, params: Value, id: Value) -> RpcResponse {
    let envelope = match envelope_for(state, params, &id) {
        Ok(e) => e,
        Err(response) => return response,
    };
    let MessageBody::GameInvitation {
        match_id,
        round_id,
        role_in_match,
        opponent_id,
        ..
    } = envelope.body
    else {
        return RpcResponse::error(id, RpcError::invalid_params("expected a GAME_INVITATION body"));
    };

    info!(%match_id, %opponent_id, %role_in_match, "invitation accepted");
    state.accept_match(ActiveMatch {
        match_id,
        round_id,
        opponent_id,
        role_in_match,
    });
    let reply = serde_json::to_value(InvitationReply { accept: true })
        .unwrap_or_else(|_| json!({"accept": true}));
    RpcResponse::success(id, reply)
}

fn choose_parity(state: &PlayerState, params: Value, id: Value) -> RpcResponse {
    let envelope = match envelope_for(state, params, &id) {
        Ok(e) => e,
        Err(response) => return response,
    };
    let MessageBody::ChooseParityCall {
        match_id, context, ..
    } = envelope.body
    else {
        return RpcResponse::error(
            id,
            RpcError::invalid_params("expected a CHOOSE_PARITY_CALL body"),
        );
    };

    let choice = state.choose(&context);
    debug!(%match_id, choice = %choice, "parity chosen");
    RpcResponse::success(
        id,
        json!(ParityReply {
            parity_choice: choice.as_str().to_string(),
        }),
    )
}

fn notify_game_over(state: &PlayerState, params: Value, id: Value) -> RpcResponse {
    let envelope = match envelope_for(state, params, &id) {
        Ok(e) => e,
        Err(response) => return response,
    };
    let MessageBody::GameOver {
        match_id,
        game_result,
        ..
    } = envelope.body
    else {
        return RpcResponse::error(id, RpcError::invalid_params("expected a GAME_OVER body"));
    };

    info!(
        %match_id,
        status = ?game_result.status,
        winner = game_result.winner_player_id.as_deref().unwrap_or("-"),
        "game over"
    );
    state.finish_match(&match_id, game_result);
    RpcResponse::success(id, json!(Ack::ok()))
}
