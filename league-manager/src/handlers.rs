//! JSON-RPC endpoint for the league manager
//!
//! Registration, result intake, and the read-only queries all arrive on
//! the same POST route. Reports are accepted only from registered referee
//! tokens when auth is enabled, and only while a run is in progress.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use league_proto::{
    methods, Envelope, LeagueError, MessageBody, RpcError, RpcRequest, RpcResponse,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::rounds::{run_league, LeaguePlan};
use crate::state::{LeaguePhase, ManagerState};

#[derive(Debug, Deserialize)]
struct RegisterParams {
    endpoint: String,
    #[serde(default)]
    display_name: Option<String>,
}

pub async fn rpc_handler(
    State(state): State<Arc<ManagerState>>,
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
        methods::REGISTER_REFEREE => register_referee(&state, request.params, id),
        methods::REGISTER_PLAYER => register_player(&state, request.params, id),
        methods::REPORT_MATCH_RESULT => report_match_result(&state, request.params, id),
        methods::START_LEAGUE => start_league(&state, id),
        methods::GET_STANDINGS => RpcResponse::success(
            id,
            json!({"phase": state.phase(), "standings": state.standings.sorted()}),
        ),
        methods::GET_SCHEDULE => {
            let plan = state.plan.read().expect("plan lock poisoned");
            match serde_json::to_value(&*plan) {
                Ok(value) => RpcResponse::success(id, value),
                Err(e) => RpcResponse::error(id, RpcError::internal_error(&e.to_string())),
            }
        }
        methods::HEALTH => RpcResponse::success(
            id,
            json!({
                "status": "ok",
                "league_id": state.config.league_id,
                "phase": state.phase(),
                "players": state.agents.player_count(),
                "referees": state.agents.referee_count(),
            }),
        ),
        other => RpcResponse::error(id, RpcError::method_not_found(other)),
    };
    Json(response)
}

fn register_referee(state: &ManagerState, params: Value, id: Value) -> RpcResponse {
    let params: RegisterParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return RpcResponse::error(id, RpcError::invalid_params(&e.to_string())),
    };
    if state.phase() != LeaguePhase::Registration {
        return RpcResponse::error(id, RpcError::invalid_params("registration is closed"));
    }
    let record = state
        .agents
        .register_referee(&params.endpoint, params.display_name);
    info!(referee_id = %record.agent_id, endpoint = %record.endpoint, "referee registered");
    RpcResponse::success(
        id,
        json!({"referee_id": record.agent_id, "auth_token": record.auth_token}),
    )
}

fn register_player(state: &ManagerState, params: Value, id: Value) -> RpcResponse {
    let params: RegisterParams = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return RpcResponse::error(id, RpcError::invalid_params(&e.to_string())),
    };
    if state.phase() != LeaguePhase::Registration {
        return RpcResponse::error(id, RpcError::invalid_params("registration is closed"));
    }
    let record = state
        .agents
        .register_player(&params.endpoint, params.display_name);
    info!(player_id = %record.agent_id, endpoint = %record.endpoint, "player registered");
    RpcResponse::success(
        id,
        json!({"player_id": record.agent_id, "auth_token": record.auth_token}),
    )
}

fn check_report_auth(state: &ManagerState, envelope: &Envelope) -> Result<(), LeagueError> {
    if !state.config.require_auth {
        return Ok(());
    }
    match &envelope.auth_token {
        None => Err(LeagueError::AuthTokenMissing),
        Some(token) if !state.agents.is_referee_token(token) => {
            Err(LeagueError::AuthTokenInvalid)
        }
        Some(_) => Ok(()),
    }
}

fn report_match_result(state: &ManagerState, params: Value, id: Value) -> RpcResponse {
    let envelope: Envelope = match serde_json::from_value(params) {
        Ok(e) => e,
        Err(e) => return RpcResponse::error(id, RpcError::invalid_params(&e.to_string())),
    };
    if let Err(err) = check_report_auth(state, &envelope) {
        warn!(sender = %envelope.sender, error = %err, "rejected report");
        return RpcResponse::error(id, err.to_rpc_error());
    }

    let MessageBody::MatchResultReport {
        round_id,
        match_id,
        result,
        ..
    } = envelope.body
    else {
        return RpcResponse::error(
            id,
            RpcError::invalid_params("expected a MATCH_RESULT_REPORT body"),
        );
    };

    let accepted = state.record_report(&match_id, result);
    if accepted {
        info!(round_id, %match_id, "match result recorded");
    } else {
        warn!(round_id, %match_id, "duplicate match report ignored");
    }
    RpcResponse::success(id, json!({"status": "ok", "accepted": accepted}))
}

/// Freeze registrations, build the plan, and drive the rounds on a task.
fn start_league(state: &Arc<ManagerState>, id: Value) -> RpcResponse {
    if state.agents.player_count() < state.config.min_players {
        return RpcResponse::error(
            id,
            RpcError::invalid_params(&format!(
                "need at least {} players, have {}",
                state.config.min_players,
                state.agents.player_count()
            )),
        );
    }
    if state.agents.referee_count() == 0 {
        return RpcResponse::error(id, RpcError::invalid_params("no referees registered"));
    }
    if !state.mark_running() {
        return RpcResponse::error(id, RpcError::invalid_params("league already started"));
    }

    let player_ids: Vec<String> = state
        .agents
        .players()
        .into_iter()
        .map(|p| p.agent_id)
        .collect();
    let plan = LeaguePlan::build(&player_ids, &state.agents.referees());
    let summary = json!({
        "status": "started",
        "rounds": plan.rounds.len(),
        "total_matches": plan.total_matches(),
    });
    state.standings.ensure_players(player_ids);
    *state.plan.write().expect("plan lock poisoned") = plan;

    let state = Arc::clone(state);
    tokio::spawn(async move {
        run_league(state).await;
    });

    RpcResponse::success(id, summary)
}
