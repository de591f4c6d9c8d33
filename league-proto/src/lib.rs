//! League Protocol - wire contracts for the Even/Odd league
//!
//! This crate defines everything that crosses an agent boundary:
//! - The `league.v2` envelope and its typed message bodies
//! - The JSON-RPC 2.0 request/response frame
//! - The application error taxonomy (stable E-codes)
//!
//! Payloads are tagged unions validated at the RPC boundary; handlers never
//! see loosely shaped JSON.

mod envelope;
mod error;
mod rpc;

pub use envelope::{
    Ack, Envelope, InvitationReply, MatchAssignment, MatchResultPayload, MessageBody,
    MoveContext, ParityReply, StandingsSnapshot, PROTOCOL_VERSION,
};
pub use error::{ErrorCode, LeagueError};
pub use rpc::{
    RpcError, RpcRequest, RpcResponse, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};

/// RPC method names understood by the agents.
pub mod methods {
    pub const GAME_INVITATION: &str = "game_invitation";
    pub const CHOOSE_PARITY: &str = "choose_parity";
    pub const NOTIFY_GAME_OVER: &str = "notify_game_over";
    pub const REPORT_MATCH_RESULT: &str = "report_match_result";
    pub const HANDLE_NOTIFICATION: &str = "handle_notification";
    pub const REGISTER_REFEREE: &str = "register_referee";
    pub const REGISTER_PLAYER: &str = "register_player";
    pub const RUN_MATCH: &str = "run_match";
    pub const START_LEAGUE: &str = "start_league";
    pub const GET_MATCH_STATE: &str = "get_match_state";
    pub const GET_STANDINGS: &str = "get_standings";
    pub const GET_SCHEDULE: &str = "get_schedule";
    pub const HEALTH: &str = "health";
}
