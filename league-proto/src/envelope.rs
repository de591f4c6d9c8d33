//! Protocol envelope and typed message bodies
//!
//! Every message between agents is a `league.v2` envelope: a common header
//! (protocol, sender, UTC timestamp, optional league/conversation/auth
//! fields) plus one message-specific body, discriminated on the wire by
//! `message_type`. The body is a tagged union so malformed payloads are
//! rejected during deserialization, before they reach any handler.

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use league_core::{GameOutcome, MatchStatus};
use serde::{Deserialize, Serialize};

/// Protocol tag carried in every envelope.
pub const PROTOCOL_VERSION: &str = "league.v2";

/// Common header plus one typed body, flattened to the original wire shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub protocol: String,
    pub sender: String,
    /// RFC 3339 UTC timestamp with explicit `Z` marker.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(flatten)]
    pub body: MessageBody,
}

impl Envelope {
    /// Envelope stamped with the current UTC time.
    pub fn new(sender: impl Into<String>, body: MessageBody) -> Self {
        Self {
            protocol: PROTOCOL_VERSION.to_string(),
            sender: sender.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            league_id: None,
            conversation_id: None,
            auth_token: None,
            body,
        }
    }

    pub fn with_league_id(mut self, league_id: impl Into<String>) -> Self {
        self.league_id = Some(league_id.into());
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_auth_token(mut self, auth_token: impl Into<String>) -> Self {
        self.auth_token = Some(auth_token.into());
        self
    }
}

/// Message-specific payload, discriminated by `message_type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type")]
pub enum MessageBody {
    /// Referee invites a player into a match.
    #[serde(rename = "GAME_INVITATION")]
    GameInvitation {
        match_id: String,
        round_id: u32,
        game_type: String,
        role_in_match: String,
        opponent_id: String,
    },
    /// Referee asks a player for its parity choice.
    #[serde(rename = "CHOOSE_PARITY_CALL")]
    ChooseParityCall {
        match_id: String,
        player_id: String,
        game_type: String,
        context: MoveContext,
        /// RFC 3339 deadline for the reply.
        deadline: String,
    },
    /// Referee notifies a player of the final outcome.
    #[serde(rename = "GAME_OVER")]
    GameOver {
        match_id: String,
        game_type: String,
        game_result: GameOutcome,
    },
    /// Referee reports a finished match to the league manager.
    #[serde(rename = "MATCH_RESULT_REPORT")]
    MatchResultReport {
        round_id: u32,
        match_id: String,
        game_type: String,
        result: MatchResultPayload,
    },
    /// Manager announces a round's match assignments to the referees.
    #[serde(rename = "ROUND_ANNOUNCEMENT")]
    RoundAnnouncement {
        round_id: u32,
        matches: Vec<MatchAssignment>,
    },
}

/// Context given to a player when asking for a choice.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveContext {
    pub opponent_id: String,
    pub round_id: u32,
    #[serde(default)]
    pub your_standings: StandingsSnapshot,
}

/// A player's running record, included in the move context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsSnapshot {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

/// One match assignment inside a round announcement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchAssignment {
    pub match_id: String,
    #[serde(rename = "player_A_id")]
    pub player_a_id: String,
    #[serde(rename = "player_B_id")]
    pub player_b_id: String,
    pub referee_id: String,
}

/// Result section of a match report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResultPayload {
    pub status: MatchStatus,
    pub winner: Option<String>,
    pub score: HashMap<String, u32>,
    pub reason: String,
    pub drawn_number: u32,
}

impl MatchResultPayload {
    pub fn from_outcome(outcome: &GameOutcome) -> Self {
        Self {
            status: outcome.status,
            winner: outcome.winner_player_id.clone(),
            score: outcome.scores.clone(),
            reason: outcome.reason.clone(),
            drawn_number: outcome.drawn_number,
        }
    }
}

/// Reply to a `GAME_INVITATION`: must affirmatively accept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationReply {
    pub accept: bool,
}

/// Reply to a `CHOOSE_PARITY_CALL`. The choice is validated by the referee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParityReply {
    pub parity_choice: String,
}

/// Generic acknowledgement payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: String,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_header_fields() {
        let env = Envelope::new(
            "referee:REF01",
            MessageBody::GameInvitation {
                match_id: "R1M1".into(),
                round_id: 1,
                game_type: "even_odd".into(),
                role_in_match: "PLAYER_A".into(),
                opponent_id: "P02".into(),
            },
        )
        .with_league_id("league-2026")
        .with_conversation_id("conv-R1M1-120000");

        assert_eq!(env.protocol, PROTOCOL_VERSION);
        assert!(env.timestamp.ends_with('Z'));
        assert_eq!(env.league_id.as_deref(), Some("league-2026"));
    }

    #[test]
    fn test_invitation_wire_shape() {
        let env = Envelope::new(
            "referee:REF01",
            MessageBody::GameInvitation {
                match_id: "R1M1".into(),
                round_id: 1,
                game_type: "even_odd".into(),
                role_in_match: "PLAYER_B".into(),
                opponent_id: "P01".into(),
            },
        );
        let value = serde_json::to_value(&env).unwrap();

        // Body fields sit at the top level, next to the header.
        assert_eq!(value["message_type"], "GAME_INVITATION");
        assert_eq!(value["match_id"], "R1M1");
        assert_eq!(value["role_in_match"], "PLAYER_B");
        assert_eq!(value["protocol"], "league.v2");
        assert!(value.get("auth_token").is_none());
    }

    #[test]
    fn test_round_announcement_round_trip() {
        let env = Envelope::new(
            "league_manager",
            MessageBody::RoundAnnouncement {
                round_id: 2,
                matches: vec![MatchAssignment {
                    match_id: "R2M1".into(),
                    player_a_id: "P01".into(),
                    player_b_id: "P03".into(),
                    referee_id: "REF01".into(),
                }],
            },
        );
        let text = serde_json::to_string(&env).unwrap();
        assert!(text.contains("\"player_A_id\":\"P01\""));

        let back: Envelope = serde_json::from_str(&text).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn test_unknown_message_type_is_rejected() {
        let raw = json!({
            "protocol": "league.v2",
            "sender": "league_manager",
            "timestamp": "2026-01-01T00:00:00Z",
            "message_type": "SOMETHING_ELSE"
        });
        assert!(serde_json::from_value::<Envelope>(raw).is_err());
    }

    #[test]
    fn test_missing_required_body_field_is_rejected() {
        let raw = json!({
            "protocol": "league.v2",
            "sender": "referee:REF01",
            "timestamp": "2026-01-01T00:00:00Z",
            "message_type": "GAME_INVITATION",
            "match_id": "R1M1"
        });
        assert!(serde_json::from_value::<Envelope>(raw).is_err());
    }

    #[test]
    fn test_result_payload_from_outcome() {
        let game = league_core::EvenOddGame::default();
        let outcome = game.resolve(
            "P01",
            "P02",
            league_core::Parity::Even,
            league_core::Parity::Odd,
            8,
        );
        let payload = MatchResultPayload::from_outcome(&outcome);
        assert_eq!(payload.status, MatchStatus::Win);
        assert_eq!(payload.winner.as_deref(), Some("P01"));
        assert_eq!(payload.score["P01"], 3);
        assert_eq!(payload.drawn_number, 8);
    }
}
