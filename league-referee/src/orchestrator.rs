//! Match orchestration - one task drives one match end to end
//!
//! Protocol steps, each fanned out to both players concurrently and bounded
//! by its own timeout:
//! 1. GAME_INVITATION - both must affirmatively accept
//! 2. CHOOSE_PARITY_CALL - collect and validate both choices
//! 3. Draw a number and resolve the outcome
//! 4. GAME_OVER to both players (best effort), MATCH_RESULT_REPORT upstream
//!
//! A player that times out, declines, errors, or answers with an invalid
//! choice takes a technical loss for the match; the other player's flow is
//! never blocked on the failing one. When both players fail the same step,
//! the loss goes to the lexicographically smaller id.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use league_core::{EvenOddGame, GameOutcome, Parity};
use league_net::{HttpTransport, ResilientClient, SendOutcome, Transport};
use league_proto::{
    methods, Envelope, InvitationReply, MatchResultPayload, MessageBody, MoveContext,
    ParityReply, RpcResponse,
};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::RefereeConfig;
use crate::registry::{MatchPhase, MatchRecord, MatchRegistry};
use crate::state::EndpointDirectory;

/// Drives one match through its full lifecycle against two player endpoints.
pub struct MatchOrchestrator<T: Transport = HttpTransport> {
    client: Arc<ResilientClient<T>>,
    registry: Arc<MatchRegistry>,
    endpoints: Arc<EndpointDirectory>,
    config: RefereeConfig,
    game: EvenOddGame,
}

impl<T: Transport> MatchOrchestrator<T> {
    pub fn new(
        client: Arc<ResilientClient<T>>,
        registry: Arc<MatchRegistry>,
        endpoints: Arc<EndpointDirectory>,
        config: RefereeConfig,
    ) -> Self {
        let game = EvenOddGame::new(config.scoring);
        Self {
            client,
            registry,
            endpoints,
            config,
            game,
        }
    }

    fn envelope(&self, body: MessageBody, conversation_id: &str) -> Envelope {
        let mut env = Envelope::new(format!("referee:{}", self.config.referee_id), body)
            .with_league_id(&self.config.league_id)
            .with_conversation_id(conversation_id);
        if let Some(token) = &self.config.auth_token {
            env = env.with_auth_token(token);
        }
        env
    }

    /// Run a match, drawing the number from the thread-local source.
    pub async fn run_match(
        &self,
        match_id: &str,
        round_id: u32,
        player_a: &str,
        player_b: &str,
    ) -> GameOutcome {
        let drawn = {
            let mut rng = rand::thread_rng();
            self.game.draw_number(&mut rng)
        };
        self.run_match_with_draw(match_id, round_id, player_a, player_b, drawn)
            .await
    }

    /// Run a match with a pre-supplied drawn number (deterministic path).
    pub async fn run_match_with_draw(
        &self,
        match_id: &str,
        round_id: u32,
        player_a: &str,
        player_b: &str,
        drawn_number: u32,
    ) -> GameOutcome {
        if self.registry.get(match_id).is_none() {
            self.registry
                .insert(MatchRecord::new(match_id, round_id, player_a, player_b));
        }
        let conversation_id = format!("conv-{}-{}", match_id, Utc::now().format("%H%M%S"));
        info!(match_id, player_a, player_b, "match starting");

        // Step 1: invitations, concurrently to both players.
        let (invite_a, invite_b) = tokio::join!(
            self.send_invitation(match_id, round_id, player_a, player_b, "PLAYER_A", &conversation_id),
            self.send_invitation(match_id, round_id, player_b, player_a, "PLAYER_B", &conversation_id),
        );
        self.registry.set_phase(match_id, MatchPhase::Invited);

        if let Some((loser, reason)) =
            first_failure(player_a, player_b, invite_a.err(), invite_b.err())
        {
            warn!(match_id, player_id = %loser, %reason, "invitation failed");
            return self
                .technical_loss(match_id, round_id, player_a, player_b, &loser, reason, &conversation_id)
                .await;
        }

        // Step 2: choice collection, concurrently, each bounded by the
        // move timeout.
        self.registry
            .set_phase(match_id, MatchPhase::CollectingChoices);
        let (choice_a, choice_b) = tokio::join!(
            self.request_choice(match_id, round_id, player_a, player_b, &conversation_id),
            self.request_choice(match_id, round_id, player_b, player_a, &conversation_id),
        );

        if let Ok(choice) = &choice_a {
            self.registry.set_choice(match_id, player_a, *choice);
        }
        if let Ok(choice) = &choice_b {
            self.registry.set_choice(match_id, player_b, *choice);
        }

        if let Some((loser, reason)) = first_failure(
            player_a,
            player_b,
            choice_a.as_ref().err().cloned(),
            choice_b.as_ref().err().cloned(),
        ) {
            warn!(match_id, player_id = %loser, %reason, "choice collection failed");
            return self
                .technical_loss(match_id, round_id, player_a, player_b, &loser, reason, &conversation_id)
                .await;
        }

        // Both Err cases are handled above; the remaining path has both.
        let (choice_a, choice_b) = match (choice_a, choice_b) {
            (Ok(a), Ok(b)) => (a, b),
            _ => unreachable!("choice failures already resolved"),
        };

        // Step 3: resolution.
        let outcome = self
            .game
            .resolve(player_a, player_b, choice_a, choice_b, drawn_number);
        self.registry.set_result(match_id, outcome.clone());
        self.registry.set_phase(match_id, MatchPhase::Resolved);
        info!(
            match_id,
            winner = outcome.winner_player_id.as_deref().unwrap_or("-"),
            number = outcome.drawn_number,
            parity = %outcome.number_parity,
            "match resolved"
        );

        // Step 4: propagation.
        self.finish_match(match_id, round_id, player_a, player_b, &outcome, &conversation_id)
            .await;
        outcome
    }

    /// Force a technical loss and run the propagation step.
    async fn technical_loss(
        &self,
        match_id: &str,
        round_id: u32,
        player_a: &str,
        player_b: &str,
        loser: &str,
        reason: String,
        conversation_id: &str,
    ) -> GameOutcome {
        let outcome = self.game.technical_loss(player_a, player_b, loser, reason);
        self.registry.set_result(match_id, outcome.clone());
        self.registry.set_phase(match_id, MatchPhase::TechnicalLoss);
        self.finish_match(match_id, round_id, player_a, player_b, &outcome, conversation_id)
            .await;
        outcome
    }

    /// Send one invitation. `Err` carries the human-readable failure reason.
    async fn send_invitation(
        &self,
        match_id: &str,
        round_id: u32,
        player_id: &str,
        opponent_id: &str,
        role: &str,
        conversation_id: &str,
    ) -> Result<(), String> {
        let endpoint = self
            .endpoints
            .get(player_id)
            .ok_or_else(|| format!("Player {} has no known endpoint", player_id))?;

        let envelope = self.envelope(
            MessageBody::GameInvitation {
                match_id: match_id.to_string(),
                round_id,
                game_type: self.config.game_type.clone(),
                role_in_match: role.to_string(),
                opponent_id: opponent_id.to_string(),
            },
            conversation_id,
        );

        let step_timeout = Duration::from_secs_f64(self.config.timeouts.invite_timeout_sec);
        let call = self
            .client
            .call(&endpoint, methods::GAME_INVITATION, &envelope, json!(1));

        match tokio::time::timeout(step_timeout, call).await {
            Err(_) => {
                // The abandoned call never reached the breaker.
                self.client.note_failure(&endpoint);
                Err(format!(
                    "Player {} did not respond to invitation (timeout)",
                    player_id
                ))
            }
            Ok(Err(e)) => Err(format!(
                "Player {} failed the invitation: {}",
                player_id, e
            )),
            Ok(Ok(SendOutcome::NoResponse)) => Err(format!(
                "Player {} did not respond to invitation",
                player_id
            )),
            Ok(Ok(SendOutcome::Response(response))) => {
                match parse_result::<InvitationReply>(&response) {
                    Some(reply) if reply.accept => {
                        debug!(match_id, player_id, "invitation accepted");
                        Ok(())
                    }
                    Some(_) => Err(format!("Player {} declined the invitation", player_id)),
                    None => Err(format!(
                        "Player {} returned an invalid invitation reply",
                        player_id
                    )),
                }
            }
        }
    }

    /// Request one player's choice. `Err` carries the failure reason.
    async fn request_choice(
        &self,
        match_id: &str,
        round_id: u32,
        player_id: &str,
        opponent_id: &str,
        conversation_id: &str,
    ) -> Result<Parity, String> {
        let endpoint = self
            .endpoints
            .get(player_id)
            .ok_or_else(|| format!("Player {} has no known endpoint", player_id))?;

        let move_timeout = Duration::from_secs_f64(self.config.timeouts.move_timeout_sec);
        let deadline = (Utc::now() + chrono::Duration::seconds(move_timeout.as_secs() as i64))
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let envelope = self.envelope(
            MessageBody::ChooseParityCall {
                match_id: match_id.to_string(),
                player_id: player_id.to_string(),
                game_type: self.config.game_type.clone(),
                context: MoveContext {
                    opponent_id: opponent_id.to_string(),
                    round_id,
                    your_standings: Default::default(),
                },
                deadline,
            },
            conversation_id,
        );

        let call = self
            .client
            .call(&endpoint, methods::CHOOSE_PARITY, &envelope, json!(2));

        match tokio::time::timeout(move_timeout, call).await {
            Err(_) => {
                self.client.note_failure(&endpoint);
                Err(format!("Player {} timed out on choice", player_id))
            }
            Ok(Err(e)) => Err(format!("Player {} failed the choice call: {}", player_id, e)),
            Ok(Ok(SendOutcome::NoResponse)) => {
                Err(format!("Player {} timed out on choice", player_id))
            }
            Ok(Ok(SendOutcome::Response(response))) => {
                let reply = parse_result::<ParityReply>(&response).ok_or_else(|| {
                    format!("Player {} returned an invalid choice reply", player_id)
                })?;
                reply.parity_choice.parse::<Parity>().map_err(|_| {
                    format!(
                        "Player {} returned an invalid choice: {:?}",
                        player_id, reply.parity_choice
                    )
                })
            }
        }
    }

    /// Step 4: notify both players (best effort) and report upstream.
    /// The match becomes `Reported` after the report attempt either way.
    async fn finish_match(
        &self,
        match_id: &str,
        round_id: u32,
        player_a: &str,
        player_b: &str,
        outcome: &GameOutcome,
        conversation_id: &str,
    ) {
        let (sent_a, sent_b) = tokio::join!(
            self.notify_game_over(match_id, player_a, outcome, conversation_id),
            self.notify_game_over(match_id, player_b, outcome, conversation_id),
        );
        for (player_id, sent) in [(player_a, sent_a), (player_b, sent_b)] {
            if !sent {
                warn!(match_id, player_id, "game-over notification failed");
            }
        }

        if !self.report_result(match_id, round_id, outcome).await {
            error!(match_id, "match result report failed, dropping");
        }
        self.registry.set_phase(match_id, MatchPhase::Reported);
        info!(
            match_id,
            status = ?outcome.status,
            winner = outcome.winner_player_id.as_deref().unwrap_or("-"),
            "match completed"
        );
    }

    async fn notify_game_over(
        &self,
        match_id: &str,
        player_id: &str,
        outcome: &GameOutcome,
        conversation_id: &str,
    ) -> bool {
        let Some(endpoint) = self.endpoints.get(player_id) else {
            return false;
        };
        let envelope = self.envelope(
            MessageBody::GameOver {
                match_id: match_id.to_string(),
                game_type: self.config.game_type.clone(),
                game_result: outcome.clone(),
            },
            conversation_id,
        );

        let step_timeout = Duration::from_secs_f64(self.config.timeouts.notify_timeout_sec);
        let call = self
            .client
            .call(&endpoint, methods::NOTIFY_GAME_OVER, &envelope, json!(null));
        match tokio::time::timeout(step_timeout, call).await {
            Ok(Ok(SendOutcome::Response(_))) => true,
            Err(_) => {
                self.client.note_failure(&endpoint);
                false
            }
            _ => false,
        }
    }

    async fn report_result(&self, match_id: &str, round_id: u32, outcome: &GameOutcome) -> bool {
        let envelope = self.envelope(
            MessageBody::MatchResultReport {
                round_id,
                match_id: match_id.to_string(),
                game_type: self.config.game_type.clone(),
                result: MatchResultPayload::from_outcome(outcome),
            },
            &format!("conv-{}-report", match_id),
        );

        let step_timeout = Duration::from_secs_f64(self.config.timeouts.report_timeout_sec);
        let call = self.client.call(
            &self.config.manager_endpoint,
            methods::REPORT_MATCH_RESULT,
            &envelope,
            json!(100),
        );
        match tokio::time::timeout(step_timeout, call).await {
            Ok(Ok(SendOutcome::Response(_))) => true,
            Err(_) => {
                self.client.note_failure(&self.config.manager_endpoint);
                false
            }
            _ => false,
        }
    }
}

/// Pick the player a step failure is attributed to. When both players fail
/// the same step, the lexicographically smaller id takes the loss.
fn first_failure(
    player_a: &str,
    player_b: &str,
    failure_a: Option<String>,
    failure_b: Option<String>,
) -> Option<(String, String)> {
    match (failure_a, failure_b) {
        (Some(reason_a), Some(reason_b)) => {
            if player_a <= player_b {
                Some((player_a.to_string(), reason_a))
            } else {
                Some((player_b.to_string(), reason_b))
            }
        }
        (Some(reason), None) => Some((player_a.to_string(), reason)),
        (None, Some(reason)) => Some((player_b.to_string(), reason)),
        (None, None) => None,
    }
}

fn parse_result<R: serde::de::DeserializeOwned>(response: &RpcResponse) -> Option<R> {
    response
        .result
        .as_ref()
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}
