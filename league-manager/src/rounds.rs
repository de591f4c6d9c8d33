//! League plan and round execution
//!
//! The plan is fixed once the league starts: the round-robin schedule for
//! the registered players, with each pairing assigned a match id
//! (`R{round}M{slot}`, both 1-based) and a referee chosen round-robin over
//! the registered referees. Rounds run strictly in order; a new round is
//! announced only after the previous one's reports are all in (or its
//! timeout passes).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use league_core::RoundRobinScheduler;
use league_net::{ResilientClient, SendOutcome};
use league_proto::{methods, Envelope, MatchAssignment, MessageBody};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::registry::AgentRecord;
use crate::state::ManagerState;

/// One round of the plan: assignments plus where to announce them.
#[derive(Clone, Debug, Serialize)]
pub struct PlannedRound {
    pub round_id: u32,
    pub matches: Vec<MatchAssignment>,
}

/// The full league plan for one run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LeaguePlan {
    pub rounds: Vec<PlannedRound>,
}

impl LeaguePlan {
    /// Build the plan for the given players and referees. Returns an empty
    /// plan when there are fewer than two players or no referees.
    pub fn build(player_ids: &[String], referees: &[AgentRecord]) -> Self {
        if player_ids.len() < 2 || referees.is_empty() {
            return Self::default();
        }
        let schedule = RoundRobinScheduler.create_schedule(player_ids);
        let mut referee_cursor = 0usize;
        let rounds = schedule
            .iter()
            .enumerate()
            .map(|(round_index, pairings)| {
                let round_id = round_index as u32 + 1;
                let matches = pairings
                    .iter()
                    .enumerate()
                    .map(|(slot, pairing)| {
                        let referee = &referees[referee_cursor % referees.len()];
                        referee_cursor += 1;
                        MatchAssignment {
                            match_id: format!("R{}M{}", round_id, slot + 1),
                            player_a_id: pairing.player_a.clone(),
                            player_b_id: pairing.player_b.clone(),
                            referee_id: referee.agent_id.clone(),
                        }
                    })
                    .collect();
                PlannedRound { round_id, matches }
            })
            .collect();
        Self { rounds }
    }

    pub fn total_matches(&self) -> usize {
        self.rounds.iter().map(|r| r.matches.len()).sum()
    }

    pub fn match_ids_for_round(&self, round_id: u32) -> Vec<String> {
        self.rounds
            .iter()
            .find(|r| r.round_id == round_id)
            .map(|r| r.matches.iter().map(|m| m.match_id.clone()).collect())
            .unwrap_or_default()
    }
}

/// Announce one planned round to every referee that owns a match in it.
async fn announce_round(
    state: &ManagerState,
    client: &ResilientClient,
    round: &PlannedRound,
) -> usize {
    let referees = state.agents.referees();
    let mut announced = 0usize;

    for referee in &referees {
        let own: Vec<MatchAssignment> = round
            .matches
            .iter()
            .filter(|m| m.referee_id == referee.agent_id)
            .cloned()
            .collect();
        if own.is_empty() {
            continue;
        }

        let envelope = Envelope::new(
            "league_manager",
            MessageBody::RoundAnnouncement {
                round_id: round.round_id,
                matches: own,
            },
        )
        .with_league_id(&state.config.league_id)
        .with_auth_token(&referee.auth_token);

        match client
            .call(
                &referee.endpoint,
                methods::HANDLE_NOTIFICATION,
                &envelope,
                serde_json::json!(round.round_id),
            )
            .await
        {
            Ok(SendOutcome::Response(_)) => announced += 1,
            Ok(SendOutcome::NoResponse) => {
                warn!(referee_id = %referee.agent_id, round_id = round.round_id, "referee unreachable for announcement");
            }
            Err(e) => {
                warn!(referee_id = %referee.agent_id, error = %e, "announcement rejected");
            }
        }
    }
    announced
}

/// Wait for every match of the round to be reported, bounded by the round
/// timeout. Returns the ids still missing when the bound is hit.
async fn await_round_reports(state: &ManagerState, round_id: u32) -> Vec<String> {
    let expected: HashSet<String> = {
        let plan = state.plan.read().expect("plan lock poisoned");
        plan.match_ids_for_round(round_id).into_iter().collect()
    };
    let deadline = Instant::now() + Duration::from_secs_f64(state.config.round_timeout_sec);
    let poll = Duration::from_secs_f64(state.config.poll_interval_sec);

    loop {
        let missing: Vec<String> = {
            let reported = state.reported.read().expect("report lock poisoned");
            expected
                .iter()
                .filter(|id| !reported.contains_key(*id))
                .cloned()
                .collect()
        };
        if missing.is_empty() {
            return Vec::new();
        }
        if Instant::now() >= deadline {
            return missing;
        }
        tokio::time::sleep(poll).await;
    }
}

/// Drive the whole league: announce each round in order and wait for its
/// reports before moving on. Runs to completion on a spawned task.
pub async fn run_league(state: Arc<ManagerState>) {
    let rounds = {
        let plan = state.plan.read().expect("plan lock poisoned");
        plan.rounds.clone()
    };
    info!(
        league_id = %state.config.league_id,
        rounds = rounds.len(),
        matches = rounds.iter().map(|r| r.matches.len()).sum::<usize>(),
        "league starting"
    );

    for round in &rounds {
        let announced = announce_round(&state, &state.client, round).await;
        if announced == 0 {
            error!(round_id = round.round_id, "no referee reachable, skipping round");
            continue;
        }
        info!(round_id = round.round_id, announced, "round announced");

        let missing = await_round_reports(&state, round.round_id).await;
        if missing.is_empty() {
            info!(round_id = round.round_id, "round complete");
        } else {
            warn!(
                round_id = round.round_id,
                missing = missing.len(),
                "round timed out with unreported matches"
            );
        }
    }

    let leader = state.standings.leader();
    info!(
        league_id = %state.config.league_id,
        winner = leader.as_ref().map(|r| r.player_id.as_str()).unwrap_or("-"),
        "league finished"
    );
    state.mark_finished();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn referees(n: usize) -> Vec<AgentRecord> {
        (1..=n)
            .map(|i| AgentRecord {
                agent_id: format!("REF{:02}", i),
                endpoint: format!("http://ref{}/rpc", i),
                auth_token: format!("tok_ref{}", i),
                display_name: None,
            })
            .collect()
    }

    fn players(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("P{:02}", i)).collect()
    }

    #[test]
    fn test_plan_covers_all_pairings_once() {
        let plan = LeaguePlan::build(&players(4), &referees(2));

        assert_eq!(plan.rounds.len(), 3);
        assert_eq!(plan.total_matches(), 6);

        let mut seen = HashSet::new();
        for round in &plan.rounds {
            for m in &round.matches {
                let key = if m.player_a_id < m.player_b_id {
                    (m.player_a_id.clone(), m.player_b_id.clone())
                } else {
                    (m.player_b_id.clone(), m.player_a_id.clone())
                };
                assert!(seen.insert(key), "duplicate pairing in plan");
            }
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_match_ids_are_round_scoped() {
        let plan = LeaguePlan::build(&players(4), &referees(1));
        assert_eq!(plan.rounds[0].matches[0].match_id, "R1M1");
        assert_eq!(plan.rounds[0].matches[1].match_id, "R1M2");
        assert_eq!(plan.rounds[2].matches[0].match_id, "R3M1");
        assert_eq!(plan.match_ids_for_round(2), vec!["R2M1", "R2M2"]);
    }

    #[test]
    fn test_referees_assigned_round_robin() {
        let plan = LeaguePlan::build(&players(4), &referees(2));
        let assigned: Vec<&str> = plan.rounds[0]
            .matches
            .iter()
            .map(|m| m.referee_id.as_str())
            .collect();
        assert_eq!(assigned, vec!["REF01", "REF02"]);
    }

    #[test]
    fn test_empty_plan_without_enough_participants() {
        assert!(LeaguePlan::build(&players(1), &referees(1)).rounds.is_empty());
        assert!(LeaguePlan::build(&players(4), &[]).rounds.is_empty());
    }

    #[test]
    fn test_odd_player_count_gets_bye_rounds() {
        let plan = LeaguePlan::build(&players(3), &referees(1));
        // Three rounds, one match each; every pairing of real players occurs.
        assert_eq!(plan.rounds.len(), 3);
        assert_eq!(plan.total_matches(), 3);
        for round in &plan.rounds {
            assert_eq!(round.matches.len(), 1);
        }
    }
}
