//! Manager process state

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use league_net::{ResilientClient, RetryPolicy};
use league_proto::MatchResultPayload;
use serde::Serialize;

use crate::config::ManagerConfig;
use crate::registry::AgentRegistry;
use crate::rounds::LeaguePlan;
use crate::standings::StandingsTable;

/// Lifecycle of one league run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaguePhase {
    Registration,
    Running,
    Finished,
}

/// Shared state for one manager process.
pub struct ManagerState {
    pub config: ManagerConfig,
    pub agents: AgentRegistry,
    pub standings: StandingsTable,
    pub plan: RwLock<LeaguePlan>,
    /// Match id to reported result; also serves as round-completion marker.
    pub reported: RwLock<HashMap<String, MatchResultPayload>>,
    pub client: Arc<ResilientClient>,
    phase: AtomicU8,
}

impl ManagerState {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            agents: AgentRegistry::new(),
            standings: StandingsTable::new(),
            plan: RwLock::new(LeaguePlan::default()),
            reported: RwLock::new(HashMap::new()),
            client: Arc::new(ResilientClient::http(RetryPolicy::default())),
            phase: AtomicU8::new(0),
        }
    }

    pub fn phase(&self) -> LeaguePhase {
        match self.phase.load(Ordering::SeqCst) {
            0 => LeaguePhase::Registration,
            1 => LeaguePhase::Running,
            _ => LeaguePhase::Finished,
        }
    }

    /// Move from registration to running. False if already started.
    pub fn mark_running(&self) -> bool {
        self.phase
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn mark_finished(&self) {
        self.phase.store(2, Ordering::SeqCst);
    }

    /// Record a reported result once; duplicate reports are dropped.
    pub fn record_report(&self, match_id: &str, result: MatchResultPayload) -> bool {
        let mut reported = self.reported.write().expect("report lock poisoned");
        if reported.contains_key(match_id) {
            return false;
        }
        self.standings.record_result(&result);
        reported.insert(match_id.to_string(), result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use league_core::MatchStatus;

    fn result(winner: &str, loser: &str) -> MatchResultPayload {
        MatchResultPayload {
            status: MatchStatus::Win,
            winner: Some(winner.to_string()),
            score: HashMap::from([(winner.to_string(), 3), (loser.to_string(), 0)]),
            reason: String::new(),
            drawn_number: 2,
        }
    }

    #[test]
    fn test_phase_transitions() {
        let state = ManagerState::new(ManagerConfig::new("l1"));
        assert_eq!(state.phase(), LeaguePhase::Registration);
        assert!(state.mark_running());
        assert!(!state.mark_running());
        assert_eq!(state.phase(), LeaguePhase::Running);
        state.mark_finished();
        assert_eq!(state.phase(), LeaguePhase::Finished);
    }

    #[test]
    fn test_duplicate_report_is_dropped() {
        let state = ManagerState::new(ManagerConfig::new("l1"));
        assert!(state.record_report("R1M1", result("P01", "P02")));
        assert!(!state.record_report("R1M1", result("P01", "P02")));

        // The duplicate did not double-count points.
        let rows = state.standings.sorted();
        assert_eq!(rows[0].points, 3);
        assert_eq!(rows[0].matches_played, 1);
    }
}
