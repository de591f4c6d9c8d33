//! Player process state

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use league_core::GameOutcome;
use serde::Serialize;

use crate::config::PlayerConfig;
use crate::strategy::{strategy_from_name, ChoiceStrategy, RandomChoice};

/// A match this player has accepted and not yet seen finish.
#[derive(Clone, Debug, Serialize)]
pub struct ActiveMatch {
    pub match_id: String,
    pub round_id: u32,
    pub opponent_id: String,
    pub role_in_match: String,
}

/// Shared state for one player process. The strategy is behind a mutex
/// because it mutates on every choice and observation.
pub struct PlayerState {
    pub config: PlayerConfig,
    strategy: Mutex<Box<dyn ChoiceStrategy>>,
    active: RwLock<HashMap<String, ActiveMatch>>,
    finished: RwLock<Vec<GameOutcome>>,
}

impl PlayerState {
    /// Build state from config; an unknown strategy name falls back to
    /// random with a warning.
    pub fn new(config: PlayerConfig) -> Self {
        let strategy = strategy_from_name(&config.strategy).unwrap_or_else(|| {
            tracing::warn!(strategy = %config.strategy, "unknown strategy, using random");
            Box::new(RandomChoice::new())
        });
        Self {
            config,
            strategy: Mutex::new(strategy),
            active: RwLock::new(HashMap::new()),
            finished: RwLock::new(Vec::new()),
        }
    }

    pub fn with_strategy(config: PlayerConfig, strategy: Box<dyn ChoiceStrategy>) -> Self {
        Self {
            config,
            strategy: Mutex::new(strategy),
            active: RwLock::new(HashMap::new()),
            finished: RwLock::new(Vec::new()),
        }
    }

    pub fn accept_match(&self, m: ActiveMatch) {
        self.active
            .write()
            .expect("active lock poisoned")
            .insert(m.match_id.clone(), m);
    }

    pub fn active_match(&self, match_id: &str) -> Option<ActiveMatch> {
        self.active
            .read()
            .expect("active lock poisoned")
            .get(match_id)
            .cloned()
    }

    pub fn active_count(&self) -> usize {
        self.active.read().expect("active lock poisoned").len()
    }

    pub fn choose(&self, context: &league_proto::MoveContext) -> league_core::Parity {
        self.strategy
            .lock()
            .expect("strategy lock poisoned")
            .choose(context)
    }

    /// Move a match to the finished log and feed the outcome to the
    /// strategy.
    pub fn finish_match(&self, match_id: &str, outcome: GameOutcome) {
        self.active
            .write()
            .expect("active lock poisoned")
            .remove(match_id);
        self.strategy
            .lock()
            .expect("strategy lock poisoned")
            .observe(&outcome);
        self.finished
            .write()
            .expect("finished lock poisoned")
            .push(outcome);
    }

    pub fn games_played(&self) -> usize {
        self.finished.read().expect("finished lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use league_core::EvenOddGame;
    use league_core::Parity;

    fn active(match_id: &str) -> ActiveMatch {
        ActiveMatch {
            match_id: match_id.into(),
            round_id: 1,
            opponent_id: "P02".into(),
            role_in_match: "PLAYER_A".into(),
        }
    }

    #[test]
    fn test_match_lifecycle() {
        let state = PlayerState::new(PlayerConfig::new("P01"));
        state.accept_match(active("R1M1"));
        assert_eq!(state.active_count(), 1);
        assert_eq!(state.active_match("R1M1").unwrap().opponent_id, "P02");

        let game = EvenOddGame::default();
        let outcome = game.resolve("P01", "P02", Parity::Even, Parity::Odd, 4);
        state.finish_match("R1M1", outcome);

        assert_eq!(state.active_count(), 0);
        assert_eq!(state.games_played(), 1);
    }

    #[test]
    fn test_unknown_strategy_falls_back_to_random() {
        let state = PlayerState::new(PlayerConfig::new("P01").with_strategy("psychic"));
        let context = league_proto::MoveContext::default();
        // Still able to choose.
        let _ = state.choose(&context);
    }
}
