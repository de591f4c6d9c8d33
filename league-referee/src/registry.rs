//! Match registry - lock-protected table of active match state
//!
//! The only mutable state shared between concurrent match tasks in one
//! referee process. Access goes through an explicit API; phases only move
//! forward.

use std::collections::HashMap;
use std::sync::RwLock;

use league_core::{GameOutcome, Parity};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a match. Strictly forward-moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchPhase {
    Created,
    Invited,
    CollectingChoices,
    Resolved,
    TechnicalLoss,
    Reported,
}

impl MatchPhase {
    /// Legal forward transitions, including the technical-loss fast path
    /// from any pre-resolution phase.
    pub fn can_advance_to(self, next: MatchPhase) -> bool {
        use MatchPhase::*;
        matches!(
            (self, next),
            (Created, Invited)
                | (Invited, CollectingChoices)
                | (CollectingChoices, Resolved)
                | (Created, TechnicalLoss)
                | (Invited, TechnicalLoss)
                | (CollectingChoices, TechnicalLoss)
                | (Resolved, Reported)
                | (TechnicalLoss, Reported)
        )
    }
}

/// State of one match owned by this referee.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: String,
    pub round_id: u32,
    pub player_a: String,
    pub player_b: String,
    pub phase: MatchPhase,
    pub choices: HashMap<String, Parity>,
    pub result: Option<GameOutcome>,
}

impl MatchRecord {
    pub fn new(
        match_id: impl Into<String>,
        round_id: u32,
        player_a: impl Into<String>,
        player_b: impl Into<String>,
    ) -> Self {
        Self {
            match_id: match_id.into(),
            round_id,
            player_a: player_a.into(),
            player_b: player_b.into(),
            phase: MatchPhase::Created,
            choices: HashMap::new(),
            result: None,
        }
    }
}

/// Concurrent-safe keyed store of match records.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: RwLock<HashMap<String, MatchRecord>>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: MatchRecord) {
        self.matches
            .write()
            .expect("registry lock poisoned")
            .insert(record.match_id.clone(), record);
    }

    /// Snapshot of one record.
    pub fn get(&self, match_id: &str) -> Option<MatchRecord> {
        self.matches
            .read()
            .expect("registry lock poisoned")
            .get(match_id)
            .cloned()
    }

    /// Apply a mutation under the write lock. Returns false for unknown ids.
    pub fn update<F>(&self, match_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut MatchRecord),
    {
        let mut matches = self.matches.write().expect("registry lock poisoned");
        match matches.get_mut(match_id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// Advance a match to `next` if that is a legal forward transition.
    pub fn set_phase(&self, match_id: &str, next: MatchPhase) -> bool {
        let mut matches = self.matches.write().expect("registry lock poisoned");
        match matches.get_mut(match_id) {
            Some(record) if record.phase.can_advance_to(next) => {
                record.phase = next;
                true
            }
            _ => false,
        }
    }

    /// Advance only if the current phase matches `expected`.
    pub fn compare_and_set_phase(
        &self,
        match_id: &str,
        expected: MatchPhase,
        next: MatchPhase,
    ) -> bool {
        let mut matches = self.matches.write().expect("registry lock poisoned");
        match matches.get_mut(match_id) {
            Some(record) if record.phase == expected && expected.can_advance_to(next) => {
                record.phase = next;
                true
            }
            _ => false,
        }
    }

    pub fn set_choice(&self, match_id: &str, player_id: &str, choice: Parity) -> bool {
        self.update(match_id, |record| {
            record.choices.insert(player_id.to_string(), choice);
        })
    }

    pub fn set_result(&self, match_id: &str, result: GameOutcome) -> bool {
        self.update(match_id, |record| {
            record.result = Some(result);
        })
    }

    pub fn len(&self) -> usize {
        self.matches.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
