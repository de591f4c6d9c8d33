//! League standings
//!
//! Points accumulate from reported match results (win 3, draw 1, loss 0,
//! technical losses count as losses for the offender). The table orders by
//! points, then wins, then id for a stable ranking.

use std::collections::HashMap;
use std::sync::RwLock;

use league_core::MatchStatus;
use league_proto::{MatchResultPayload, StandingsSnapshot};
use serde::{Deserialize, Serialize};

/// One player's running record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub player_id: String,
    pub points: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub matches_played: u32,
}

#[derive(Debug, Default)]
pub struct StandingsTable {
    rows: RwLock<HashMap<String, StandingRow>>,
}

impl StandingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed empty rows so unstarted players still appear in the table.
    pub fn ensure_players<I: IntoIterator<Item = String>>(&self, player_ids: I) {
        let mut rows = self.rows.write().expect("standings lock poisoned");
        for player_id in player_ids {
            rows.entry(player_id.clone()).or_insert_with(|| StandingRow {
                player_id,
                ..StandingRow::default()
            });
        }
    }

    /// Fold one reported result into the table.
    pub fn record_result(&self, result: &MatchResultPayload) {
        let mut rows = self.rows.write().expect("standings lock poisoned");
        for (player_id, points) in &result.score {
            let row = rows
                .entry(player_id.clone())
                .or_insert_with(|| StandingRow {
                    player_id: player_id.clone(),
                    ..StandingRow::default()
                });
            row.points += points;
            row.matches_played += 1;
            match result.status {
                MatchStatus::Draw => row.draws += 1,
                MatchStatus::Win | MatchStatus::TechnicalLoss => {
                    if result.winner.as_deref() == Some(player_id) {
                        row.wins += 1;
                    } else {
                        row.losses += 1;
                    }
                }
            }
        }
    }

    /// Rows ordered by points desc, wins desc, id asc.
    pub fn sorted(&self) -> Vec<StandingRow> {
        let mut rows: Vec<StandingRow> = self
            .rows
            .read()
            .expect("standings lock poisoned")
            .values()
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| b.wins.cmp(&a.wins))
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        rows
    }

    pub fn snapshot_for(&self, player_id: &str) -> StandingsSnapshot {
        self.rows
            .read()
            .expect("standings lock poisoned")
            .get(player_id)
            .map(|row| StandingsSnapshot {
                wins: row.wins,
                losses: row.losses,
                draws: row.draws,
            })
            .unwrap_or_default()
    }

    pub fn leader(&self) -> Option<StandingRow> {
        self.sorted().into_iter().next()
    }
}
