//! Round-robin scheduling - the circle method
//!
//! For n players this produces rounds of disjoint pairings so that every
//! pair meets exactly once: n(n-1)/2 matches overall. An odd player count
//! gets a BYE placeholder whose pairings are dropped.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One match pairing within a round. The two ids are always distinct.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub player_a: String,
    pub player_b: String,
}

impl Pairing {
    /// Identifier-ordered key for duplicate detection.
    fn key(&self) -> (String, String) {
        if self.player_a <= self.player_b {
            (self.player_a.clone(), self.player_b.clone())
        } else {
            (self.player_b.clone(), self.player_a.clone())
        }
    }
}

/// A full tournament schedule: rounds of disjoint pairings.
pub type Schedule = Vec<Vec<Pairing>>;

const BYE: &str = "BYE";

/// Round-robin tournament scheduler.
///
/// Deterministic for a given input ordering; no randomness is involved.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoundRobinScheduler;

impl RoundRobinScheduler {
    /// Create a schedule where every player meets every other exactly once.
    ///
    /// Fewer than 2 players yields an empty schedule. Uses the circle
    /// method: fix the first slot, rotate the rest one position per round,
    /// pair slot `i` with slot `n-1-i`. Pairings against the BYE
    /// placeholder (added for odd counts) are dropped.
    pub fn create_schedule(&self, player_ids: &[String]) -> Schedule {
        let n = player_ids.len();
        if n < 2 {
            return Vec::new();
        }

        let mut players: Vec<String> = player_ids.to_vec();
        if players.len() % 2 == 1 {
            players.push(BYE.to_string());
        }
        let n = players.len();
        let num_rounds = n - 1;

        let mut schedule = Vec::with_capacity(num_rounds);
        for _ in 0..num_rounds {
            let mut round = Vec::with_capacity(n / 2);
            for i in 0..n / 2 {
                let a = &players[i];
                let b = &players[n - 1 - i];
                if a != BYE && b != BYE {
                    round.push(Pairing {
                        player_a: a.clone(),
                        player_b: b.clone(),
                    });
                }
            }
            schedule.push(round);

            // Rotate: [1, 2, 3, 4] -> [1, 4, 2, 3]
            let last = players.pop().expect("working list is non-empty");
            players.insert(1, last);
        }

        schedule
    }

    /// Total matches in a full round robin: n(n-1)/2.
    pub fn total_matches(&self, num_players: usize) -> usize {
        num_players * num_players.saturating_sub(1) / 2
    }

    /// Number of rounds: n-1 for even n, n for odd n (the BYE adds one).
    pub fn num_rounds(&self, num_players: usize) -> usize {
        if num_players < 2 {
            0
        } else if num_players % 2 == 0 {
            num_players - 1
        } else {
            num_players
        }
    }

    /// Matches per round (rounds with a BYE have one fewer).
    pub fn matches_per_round(&self, num_players: usize) -> usize {
        num_players / 2
    }

    /// Check a schedule is a valid round robin for the given players:
    /// no self-pairing, no repeated pair, the expected total, and every
    /// player appearing in exactly n-1 pairings.
    pub fn validate_schedule(&self, schedule: &Schedule, player_ids: &[String]) -> bool {
        let expected_total = self.total_matches(player_ids.len());
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut counts: HashMap<&str, usize> =
            player_ids.iter().map(|id| (id.as_str(), 0)).collect();

        for round in schedule {
            for pairing in round {
                if pairing.player_a == pairing.player_b {
                    return false;
                }
                if !seen.insert(pairing.key()) {
                    return false;
                }
                if let Some(c) = counts.get_mut(pairing.player_a.as_str()) {
                    *c += 1;
                }
                if let Some(c) = counts.get_mut(pairing.player_b.as_str()) {
                    *c += 1;
                }
            }
        }

        if seen.len() != expected_total {
            return false;
        }

        let expected_per_player = player_ids.len().saturating_sub(1);
        counts.values().all(|&c| c == expected_per_player)
    }

    /// Human-readable rendering of a schedule.
    pub fn format_schedule(&self, schedule: &Schedule) -> String {
        let mut lines = Vec::new();
        for (round_num, round) in schedule.iter().enumerate() {
            lines.push(format!("Round {}:", round_num + 1));
            for (match_num, pairing) in round.iter().enumerate() {
                lines.push(format!(
                    "  Match {}: {} vs {}",
                    match_num + 1,
                    pairing.player_a,
                    pairing.player_b
                ));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_schedule_for_two_players() {
        let scheduler = RoundRobinScheduler;
        let players = ids(&["P01", "P02"]);
        let schedule = scheduler.create_schedule(&players);

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].len(), 1);
        let pairing = &schedule[0][0];
        assert!(
            (pairing.player_a == "P01" && pairing.player_b == "P02")
                || (pairing.player_a == "P02" && pairing.player_b == "P01")
        );
    }

    #[test]
    fn test_schedule_for_four_players() {
        let scheduler = RoundRobinScheduler;
        let players = ids(&["P01", "P02", "P03", "P04"]);
        let schedule = scheduler.create_schedule(&players);

        assert_eq!(schedule.len(), 3);
        for round in &schedule {
            assert_eq!(round.len(), 2);
        }
        let total: usize = schedule.iter().map(|r| r.len()).sum();
        assert_eq!(total, 6);
        assert!(scheduler.validate_schedule(&schedule, &players));
    }

    #[test]
    fn test_schedule_for_odd_count_drops_bye() {
        let scheduler = RoundRobinScheduler;
        let players = ids(&["P01", "P02", "P03"]);
        let schedule = scheduler.create_schedule(&players);

        // 3 rounds of one real pairing each; the BYE pairing is dropped.
        assert_eq!(schedule.len(), 3);
        let total: usize = schedule.iter().map(|r| r.len()).sum();
        assert_eq!(total, 3);
        assert!(scheduler.validate_schedule(&schedule, &players));
        for round in &schedule {
            for pairing in round {
                assert_ne!(pairing.player_a, "BYE");
                assert_ne!(pairing.player_b, "BYE");
            }
        }
    }

    #[test]
    fn test_schedule_completeness_across_sizes() {
        let scheduler = RoundRobinScheduler;
        for n in 2..=9 {
            let players: Vec<String> = (1..=n).map(|i| format!("P{:02}", i)).collect();
            let schedule = scheduler.create_schedule(&players);

            let total: usize = schedule.iter().map(|r| r.len()).sum();
            assert_eq!(total, scheduler.total_matches(n), "n={}", n);
            assert_eq!(schedule.len(), scheduler.num_rounds(n), "n={}", n);
            assert!(scheduler.validate_schedule(&schedule, &players), "n={}", n);

            // Disjointness: within one round, no player appears twice.
            for round in &schedule {
                let mut seen = HashSet::new();
                for pairing in round {
                    assert!(seen.insert(pairing.player_a.clone()));
                    assert!(seen.insert(pairing.player_b.clone()));
                }
            }
        }
    }

    #[test]
    fn test_fewer_than_two_players() {
        let scheduler = RoundRobinScheduler;
        assert!(scheduler.create_schedule(&[]).is_empty());
        assert!(scheduler.create_schedule(&ids(&["P01"])).is_empty());
    }

    #[test]
    fn test_counting_helpers() {
        let scheduler = RoundRobinScheduler;
        assert_eq!(scheduler.total_matches(4), 6);
        assert_eq!(scheduler.total_matches(5), 10);
        assert_eq!(scheduler.num_rounds(4), 3);
        assert_eq!(scheduler.num_rounds(5), 5);
        assert_eq!(scheduler.matches_per_round(4), 2);
        assert_eq!(scheduler.matches_per_round(5), 2);
    }

    #[test]
    fn test_validate_rejects_self_pairing() {
        let scheduler = RoundRobinScheduler;
        let players = ids(&["P01", "P02"]);
        let schedule = vec![vec![Pairing {
            player_a: "P01".to_string(),
            player_b: "P01".to_string(),
        }]];
        assert!(!scheduler.validate_schedule(&schedule, &players));
    }

    #[test]
    fn test_validate_rejects_duplicate_pair() {
        let scheduler = RoundRobinScheduler;
        let players = ids(&["P01", "P02"]);
        let pairing = Pairing {
            player_a: "P01".to_string(),
            player_b: "P02".to_string(),
        };
        let reversed = Pairing {
            player_a: "P02".to_string(),
            player_b: "P01".to_string(),
        };
        let schedule = vec![vec![pairing], vec![reversed]];
        assert!(!scheduler.validate_schedule(&schedule, &players));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let scheduler = RoundRobinScheduler;
        let players = ids(&["P01", "P02", "P03", "P04"]);
        let schedule = scheduler.create_schedule(&players);

        let first = scheduler.validate_schedule(&schedule, &players);
        let second = scheduler.validate_schedule(&schedule, &players);
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let scheduler = RoundRobinScheduler;
        let players = ids(&["P01", "P02", "P03", "P04", "P05"]);
        assert_eq!(
            scheduler.create_schedule(&players),
            scheduler.create_schedule(&players)
        );
    }

    #[test]
    fn test_format_schedule() {
        let scheduler = RoundRobinScheduler;
        let players = ids(&["P01", "P02"]);
        let schedule = scheduler.create_schedule(&players);
        let text = scheduler.format_schedule(&schedule);
        assert!(text.contains("Round 1:"));
        assert!(text.contains("vs"));
    }
}
