//! Even/Odd game rules - outcome resolution and scoring
//!
//! Two players each declare "even" or "odd", a number from 1-10 is drawn,
//! and whoever matched the number's parity wins. Both right or both wrong
//! is a draw. A player that fails to cooperate takes a technical loss.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A declared parity choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    /// Parity of a drawn number.
    pub fn of(number: u32) -> Self {
        if number % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Parity::Even => "even",
            Parity::Odd => "odd",
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a choice value outside the game's vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid parity choice: {0:?} (must be 'even' or 'odd')")]
pub struct ParityError(pub String);

impl FromStr for Parity {
    type Err = ParityError;

    /// Case-insensitive parse, normalizing to the lowercase vocabulary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "even" => Ok(Parity::Even),
            "odd" => Ok(Parity::Odd),
            _ => Err(ParityError(s.to_string())),
        }
    }
}

/// Match outcome kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Win,
    Draw,
    TechnicalLoss,
}

/// Scoring constants. Defaults follow the league rules: win 3, draw 1, loss 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoring {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

/// Resolved outcome of a single match. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub status: MatchStatus,
    /// Winner id, absent on a draw.
    pub winner_player_id: Option<String>,
    /// Drawn number; 0 is the sentinel for technical losses.
    pub drawn_number: u32,
    pub number_parity: Parity,
    /// Declared choice per player; absent when the player never produced one.
    pub choices: HashMap<String, Option<Parity>>,
    pub scores: HashMap<String, u32>,
    pub reason: String,
}

/// Even/Odd game logic: choice validation, number drawing, winner resolution.
#[derive(Clone, Debug, Default)]
pub struct EvenOddGame {
    scoring: Scoring,
}

impl EvenOddGame {
    pub const MIN_NUMBER: u32 = 1;
    pub const MAX_NUMBER: u32 = 10;

    pub fn new(scoring: Scoring) -> Self {
        Self { scoring }
    }

    pub fn scoring(&self) -> Scoring {
        self.scoring
    }

    /// Draw a number in `1..=10` from the supplied source.
    pub fn draw_number<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(Self::MIN_NUMBER..=Self::MAX_NUMBER)
    }

    /// Resolve a match from both declared choices and the drawn number.
    ///
    /// Exactly one correct guess wins; both correct or both wrong is a draw.
    pub fn resolve(
        &self,
        player_a: &str,
        player_b: &str,
        choice_a: Parity,
        choice_b: Parity,
        drawn_number: u32,
    ) -> GameOutcome {
        let number_parity = Parity::of(drawn_number);
        let a_correct = choice_a == number_parity;
        let b_correct = choice_b == number_parity;

        let choices = HashMap::from([
            (player_a.to_string(), Some(choice_a)),
            (player_b.to_string(), Some(choice_b)),
        ]);

        if a_correct != b_correct {
            let (winner, winner_choice) = if a_correct {
                (player_a, choice_a)
            } else {
                (player_b, choice_b)
            };
            let loser = if a_correct { player_b } else { player_a };
            GameOutcome {
                status: MatchStatus::Win,
                winner_player_id: Some(winner.to_string()),
                drawn_number,
                number_parity,
                choices,
                scores: HashMap::from([
                    (winner.to_string(), self.scoring.win),
                    (loser.to_string(), self.scoring.loss),
                ]),
                reason: format!(
                    "{} chose {}, number was {} ({})",
                    winner, winner_choice, drawn_number, number_parity
                ),
            }
        } else {
            let reason = if a_correct {
                format!(
                    "Both chose correctly ({}), number was {}",
                    number_parity, drawn_number
                )
            } else {
                format!(
                    "Both guessed wrong, number was {} ({})",
                    drawn_number, number_parity
                )
            };
            GameOutcome {
                status: MatchStatus::Draw,
                winner_player_id: None,
                drawn_number,
                number_parity,
                choices,
                scores: HashMap::from([
                    (player_a.to_string(), self.scoring.draw),
                    (player_b.to_string(), self.scoring.draw),
                ]),
                reason,
            }
        }
    }

    /// Forced outcome for a player that failed to cooperate (timeout,
    /// invalid choice, connection failure). The other player wins.
    pub fn technical_loss(
        &self,
        player_a: &str,
        player_b: &str,
        losing_player: &str,
        reason: impl Into<String>,
    ) -> GameOutcome {
        let winner = if losing_player == player_a {
            player_b
        } else {
            player_a
        };

        GameOutcome {
            status: MatchStatus::TechnicalLoss,
            winner_player_id: Some(winner.to_string()),
            drawn_number: 0,
            number_parity: Parity::Even,
            choices: HashMap::from([
                (player_a.to_string(), None),
                (player_b.to_string(), None),
            ]),
            scores: HashMap::from([
                (winner.to_string(), self.scoring.win),
                (losing_player.to_string(), self.scoring.loss),
            ]),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_parity_of_number() {
        assert_eq!(Parity::of(8), Parity::Even);
        assert_eq!(Parity::of(7), Parity::Odd);
        assert_eq!(Parity::of(0), Parity::Even);
    }

    #[test]
    fn test_parity_parse_case_insensitive() {
        assert_eq!("even".parse::<Parity>().unwrap(), Parity::Even);
        assert_eq!("ODD".parse::<Parity>().unwrap(), Parity::Odd);
        assert_eq!(" Even ".parse::<Parity>().unwrap(), Parity::Even);
        assert!("prime".parse::<Parity>().is_err());
        assert!("".parse::<Parity>().is_err());
    }

    #[test]
    fn test_resolve_a_wins_on_even() {
        let game = EvenOddGame::default();
        let outcome = game.resolve("P01", "P02", Parity::Even, Parity::Odd, 8);

        assert_eq!(outcome.status, MatchStatus::Win);
        assert_eq!(outcome.winner_player_id.as_deref(), Some("P01"));
        assert_eq!(outcome.scores["P01"], 3);
        assert_eq!(outcome.scores["P02"], 0);
        assert_eq!(outcome.number_parity, Parity::Even);
    }

    #[test]
    fn test_resolve_b_wins_on_odd() {
        let game = EvenOddGame::default();
        let outcome = game.resolve("P01", "P02", Parity::Even, Parity::Odd, 7);

        assert_eq!(outcome.status, MatchStatus::Win);
        assert_eq!(outcome.winner_player_id.as_deref(), Some("P02"));
        assert_eq!(outcome.scores["P02"], 3);
        assert_eq!(outcome.scores["P01"], 0);
    }

    #[test]
    fn test_resolve_draw_both_correct() {
        let game = EvenOddGame::default();
        let outcome = game.resolve("P01", "P02", Parity::Even, Parity::Even, 4);

        assert_eq!(outcome.status, MatchStatus::Draw);
        assert_eq!(outcome.winner_player_id, None);
        assert_eq!(outcome.scores["P01"], 1);
        assert_eq!(outcome.scores["P02"], 1);
        assert!(outcome.reason.contains("Both chose correctly"));
    }

    #[test]
    fn test_resolve_draw_both_wrong() {
        let game = EvenOddGame::default();
        let outcome = game.resolve("P01", "P02", Parity::Odd, Parity::Odd, 6);

        assert_eq!(outcome.status, MatchStatus::Draw);
        assert_eq!(outcome.winner_player_id, None);
        assert!(outcome.reason.contains("Both guessed wrong"));
    }

    #[test]
    fn test_technical_loss_attribution() {
        let game = EvenOddGame::default();
        let outcome = game.technical_loss("P01", "P02", "P02", "Player P02 timed out on choice");

        assert_eq!(outcome.status, MatchStatus::TechnicalLoss);
        assert_eq!(outcome.winner_player_id.as_deref(), Some("P01"));
        assert_eq!(outcome.scores["P01"], 3);
        assert_eq!(outcome.scores["P02"], 0);
        assert_eq!(outcome.drawn_number, 0);
        assert_eq!(outcome.choices["P01"], None);
        assert_eq!(outcome.choices["P02"], None);
    }

    #[test]
    fn test_custom_scoring() {
        let game = EvenOddGame::new(Scoring {
            win: 2,
            draw: 1,
            loss: 0,
        });
        let outcome = game.resolve("P01", "P02", Parity::Even, Parity::Odd, 2);
        assert_eq!(outcome.scores["P01"], 2);
    }

    #[test]
    fn test_draw_number_in_range() {
        let game = EvenOddGame::default();
        let mut rng = StepRng::new(0, 0x9E3779B97F4A7C15);
        for _ in 0..100 {
            let n = game.draw_number(&mut rng);
            assert!((EvenOddGame::MIN_NUMBER..=EvenOddGame::MAX_NUMBER).contains(&n));
        }
    }

    #[test]
    fn test_outcome_serializes_wire_fields() {
        let game = EvenOddGame::default();
        let outcome = game.resolve("P01", "P02", Parity::Even, Parity::Odd, 8);
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "WIN");
        assert_eq!(json["winner_player_id"], "P01");
        assert_eq!(json["number_parity"], "even");
        assert_eq!(json["choices"]["P02"], "odd");
    }
}
