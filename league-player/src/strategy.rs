//! Choice strategies
//!
//! A strategy picks a parity for each move and may learn from finished
//! games. The draw is uniform, so no strategy has an edge; the seam exists
//! so player behavior is swappable and observable in tests.

use league_core::{GameOutcome, MatchStatus, Parity};
use league_proto::MoveContext;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Behavior seam for a player's parity decisions.
pub trait ChoiceStrategy: Send {
    fn name(&self) -> &'static str;

    fn choose(&mut self, context: &MoveContext) -> Parity;

    /// Called with every finished game the player took part in.
    fn observe(&mut self, _outcome: &GameOutcome) {}
}

/// Uniform coin flip.
pub struct RandomChoice {
    rng: StdRng,
}

impl RandomChoice {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomChoice {
    fn default() -> Self {
        Self::new()
    }
}

impl ChoiceStrategy for RandomChoice {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose(&mut self, _context: &MoveContext) -> Parity {
        if self.rng.gen::<bool>() {
            Parity::Even
        } else {
            Parity::Odd
        }
    }
}

/// Always the same parity.
pub struct FixedChoice {
    parity: Parity,
}

impl FixedChoice {
    pub fn new(parity: Parity) -> Self {
        Self { parity }
    }
}

impl ChoiceStrategy for FixedChoice {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn choose(&mut self, _context: &MoveContext) -> Parity {
        self.parity
    }
}

/// Flips parity on every move.
pub struct AlternatingChoice {
    next: Parity,
}

impl AlternatingChoice {
    pub fn new() -> Self {
        Self { next: Parity::Even }
    }
}

impl Default for AlternatingChoice {
    fn default() -> Self {
        Self::new()
    }
}

impl ChoiceStrategy for AlternatingChoice {
    fn name(&self) -> &'static str {
        "alternating"
    }

    fn choose(&mut self, _context: &MoveContext) -> Parity {
        let choice = self.next;
        self.next = match choice {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        };
        choice
    }
}

/// Follows the parity drawn most often so far; random until it has seen a
/// skew. Technical losses carry a sentinel draw and are ignored.
pub struct AdaptiveChoice {
    even_draws: u32,
    odd_draws: u32,
    fallback: RandomChoice,
}

impl AdaptiveChoice {
    pub fn new() -> Self {
        Self {
            even_draws: 0,
            odd_draws: 0,
            fallback: RandomChoice::new(),
        }
    }
}

impl Default for AdaptiveChoice {
    fn default() -> Self {
        Self::new()
    }
}

impl ChoiceStrategy for AdaptiveChoice {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn choose(&mut self, context: &MoveContext) -> Parity {
        if self.even_draws > self.odd_draws {
            Parity::Even
        } else if self.odd_draws > self.even_draws {
            Parity::Odd
        } else {
            self.fallback.choose(context)
        }
    }

    fn observe(&mut self, outcome: &GameOutcome) {
        if outcome.status == MatchStatus::TechnicalLoss || outcome.drawn_number == 0 {
            return;
        }
        match outcome.number_parity {
            Parity::Even => self.even_draws += 1,
            Parity::Odd => self.odd_draws += 1,
        }
    }
}

/// Strategy by name, for config and CLI flags.
pub fn strategy_from_name(name: &str) -> Option<Box<dyn ChoiceStrategy>> {
    match name {
        "random" => Some(Box::new(RandomChoice::new())),
        "fixed_even" => Some(Box::new(FixedChoice::new(Parity::Even))),
        "fixed_odd" => Some(Box::new(FixedChoice::new(Parity::Odd))),
        "alternating" => Some(Box::new(AlternatingChoice::new())),
        "adaptive" => Some(Box::new(AdaptiveChoice::new())),
        _ => None,
    }
}
