//! League Core - Even/Odd game rules and tournament scheduling
//!
//! This crate provides the pure domain logic:
//! - Outcome resolution for the Even/Odd game
//! - Round-robin schedule generation (circle method)
//! - Scoring configuration
//!
//! Everything here is deterministic given its inputs; randomness (the drawn
//! number) is injected by the caller.

mod game;
mod scheduler;

pub use game::{EvenOddGame, GameOutcome, MatchStatus, Parity, ParityError, Scoring};
pub use scheduler::{Pairing, RoundRobinScheduler, Schedule};
