//! Data model of a repeated simultaneous-move game.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two moves available each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    /// Cooperate with the opponent.
    Cooperate,
    /// Defect against the opponent.
    Defect,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Cooperate => write!(f, "cooperate"),
            Move::Defect => write!(f, "defect"),
        }
    }
}

/// The two sides of a match. Side A is listed first everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// First agent.
    A,
    /// Second agent.
    B,
}

/// One committed round. Never mutated after creation.
///
/// `substituted_*` mark moves the orchestrator forced in place of a malformed
/// decision, so a sealed record stays auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Zero-based round index.
    pub index: u32,
    /// Side A's move.
    pub move_a: Move,
    /// Side B's move.
    pub move_b: Move,
    /// Side A's score for this round.
    pub score_a: i32,
    /// Side B's score for this round.
    pub score_b: i32,
    /// Side A's move was substituted by the engine's fallback policy.
    pub substituted_a: bool,
    /// Side B's move was substituted by the engine's fallback policy.
    pub substituted_b: bool,
}

/// Append-only sequence of committed rounds.
///
/// Exclusively owned and mutated by the orchestrator; strategies only ever see
/// read-only per-side views of it. Invariant: round indices are contiguous
/// from 0, so `history.len()` is always the index of the next round to play.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    rounds: Vec<Round>,
}

impl History {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed rounds.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// True if no round has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// All committed rounds, in order.
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// The moves one side has played so far, in round order.
    pub fn moves_of(&self, side: Side) -> Vec<Move> {
        self.rounds
            .iter()
            .map(|round| match side {
                Side::A => round.move_a,
                Side::B => round.move_b,
            })
            .collect()
    }

    pub(crate) fn push(&mut self, round: Round) {
        assert_eq!(
            round.index as usize,
            self.rounds.len(),
            "round indices must be contiguous"
        );
        self.rounds.push(round);
    }
}
