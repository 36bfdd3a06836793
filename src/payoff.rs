//! Payoff matrix of the stage game.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::game::Move;

/// Scores a pair of simultaneous moves.
///
/// The four values are the classic temptation `T`, reward `R`, punishment `P`
/// and sucker's payoff `S`. Construction enforces `T > R > P > S` and
/// `2R > T + S`, so a table that does not describe a social dilemma is
/// rejected before any round is played.
///
/// A matrix deserialized from stored configuration is re-validated when the
/// enclosing [`MatchConfig`](crate::configuration::MatchConfig) is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffMatrix {
    temptation: i32,
    reward: i32,
    punishment: i32,
    sucker: i32,
}

impl PayoffMatrix {
    /// Builds a validated matrix from `(T, R, P, S)`.
    ///
    /// # Errors
    /// [`ConfigError::NotADilemma`] if the ordering constraints fail.
    pub fn new(temptation: i32, reward: i32, punishment: i32, sucker: i32) -> Result<Self, ConfigError> {
        let matrix = Self {
            temptation,
            reward,
            punishment,
            sucker,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// The canonical table `T=5, R=3, P=1, S=0`.
    pub fn canonical() -> Self {
        Self {
            temptation: 5,
            reward: 3,
            punishment: 1,
            sucker: 0,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.temptation > self.reward
            && self.reward > self.punishment
            && self.punishment > self.sucker;
        // 2R > T + S keeps alternating exploitation below mutual cooperation.
        let dilemma = 2 * self.reward > self.temptation + self.sucker;
        if ordered && dilemma {
            Ok(())
        } else {
            Err(ConfigError::NotADilemma {
                temptation: self.temptation,
                reward: self.reward,
                punishment: self.punishment,
                sucker: self.sucker,
            })
        }
    }

    /// Scores one round; pure and total over the four move combinations.
    pub fn score(&self, move_a: Move, move_b: Move) -> (i32, i32) {
        match (move_a, move_b) {
            (Move::Cooperate, Move::Cooperate) => (self.reward, self.reward),
            (Move::Defect, Move::Defect) => (self.punishment, self.punishment),
            (Move::Defect, Move::Cooperate) => (self.temptation, self.sucker),
            (Move::Cooperate, Move::Defect) => (self.sucker, self.temptation),
        }
    }

    /// Temptation payoff `T`.
    pub fn temptation(&self) -> i32 {
        self.temptation
    }

    /// Mutual-cooperation reward `R`.
    pub fn reward(&self) -> i32 {
        self.reward
    }

    /// Mutual-defection punishment `P`.
    pub fn punishment(&self) -> i32 {
        self.punishment
    }

    /// Sucker's payoff `S`.
    pub fn sucker(&self) -> i32 {
        self.sucker
    }
}

impl Default for PayoffMatrix {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod payoff_tests {
    use super::*;

    #[test]
    fn canonical_scores_all_combinations() {
        let payoff = PayoffMatrix::canonical();
        assert_eq!(payoff.score(Move::Cooperate, Move::Cooperate), (3, 3));
        assert_eq!(payoff.score(Move::Defect, Move::Defect), (1, 1));
        assert_eq!(payoff.score(Move::Defect, Move::Cooperate), (5, 0));
        assert_eq!(payoff.score(Move::Cooperate, Move::Defect), (0, 5));
    }

    #[test]
    fn rejects_broken_ordering() {
        // S >= P
        assert!(PayoffMatrix::new(5, 3, 1, 2).is_err());
        // T <= R
        assert!(PayoffMatrix::new(3, 3, 1, 0).is_err());
    }

    #[test]
    fn rejects_exploitable_alternation() {
        // ordering holds but 2R == T + S
        assert!(PayoffMatrix::new(10, 5, 1, 0).is_err());
    }

    #[test]
    fn accepts_custom_dilemma() {
        let payoff = PayoffMatrix::new(7, 5, 2, 0).unwrap();
        assert_eq!(payoff.score(Move::Defect, Move::Cooperate), (7, 0));
    }
}
