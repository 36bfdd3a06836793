//! Sealed results of a finished match.

use serde::{Deserialize, Serialize};

use crate::configuration::MatchConfig;
use crate::game::{History, Move};

/// Why a match stopped before reaching its configured round count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbortReason {
    /// An agent's decision backend failed twice in the same round.
    Unavailable,
    /// The caller cancelled the match at a round boundary.
    Cancelled,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Unavailable => write!(f, "unavailable"),
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal state of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// All configured rounds committed.
    Completed,
    /// Stopped early; the history holds every round committed before the abort.
    Aborted(AbortReason),
}

/// The sealed outcome of one match.
///
/// Built exclusively by the orchestrator and immutable once returned. An
/// aborted match still yields a record, with the partial history intact for
/// audit; the engine never fabricates rounds to pad a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// The configuration the match ran under.
    pub config: MatchConfig,
    /// Every committed round, in order.
    pub history: History,
    /// Side A's cumulative score.
    pub score_a: i32,
    /// Side B's cumulative score.
    pub score_b: i32,
    /// Terminal status.
    pub status: MatchStatus,
}

impl MatchRecord {
    /// True if every configured round committed.
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// The wire-shaped summary handed to reporting and persistence layers.
    pub fn summary(&self) -> MatchSummary {
        let (status, abort_reason) = match self.status {
            MatchStatus::Completed => (SummaryStatus::Completed, None),
            MatchStatus::Aborted(reason) => (SummaryStatus::Aborted, Some(reason)),
        };
        MatchSummary {
            scores: SummaryScores {
                agent_a: self.score_a,
                agent_b: self.score_b,
            },
            history: self
                .history
                .rounds()
                .iter()
                .map(|round| (round.move_a, round.move_b))
                .collect(),
            status,
            abort_reason,
        }
    }
}

/// Cumulative scores as reported to external consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryScores {
    /// Side A's cumulative score.
    #[serde(rename = "agentA")]
    pub agent_a: i32,
    /// Side B's cumulative score.
    #[serde(rename = "agentB")]
    pub agent_b: i32,
}

/// Terminal status as reported to external consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryStatus {
    /// The match ran to its configured round count.
    Completed,
    /// The match stopped early; see `abortReason`.
    Aborted,
}

/// Language-agnostic result shape:
/// `{ scores: {agentA, agentB}, history: [[moveA, moveB], ...], status, abortReason? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Cumulative scores per agent.
    pub scores: SummaryScores,
    /// Move pairs per round, side A first.
    pub history: Vec<(Move, Move)>,
    /// `"COMPLETED"` or `"ABORTED"`.
    pub status: SummaryStatus,
    /// Present only when aborted.
    #[serde(rename = "abortReason", default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<AbortReason>,
}

#[cfg(test)]
mod record_tests {
    use super::*;
    use crate::configuration::StrategySpec;
    use crate::game::Round;

    fn record(status: MatchStatus) -> MatchRecord {
        let mut history = History::new();
        history.push(Round {
            index: 0,
            move_a: Move::Cooperate,
            move_b: Move::Defect,
            score_a: 0,
            score_b: 5,
            substituted_a: false,
            substituted_b: false,
        });
        MatchRecord {
            config: MatchConfig::new(StrategySpec::AlwaysCooperate, StrategySpec::AlwaysDefect, 5),
            history,
            score_a: 0,
            score_b: 5,
            status,
        }
    }

    #[test]
    fn completed_summary_matches_wire_shape() {
        let summary = record(MatchStatus::Completed).summary();
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["status"], "COMPLETED");
        assert_eq!(value["scores"]["agentA"], 0);
        assert_eq!(value["scores"]["agentB"], 5);
        assert_eq!(value["history"][0][0], "cooperate");
        assert_eq!(value["history"][0][1], "defect");
        assert!(value.get("abortReason").is_none());
    }

    #[test]
    fn aborted_summary_carries_reason() {
        let summary = record(MatchStatus::Aborted(AbortReason::Unavailable)).summary();
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["status"], "ABORTED");
        assert_eq!(value["abortReason"], "unavailable");
    }
}
