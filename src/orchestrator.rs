//! Match orchestration: drives N rounds between two strategies.
//!
//! One [`MatchOrchestrator`] runs exactly one match. Construction validates
//! the configuration and instantiates both strategies (the CONFIGURED state);
//! [`MatchOrchestrator::run`] consumes the orchestrator (RUNNING) and always
//! returns a sealed [`MatchRecord`], either COMPLETED or ABORTED with the
//! partial history intact. Terminal states are final: a new match requires a
//! new orchestrator.
//!
//! # Failure policy
//!
//! Per round and per agent:
//! - a malformed decision is substituted with the engine's fallback move
//!   (DEFECT by default) and flagged in the round metadata; the match goes on;
//! - an unavailable backend (error or deadline expiry) is retried once with
//!   the same history; a second failure aborts the match. No synthetic rounds
//!   are fabricated to reach the configured round count.
//!
//! Rounds are simultaneous: both decisions are collected before either score
//! is committed, so no strategy ever observes the opponent's same-round move.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, trace, warn};

use crate::configuration::{EngineSettings, MatchConfig};
use crate::errors::{ConfigError, DecisionError};
use crate::game::{History, Move, Round, Side};
use crate::llm_client::TextGenerator;
use crate::logger;
use crate::match_record::{AbortReason, MatchRecord, MatchStatus};
use crate::strategy::{build_strategy, Strategy};

/// Cooperative cancellation handle for a running match.
///
/// Cancellation is observed at round boundaries only: a round in flight
/// always either commits fully or not at all, and the match then seals as
/// `ABORTED(Cancelled)`.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Requests cancellation before the next round starts.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Drives one match between two strategies.
pub struct MatchOrchestrator {
    config: MatchConfig,
    settings: EngineSettings,
    strategy_a: Box<dyn Strategy>,
    strategy_b: Box<dyn Strategy>,
    history: History,
    score_a: i32,
    score_b: i32,
    cancel: Arc<AtomicBool>,
}

impl MatchOrchestrator {
    /// Creates an orchestrator for a match between deterministic strategies.
    ///
    /// # Errors
    /// [`ConfigError`] when the configuration is invalid or names an LLM
    /// strategy (which needs [`MatchOrchestrator::with_generator`]). Nothing
    /// is executed and no partial state exists on error.
    pub fn new(config: MatchConfig, settings: EngineSettings) -> Result<Self, ConfigError> {
        Self::build(config, settings, None)
    }

    /// Creates an orchestrator whose LLM strategies call `generator`.
    ///
    /// # Errors
    /// [`ConfigError`] when the configuration is invalid.
    pub fn with_generator(
        config: MatchConfig,
        settings: EngineSettings,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self, ConfigError> {
        Self::build(config, settings, Some(generator))
    }

    /// Creates an orchestrator running two caller-supplied strategies.
    ///
    /// The specs inside `config` are validated and recorded in the sealed
    /// record as usual, but the supplied instances are what actually plays.
    ///
    /// # Errors
    /// [`ConfigError`] when the configuration is invalid.
    pub fn with_strategies(
        config: MatchConfig,
        settings: EngineSettings,
        strategy_a: Box<dyn Strategy>,
        strategy_b: Box<dyn Strategy>,
    ) -> Result<Self, ConfigError> {
        config.validate(&settings)?;
        if settings.log {
            logger::init_file_logger();
        }
        Ok(Self {
            config,
            settings,
            strategy_a,
            strategy_b,
            history: History::new(),
            score_a: 0,
            score_b: 0,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    fn build(
        config: MatchConfig,
        settings: EngineSettings,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Result<Self, ConfigError> {
        config.validate(&settings)?;
        let strategy_a = build_strategy(&config.strategy_a, config.payoff, generator.as_ref())?;
        let strategy_b = build_strategy(&config.strategy_b, config.payoff, generator.as_ref())?;
        Self::with_strategies(config, settings, strategy_a, strategy_b)
    }

    /// A handle that cancels this match at the next round boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: self.cancel.clone(),
        }
    }

    /// Runs the match to a terminal state.
    ///
    /// Always returns a sealed record: COMPLETED after the configured number
    /// of rounds, or ABORTED with the partial history when a backend stays
    /// unavailable or the caller cancels.
    #[instrument(skip_all, fields(rounds = self.config.rounds))]
    pub async fn run(mut self) -> MatchRecord {
        info!(
            strategy_a = self.strategy_a.name(),
            strategy_b = self.strategy_b.name(),
            "starting match"
        );

        for index in 0..self.config.rounds {
            if self.cancel.load(Ordering::Relaxed) {
                info!(round = index, "match cancelled");
                return self.seal(MatchStatus::Aborted(AbortReason::Cancelled));
            }
            match self.play_round(index).await {
                Ok(round) => {
                    self.score_a += round.score_a;
                    self.score_b += round.score_b;
                    self.history.push(round);
                }
                Err(reason) => {
                    warn!(round = index, %reason, "aborting match");
                    return self.seal(MatchStatus::Aborted(reason));
                }
            }
        }

        info!(score_a = self.score_a, score_b = self.score_b, "match completed");
        self.seal(MatchStatus::Completed)
    }

    /// Plays one atomic round: both moves are collected before any score is
    /// committed.
    async fn play_round(&mut self, index: u32) -> Result<Round, AbortReason> {
        let moves_a = self.history.moves_of(Side::A);
        let moves_b = self.history.moves_of(Side::B);
        debug_assert_eq!(moves_a.len(), index as usize);

        let deadline = self.settings.decision_timeout;
        let fallback = self.settings.fallback_move;
        let (decision_a, decision_b) = tokio::join!(
            collect_move(
                self.strategy_a.as_mut(),
                &moves_a,
                &moves_b,
                index,
                deadline,
                fallback,
            ),
            collect_move(
                self.strategy_b.as_mut(),
                &moves_b,
                &moves_a,
                index,
                deadline,
                fallback,
            ),
        );
        let (move_a, substituted_a) = decision_a?;
        let (move_b, substituted_b) = decision_b?;

        let (score_a, score_b) = self.config.payoff.score(move_a, move_b);
        trace!(round = index, %move_a, %move_b, score_a, score_b);
        Ok(Round {
            index,
            move_a,
            move_b,
            score_a,
            score_b,
            substituted_a,
            substituted_b,
        })
    }

    fn seal(self, status: MatchStatus) -> MatchRecord {
        MatchRecord {
            config: self.config,
            history: self.history,
            score_a: self.score_a,
            score_b: self.score_b,
            status,
        }
    }
}

/// Obtains one agent's move for one round, applying the local recovery
/// policy. Returns the move plus whether it was substituted, or the abort
/// reason when recovery is exhausted.
async fn collect_move(
    strategy: &mut dyn Strategy,
    own: &[Move],
    opponent: &[Move],
    index: u32,
    deadline: Duration,
    fallback: Move,
) -> Result<(Move, bool), AbortReason> {
    match attempt(strategy, own, opponent, index, deadline).await {
        Ok(chosen) => Ok((chosen, false)),
        Err(DecisionError::Malformed { response }) => {
            warn!(
                agent = strategy.name(),
                round = index,
                response,
                "malformed decision, substituting fallback move"
            );
            Ok((fallback, true))
        }
        Err(DecisionError::Unavailable(error)) => {
            warn!(
                agent = strategy.name(),
                round = index,
                error = %error,
                "decision backend unavailable, retrying once"
            );
            match attempt(strategy, own, opponent, index, deadline).await {
                Ok(chosen) => Ok((chosen, false)),
                Err(DecisionError::Malformed { response }) => {
                    warn!(
                        agent = strategy.name(),
                        round = index,
                        response,
                        "malformed decision on retry, substituting fallback move"
                    );
                    Ok((fallback, true))
                }
                Err(DecisionError::Unavailable(error)) => {
                    warn!(
                        agent = strategy.name(),
                        round = index,
                        error = %error,
                        "decision backend unavailable twice"
                    );
                    Err(AbortReason::Unavailable)
                }
            }
        }
    }
}

/// One decision attempt under the per-call deadline.
async fn attempt(
    strategy: &mut dyn Strategy,
    own: &[Move],
    opponent: &[Move],
    index: u32,
    deadline: Duration,
) -> Result<Move, DecisionError> {
    match tokio::time::timeout(deadline, strategy.decide(own, opponent, index)).await {
        Ok(decision) => decision,
        Err(_) => Err(DecisionError::Unavailable(anyhow::anyhow!(
            "decision did not finish within {deadline:?}"
        ))),
    }
}
