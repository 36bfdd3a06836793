//! Error taxonomy of the engine.
//!
//! Three families, matching where the failure is handled:
//!
//! - [`ConfigError`]: rejected configuration. Fatal, raised before any round
//!   executes; no partial match state exists when it is returned.
//! - [`DecisionError`]: a single agent failed to produce a move for a single
//!   round. Always recovered locally by the orchestrator (fallback
//!   substitution or one retry) and never surfaced to the caller.
//! - Match-level aborts are not errors at all: the caller still receives a
//!   [`MatchRecord`](crate::match_record::MatchRecord) carrying an
//!   [`AbortReason`](crate::match_record::AbortReason) and the partial
//!   history up to the abort point.

/// Reasons a match configuration is rejected before orchestration begins.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Round count outside the engine's configured bounds.
    #[error("round count {rounds} is outside the allowed range {min}..={max}")]
    RoundsOutOfRange {
        /// Requested number of rounds.
        rounds: u32,
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },

    /// Sampling temperature outside the accepted interval.
    #[error("sampling temperature {0} is outside [0.0, 2.0]")]
    TemperatureOutOfRange(f32),

    /// The strategy identifier does not name a known strategy.
    #[error("unknown strategy identifier: {0:?}")]
    UnknownStrategy(String),

    /// A random strategy was requested without an explicit seed.
    #[error("the random strategy requires an explicit seed")]
    MissingSeed,

    /// Payoff values do not satisfy the social-dilemma ordering.
    #[error(
        "payoff values (T={temptation}, R={reward}, P={punishment}, S={sucker}) \
         do not form a dilemma: T > R > P > S and 2R > T + S are required"
    )]
    NotADilemma {
        /// Temptation payoff.
        temptation: i32,
        /// Mutual-cooperation reward.
        reward: i32,
        /// Mutual-defection punishment.
        punishment: i32,
        /// Sucker's payoff.
        sucker: i32,
    },

    /// The model identifier of an LLM strategy is empty.
    #[error("model identifier must not be empty")]
    EmptyModel,

    /// An LLM strategy was configured but no text generation backend was given.
    #[error("strategy {0:?} needs a text generation backend but none was provided")]
    MissingGenerator(String),
}

/// A single agent's failure to produce a move for one round.
///
/// The two variants drive different recovery policies in the orchestrator:
/// `Malformed` is substituted with the configured fallback move, `Unavailable`
/// is retried once and aborts the match on a second failure.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The agent answered, but no unambiguous move could be extracted.
    #[error("no unambiguous move in decision output: {response:?}")]
    Malformed {
        /// The offending response, truncated for logging.
        response: String,
    },

    /// The external decision backend failed or exceeded its deadline.
    #[error("decision backend unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}
