//! Config for the match engine.
//!
//! Two layers of configuration exist:
//!
//! - [`EngineSettings`]: process-wide policy of the engine itself (round
//!   bounds, per-decision deadline, fallback move, logging). Created
//!   programmatically with [`EngineSettings::new()`] or from environment
//!   variables with [`EngineSettings::from_env()`].
//! - [`MatchConfig`]: the description of one match (the two strategy specs,
//!   round count, payoff table). Validated against the engine settings before
//!   any round executes.
//!
//! # Environment Variables
//!
//! The following environment variables override [`EngineSettings`] defaults.
//! All values are optional.
//!
//! - `DILEMMA_MIN_ROUNDS` — Minimum allowed round count (default: `5`)
//! - `DILEMMA_MAX_ROUNDS` — Maximum allowed round count (default: `100`)
//! - `DILEMMA_DECISION_TIMEOUT_MS` — Deadline per decision call in milliseconds (default: `30000`)
//! - `DILEMMA_LOG` — Set to `"true"` to enable logging to a file (default: `false`)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::game::Move;
use crate::payoff::PayoffMatrix;

/// Default lower bound on the configurable round count.
pub const DEFAULT_MIN_ROUNDS: u32 = 5;
/// Default upper bound on the configurable round count.
pub const DEFAULT_MAX_ROUNDS: u32 = 100;
const DEFAULT_DECISION_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide policy for match execution.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub(crate) min_rounds: u32,
    pub(crate) max_rounds: u32,
    pub(crate) decision_timeout: Duration,
    pub(crate) fallback_move: Move,
    pub(crate) log: bool,
}

impl EngineSettings {
    /// Create settings with default policy.
    ///
    /// By default:
    /// - Round counts between 5 and 100 are accepted.
    /// - Each decision call gets a 30 second deadline.
    /// - A malformed decision is substituted with [`Move::Defect`].
    /// - Logging to file is disabled.
    pub fn new() -> Self {
        Self {
            min_rounds: DEFAULT_MIN_ROUNDS,
            max_rounds: DEFAULT_MAX_ROUNDS,
            decision_timeout: DEFAULT_DECISION_TIMEOUT,
            fallback_move: Move::Defect,
            log: false,
        }
    }

    /// Create settings from environment variables.
    ///
    /// See the module documentation for the recognized variables. Any unset or
    /// unparsable variable falls back to its default.
    pub fn from_env() -> Self {
        fn parse_u32(var: &str, default: u32) -> u32 {
            env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        }

        let min_rounds = parse_u32("DILEMMA_MIN_ROUNDS", DEFAULT_MIN_ROUNDS);
        let max_rounds = parse_u32("DILEMMA_MAX_ROUNDS", DEFAULT_MAX_ROUNDS);
        let decision_timeout = env::var("DILEMMA_DECISION_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DECISION_TIMEOUT);
        let log = env::var("DILEMMA_LOG")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            min_rounds,
            max_rounds,
            decision_timeout,
            fallback_move: Move::Defect,
            log,
        }
    }

    /// Sets the accepted round-count range (inclusive).
    #[must_use]
    pub fn with_round_bounds(mut self, min: u32, max: u32) -> Self {
        assert!(min >= 1 && min <= max, "round bounds must satisfy 1 <= min <= max");
        self.min_rounds = min;
        self.max_rounds = max;
        self
    }

    /// Sets the deadline applied to every single decision call.
    #[must_use]
    pub fn with_decision_timeout(mut self, deadline: Duration) -> Self {
        self.decision_timeout = deadline;
        self
    }

    /// Sets the move substituted when an agent's decision is malformed.
    #[must_use]
    pub fn with_fallback_move(mut self, fallback: Move) -> Self {
        self.fallback_move = fallback;
        self
    }

    /// Enable or disable logging to a file.
    #[must_use]
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Variant-specific description of one agent.
///
/// Deterministic variants carry no configuration beyond an optional seed; the
/// LLM variant carries its sampling parameters. A spec is immutable once a
/// match starts and is recorded verbatim in the sealed
/// [`MatchRecord`](crate::match_record::MatchRecord).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategySpec {
    /// Cooperates every round.
    AlwaysCooperate,
    /// Defects every round.
    AlwaysDefect,
    /// Cooperates first, then replies with the opponent's previous move.
    TitForTat,
    /// Cooperates until the opponent's first defection, then defects forever.
    GrimTrigger,
    /// Draws uniformly at random from an explicitly seeded generator.
    Random {
        /// Seed of the per-match random source; injected, never ambient.
        seed: u64,
    },
    /// Asks an external text-generation model for each move.
    Llm {
        /// Model identifier understood by the backend.
        model: String,
        /// Sampling temperature in `[0, 2]`. `temperature = 0` narrows but
        /// does not guarantee determinism across calls.
        temperature: f32,
        /// Optional system prompt prefixed to every request.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        system_prompt: Option<String>,
    },
}

impl StrategySpec {
    /// A seeded random strategy.
    pub fn random(seed: u64) -> Self {
        StrategySpec::Random { seed }
    }

    /// An LLM-backed strategy with no system prompt.
    pub fn llm(model: impl Into<String>, temperature: f32) -> Self {
        StrategySpec::Llm {
            model: model.into(),
            temperature,
            system_prompt: None,
        }
    }

    /// The stable identifier of this variant.
    pub fn identifier(&self) -> &'static str {
        match self {
            StrategySpec::AlwaysCooperate => "always_cooperate",
            StrategySpec::AlwaysDefect => "always_defect",
            StrategySpec::TitForTat => "tit_for_tat",
            StrategySpec::GrimTrigger => "grim_trigger",
            StrategySpec::Random { .. } => "random",
            StrategySpec::Llm { .. } => "llm",
        }
    }

    /// True for the LLM-backed variant.
    pub fn is_llm(&self) -> bool {
        matches!(self, StrategySpec::Llm { .. })
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let StrategySpec::Llm {
            model, temperature, ..
        } = self
        {
            if model.trim().is_empty() {
                return Err(ConfigError::EmptyModel);
            }
            if !(0.0..=2.0).contains(temperature) {
                return Err(ConfigError::TemperatureOutOfRange(*temperature));
            }
        }
        Ok(())
    }
}

impl FromStr for StrategySpec {
    type Err = ConfigError;

    /// Parses the identifiers used by inbound requests. Only variants that
    /// need no further configuration can be parsed from a bare identifier;
    /// `random` and `llm` are assembled by [`MatchRequest`] instead.
    fn from_str(identifier: &str) -> Result<Self, Self::Err> {
        match identifier {
            "always_cooperate" => Ok(StrategySpec::AlwaysCooperate),
            "always_defect" => Ok(StrategySpec::AlwaysDefect),
            "tit_for_tat" => Ok(StrategySpec::TitForTat),
            "grim_trigger" => Ok(StrategySpec::GrimTrigger),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Full description of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Side A's strategy.
    pub strategy_a: StrategySpec,
    /// Side B's strategy.
    pub strategy_b: StrategySpec,
    /// Number of rounds to play.
    pub rounds: u32,
    /// Payoff table; canonical unless the experiment configures its own.
    #[serde(default)]
    pub payoff: PayoffMatrix,
}

impl MatchConfig {
    /// A match over the canonical payoff table.
    pub fn new(strategy_a: StrategySpec, strategy_b: StrategySpec, rounds: u32) -> Self {
        Self {
            strategy_a,
            strategy_b,
            rounds,
            payoff: PayoffMatrix::canonical(),
        }
    }

    /// Replaces the payoff table.
    #[must_use]
    pub fn with_payoff(mut self, payoff: PayoffMatrix) -> Self {
        self.payoff = payoff;
        self
    }

    /// True if either side needs a text generation backend.
    pub fn requires_generator(&self) -> bool {
        self.strategy_a.is_llm() || self.strategy_b.is_llm()
    }

    pub(crate) fn validate(&self, settings: &EngineSettings) -> Result<(), ConfigError> {
        if self.rounds < settings.min_rounds || self.rounds > settings.max_rounds {
            return Err(ConfigError::RoundsOutOfRange {
                rounds: self.rounds,
                min: settings.min_rounds,
                max: settings.max_rounds,
            });
        }
        self.payoff.validate()?;
        self.strategy_a.validate()?;
        self.strategy_b.validate()?;
        Ok(())
    }
}

/// Inbound request shape submitted by the (external) web layer.
///
/// Carries the fields a participant-facing front end knows about: which model
/// plays side A, the sampling temperature, the opponent strategy identifier
/// and the round count. [`MatchRequest::into_config`] resolves it into a
/// [`MatchConfig`]; bound and temperature checks happen later, when the
/// orchestrator validates the config.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    /// Model identifier for the LLM agent (side A).
    pub model: String,
    /// Sampling temperature; the original platform defaults to 0.7.
    #[serde(default = "MatchRequest::default_temperature")]
    pub temperature: f32,
    /// Optional system prompt for the LLM agent.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Identifier of the opponent strategy (side B), e.g. `"tit_for_tat"`.
    pub opponent_strategy: String,
    /// Number of rounds to play.
    pub rounds: u32,
    /// Seed for the `"random"` opponent; required with that identifier.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl MatchRequest {
    fn default_temperature() -> f32 {
        0.7
    }

    /// Resolves the request into a [`MatchConfig`].
    ///
    /// # Errors
    /// [`ConfigError::UnknownStrategy`] for an unrecognized opponent
    /// identifier, [`ConfigError::MissingSeed`] for `"random"` without a seed.
    pub fn into_config(self) -> Result<MatchConfig, ConfigError> {
        let opponent = match self.opponent_strategy.as_str() {
            "random" => StrategySpec::Random {
                seed: self.seed.ok_or(ConfigError::MissingSeed)?,
            },
            other => other.parse()?,
        };
        let llm = StrategySpec::Llm {
            model: self.model,
            temperature: self.temperature,
            system_prompt: self.system_prompt,
        };
        Ok(MatchConfig::new(llm, opponent, self.rounds))
    }
}
