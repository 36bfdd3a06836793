//! # Dilemma Engine
//!
//! A modular Rust crate for running repeated-game behavioral experiments
//! between two decision-making agents, one of which may be backed by a
//! language-model call.
//!
//! It provides:
//! - Match orchestration with simultaneous-move rounds (`MatchOrchestrator`)
//! - Built-in strategies like `TitForTat`, `GrimTrigger` and a seeded `RandomStrategy`
//! - An LLM-backed strategy behind the `TextGenerator` capability trait
//! - A validated `PayoffMatrix` enforcing the social-dilemma ordering
//! - Parallel execution of independent matches (`BatchRunner`)
//!
//! Each match runs a fixed, validated number of rounds between two strategy
//! instances. Before every round both agents see the full public history;
//! their moves are collected concurrently and committed atomically, then
//! scored through the payoff matrix. The sealed
//! [`MatchRecord`](match_record::MatchRecord) is immutable and replayable: a
//! match configured with only deterministic strategies reproduces
//! byte-identically.
//!
//! # Documentation Overview
//!
//! - For match execution, failure policy, and cancellation, see the
//!   [`orchestrator`] module.
//! - For engine policy (round bounds, decision deadline, fallback move) and
//!   match description, see [`EngineSettings`](configuration::EngineSettings)
//!   and [`MatchConfig`](configuration::MatchConfig).
//! - For implementing custom agents, check out the
//!   [`Strategy`](strategy::Strategy) trait; for plugging in a different
//!   model backend, the [`TextGenerator`](llm_client::TextGenerator) trait.
//!
//! # Usage Example
//!
//! Below is a minimal example running an LLM agent against tit-for-tat:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dilemma_engine::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = EngineSettings::from_env();
//!     let generator = Arc::new(OpenAiClient::from_env()?);
//!
//!     let config = MatchConfig::new(
//!         StrategySpec::llm("gpt-4o-mini", 0.7),
//!         StrategySpec::TitForTat,
//!         10,
//!     );
//!
//!     let orchestrator = MatchOrchestrator::with_generator(config, settings, generator)?;
//!     let record = orchestrator.run().await;
//!
//!     println!("{}", serde_json::to_string_pretty(&record.summary())?);
//!     Ok(())
//! }
//! ```
//!
//! Deterministic-only matches need no backend:
//!
//! ```
//! use dilemma_engine::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = MatchConfig::new(StrategySpec::GrimTrigger, StrategySpec::random(7), 20);
//! let record = MatchOrchestrator::new(config, EngineSettings::new())
//!     .unwrap()
//!     .run()
//!     .await;
//! assert!(record.is_completed());
//! # }
//! ```
#![warn(missing_docs)]

pub use anyhow;

pub mod batch;
pub mod configuration;
pub mod errors;
pub mod game;
pub mod llm_client;
mod logger;
pub mod match_record;
pub mod orchestrator;
pub mod payoff;
pub mod strategy;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use dilemma_engine::prelude::*;
/// ```
pub mod prelude {
    pub use crate::batch::BatchRunner;
    pub use crate::configuration::{EngineSettings, MatchConfig, MatchRequest, StrategySpec};
    pub use crate::errors::{ConfigError, DecisionError};
    pub use crate::game::{History, Move, Round, Side};
    pub use crate::llm_client::{OpenAiClient, OpenAiConfig, SamplingConfig, TextGenerator};
    pub use crate::match_record::{AbortReason, MatchRecord, MatchStatus, MatchSummary};
    pub use crate::orchestrator::{CancelHandle, MatchOrchestrator};
    pub use crate::payoff::PayoffMatrix;
    pub use crate::strategy::Strategy;
}
