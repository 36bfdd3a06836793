//! The decision seam of the engine, and every built-in strategy.
//!
//! A [`Strategy`] is one agent in one match: the orchestrator hands it
//! read-only views of the public history and expects a [`Move`]. Deterministic
//! strategies are pure functions of the history; the LLM variant forwards the
//! history to an external model and parses the reply.
//!
//! The trait is public so custom agents can be plugged into
//! [`MatchOrchestrator::with_strategies`](crate::orchestrator::MatchOrchestrator::with_strategies).

use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::configuration::StrategySpec;
use crate::errors::{ConfigError, DecisionError};
use crate::game::Move;
use crate::llm_client::{SamplingConfig, TextGenerator};
use crate::payoff::PayoffMatrix;

/// A pluggable decision-making unit; one instance per agent per match.
///
/// `own` and `opponent` are the per-side views of the same shared history:
/// `own[k]` and `opponent[k]` are the round-`k` moves of this agent and its
/// opponent. Implementations must not retain the views across rounds.
#[async_trait]
pub trait Strategy: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Decides the move for `round_index`, given all past moves.
    ///
    /// # Errors
    /// [`DecisionError::Malformed`] when a decision was produced but cannot be
    /// interpreted, [`DecisionError::Unavailable`] when no decision could be
    /// obtained at all. Deterministic strategies never fail.
    async fn decide(
        &mut self,
        own: &[Move],
        opponent: &[Move],
        round_index: u32,
    ) -> Result<Move, DecisionError>;
}

/// Cooperates unconditionally.
pub struct AlwaysCooperate;

#[async_trait]
impl Strategy for AlwaysCooperate {
    fn name(&self) -> &str {
        "always_cooperate"
    }

    async fn decide(&mut self, _: &[Move], _: &[Move], _: u32) -> Result<Move, DecisionError> {
        Ok(Move::Cooperate)
    }
}

/// Defects unconditionally.
pub struct AlwaysDefect;

#[async_trait]
impl Strategy for AlwaysDefect {
    fn name(&self) -> &str {
        "always_defect"
    }

    async fn decide(&mut self, _: &[Move], _: &[Move], _: u32) -> Result<Move, DecisionError> {
        Ok(Move::Defect)
    }
}

/// Opens with cooperation, then mirrors the opponent's previous move.
pub struct TitForTat;

#[async_trait]
impl Strategy for TitForTat {
    fn name(&self) -> &str {
        "tit_for_tat"
    }

    async fn decide(
        &mut self,
        _own: &[Move],
        opponent: &[Move],
        _round_index: u32,
    ) -> Result<Move, DecisionError> {
        Ok(opponent.last().copied().unwrap_or(Move::Cooperate))
    }
}

/// Cooperates until the opponent defects once, then defects forever.
pub struct GrimTrigger;

#[async_trait]
impl Strategy for GrimTrigger {
    fn name(&self) -> &str {
        "grim_trigger"
    }

    async fn decide(
        &mut self,
        _own: &[Move],
        opponent: &[Move],
        _round_index: u32,
    ) -> Result<Move, DecisionError> {
        if opponent.contains(&Move::Defect) {
            Ok(Move::Defect)
        } else {
            Ok(Move::Cooperate)
        }
    }
}

/// Draws uniformly from an explicitly seeded generator.
///
/// The seed comes from the strategy spec, so a match using this strategy is
/// exactly reproducible.
pub struct RandomStrategy {
    rng: SmallRng,
}

impl RandomStrategy {
    /// A random strategy drawing from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

#[async_trait]
impl Strategy for RandomStrategy {
    fn name(&self) -> &str {
        "random"
    }

    async fn decide(&mut self, _: &[Move], _: &[Move], _: u32) -> Result<Move, DecisionError> {
        if self.rng.gen_bool(0.5) {
            Ok(Move::Cooperate)
        } else {
            Ok(Move::Defect)
        }
    }
}

/// Asks an external text-generation model for each move.
///
/// The full round history and the payoff values of the actual configured
/// matrix are serialized into the prompt; the reply must contain exactly one
/// of the tokens `cooperate` or `defect`. Repeated calls with identical
/// history are not guaranteed to be deterministic, whatever the temperature.
pub struct LlmStrategy {
    generator: Arc<dyn TextGenerator>,
    sampling: SamplingConfig,
    payoff: PayoffMatrix,
}

impl LlmStrategy {
    /// An LLM-backed strategy calling `generator` with `sampling`.
    pub fn new(generator: Arc<dyn TextGenerator>, sampling: SamplingConfig, payoff: PayoffMatrix) -> Self {
        Self {
            generator,
            sampling,
            payoff,
        }
    }
}

#[async_trait]
impl Strategy for LlmStrategy {
    fn name(&self) -> &str {
        "llm"
    }

    async fn decide(
        &mut self,
        own: &[Move],
        opponent: &[Move],
        _round_index: u32,
    ) -> Result<Move, DecisionError> {
        let prompt = render_prompt(&self.payoff, own, opponent);
        let response = self.generator.generate(&prompt, &self.sampling).await?;
        parse_move(&response).ok_or_else(|| DecisionError::Malformed {
            response: clip(&response),
        })
    }
}

fn render_prompt(payoff: &PayoffMatrix, own: &[Move], opponent: &[Move]) -> String {
    let mut prompt = String::from(
        "You are playing an iterated Prisoner's Dilemma. Each round, both \
         players simultaneously choose to cooperate or defect.\n\nScoring:\n",
    );
    prompt.push_str(&format!(
        "- Both cooperate: {} points each\n",
        payoff.reward()
    ));
    prompt.push_str(&format!("- Both defect: {} points each\n", payoff.punishment()));
    prompt.push_str(&format!(
        "- One defects while the other cooperates: the defector gets {}, the cooperator gets {}\n",
        payoff.temptation(),
        payoff.sucker()
    ));

    if own.is_empty() {
        prompt.push_str("\nNo rounds have been played yet.\n");
    } else {
        prompt.push_str("\nRounds so far:\n");
        for (index, (mine, theirs)) in own.iter().zip(opponent.iter()).enumerate() {
            prompt.push_str(&format!(
                "Round {}: you played {mine}, opponent played {theirs}\n",
                index + 1
            ));
        }
    }

    prompt.push_str("\nWhat is your next move? Answer with exactly one word: cooperate or defect");
    prompt
}

/// Extracts the move from a model reply; `None` when the reply is empty,
/// contains neither token or contains both.
pub(crate) fn parse_move(response: &str) -> Option<Move> {
    let lowered = response.to_lowercase();
    let cooperates = lowered.contains("cooperate");
    let defects = lowered.contains("defect");
    match (cooperates, defects) {
        (true, false) => Some(Move::Cooperate),
        (false, true) => Some(Move::Defect),
        _ => None,
    }
}

fn clip(response: &str) -> String {
    const LIMIT: usize = 200;
    if response.len() <= LIMIT {
        response.to_string()
    } else {
        let cut = response
            .char_indices()
            .take_while(|(byte, _)| *byte < LIMIT)
            .last()
            .map(|(byte, c)| byte + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &response[..cut])
    }
}

/// Instantiates the strategy described by `spec`.
pub(crate) fn build_strategy(
    spec: &StrategySpec,
    payoff: PayoffMatrix,
    generator: Option<&Arc<dyn TextGenerator>>,
) -> Result<Box<dyn Strategy>, ConfigError> {
    Ok(match spec {
        StrategySpec::AlwaysCooperate => Box::new(AlwaysCooperate),
        StrategySpec::AlwaysDefect => Box::new(AlwaysDefect),
        StrategySpec::TitForTat => Box::new(TitForTat),
        StrategySpec::GrimTrigger => Box::new(GrimTrigger),
        StrategySpec::Random { seed } => Box::new(RandomStrategy::seeded(*seed)),
        StrategySpec::Llm {
            model,
            temperature,
            system_prompt,
        } => {
            let generator = generator
                .cloned()
                .ok_or_else(|| ConfigError::MissingGenerator(spec.identifier().to_string()))?;
            let sampling = SamplingConfig {
                model: model.clone(),
                temperature: *temperature,
                system_prompt: system_prompt.clone(),
                max_tokens: Some(10),
            };
            Box::new(LlmStrategy::new(generator, sampling, payoff))
        }
    })
}

#[cfg(test)]
mod strategy_tests {
    use super::*;

    const C: Move = Move::Cooperate;
    const D: Move = Move::Defect;

    #[tokio::test]
    async fn tit_for_tat_opens_with_cooperation() {
        let mut strategy = TitForTat;
        assert_eq!(strategy.decide(&[], &[], 0).await.unwrap(), C);
    }

    #[tokio::test]
    async fn tit_for_tat_mirrors_previous_move() {
        let mut strategy = TitForTat;
        assert_eq!(strategy.decide(&[C], &[D], 1).await.unwrap(), D);
        assert_eq!(strategy.decide(&[C, D], &[D, C], 2).await.unwrap(), C);
    }

    #[tokio::test]
    async fn grim_trigger_never_forgives() {
        let mut strategy = GrimTrigger;
        assert_eq!(strategy.decide(&[C, C], &[C, C], 2).await.unwrap(), C);
        // one defection anywhere in the past is enough
        assert_eq!(strategy.decide(&[C, C], &[D, C], 2).await.unwrap(), D);
        assert_eq!(strategy.decide(&[C, C, D], &[D, C, C], 3).await.unwrap(), D);
    }

    #[tokio::test]
    async fn seeded_random_is_reproducible() {
        let mut first = RandomStrategy::seeded(42);
        let mut second = RandomStrategy::seeded(42);
        for round in 0..20 {
            let a = first.decide(&[], &[], round).await.unwrap();
            let b = second.decide(&[], &[], round).await.unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn parse_accepts_unambiguous_tokens() {
        assert_eq!(parse_move("cooperate"), Some(C));
        assert_eq!(parse_move("I will DEFECT."), Some(D));
        assert_eq!(parse_move("Cooperate!"), Some(C));
    }

    #[test]
    fn parse_rejects_ambiguous_or_empty_replies() {
        assert_eq!(parse_move(""), None);
        assert_eq!(parse_move("cooperate or defect"), None);
        assert_eq!(parse_move("I'd rather collaborate"), None);
    }

    #[test]
    fn prompt_serializes_full_history_and_payoff() {
        let payoff = PayoffMatrix::canonical();
        let own = vec![C, D, C, C, C, C];
        let opponent = vec![D, D, C, C, C, D];
        let prompt = render_prompt(&payoff, &own, &opponent);

        // payoff values of the configured matrix
        assert!(prompt.contains("3 points each"));
        assert!(prompt.contains("the defector gets 5, the cooperator gets 0"));
        // the full history, not a truncated window
        assert!(prompt.contains("Round 1: you played cooperate, opponent played defect"));
        assert!(prompt.contains("Round 6: you played cooperate, opponent played defect"));
        assert!(prompt.ends_with("Answer with exactly one word: cooperate or defect"));
    }
}
