use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::bail;
use async_trait::async_trait;
use dilemma_engine::prelude::*;

const C: Move = Move::Cooperate;
const D: Move = Move::Defect;

/// Replies with a fixed text and records every prompt and sampling config.
struct RecordingGenerator {
    reply: &'static str,
    prompts: Mutex<Vec<String>>,
    models: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    fn new(reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
            models: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.models.lock().unwrap().push(sampling.model.clone());
        Ok(self.reply.to_string())
    }
}

/// Fails every call and counts them.
struct FailingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str, _sampling: &SamplingConfig) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        bail!("connection refused")
    }
}

fn llm_versus(opponent: StrategySpec, rounds: u32) -> MatchConfig {
    MatchConfig::new(StrategySpec::llm("test-model", 0.0), opponent, rounds)
}

#[tokio::test]
async fn llm_agent_plays_against_tit_for_tat() {
    let generator = RecordingGenerator::new("defect");
    let record = MatchOrchestrator::with_generator(
        llm_versus(StrategySpec::TitForTat, 5),
        EngineSettings::new(),
        generator.clone(),
    )
    .unwrap()
    .run()
    .await;

    assert!(record.is_completed());
    let moves: Vec<(Move, Move)> = record
        .history
        .rounds()
        .iter()
        .map(|round| (round.move_a, round.move_b))
        .collect();
    // tit-for-tat cooperates once, then mirrors the defections
    assert_eq!(moves, vec![(D, C), (D, D), (D, D), (D, D), (D, D)]);
    assert_eq!(record.score_a, 9);
    assert_eq!(record.score_b, 4);
    // one generation per round, no substitution
    assert_eq!(generator.prompts.lock().unwrap().len(), 5);
    assert!(record.history.rounds().iter().all(|round| !round.substituted_a));
    // the configured model identifier reaches the backend
    assert!(generator
        .models
        .lock()
        .unwrap()
        .iter()
        .all(|model| model == "test-model"));
}

#[tokio::test]
async fn prompts_carry_the_full_round_history() {
    let generator = RecordingGenerator::new("cooperate");
    MatchOrchestrator::with_generator(
        llm_versus(StrategySpec::AlwaysDefect, 6),
        EngineSettings::new(),
        generator.clone(),
    )
    .unwrap()
    .run()
    .await;

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("No rounds have been played yet."));
    let last = prompts.last().unwrap();
    // all five committed rounds appear, not a truncated window
    assert!(last.contains("Round 1: you played cooperate, opponent played defect"));
    assert!(last.contains("Round 5: you played cooperate, opponent played defect"));
    assert!(last.contains("the defector gets 5, the cooperator gets 0"));
}

#[tokio::test]
async fn gibberish_replies_substitute_the_fallback_move() {
    let generator = RecordingGenerator::new("beep boop");
    let record = MatchOrchestrator::with_generator(
        llm_versus(StrategySpec::AlwaysCooperate, 5),
        EngineSettings::new(),
        generator,
    )
    .unwrap()
    .run()
    .await;

    assert!(record.is_completed());
    assert_eq!(record.history.len(), 5);
    for round in record.history.rounds() {
        assert!(round.substituted_a);
        assert_eq!(round.move_a, D);
    }
}

#[tokio::test]
async fn failing_backend_aborts_after_one_retry() {
    let generator = Arc::new(FailingGenerator {
        calls: AtomicUsize::new(0),
    });
    let record = MatchOrchestrator::with_generator(
        llm_versus(StrategySpec::TitForTat, 5),
        EngineSettings::new(),
        generator.clone(),
    )
    .unwrap()
    .run()
    .await;

    assert_eq!(record.status, MatchStatus::Aborted(AbortReason::Unavailable));
    assert!(record.history.is_empty());
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn llm_config_without_backend_is_rejected() {
    let result = MatchOrchestrator::new(llm_versus(StrategySpec::TitForTat, 5), EngineSettings::new());
    assert!(matches!(result, Err(ConfigError::MissingGenerator(_))));
}

#[tokio::test]
async fn request_roundtrip_drives_a_match() {
    let request: MatchRequest = serde_json::from_str(
        r#"{
            "model": "test-model",
            "temperature": 0.0,
            "opponent_strategy": "grim_trigger",
            "rounds": 5
        }"#,
    )
    .unwrap();

    let generator = RecordingGenerator::new("cooperate");
    let record = MatchOrchestrator::with_generator(
        request.into_config().unwrap(),
        EngineSettings::new(),
        generator,
    )
    .unwrap()
    .run()
    .await;

    assert!(record.is_completed());
    // mutual cooperation all the way through
    assert_eq!(record.score_a, 15);
    assert_eq!(record.score_b, 15);
}
