//! Parallel execution of independent matches.
//!
//! A batch experiment sweep runs many configured matches at once. Matches
//! share no mutable state (each orchestrator exclusively owns its history),
//! so the only coordination needed is bounding how many run concurrently and
//! collecting the sealed records.
//!
//! All configurations are validated before the first round of any match
//! executes, so a bad configuration in the middle of a sweep fails the whole
//! batch fast instead of surfacing halfway through.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument};

use crate::configuration::{EngineSettings, MatchConfig};
use crate::errors::ConfigError;
use crate::llm_client::TextGenerator;
use crate::match_record::MatchRecord;
use crate::orchestrator::MatchOrchestrator;

/// Runs batches of independent matches concurrently.
pub struct BatchRunner {
    settings: EngineSettings,
    generator: Option<Arc<dyn TextGenerator>>,
    max_concurrent: usize,
}

impl BatchRunner {
    /// A runner executing at most one match per available CPU by default.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            generator: None,
            max_concurrent: num_cpus::get().max(1),
        }
    }

    /// Sets the text generation backend shared by all LLM strategies.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Sets the number of matches allowed to run at the same time.
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        assert!(max_concurrent >= 1, "at least one match must be able to run");
        self.max_concurrent = max_concurrent;
        self
    }

    /// Runs one match to completion.
    ///
    /// # Errors
    /// [`ConfigError`] when the configuration is rejected; no round executes.
    pub async fn run_one(&self, config: MatchConfig) -> Result<MatchRecord, ConfigError> {
        Ok(self.orchestrator(config)?.run().await)
    }

    /// Runs every configured match and returns the records in input order.
    ///
    /// # Errors
    /// [`ConfigError`] if any configuration is rejected; in that case no
    /// match has started.
    #[instrument(skip_all, fields(matches = configs.len()))]
    pub async fn run_all(&self, configs: Vec<MatchConfig>) -> Result<Vec<MatchRecord>, ConfigError> {
        // Validate and instantiate everything before running anything.
        let mut orchestrators = Vec::with_capacity(configs.len());
        for config in configs {
            orchestrators.push(self.orchestrator(config)?);
        }

        let total = orchestrators.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        for (position, orchestrator) in orchestrators.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore closed while matches were pending");
                (position, orchestrator.run().await)
            });
        }

        let mut records: Vec<Option<MatchRecord>> = std::iter::repeat_with(|| None)
            .take(total)
            .collect();
        while let Some(joined) = tasks.join_next().await {
            let (position, record) = joined.expect("match task panicked");
            records[position] = Some(record);
        }

        info!(total, "batch finished");
        Ok(records
            .into_iter()
            .map(|record| record.expect("every spawned match reports exactly once"))
            .collect())
    }

    fn orchestrator(&self, config: MatchConfig) -> Result<MatchOrchestrator, ConfigError> {
        match &self.generator {
            Some(generator) => {
                MatchOrchestrator::with_generator(config, self.settings.clone(), generator.clone())
            }
            None => MatchOrchestrator::new(config, self.settings.clone()),
        }
    }
}
