use std::future::Future;
use std::sync::Arc;

use common::configuration::Configuration;

use crate::escalation::EscalationEngine;
use crate::processors::output::{deliver_with_retries, Delivery};
use crate::processors::{CheckerPipeline, InputPipeline, OutputPipeline, RegenerationRequest};
use crate::state::memory::MemorySessionStore;
use crate::state::SessionStore;

/// Shared application state bundled into a single Arc-wrapped struct.
///
/// A single `Arc<AppState>` is cloned per connection and handed to the router.
pub struct AppState {
    pub config: Configuration,
    pub engine: EscalationEngine,
    pub sessions: Arc<dyn SessionStore>,
    pub input_pipeline: InputPipeline,
    pub output_pipeline: OutputPipeline,
    pub checker: CheckerPipeline,
}

impl AppState {
    /// Build every component from configuration, keeping sessions in memory.
    pub fn from_config(config: Configuration) -> Self {
        Self::with_session_store(config, Arc::new(MemorySessionStore::new()))
    }

    pub fn with_session_store(config: Configuration, sessions: Arc<dyn SessionStore>) -> Self {
        let input_pipeline = InputPipeline::from_config(&config.processing, config.masking.as_ref());
        let output_pipeline = OutputPipeline::from_config(&config.processing);
        let checker = CheckerPipeline::with_defaults(config.processing.checker_enabled);

        Self {
            engine: EscalationEngine::new(),
            sessions,
            input_pipeline,
            output_pipeline,
            checker,
            config,
        }
    }

    /// Run the regeneration loop over the output pipeline, bounded by
    /// `agent.max_retries`.
    pub async fn deliver<F, Fut>(&self, draft_fn: F) -> Delivery
    where
        F: FnMut(u32, Option<RegenerationRequest>) -> Fut,
        Fut: Future<Output = String>,
    {
        deliver_with_retries(&self.output_pipeline, self.config.agent.max_retries, draft_fn).await
    }
}
