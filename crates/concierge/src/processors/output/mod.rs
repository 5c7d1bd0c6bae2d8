//! Postprocessing of agent drafts.
//!
//! Stages run in a fixed order:
//!
//! 1. URL allowlist validation
//! 2. Markdown normalization and validation
//! 3. Link-to-button rendering
//! 4. Watermarking
//! 5. Escalation-footer detection
//!
//! The first two stages may ask for the draft to be regenerated. That request
//! ends the pipeline and is handed back to the caller untouched. Any other stage
//! failure is logged and the stage's input flows on to the next stage.

use common::configuration::ProcessingConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, error, info};

pub mod buttons;
pub mod footer;
pub mod markdown;
pub mod retry;
pub mod urls;
pub mod watermark;

pub use buttons::LinkButtonStage;
pub use footer::EscalationFooterStage;
pub use markdown::MarkdownStage;
pub use retry::{deliver_with_retries, Delivery};
pub use urls::{UrlAllowlist, UrlValidationStage};
pub use watermark::WatermarkStage;

/// Characters a URL may contain when scanning free text for links
pub(crate) const URL_PATTERN: &str = r#"https?://[^\s<>"{}|\\^`\[\]]*"#;

static URL_REGEX: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(URL_PATTERN));

pub(crate) fn url_regex() -> Result<&'static Regex, StageError> {
    URL_REGEX
        .as_ref()
        .map_err(|e| StageError::Internal(format!("url pattern failed to compile: {e}")))
}

/// Strip sentence punctuation that the URL pattern swallows from prose,
/// e.g. the final period in "see https://hsbc.com.".
pub(crate) fn trim_url(candidate: &str) -> &str {
    candidate.trim_end_matches(['.', ',', ';', ':', '!', '?', ')'])
}

/// Feedback for the model when a draft cannot be delivered as written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegenerationRequest {
    /// Stage that rejected the draft
    pub stage: String,
    /// Human-readable instruction for the next draft
    pub reason: String,
}

impl RegenerationRequest {
    pub fn new(stage: &str, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("{}", .0.reason)]
    Regenerate(RegenerationRequest),
    #[error("{0}")]
    Internal(String),
}

/// Outcome of running a draft through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Postprocessed {
    Ready(String),
    NeedsRegeneration(RegenerationRequest),
}

impl Postprocessed {
    pub fn is_ready(&self) -> bool {
        matches!(self, Postprocessed::Ready(_))
    }
}

pub trait OutputStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, text: &str) -> Result<String, StageError>;
}

pub struct OutputPipeline {
    enabled: bool,
    stages: Vec<Box<dyn OutputStage>>,
}

impl OutputPipeline {
    pub fn new(enabled: bool, stages: Vec<Box<dyn OutputStage>>) -> Self {
        Self { enabled, stages }
    }

    /// The standard five-stage pipeline.
    pub fn from_config(config: &ProcessingConfig) -> Self {
        let stages: Vec<Box<dyn OutputStage>> = vec![
            Box::new(UrlValidationStage::new(UrlAllowlist::new(
                &config.url_allowlist,
                config.url_match,
            ))),
            Box::new(MarkdownStage),
            Box::new(LinkButtonStage::new(&config.link_button_class)),
            Box::new(WatermarkStage),
            Box::new(EscalationFooterStage),
        ];
        Self::new(config.postprocessing_enabled, stages)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn postprocess(&self, text: &str) -> Postprocessed {
        if !self.enabled || text.is_empty() {
            return Postprocessed::Ready(text.to_string());
        }

        let mut current = text.to_string();
        for stage in &self.stages {
            match stage.apply(&current) {
                Ok(next) => {
                    debug!(stage = stage.name(), "applied postprocessing stage");
                    current = next;
                }
                Err(StageError::Regenerate(request)) => {
                    info!(
                        stage = stage.name(),
                        reason = %request.reason,
                        "postprocessing requested regeneration"
                    );
                    return Postprocessed::NeedsRegeneration(request);
                }
                Err(StageError::Internal(message)) => {
                    error!(
                        stage = stage.name(),
                        error = %message,
                        "error in postprocessing stage"
                    );
                }
            }
        }

        Postprocessed::Ready(current)
    }
}
