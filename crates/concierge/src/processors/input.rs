//! Preprocessing of user messages before they reach the agent.

use common::configuration::ProcessingConfig;
use common::masking::{MaskingConfig, SensitiveContentMasker};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("{stage} patterns failed to compile: {source}")]
    PatternCompile {
        stage: &'static str,
        #[source]
        source: regex::Error,
    },
}

pub trait InputStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, text: &str) -> Result<String, PreprocessError>;
}

// ---------------------------------------------------------------------------
// Code escaping
// ---------------------------------------------------------------------------

// Keywords and SQL verbs are matched case-sensitively so that ordinary prose
// ("For example", "select a card") is left alone.
const CODE_PATTERNS: &[&str] = &[
    // function calls
    r"\b\w+\([^()\n]*\)",
    // assignments
    r"\b\w+\s*=\s*[^,\n]+",
    // statements starting with a keyword
    r"(?m)^\s*(?:if|for|while|def|class|import|from)\s+[^.!?\n]*",
    // html / xml tags
    r"</?[A-Za-z][^<>\n]*>",
    // sql statements
    r"\b(?:SELECT|INSERT|UPDATE|DELETE|CREATE)\s+[^.!?\n]*",
];

static CODE_REGEXES: LazyLock<Result<Vec<Regex>, regex::Error>> =
    LazyLock::new(|| CODE_PATTERNS.iter().map(|p| Regex::new(p)).collect());

fn inside_backticks(text: &str, pos: usize) -> bool {
    text[..pos].matches('`').count() % 2 == 1
}

fn wrap_matches(text: &str, pattern: &Regex) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;

    for m in pattern.find_iter(text) {
        let snippet = m.as_str().trim_start();
        let start = m.end() - snippet.len();
        if snippet.is_empty() || snippet.contains('`') || inside_backticks(text, start) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push('`');
        out.push_str(snippet);
        out.push('`');
        last = m.end();
    }

    out.push_str(&text[last..]);
    out
}

/// Wraps code-like spans in backticks so the model treats them as quoted text
pub struct CodeEscapingStage;

impl InputStage for CodeEscapingStage {
    fn name(&self) -> &'static str {
        "code_escaping"
    }

    fn apply(&self, text: &str) -> Result<String, PreprocessError> {
        let patterns = CODE_REGEXES
            .as_ref()
            .map_err(|e| PreprocessError::PatternCompile {
                stage: self.name(),
                source: e.clone(),
            })?;

        let escaped = patterns
            .iter()
            .fold(text.to_string(), |acc, pattern| wrap_matches(&acc, pattern));

        debug!(
            original_length = text.len(),
            processed_length = escaped.len(),
            "code escaping applied"
        );
        Ok(escaped)
    }
}

// ---------------------------------------------------------------------------
// Masking
// ---------------------------------------------------------------------------

pub struct MaskingStage {
    masker: SensitiveContentMasker,
}

impl MaskingStage {
    pub fn new(config: &MaskingConfig) -> Self {
        Self {
            masker: SensitiveContentMasker::new(config),
        }
    }
}

impl InputStage for MaskingStage {
    fn name(&self) -> &'static str {
        "masking"
    }

    fn apply(&self, text: &str) -> Result<String, PreprocessError> {
        let result = self.masker.mask(text);
        if result.masked_count > 0 {
            info!(
                patterns_masked = result.masked_count,
                matched = ?result.matched,
                "sensitive content masked"
            );
        }
        Ok(result.masked_text)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct InputPipeline {
    enabled: bool,
    stages: Vec<Box<dyn InputStage>>,
}

impl InputPipeline {
    pub fn new(enabled: bool, stages: Vec<Box<dyn InputStage>>) -> Self {
        Self { enabled, stages }
    }

    /// Code escaping followed by masking. Without a masking section the
    /// built-in patterns are used.
    pub fn from_config(processing: &ProcessingConfig, masking: Option<&MaskingConfig>) -> Self {
        let default_masking = MaskingConfig::default();
        let masking = masking.unwrap_or(&default_masking);
        Self::new(
            processing.preprocessing_enabled,
            vec![Box::new(CodeEscapingStage), Box::new(MaskingStage::new(masking))],
        )
    }

    pub fn preprocess(&self, text: &str) -> String {
        if !self.enabled || text.is_empty() {
            return text.to_string();
        }

        let mut current = text.to_string();
        for stage in &self.stages {
            match stage.apply(&current) {
                Ok(next) => current = next,
                Err(e) => {
                    error!(stage = stage.name(), error = %e, "error in preprocessing stage");
                }
            }
        }
        current
    }
}
