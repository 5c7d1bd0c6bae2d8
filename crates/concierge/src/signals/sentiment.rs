//! Message sentiment - a keyword heuristic the agent consults alongside the
//! escalation check.
//!
//! Each pattern group counts at most once per message, so the counts range
//! from 0 to the number of groups.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::error;

// ============================================================================
// Pattern Groups
// ============================================================================

const NEGATIVE_PATTERNS: &[&str] = &[
    r"(terrible|awful|horrible|worst|hate|angry|furious)",
    r"(useless|pathetic|ridiculous|stupid|waste)",
    r"(frustrated|annoyed|disappointed|upset)",
];

const POSITIVE_PATTERNS: &[&str] = &[
    r"(excellent|great|wonderful|fantastic|love|amazing)",
    r"(helpful|satisfied|pleased|happy|good)",
    r"(thank you|thanks|appreciate)",
];

/// Minimum negative groups before a message counts as negative
const NEGATIVE_THRESHOLD: usize = 2;

// ============================================================================
// Signal Types
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "POSITIVE",
            Sentiment::Negative => "NEGATIVE",
            Sentiment::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentiment plus the group counts it was derived from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SentimentSignal {
    pub sentiment: Sentiment,
    /// Number of negative pattern groups that matched
    pub negative_count: usize,
    /// Number of positive pattern groups that matched
    pub positive_count: usize,
}

// ============================================================================
// Analyzer
// ============================================================================

pub struct SentimentAnalyzer {
    negative: Vec<Regex>,
    positive: Vec<Regex>,
}

fn compile_group(sources: &[&str]) -> Result<Vec<Regex>, regex::Error> {
    sources
        .iter()
        .map(|source| RegexBuilder::new(source).case_insensitive(true).build())
        .collect()
}

impl SentimentAnalyzer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            negative: compile_group(NEGATIVE_PATTERNS)?,
            positive: compile_group(POSITIVE_PATTERNS)?,
        })
    }

    pub fn analyze(&self, message: &str) -> SentimentSignal {
        let negative_count = self.negative.iter().filter(|p| p.is_match(message)).count();
        let positive_count = self.positive.iter().filter(|p| p.is_match(message)).count();

        let sentiment = if negative_count > positive_count && negative_count >= NEGATIVE_THRESHOLD
        {
            Sentiment::Negative
        } else if positive_count > negative_count {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        };

        SentimentSignal {
            sentiment,
            negative_count,
            positive_count,
        }
    }
}

static ANALYZER: LazyLock<Result<SentimentAnalyzer, regex::Error>> =
    LazyLock::new(SentimentAnalyzer::new);

/// Classify a message with the shared analyzer. Never fails: an unusable
/// analyzer reports `NEUTRAL`.
pub fn analyze(message: &str) -> Sentiment {
    match ANALYZER.as_ref() {
        Ok(analyzer) => analyzer.analyze(message).sentiment,
        Err(e) => {
            error!(error = %e, "error in sentiment analysis");
            Sentiment::Neutral
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
