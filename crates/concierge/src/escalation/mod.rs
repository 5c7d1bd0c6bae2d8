//! Human escalation: category inference, the ordered escalation rule table and
//! the customer-facing rendering of its decisions.

use thiserror::Error;

pub mod categories;
pub mod classifier;
pub mod engine;
pub mod formatter;
pub mod patterns;

pub use categories::{CategoryInfo, EscalationCategory, Priority};
pub use classifier::classify;
pub use engine::{
    EscalationDecision, EscalationEngine, EscalationOutcome, EscalationReason, RuleKind,
    ESCALATION_RULES,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EscalationError {
    #[error("escalation patterns failed to compile: {0}")]
    PatternCompile(String),
}
