use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use tracing::info;

use super::{OutputStage, StageError};

const STAGE_NAME: &str = "escalation_footer";
const FOOTER_MARKER: &str = "**Human Escalation Requested**";

const HANDOFF_PATTERNS: &[&str] = &[
    r"(transfer to human|escalate to agent|speak to representative)",
    r"(need human help|require specialist|complex issue)",
    r"(cannot help with|outside my capabilities|need manual review)",
];

static HANDOFF_REGEXES: LazyLock<Result<Vec<Regex>, regex::Error>> = LazyLock::new(|| {
    HANDOFF_PATTERNS
        .iter()
        .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
        .collect()
});

pub fn footer(timestamp: i64) -> String {
    format!(
        "\n\n---\n🔄 {FOOTER_MARKER}\nThis query requires human assistance. A customer service representative will be notified.\n**Escalation ID**: ESC-{timestamp}\n**Priority**: Standard\n---"
    )
}

/// Appends a hand-off footer when the draft says it cannot finish the job.
pub struct EscalationFooterStage;

impl OutputStage for EscalationFooterStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        if text.contains(FOOTER_MARKER) {
            return Ok(text.to_string());
        }

        let patterns = HANDOFF_REGEXES
            .as_ref()
            .map_err(|e| StageError::Internal(format!("hand-off patterns failed to compile: {e}")))?;

        // Watermarking runs first and may have turned a phrase's space into NBSP
        let plain = text.replace('\u{00a0}', " ");
        if !patterns.iter().any(|p| p.is_match(&plain)) {
            return Ok(text.to_string());
        }

        info!("human escalation command parsed and formatted");
        Ok(format!("{text}{}", footer(chrono::Utc::now().timestamp())))
    }
}
