use tracing::debug;

use super::{OutputStage, StageError};

const STAGE_NAME: &str = "watermark";
const NBSP: char = '\u{00a0}';
const INTERVAL: usize = 5;

/// Every fifth space becomes a non-breaking space. Texts with fewer than five
/// space-separated pieces are returned unchanged.
pub fn watermark(text: &str) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    if words.len() < INTERVAL {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + words.len());
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push(if i % INTERVAL == 0 { NBSP } else { ' ' });
        }
        out.push_str(word);
    }
    out
}

pub struct WatermarkStage;

impl OutputStage for WatermarkStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        let marked = watermark(text);
        debug!(
            original_length = text.len(),
            watermarked_length = marked.len(),
            "watermark applied"
        );
        Ok(marked)
    }
}
