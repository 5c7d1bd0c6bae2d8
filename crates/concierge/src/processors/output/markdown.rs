use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

use super::{OutputStage, RegenerationRequest, StageError};

const STAGE_NAME: &str = "markdown";

struct LineRules {
    heading: Regex,
    bullet: Regex,
    ordered: Regex,
    trailing_fence: Regex,
}

// `**bold**` and `---` start with list markers but are not list items, so the
// bullet rule never fires when the marker is followed by another marker.
// `trailing_fence` only matches a bare opening fence (optionally with a
// language tag) at the end of a line of prose.
static LINE_RULES: LazyLock<Result<LineRules, regex::Error>> = LazyLock::new(|| {
    Ok(LineRules {
        heading: Regex::new(r"^(#{1,6})([^\s#])")?,
        bullet: Regex::new(r"^([*\-+])([^\s*\-+])")?,
        ordered: Regex::new(r"^(\d+\.)([^\s\d])")?,
        trailing_fence: Regex::new(r"^(?P<text>[^`~]*[^`~\s])\s*(?P<fence>`{3,}[\w+#.\-]*)\s*$")?,
    })
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkdownError {
    #[error("unterminated fenced code block starting at line {line}")]
    UnterminatedFence { line: usize },
}

fn line_rules() -> Result<&'static LineRules, StageError> {
    LINE_RULES
        .as_ref()
        .map_err(|e| StageError::Internal(format!("markdown patterns failed to compile: {e}")))
}

fn normalize_line(rules: &LineRules, line: &str) -> String {
    let line = rules.heading.replace(line, "$1 $2");
    let line = rules.bullet.replace(&line, "$1 $2");
    rules.ordered.replace(&line, "$1 $2").into_owned()
}

/// An open fenced code block: its marker character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// A backtick fence's info string may not contain backticks; a line like
    /// "```x```" is inline code.
    fn opening(line: &str) -> Option<Fence> {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        if len < 3 || (marker == '`' && trimmed[len..].contains('`')) {
            return None;
        }
        Some(Fence { marker, len })
    }

    /// Only a line holding nothing but a long enough marker run closes the block.
    fn is_closed_by(&self, line: &str) -> bool {
        let trimmed = line.trim();
        let run = trimmed.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && run == trimmed.chars().count()
    }
}

/// Normalize spacing after heading, bullet and ordered-list markers and move
/// an opening fence trailing a line of prose onto its own line. Lines inside
/// fenced code blocks are left alone.
/// Applying this twice gives the same result as applying it once.
pub fn normalize(text: &str) -> Result<String, StageError> {
    Ok(normalize_with(line_rules()?, text, true))
}

fn normalize_with(rules: &LineRules, text: &str, split_fences: bool) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut open: Option<Fence> = None;

    for line in text.split('\n') {
        if let Some(fence) = open {
            if fence.is_closed_by(line) {
                open = None;
            }
            out.push(line.to_string());
            continue;
        }

        if split_fences {
            if let Some(caps) = rules.trailing_fence.captures(line) {
                out.push(normalize_line(rules, &caps["text"]));
                open = Fence::opening(&caps["fence"]);
                out.push(caps["fence"].to_string());
                continue;
            }
        }

        if let Some(fence) = Fence::opening(line) {
            open = Some(fence);
            out.push(line.to_string());
        } else {
            out.push(normalize_line(rules, line));
        }
    }

    out.join("\n")
}

/// Report fenced code blocks that never close.
pub fn validate(text: &str) -> Result<(), MarkdownError> {
    for (event, range) in Parser::new(text).into_offset_iter() {
        if let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) = event {
            if !is_closed_block(&text[range.clone()]) {
                let line = text[..range.start].matches('\n').count() + 1;
                return Err(MarkdownError::UnterminatedFence { line });
            }
        }
    }
    Ok(())
}

fn strip_container_prefix(line: &str) -> &str {
    line.trim_start_matches(|c: char| c == '>' || c.is_whitespace())
}

fn is_closed_block(block: &str) -> bool {
    let mut lines = block.trim_end().lines();
    let Some(opening) = lines.next() else {
        return false;
    };
    let opening = strip_container_prefix(opening);
    let Some(fence_char) = opening.chars().next() else {
        return false;
    };
    let fence_len = opening.chars().take_while(|c| *c == fence_char).count();

    match lines.last() {
        Some(last) => {
            let last = strip_container_prefix(last);
            let run = last.chars().take_while(|c| *c == fence_char).count();
            run >= fence_len && last.chars().skip(run).all(char::is_whitespace)
        }
        None => false,
    }
}

pub struct MarkdownStage;

impl OutputStage for MarkdownStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        let rules = line_rules()?;
        let mut normalized = normalize_with(rules, text, true);

        if let Err(e) = validate(&normalized) {
            // Moving a fence can pair it with a different closer; a draft that
            // parsed cleanly keeps its fences where they were.
            if validate(text).is_err() {
                warn!(error = %e, "markdown syntax issue detected");
                return Err(StageError::Regenerate(RegenerationRequest::new(
                    STAGE_NAME,
                    format!(
                        "The response contains invalid markdown syntax: {e}. Please ensure proper markdown formatting."
                    ),
                )));
            }
            debug!(error = %e, "fence split rejected, keeping original fences");
            normalized = normalize_with(rules, text, false);
            if validate(&normalized).is_err() {
                normalized = text.to_string();
            }
        }

        debug!("markdown rendering completed");
        Ok(normalized)
    }
}
