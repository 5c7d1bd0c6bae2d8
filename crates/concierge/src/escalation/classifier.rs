use tracing::error;

use super::categories::EscalationCategory;
use super::patterns::PatternLibrary;

/// Lower-cased `"{intent} {user_message}"`, the text every rule matches against.
pub fn combined_text(intent: &str, user_message: &str) -> String {
    format!("{intent} {user_message}").to_lowercase()
}

/// Pick the first category (registry order) with any matching pattern.
pub fn classify_with(library: &PatternLibrary, intent: &str, user_message: &str) -> EscalationCategory {
    let text = combined_text(intent, user_message);
    library
        .categories
        .iter()
        .find(|(_, patterns)| patterns.is_match(&text))
        .map(|(category, _)| *category)
        .unwrap_or(EscalationCategory::GeneralInquiry)
}

/// Classify against the built-in library. Never fails: a broken library
/// degrades to `GENERAL_INQUIRY`.
pub fn classify(intent: &str, user_message: &str) -> EscalationCategory {
    match PatternLibrary::builtin() {
        Ok(library) => classify_with(library, intent, user_message),
        Err(e) => {
            error!(error = %e, "category classification unavailable");
            EscalationCategory::GeneralInquiry
        }
    }
}
