//! Checks over the agent's tool results that can short-circuit the turn with a
//! fixed response.

use serde_json::Value;
use tracing::info;

pub const CROSS_BORDER_KEY: &str = "verify_cross_border";
pub const CROSS_BORDER_RESPONSE: &str = "Please declare your location";

pub trait ToolResultCheck: Send + Sync {
    fn name(&self) -> &'static str;

    /// A final response for the customer, or `None` to let the turn continue.
    fn check(&self, tool_results: &[Value]) -> Option<String>;
}

/// Asks the customer for their location when a tool flags a cross-border request
pub struct CrossBorderCheck;

impl ToolResultCheck for CrossBorderCheck {
    fn name(&self) -> &'static str {
        "cross_border_verification"
    }

    fn check(&self, tool_results: &[Value]) -> Option<String> {
        let flagged = tool_results
            .iter()
            .filter_map(Value::as_object)
            .any(|result| result.contains_key(CROSS_BORDER_KEY));

        if flagged {
            info!("cross-border verification requirement detected");
            Some(CROSS_BORDER_RESPONSE.to_string())
        } else {
            None
        }
    }
}

pub struct CheckerPipeline {
    enabled: bool,
    checks: Vec<Box<dyn ToolResultCheck>>,
}

impl CheckerPipeline {
    pub fn new(enabled: bool, checks: Vec<Box<dyn ToolResultCheck>>) -> Self {
        Self { enabled, checks }
    }

    pub fn with_defaults(enabled: bool) -> Self {
        Self::new(enabled, vec![Box::new(CrossBorderCheck)])
    }

    /// First check to produce a response wins.
    pub fn run(&self, tool_results: &[Value]) -> Option<String> {
        if !self.enabled || tool_results.is_empty() {
            return None;
        }

        self.checks.iter().find_map(|check| {
            let response = check.check(tool_results)?;
            info!(check = check.name(), "checker triggered");
            Some(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Always(&'static str);

    impl ToolResultCheck for Always {
        fn name(&self) -> &'static str {
            "always"
        }

        fn check(&self, _tool_results: &[Value]) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn test_cross_border_flag() {
        let pipeline = CheckerPipeline::with_defaults(true);
        let results = vec![
            json!({"balance": 100}),
            json!({"verify_cross_border": true, "country": "SG"}),
        ];
        assert_eq!(
            pipeline.run(&results),
            Some("Please declare your location".to_string())
        );
    }

    #[test]
    fn test_no_flag_or_non_object_results() {
        let pipeline = CheckerPipeline::with_defaults(true);
        let results = vec![
            json!("verify_cross_border"),
            json!(["verify_cross_border"]),
            json!({"nested": {"verify_cross_border": true}}),
        ];
        assert_eq!(pipeline.run(&results), None);
    }

    #[test]
    fn test_disabled_or_empty() {
        let results = vec![json!({"verify_cross_border": false})];
        assert_eq!(CheckerPipeline::with_defaults(false).run(&results), None);
        assert_eq!(CheckerPipeline::with_defaults(true).run(&[]), None);
    }

    #[test]
    fn test_first_response_wins() {
        let pipeline = CheckerPipeline::new(
            true,
            vec![Box::new(CrossBorderCheck), Box::new(Always("fallback"))],
        );
        assert_eq!(
            pipeline.run(&[json!({"ok": true})]),
            Some("fallback".to_string())
        );
        assert_eq!(
            pipeline.run(&[json!({"verify_cross_border": 1})]),
            Some(CROSS_BORDER_RESPONSE.to_string())
        );
    }
}
