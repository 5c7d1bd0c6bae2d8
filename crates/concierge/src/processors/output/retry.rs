use std::future::Future;
use tracing::{info, warn};

use super::{OutputPipeline, Postprocessed, RegenerationRequest};

pub const EXHAUSTED_APOLOGY: &str = "I'm sorry, I wasn't able to prepare a response that meets our formatting and safety requirements. Please try rephrasing your question, or ask to speak with a customer service representative.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A draft made it through postprocessing
    Delivered { text: String, attempts: u32 },
    /// Every draft was rejected; carries the last rejection
    Exhausted {
        attempts: u32,
        last_request: Option<RegenerationRequest>,
    },
}

impl Delivery {
    pub fn attempts(&self) -> u32 {
        match self {
            Delivery::Delivered { attempts, .. } | Delivery::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Delivery::Delivered { text, .. } => text,
            Delivery::Exhausted { .. } => EXHAUSTED_APOLOGY.to_string(),
        }
    }
}

/// Ask `draft_fn` for drafts until one passes `pipeline` or `max_attempts`
/// drafts have been rejected. `draft_fn` receives the 1-based attempt number
/// and the previous rejection, if any, to feed back to the model.
pub async fn deliver_with_retries<F, Fut>(
    pipeline: &OutputPipeline,
    max_attempts: u32,
    mut draft_fn: F,
) -> Delivery
where
    F: FnMut(u32, Option<RegenerationRequest>) -> Fut,
    Fut: Future<Output = String>,
{
    let max_attempts = max_attempts.max(1);
    let mut feedback: Option<RegenerationRequest> = None;

    for attempt in 1..=max_attempts {
        let draft = draft_fn(attempt, feedback.take()).await;
        match pipeline.postprocess(&draft) {
            Postprocessed::Ready(text) => {
                if attempt > 1 {
                    info!(attempt, "draft accepted after regeneration");
                }
                return Delivery::Delivered {
                    text,
                    attempts: attempt,
                };
            }
            Postprocessed::NeedsRegeneration(request) => {
                warn!(
                    attempt,
                    max_attempts,
                    stage = %request.stage,
                    "draft rejected by postprocessing"
                );
                feedback = Some(request);
            }
        }
    }

    warn!(max_attempts, "regeneration budget exhausted");
    Delivery::Exhausted {
        attempts: max_attempts,
        last_request: feedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::configuration::ProcessingConfig;
    use std::sync::{Arc, Mutex};

    fn pipeline() -> OutputPipeline {
        OutputPipeline::from_config(&ProcessingConfig::default())
    }

    #[tokio::test]
    async fn test_first_draft_accepted() {
        let delivery = deliver_with_retries(&pipeline(), 3, |_, _| async {
            "Your card is active".to_string()
        })
        .await;
        assert_eq!(
            delivery,
            Delivery::Delivered {
                text: "Your card is active".to_string(),
                attempts: 1
            }
        );
    }

    #[tokio::test]
    async fn test_feedback_reaches_next_draft() {
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_in_fn = Arc::clone(&seen);

        let delivery = deliver_with_retries(&pipeline(), 3, move |attempt, feedback| {
            seen_in_fn
                .lock()
                .unwrap()
                .push(feedback.map(|r| r.stage));
            async move {
                if attempt == 1 {
                    "Go to http://evil.example".to_string()
                } else {
                    "Go to our branch".to_string()
                }
            }
        })
        .await;

        assert_eq!(delivery.attempts(), 2);
        assert_eq!(delivery.into_text(), "Go to our branch");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("url_validation".to_string())]
        );
    }

    #[tokio::test]
    async fn test_exhausted_budget_apologises() {
        let mut calls = 0;
        let delivery = deliver_with_retries(&pipeline(), 2, |_, _| {
            calls += 1;
            async { "Unclosed\n```\ncode".to_string() }
        })
        .await;

        assert_eq!(calls, 2);
        match &delivery {
            Delivery::Exhausted {
                attempts,
                last_request,
            } => {
                assert_eq!(*attempts, 2);
                assert_eq!(
                    last_request.as_ref().map(|r| r.stage.as_str()),
                    Some("markdown")
                );
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(delivery.into_text(), EXHAUSTED_APOLOGY);
    }

    #[tokio::test]
    async fn test_zero_budget_still_drafts_once() {
        let delivery = deliver_with_retries(&pipeline(), 0, |_, _| async { "ok".to_string() }).await;
        assert_eq!(delivery.attempts(), 1);
    }
}
