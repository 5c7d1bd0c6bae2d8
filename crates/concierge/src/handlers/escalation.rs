use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::errors::ConciergeError;
use super::request::parse_json;
use crate::app_state::AppState;
use crate::escalation::{formatter, EscalationCategory, EscalationOutcome, Priority};
use crate::state::{ConversationTurn, UserProfile};

#[derive(Debug, Deserialize)]
pub struct EscalationRequest {
    pub session_id: String,
    #[serde(default)]
    pub intent: String,
    pub user_message: String,
    /// Only used when the session is created by this request
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EscalationResponse {
    pub response: String,
    pub escalated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<EscalationCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_id: Option<String>,
    pub previous_escalations: u32,
}

/// Record the user's message on the session, then run the escalation check.
///
/// The session lock is held across the whole decision so concurrent requests
/// for one session are serialized.
pub async fn handle_escalation(
    body: &Bytes,
    state: &AppState,
) -> Result<EscalationResponse, ConciergeError> {
    let request: EscalationRequest = parse_json(body)?;
    if request.session_id.trim().is_empty() {
        return Err(ConciergeError::InvalidRequest(
            "session_id must not be empty".to_string(),
        ));
    }

    let session = state
        .sessions
        .session(&request.session_id, request.user_profile)
        .await;
    let mut session = session.lock().await;

    session.record_turn(ConversationTurn::user(request.user_message.as_str()));
    debug!(
        session_id = %request.session_id,
        history_len = session.conversation_history.len(),
        "recorded user turn"
    );

    let outcome = state
        .engine
        .assess(&mut session, &request.intent, &request.user_message);
    let response = formatter::render(&outcome, &session.user_profile, &request.user_message);

    let (category, priority, escalation_id) = match &outcome {
        EscalationOutcome::Escalated(decision) => (
            Some(decision.category),
            Some(decision.category.info().priority),
            Some(decision.escalation_id.clone()),
        ),
        EscalationOutcome::NoEscalation => (None, None, None),
    };

    info!(
        session_id = %request.session_id,
        escalated = category.is_some(),
        "escalation request handled"
    );

    Ok(EscalationResponse {
        response,
        escalated: category.is_some(),
        category,
        priority,
        escalation_id,
        previous_escalations: session.previous_escalations,
    })
}
