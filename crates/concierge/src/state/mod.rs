use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod memory;

/// Customer tier as reported by the profile service.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CustomerTier {
    #[default]
    Standard,
    Premium,
    Vip,
    Premier,
}

impl CustomerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerTier::Standard => "standard",
            CustomerTier::Premium => "premium",
            CustomerTier::Vip => "vip",
            CustomerTier::Premier => "premier",
        }
    }

    /// Tiers routed to the premier desk.
    pub fn is_priority(&self) -> bool {
        matches!(self, CustomerTier::Vip | CustomerTier::Premier)
    }
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub tier: CustomerTier,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Per-conversation state shared between the agent host and the escalation engine.
///
/// The engine only ever touches `previous_escalations`; everything else is
/// owned by the host. Callers must hold the session lock for the duration of
/// a decision so that a session has a single writer at a time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    #[serde(default)]
    pub user_profile: UserProfile,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default)]
    pub previous_escalations: u32,
}

impl SessionState {
    pub fn new(user_profile: UserProfile) -> Self {
        Self {
            user_profile,
            ..Self::default()
        }
    }

    pub fn record_turn(&mut self, turn: ConversationTurn) {
        self.conversation_history.push(turn);
    }
}

pub type SharedSession = Arc<Mutex<SessionState>>;

/// Storage for live conversation sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session, creating it with `profile` when it does not exist yet.
    async fn session(&self, session_id: &str, profile: Option<UserProfile>) -> SharedSession;

    /// Drop a session. Returns whether it existed.
    async fn remove(&self, session_id: &str) -> bool;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_defaults_when_fields_absent() {
        let state: SessionState =
            serde_json::from_str(r#"{"user_profile": {"tier": "vip"}}"#).unwrap();
        assert_eq!(state.previous_escalations, 0);
        assert!(state.conversation_history.is_empty());
        assert_eq!(state.user_profile.tier, CustomerTier::Vip);
        assert_eq!(state.user_profile.customer_id, None);
    }

    #[test]
    fn test_tier_priority() {
        assert!(CustomerTier::Vip.is_priority());
        assert!(CustomerTier::Premier.is_priority());
        assert!(!CustomerTier::Premium.is_priority());
        assert!(!CustomerTier::Standard.is_priority());
        assert_eq!(CustomerTier::Premier.to_string(), "premier");
    }
}
