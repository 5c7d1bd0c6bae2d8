use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::{SessionState, SessionStore, SharedSession, UserProfile};

/// In-process session store. Sessions live until removed or the process exits.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn session(&self, session_id: &str, profile: Option<UserProfile>) -> SharedSession {
        if let Some(existing) = self.sessions.read().await.get(session_id) {
            return Arc::clone(existing);
        }

        let mut sessions = self.sessions.write().await;
        // Another task may have created it between the two locks
        let entry = sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id = %session_id, "creating session");
            Arc::new(Mutex::new(SessionState::new(profile.unwrap_or_default())))
        });
        Arc::clone(entry)
    }

    async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CustomerTier;

    #[tokio::test]
    async fn test_session_created_once() {
        let store = MemorySessionStore::new();
        let profile = UserProfile {
            customer_id: Some("C-1".to_string()),
            tier: CustomerTier::Premier,
        };

        let first = store.session("s1", Some(profile)).await;
        first.lock().await.previous_escalations = 2;

        // Profile on later calls does not replace the stored one
        let second = store.session("s1", None).await;
        let state = second.lock().await;
        assert_eq!(state.previous_escalations, 2);
        assert_eq!(state.user_profile.tier, CustomerTier::Premier);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemorySessionStore::new();
        store.session("s1", None).await;
        assert!(store.remove("s1").await);
        assert!(!store.remove("s1").await);
        assert!(store.is_empty().await);
    }
}
