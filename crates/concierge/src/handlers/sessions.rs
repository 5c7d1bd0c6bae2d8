use tracing::info;

use super::errors::ConciergeError;
use crate::app_state::AppState;

pub async fn handle_delete_session(session_id: &str, state: &AppState) -> Result<(), ConciergeError> {
    if state.sessions.remove(session_id).await {
        info!(session_id = %session_id, "session removed");
        Ok(())
    } else {
        Err(ConciergeError::SessionNotFound(session_id.to_string()))
    }
}
