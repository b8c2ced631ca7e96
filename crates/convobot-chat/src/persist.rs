//! Best-effort remote persistence of confirmed message pairs.
//!
//! Converts successful exchanges into create/append calls against the
//! conversation backend. Failures are logged only: the optimistic local
//! append is never rolled back and there is no automatic retry.

use std::sync::Arc;

use convobot_core::types::{Message, Role};

use crate::traits::ConversationBackend;

/// Title fallback when no user message exists yet.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Maximum title length in characters before truncation.
const TITLE_MAX_CHARS: usize = 50;

/// Derive a conversation title from the first user message.
///
/// Takes the first 50 characters and appends `...` when the original is
/// longer; falls back to a fixed default when no user message exists.
pub fn derive_title(messages: &[Message]) -> String {
    let first_user = messages.iter().find(|m| m.role == Role::User);
    match first_user {
        Some(message) => {
            let mut title: String = message.content.chars().take(TITLE_MAX_CHARS).collect();
            if message.content.chars().count() > TITLE_MAX_CHARS {
                title.push_str("...");
            }
            title
        }
        None => DEFAULT_TITLE.to_string(),
    }
}

/// Syncs confirmed exchanges to the backend.
pub struct PersistenceSync {
    backend: Arc<dyn ConversationBackend>,
}

impl PersistenceSync {
    pub fn new(backend: Arc<dyn ConversationBackend>) -> Self {
        Self { backend }
    }

    /// Persist one successful exchange.
    ///
    /// With an `active_id` the new user+assistant pair (`delta`) is appended;
    /// without one the conversation is created with its full history
    /// (welcome included) and a derived title. Returns the backend-assigned
    /// id on creation so the caller can record it. Persistence failures are
    /// logged and swallowed.
    pub async fn sync_exchange(
        &self,
        active_id: Option<&str>,
        all_messages: &[Message],
        delta: &[Message],
    ) -> Option<String> {
        match active_id {
            Some(id) => {
                if let Err(e) = self.backend.append(id, delta).await {
                    tracing::warn!(id, error = %e, "Failed to append messages to conversation");
                }
                None
            }
            None => {
                let title = derive_title(all_messages);
                match self.backend.create(&title, all_messages).await {
                    Ok(id) => {
                        tracing::info!(id, title = %title, "Conversation created");
                        Some(id)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to save conversation");
                        None
                    }
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
