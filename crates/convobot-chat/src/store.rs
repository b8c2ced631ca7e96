//! Conversation store: single owner of all conversation state mutation.
//!
//! Holds the active message sequence (an optimistic client-side mirror of
//! backend state) and the persisted conversation summaries. Appends are
//! local-only and synchronous; load/list/delete go to the backend, and their
//! failures are logged while the prior in-memory state stays valid.

use std::sync::Arc;

use convobot_core::types::{welcome_message, ConversationSummary, Message, ViewContext};

use crate::traits::ConversationBackend;

/// Client-side owner of the active message sequence and summary list.
pub struct ConversationStore {
    backend: Arc<dyn ConversationBackend>,
    active_id: Option<String>,
    messages: Vec<Message>,
    summaries: Vec<ConversationSummary>,
    context: Option<ViewContext>,
    /// Whether `messages[0]` is the locally synthesized welcome (as opposed
    /// to a welcome loaded back from the backend as ordinary history).
    synthesized_welcome: bool,
}

impl ConversationStore {
    /// Create a store seeded with a welcome message for the given context.
    pub fn new(backend: Arc<dyn ConversationBackend>, context: Option<ViewContext>) -> Self {
        let welcome = welcome_message(context.as_ref());
        Self {
            backend,
            active_id: None,
            messages: vec![welcome],
            summaries: Vec::new(),
            context,
            synthesized_welcome: true,
        }
    }

    // ---- Accessors ----

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn summaries(&self) -> &[ConversationSummary] {
        &self.summaries
    }

    pub fn context(&self) -> Option<&ViewContext> {
        self.context.as_ref()
    }

    /// Turns to send as dispatch context, excluding the synthesized welcome.
    pub fn prior_turns(&self) -> Vec<Message> {
        let skip = usize::from(self.synthesized_welcome);
        self.messages.iter().skip(skip).cloned().collect()
    }

    // ---- Local mutation ----

    /// Optimistic, synchronous, local-only append. The sequence is
    /// append-only; nothing ever rewrites or reorders existing entries.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Record the backend-assigned id after the first successful persistence.
    pub fn set_active_id(&mut self, id: String) {
        self.active_id = Some(id);
    }

    /// Reset to a fresh conversation: no active id, a single welcome message
    /// computed from the current context. Discards any unsent local state.
    pub fn new_conversation(&mut self) {
        self.active_id = None;
        self.messages = vec![welcome_message(self.context.as_ref())];
        self.synthesized_welcome = true;
    }

    /// Update the externally selected context.
    ///
    /// Regenerates the welcome message iff the sequence has not diverged from
    /// the initial single welcome entry.
    pub fn set_context(&mut self, context: Option<ViewContext>) {
        self.context = context;
        if self.synthesized_welcome && self.messages.len() == 1 {
            self.messages[0] = welcome_message(self.context.as_ref());
        }
    }

    // ---- Backend-coupled operations ----

    /// Replace local state with the authoritative server sequence.
    ///
    /// On backend failure the error is logged and the prior state remains.
    pub async fn load(&mut self, id: &str) {
        match self.backend.fetch(id).await {
            Ok(conversation) => {
                self.messages = conversation.messages;
                self.active_id = Some(id.to_string());
                self.synthesized_welcome = false;
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Failed to load conversation");
            }
        }
    }

    /// Refresh the summary list from the backend.
    pub async fn list_summaries(&mut self, limit: usize) {
        match self.backend.list(limit).await {
            Ok(summaries) => self.summaries = summaries,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load conversation summaries");
            }
        }
    }

    /// Delete a conversation. Removes it from the summary list; deleting the
    /// active conversation resets local state like `new_conversation`.
    pub async fn delete_conversation(&mut self, id: &str) {
        match self.backend.delete(id).await {
            Ok(()) => {
                self.summaries.retain(|s| s.id != id);
                if self.active_id.as_deref() == Some(id) {
                    self.new_conversation();
                }
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Failed to delete conversation");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
