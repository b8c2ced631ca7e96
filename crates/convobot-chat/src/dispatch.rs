//! Query dispatch to the remote answering service.

use std::sync::Arc;

use convobot_core::error::Result;
use convobot_core::types::{Message, QueryRequest};

use crate::traits::AnswerService;

/// Sends a resolved question plus prior turns to the answering service.
pub struct QueryDispatcher {
    service: Arc<dyn AnswerService>,
    model_choice: String,
}

impl QueryDispatcher {
    pub fn new(service: Arc<dyn AnswerService>, model_choice: impl Into<String>) -> Self {
        Self {
            service,
            model_choice: model_choice.into(),
        }
    }

    /// Ask the answering service for a reply.
    ///
    /// `prior_turns` must already exclude the synthesized welcome message.
    /// `context_id` scopes backend retrieval to the selected call/file and is
    /// passed through unmodified; `None` is a general query. Failures are
    /// returned to the caller, which absorbs them into a locally visible
    /// assistant message.
    pub async fn query(
        &self,
        question: &str,
        prior_turns: Vec<Message>,
        context_id: Option<String>,
    ) -> Result<String> {
        tracing::debug!(
            question_len = question.len(),
            prior_turns = prior_turns.len(),
            context_id = context_id.as_deref().unwrap_or("-"),
            "Dispatching query"
        );
        let request = QueryRequest {
            question: question.to_string(),
            chat_history: prior_turns,
            model_choice: self.model_choice.clone(),
            selected_call_id: context_id,
        };
        let response = self.service.answer(request).await?;
        Ok(response.answer)
    }
}

// =============================================================================
// Tests
// =============================================================================
