//! Collaborator ports for the send pipeline.
//!
//! The chat crate talks to the backend only through these object-safe async
//! traits; the HTTP implementation lives in `convobot-client`, and tests use
//! in-memory mocks.

use async_trait::async_trait;

use convobot_core::error::Result;
use convobot_core::types::{
    Attachment, Conversation, ConversationSummary, Message, QueryRequest, QueryResponse,
};

/// Turns a staged voice recording into text.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Transcribe the audio attachment. An empty string is a valid result
    /// (silence); errors are recoverable at the pipeline layer.
    async fn transcribe(&self, audio: &Attachment) -> Result<String>;
}

/// Answers a resolved question given prior conversation turns.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn answer(&self, request: QueryRequest) -> Result<QueryResponse>;
}

/// Remote conversation persistence.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Create a conversation and return its backend-assigned id.
    async fn create(&self, title: &str, messages: &[Message]) -> Result<String>;

    /// Append new trailing messages to an existing conversation.
    async fn append(&self, id: &str, messages: &[Message]) -> Result<()>;

    /// List the most recent conversation summaries.
    async fn list(&self, limit: usize) -> Result<Vec<ConversationSummary>>;

    /// Fetch a full conversation.
    async fn fetch(&self, id: &str) -> Result<Conversation>;

    /// Delete a conversation.
    async fn delete(&self, id: &str) -> Result<()>;
}
