//! In-memory mock collaborators.
//!
//! Used by tests throughout the workspace and by the app binary when no real
//! backend is configured. Each mock can be flipped into a failing mode to
//! exercise the degradation paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use convobot_core::error::{ConvoError, Result};
use convobot_core::types::{
    Attachment, Conversation, ConversationSummary, Message, QueryRequest, QueryResponse,
};

use crate::traits::{AnswerService, ConversationBackend, TranscriptionService};

// =============================================================================
// MockConversationBackend
// =============================================================================

/// In-memory conversation backend.
///
/// Stores conversations in creation order and tracks how many create/append
/// calls were made so tests can assert persistence behavior.
#[derive(Default)]
pub struct MockConversationBackend {
    conversations: Mutex<Vec<Conversation>>,
    next_id: AtomicUsize,
    create_calls: AtomicUsize,
    append_calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockConversationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// When failing, every backend call returns a network error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::Relaxed)
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::Relaxed)
    }

    /// A copy of the stored conversation, if present.
    pub fn conversation(&self, id: &str) -> Option<Conversation> {
        let conversations = self.conversations.lock().expect("mock mutex poisoned");
        conversations.iter().find(|c| c.id == id).cloned()
    }

    /// Seed a conversation directly, bypassing `create` accounting.
    pub fn seed(&self, conversation: Conversation) {
        let mut conversations = self.conversations.lock().expect("mock mutex poisoned");
        conversations.push(conversation);
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            Err(ConvoError::Network(
                "Unable to connect to the server. Please ensure the backend is running."
                    .to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConversationBackend for MockConversationBackend {
    async fn create(&self, title: &str, messages: &[Message]) -> Result<String> {
        self.check_failing()?;
        self.create_calls.fetch_add(1, Ordering::Relaxed);
        let id = format!("conv-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let conversation = Conversation {
            id: id.clone(),
            title: title.to_string(),
            messages: messages.to_vec(),
            message_count: messages.len(),
            created_at: None,
        };
        let mut conversations = self.conversations.lock().expect("mock mutex poisoned");
        conversations.push(conversation);
        Ok(id)
    }

    async fn append(&self, id: &str, messages: &[Message]) -> Result<()> {
        self.check_failing()?;
        self.append_calls.fetch_add(1, Ordering::Relaxed);
        let mut conversations = self.conversations.lock().expect("mock mutex poisoned");
        let conversation = conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ConvoError::Api(format!("conversation not found: {}", id)))?;
        conversation.messages.extend_from_slice(messages);
        conversation.message_count = conversation.messages.len();
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<ConversationSummary>> {
        self.check_failing()?;
        let conversations = self.conversations.lock().expect("mock mutex poisoned");
        Ok(conversations
            .iter()
            .rev()
            .take(limit)
            .map(|c| ConversationSummary {
                id: c.id.clone(),
                title: c.title.clone(),
                message_count: c.message_count,
                created_at: c.created_at,
            })
            .collect())
    }

    async fn fetch(&self, id: &str) -> Result<Conversation> {
        self.check_failing()?;
        self.conversation(id)
            .ok_or_else(|| ConvoError::Api(format!("conversation not found: {}", id)))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check_failing()?;
        let mut conversations = self.conversations.lock().expect("mock mutex poisoned");
        let before = conversations.len();
        conversations.retain(|c| c.id != id);
        if conversations.len() == before {
            return Err(ConvoError::Api(format!("conversation not found: {}", id)));
        }
        Ok(())
    }
}

// =============================================================================
// MockAnswerService
// =============================================================================

/// Answering service returning a canned reply.
///
/// Records the most recent request so tests can assert question text, prior
/// turns, and context id.
pub struct MockAnswerService {
    reply: String,
    failing: AtomicBool,
    last_request: Mutex<Option<QueryRequest>>,
}

impl MockAnswerService {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            failing: AtomicBool::new(false),
            last_request: Mutex::new(None),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn last_request(&self) -> Option<QueryRequest> {
        self.last_request.lock().expect("mock mutex poisoned").clone()
    }
}

#[async_trait]
impl AnswerService for MockAnswerService {
    async fn answer(&self, request: QueryRequest) -> Result<QueryResponse> {
        *self.last_request.lock().expect("mock mutex poisoned") = Some(request);
        if self.failing.load(Ordering::Relaxed) {
            return Err(ConvoError::Network(
                "Unable to connect to the server. Please ensure the backend is running."
                    .to_string(),
            ));
        }
        Ok(QueryResponse {
            answer: self.reply.clone(),
        })
    }
}

// =============================================================================
// MockTranscriptionService
// =============================================================================

/// Transcriber returning a canned transcript, or failing on demand.
pub struct MockTranscriptionService {
    transcript: String,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockTranscriptionService {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TranscriptionService for MockTranscriptionService {
    async fn transcribe(&self, _audio: &Attachment) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing.load(Ordering::Relaxed) {
            return Err(ConvoError::Transcription(
                "transcription service unavailable".to_string(),
            ));
        }
        Ok(self.transcript.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_create_and_fetch() {
        let backend = MockConversationBackend::new();
        let id = backend
            .create("Test", &[Message::user("hello")])
            .await
            .unwrap();
        let conversation = backend.fetch(&id).await.unwrap();
        assert_eq!(conversation.title, "Test");
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(backend.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_backend_append_updates_count() {
        let backend = MockConversationBackend::new();
        let id = backend.create("Test", &[Message::user("a")]).await.unwrap();
        backend
            .append(&id, &[Message::user("b"), Message::assistant("c")])
            .await
            .unwrap();
        let conversation = backend.fetch(&id).await.unwrap();
        assert_eq!(conversation.message_count, 3);
        assert_eq!(backend.append_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_backend_list_most_recent_first() {
        let backend = MockConversationBackend::new();
        backend.create("First", &[]).await.unwrap();
        backend.create("Second", &[]).await.unwrap();
        let summaries = backend.list(10).await.unwrap();
        assert_eq!(summaries[0].title, "Second");
        assert_eq!(summaries[1].title, "First");
    }

    #[tokio::test]
    async fn test_mock_backend_list_respects_limit() {
        let backend = MockConversationBackend::new();
        for i in 0..5 {
            backend.create(&format!("Conv {}", i), &[]).await.unwrap();
        }
        let summaries = backend.list(3).await.unwrap();
        assert_eq!(summaries.len(), 3);
    }

    #[tokio::test]
    async fn test_mock_backend_delete() {
        let backend = MockConversationBackend::new();
        let id = backend.create("Gone", &[]).await.unwrap();
        backend.delete(&id).await.unwrap();
        assert!(backend.fetch(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_backend_failing_mode() {
        let backend = MockConversationBackend::new();
        backend.set_failing(true);
        assert!(backend.create("x", &[]).await.is_err());
        assert!(backend.list(10).await.is_err());
        assert_eq!(backend.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_mock_answer_records_request() {
        let service = MockAnswerService::new("the answer");
        let request = QueryRequest {
            question: "q".to_string(),
            chat_history: vec![],
            model_choice: "gemini".to_string(),
            selected_call_id: None,
        };
        let response = service.answer(request).await.unwrap();
        assert_eq!(response.answer, "the answer");
        assert_eq!(service.last_request().unwrap().question, "q");
    }

    #[tokio::test]
    async fn test_mock_transcriber_counts_calls() {
        let service = MockTranscriptionService::new("words");
        let attachment = Attachment {
            kind: convobot_core::types::AttachmentKind::Recording,
            data: vec![1],
            mime_type: "audio/webm".to_string(),
            name: "recording-1.webm".to_string(),
        };
        assert_eq!(service.transcribe(&attachment).await.unwrap(), "words");
        assert_eq!(service.calls(), 1);
    }
}
