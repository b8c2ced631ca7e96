//! Shared domain and wire types for the ConvoBot pipeline.
//!
//! All serde shapes here match the backend REST contract exactly; the
//! conversation types double as the client-side mirror of backend state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Messages
// =============================================================================

/// Who authored a message. Closed variant so role handling is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn in a conversation. Immutable once appended to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Set by the backend on persisted messages; absent on locally
    /// synthesized ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a user message with no timestamp.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: None,
        }
    }

    /// Create an assistant message with no timestamp.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: None,
        }
    }
}

// =============================================================================
// Conversations
// =============================================================================

/// A full conversation as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub message_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A conversation list row. `message_count` here is authoritative; local
/// optimistic counts are reconciled on the next list refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub message_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Attachments
// =============================================================================

/// How an attachment entered the staging area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// A user-picked or dropped file.
    File,
    /// The finalized output of a microphone recording.
    Recording,
}

/// A staged attachment awaiting inclusion in the next send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub data: Vec<u8>,
    pub mime_type: String,
    pub name: String,
}

impl Attachment {
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether this attachment is a voice recording to be transcribed.
    pub fn is_recording(&self) -> bool {
        self.kind == AttachmentKind::Recording
    }
}

// =============================================================================
// External view context
// =============================================================================

/// The externally selected call/file the user is currently viewing.
///
/// Scopes welcome text and is passed through to the answering service so the
/// backend can narrow retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    pub id: String,
    pub filename: String,
}

/// Build the synthesized assistant welcome message for the given context.
pub fn welcome_message(context: Option<&ViewContext>) -> Message {
    let content = match context {
        Some(ctx) => format!(
            "Hi! I'm ConvoBot, your AI call assistant. I can see you're viewing \
             \"{}\". Ask me anything about this call or your other recent calls.",
            ctx.filename
        ),
        None => "Hi! I'm ConvoBot, your AI call assistant. Ask me anything about \
                 your call summaries, transcripts, or action items."
            .to_string(),
    };
    Message::assistant(content)
}

// =============================================================================
// Query wire types
// =============================================================================

/// Request body for `POST /chat/query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub chat_history: Vec<Message>,
    pub model_choice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_call_id: Option<String>,
}

/// Response body for `POST /chat/query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_role_deserializes_lowercase() {
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn test_role_rejects_unknown() {
        let result: std::result::Result<Role, _> = serde_json::from_str("\"system\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
        assert!(msg.created_at.is_none());

        let msg = Message::assistant("hi there");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "hi there");
    }

    #[test]
    fn test_message_omits_absent_timestamp() {
        let json = serde_json::to_string(&Message::user("hello")).unwrap();
        assert!(!json.contains("created_at"));
    }

    #[test]
    fn test_message_round_trips_timestamp() {
        let json = r#"{"role":"assistant","content":"hi","created_at":"2024-06-01T12:00:00Z"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(msg.created_at.is_some());
    }

    #[test]
    fn test_conversation_defaults() {
        let json = r#"{"id":"abc","title":"Test"}"#;
        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert!(conv.messages.is_empty());
        assert_eq!(conv.message_count, 0);
        assert!(conv.created_at.is_none());
    }

    #[test]
    fn test_attachment_size_bytes() {
        let att = Attachment {
            kind: AttachmentKind::File,
            data: vec![0u8; 1024],
            mime_type: "application/pdf".to_string(),
            name: "notes.pdf".to_string(),
        };
        assert_eq!(att.size_bytes(), 1024);
        assert!(!att.is_recording());
    }

    #[test]
    fn test_attachment_is_recording() {
        let att = Attachment {
            kind: AttachmentKind::Recording,
            data: vec![1, 2, 3],
            mime_type: "audio/webm".to_string(),
            name: "recording-1700000000000.webm".to_string(),
        };
        assert!(att.is_recording());
    }

    #[test]
    fn test_welcome_message_without_context() {
        let msg = welcome_message(None);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(
            msg.content,
            "Hi! I'm ConvoBot, your AI call assistant. Ask me anything about \
             your call summaries, transcripts, or action items."
        );
    }

    #[test]
    fn test_welcome_message_with_context() {
        let ctx = ViewContext {
            id: "call-42".to_string(),
            filename: "standup.mp3".to_string(),
        };
        let msg = welcome_message(Some(&ctx));
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.content.contains("\"standup.mp3\""));
        assert!(msg.content.starts_with("Hi! I'm ConvoBot"));
    }

    #[test]
    fn test_query_request_omits_absent_call_id() {
        let req = QueryRequest {
            question: "what was discussed?".to_string(),
            chat_history: vec![],
            model_choice: "gemini".to_string(),
            selected_call_id: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("selected_call_id"));
        assert!(json.contains("chat_history"));
        assert!(json.contains("model_choice"));
    }

    #[test]
    fn test_query_request_includes_call_id() {
        let req = QueryRequest {
            question: "summarize".to_string(),
            chat_history: vec![Message::user("hi")],
            model_choice: "gemini".to_string(),
            selected_call_id: Some("call-7".to_string()),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"selected_call_id\":\"call-7\""));
    }

    #[test]
    fn test_query_response_deserializes() {
        let resp: QueryResponse = serde_json::from_str(r#"{"answer":"42"}"#).unwrap();
        assert_eq!(resp.answer, "42");
    }
}
