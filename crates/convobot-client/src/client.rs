//! Backend REST client.
//!
//! One `ApiClient` instance is shared by all three service ports. Endpoint
//! paths and body shapes follow the backend contract:
//!
//! - `POST /transcript`            multipart, field `audio_file`
//! - `POST /chat/query`            JSON `QueryRequest`
//! - `POST /chat/save`             JSON `{title, messages}`
//! - `POST /chat/{id}/messages`    JSON `{messages}`
//! - `GET  /chat/history?limit=N`  JSON summary list
//! - `GET  /chat/{id}`             JSON full conversation
//! - `DELETE /chat/{id}`

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use convobot_chat::traits::{AnswerService, ConversationBackend, TranscriptionService};
use convobot_core::config::BackendConfig;
use convobot_core::error::{ConvoError, Result};
use convobot_core::types::{
    Attachment, Conversation, ConversationSummary, Message, QueryRequest, QueryResponse,
};

/// User-facing message for a backend that cannot be reached.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to connect to the server. Please ensure the backend is running.";

const REQUEST_TIMEOUT_SECS: u64 = 120;

// ---- Wire bodies ----

#[derive(Serialize)]
struct SaveConversationBody<'a> {
    title: &'a str,
    messages: &'a [Message],
}

#[derive(Serialize)]
struct AppendMessagesBody<'a> {
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct SavedConversation {
    id: String,
}

/// HTTP client for the conversation backend.
pub struct ApiClient {
    base_url: String,
    auth_token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client against the given base URL.
    ///
    /// A bearer token, when present, is attached to every request.
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConvoError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: normalize_base_url(base_url.into()),
            auth_token,
            http,
        })
    }

    /// Create a client from the `[backend]` config section.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.auth_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn transport_error(e: reqwest::Error) -> ConvoError {
        if e.is_connect() || e.is_timeout() {
            ConvoError::Network(NETWORK_ERROR_MESSAGE.to_string())
        } else {
            ConvoError::Network(e.to_string())
        }
    }

    /// Pass 2xx responses through; turn everything else into `ConvoError::Api`
    /// using the body's `error` field when the backend supplies one, falling
    /// back to the transport-level status message.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let transport_message = match response.error_for_status_ref() {
            Err(e) => e.to_string(),
            Ok(_) => format!("server returned status {}", response.status()),
        };
        let body = response.text().await.unwrap_or_default();
        Err(ConvoError::Api(api_error_message(&body, transport_message)))
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| ConvoError::Api(format!("invalid response body: {}", e)))
    }
}

/// Trailing slashes would double up when joining paths.
fn normalize_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

fn api_error_message(body: &str, transport_message: String) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(transport_message)
}

#[async_trait]
impl TranscriptionService for ApiClient {
    async fn transcribe(&self, audio: &Attachment) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(audio.data.clone())
            .file_name(audio.name.clone())
            .mime_str(&audio.mime_type)
            .map_err(|e| ConvoError::Transcription(format!("invalid audio mime type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("audio_file", part);

        tracing::debug!(name = %audio.name, size_bytes = audio.size_bytes(), "Uploading audio for transcription");
        let response = self
            .authorize(self.http.post(self.url("/transcript")))
            .multipart(form)
            .send()
            .await
            .map_err(Self::transport_error)?;
        // The endpoint returns the transcript text directly as a JSON string.
        let transcript: String = Self::decode(Self::check(response).await?).await?;
        Ok(transcript)
    }
}

#[async_trait]
impl AnswerService for ApiClient {
    async fn answer(&self, request: QueryRequest) -> Result<QueryResponse> {
        let response = self
            .authorize(self.http.post(self.url("/chat/query")))
            .json(&request)
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::decode(Self::check(response).await?).await
    }
}

#[async_trait]
impl ConversationBackend for ApiClient {
    async fn create(&self, title: &str, messages: &[Message]) -> Result<String> {
        let body = SaveConversationBody { title, messages };
        let response = self
            .authorize(self.http.post(self.url("/chat/save")))
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;
        let saved: SavedConversation = Self::decode(Self::check(response).await?).await?;
        Ok(saved.id)
    }

    async fn append(&self, id: &str, messages: &[Message]) -> Result<()> {
        let body = AppendMessagesBody { messages };
        let response = self
            .authorize(
                self.http
                    .post(self.url(&format!("/chat/{}/messages", id))),
            )
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<ConversationSummary>> {
        let response = self
            .authorize(self.http.get(self.url("/chat/history")))
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::decode(Self::check(response).await?).await
    }

    async fn fetch(&self, id: &str) -> Result<Conversation> {
        let response = self
            .authorize(self.http.get(self.url(&format!("/chat/{}", id))))
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::decode(Self::check(response).await?).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .authorize(self.http.delete(self.url(&format!("/chat/{}", id))))
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::check(response).await?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/chat/history"), "http://localhost:8000/chat/history");
    }

    #[test]
    fn test_base_url_without_slash_unchanged() {
        let client = ApiClient::new("http://localhost:8000", None).unwrap();
        assert_eq!(client.url("/transcript"), "http://localhost:8000/transcript");
    }

    #[test]
    fn test_from_config_uses_backend_section() {
        let config = BackendConfig {
            base_url: "http://api.example.com/".to_string(),
            auth_token: Some("token-1".to_string()),
        };
        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://api.example.com");
    }

    fn transport(text: &str) -> String {
        text.to_string()
    }

    #[test]
    fn test_api_error_message_prefers_error_field() {
        let body = r#"{"error":"Conversation not found"}"#;
        assert_eq!(
            api_error_message(body, transport("HTTP status client error (404 Not Found)")),
            "Conversation not found"
        );
    }

    #[test]
    fn test_api_error_message_falls_back_to_transport_message() {
        assert_eq!(
            api_error_message(
                "internal server error",
                transport("HTTP status server error (500 Internal Server Error)")
            ),
            "HTTP status server error (500 Internal Server Error)"
        );
        assert_eq!(
            api_error_message("", transport("HTTP status client error (404 Not Found)")),
            "HTTP status client error (404 Not Found)"
        );
    }

    #[test]
    fn test_api_error_message_ignores_non_string_error() {
        let body = r#"{"error":{"code":7}}"#;
        assert_eq!(
            api_error_message(body, transport("HTTP status client error (400 Bad Request)")),
            "HTTP status client error (400 Bad Request)"
        );
    }

    #[test]
    fn test_save_body_shape() {
        let messages = vec![Message::user("hello")];
        let body = SaveConversationBody {
            title: "Test",
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["title"], "Test");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_append_body_shape() {
        let messages = vec![Message::user("a"), Message::assistant("b")];
        let body = AppendMessagesBody {
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_saved_conversation_extracts_id() {
        let json = r#"{"id":"conv-uuid","user_id":"u1","title":"Test","messages":[],"created_at":"2024-06-01T12:00:00Z","updated_at":"2024-06-01T12:00:00Z"}"#;
        let saved: SavedConversation = serde_json::from_str(json).unwrap();
        assert_eq!(saved.id, "conv-uuid");
    }
}
