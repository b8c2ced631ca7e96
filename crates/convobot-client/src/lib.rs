//! HTTP implementation of the remote service ports.
//!
//! `ApiClient` speaks the backend REST contract over reqwest and implements
//! the `TranscriptionService`, `AnswerService`, and `ConversationBackend`
//! traits from `convobot-chat`.

pub mod client;

pub use client::{ApiClient, NETWORK_ERROR_MESSAGE};
