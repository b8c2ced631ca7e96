//! Conversation pipeline: message resolution, query dispatch, local
//! conversation state, and best-effort persistence, tied together by the
//! `ChatSession` send cycle.
//!
//! Remote collaborators are reached through the `TranscriptionService`,
//! `AnswerService`, and `ConversationBackend` traits so the pipeline can be
//! tested against in-memory mocks.

pub mod dispatch;
pub mod mock;
pub mod persist;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod traits;

pub use dispatch::QueryDispatcher;
pub use mock::{MockAnswerService, MockConversationBackend, MockTranscriptionService};
pub use persist::{derive_title, PersistenceSync, DEFAULT_TITLE};
pub use pipeline::{MessagePipeline, ATTACHED_FILE_PLACEHOLDER, TRANSCRIPTION_FALLBACK};
pub use session::{ChatSession, DISPATCH_ERROR_REPLY};
pub use store::ConversationStore;
pub use traits::{AnswerService, ConversationBackend, TranscriptionService};
