//! Chat session: owner of the send cycle.
//!
//! Coordinates attachment staging, recording, message resolution, dispatch,
//! and persistence against the single conversation store. Exactly one send
//! runs at a time; within a send the stages execute strictly in sequence:
//! resolve -> append-user -> dispatch -> append-assistant -> persist.

use std::sync::Arc;

use convobot_capture::{AttachmentManager, CaptureDevice, RecordingController};
use convobot_core::config::ConvoConfig;
use convobot_core::error::{ConvoError, Result};
use convobot_core::types::{Attachment, ConversationSummary, Message, ViewContext};

use crate::dispatch::QueryDispatcher;
use crate::persist::PersistenceSync;
use crate::pipeline::MessagePipeline;
use crate::store::ConversationStore;
use crate::traits::{AnswerService, ConversationBackend, TranscriptionService};

/// Assistant reply shown locally when the answering service fails.
pub const DISPATCH_ERROR_REPLY: &str =
    "I'm sorry, I encountered an error processing your request. Please try again.";

/// Drives the conversational pipeline for one user-facing chat surface.
pub struct ChatSession {
    store: ConversationStore,
    pipeline: MessagePipeline,
    dispatcher: QueryDispatcher,
    persistence: PersistenceSync,
    attachments: AttachmentManager,
    recorder: RecordingController,
    transcriber: Arc<dyn TranscriptionService>,
    history_limit: usize,
    sending: bool,
}

impl ChatSession {
    /// Wire a session from its collaborators and configuration.
    pub fn new(
        backend: Arc<dyn ConversationBackend>,
        answers: Arc<dyn AnswerService>,
        transcriber: Arc<dyn TranscriptionService>,
        device: Arc<dyn CaptureDevice>,
        config: &ConvoConfig,
        context: Option<ViewContext>,
    ) -> Self {
        Self {
            store: ConversationStore::new(Arc::clone(&backend), context),
            pipeline: MessagePipeline,
            dispatcher: QueryDispatcher::new(answers, config.chat.model_choice.clone()),
            persistence: PersistenceSync::new(backend),
            attachments: AttachmentManager::new(config.capture.max_attachment_bytes),
            recorder: RecordingController::new(device, config.capture.audio_mime_type.clone()),
            transcriber,
            history_limit: config.chat.history_limit,
            sending: false,
        }
    }

    // ---- Send cycle ----

    /// Whether a send could start right now.
    ///
    /// False while a send is in flight, while recording, or when there is no
    /// content (no typed text and no staged attachment).
    pub fn can_send(&self, typed_text: &str) -> bool {
        !self.sending
            && !self.recorder.is_recording()
            && (!typed_text.trim().is_empty() || self.attachments.has_staged())
    }

    /// Run one full send cycle.
    ///
    /// Rejects with `ConvoError::Validation` before any stage runs when the
    /// send is empty, a send is already in flight, or a recording is active.
    /// Dispatch failures are absorbed into a locally visible assistant
    /// message and never persisted; this returns `Ok` in that case.
    pub async fn send(&mut self, typed_text: &str) -> Result<()> {
        if self.sending {
            return Err(ConvoError::Validation(
                "a send is already in flight".to_string(),
            ));
        }
        if self.recorder.is_recording() {
            return Err(ConvoError::Validation(
                "cannot send while recording".to_string(),
            ));
        }
        if typed_text.trim().is_empty() && !self.attachments.has_staged() {
            return Err(ConvoError::Validation(
                "message cannot be empty".to_string(),
            ));
        }

        self.sending = true;
        let result = self.send_inner(typed_text).await;
        self.sending = false;
        result
    }

    async fn send_inner(&mut self, typed_text: &str) -> Result<()> {
        // Resolution completes fully before any store mutation.
        let attachment = self.attachments.take();
        let content = self
            .pipeline
            .resolve(typed_text, attachment.as_ref(), self.transcriber.as_ref())
            .await;

        let user_message = Message::user(content);
        let prior_turns = self.store.prior_turns();
        let context_id = self.store.context().map(|c| c.id.clone());

        // Optimistic local append keeps the surface responsive while the
        // answering service runs.
        self.store.append(user_message.clone());

        match self
            .dispatcher
            .query(&user_message.content, prior_turns, context_id)
            .await
        {
            Ok(answer) => {
                let assistant_message = Message::assistant(answer);
                self.store.append(assistant_message.clone());

                let delta = [user_message, assistant_message];
                let new_id = self
                    .persistence
                    .sync_exchange(self.store.active_id(), self.store.messages(), &delta)
                    .await;
                if let Some(id) = new_id {
                    self.store.set_active_id(id);
                    self.store.list_summaries(self.history_limit).await;
                }
            }
            Err(e) => {
                // A failed exchange stays visible locally but is never
                // persisted.
                tracing::error!(error = %e, "Failed to get AI response");
                self.store.append(Message::assistant(DISPATCH_ERROR_REPLY));
            }
        }
        Ok(())
    }

    // ---- Recording ----

    /// Start a microphone recording. Mutually exclusive with a send.
    ///
    /// A live capture session and a staged attachment never coexist: once
    /// capture starts, anything staged earlier is discarded. A denied start
    /// leaves the staged attachment in place.
    pub async fn start_recording(&mut self) -> Result<()> {
        if self.sending {
            return Err(ConvoError::Validation(
                "cannot record while a send is in flight".to_string(),
            ));
        }
        self.recorder.start().await?;
        self.attachments.clear();
        Ok(())
    }

    /// Stop the recording and stage its output, superseding any staged file.
    pub fn stop_recording(&mut self) -> Result<()> {
        let attachment = self.recorder.stop()?;
        self.attachments.attach(attachment)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Elapsed recording seconds for the display tick.
    pub fn recording_elapsed_secs(&self) -> u64 {
        self.recorder.elapsed_secs()
    }

    // ---- Attachments ----

    /// Stage a file attachment. Rejected while a recording is live; staging
    /// after a recording has fully stopped replaces its output like any
    /// other attachment.
    pub fn attach_file(&mut self, attachment: Attachment) -> Result<()> {
        if self.recorder.is_recording() {
            return Err(ConvoError::Validation(
                "cannot stage an attachment while recording".to_string(),
            ));
        }
        self.attachments.attach(attachment)
    }

    pub fn clear_attachment(&self) {
        self.attachments.clear();
    }

    pub fn staged_attachment(&self) -> Option<Attachment> {
        self.attachments.staged()
    }

    // ---- Conversation state ----

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn summaries(&self) -> &[ConversationSummary] {
        self.store.summaries()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.store.active_id()
    }

    pub fn new_conversation(&mut self) {
        self.store.new_conversation();
    }

    pub fn set_context(&mut self, context: Option<ViewContext>) {
        self.store.set_context(context);
    }

    pub async fn load_conversation(&mut self, id: &str) {
        self.store.load(id).await;
    }

    pub async fn refresh_summaries(&mut self) {
        self.store.list_summaries(self.history_limit).await;
    }

    pub async fn delete_conversation(&mut self, id: &str) {
        self.store.delete_conversation(id).await;
    }
}

// =============================================================================
// Tests
// =============================================================================
