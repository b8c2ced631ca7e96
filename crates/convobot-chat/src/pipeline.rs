//! Message resolution pipeline.
//!
//! Turns a pending send (typed text plus optional attachment) into final
//! message content. Voice recordings are transcribed; transcription failures
//! degrade the content but never abort the send. Resolution completes fully
//! before any store mutation happens.

use convobot_core::types::Attachment;

use crate::traits::TranscriptionService;

/// Content used when transcription fails and no text was typed.
pub const TRANSCRIPTION_FALLBACK: &str = "[Voice message - transcription failed]";

/// Content prefix used when a non-audio file is attached with no typed text.
pub const ATTACHED_FILE_PLACEHOLDER: &str = "Attached file";

/// Resolves typed text and an optional attachment into final message content.
pub struct MessagePipeline;

impl MessagePipeline {
    /// Resolve the final content for a send.
    ///
    /// The caller guarantees that at least one of `typed_text` (after
    /// trimming) or `attachment` is present; an all-empty send is rejected
    /// before this stage runs.
    pub async fn resolve(
        &self,
        typed_text: &str,
        attachment: Option<&Attachment>,
        transcriber: &dyn TranscriptionService,
    ) -> String {
        let typed = typed_text.trim();

        let attachment = match attachment {
            Some(attachment) => attachment,
            None => return typed.to_string(),
        };

        if attachment.is_recording() {
            match transcriber.transcribe(attachment).await {
                Ok(transcript) if !transcript.trim().is_empty() => transcript,
                Ok(_) => {
                    tracing::warn!(name = %attachment.name, "Transcription returned empty text");
                    Self::voice_fallback(typed)
                }
                Err(e) => {
                    // Swallowed here: a failed transcription degrades the
                    // content, it never blocks the send.
                    tracing::warn!(name = %attachment.name, error = %e, "Transcription failed");
                    Self::voice_fallback(typed)
                }
            }
        } else {
            // Non-audio files are referenced textually, never uploaded or
            // transcribed by this pipeline.
            let lead = if typed.is_empty() {
                ATTACHED_FILE_PLACEHOLDER
            } else {
                typed
            };
            format!("{} [File: {}]", lead, attachment.name)
        }
    }

    fn voice_fallback(typed: &str) -> String {
        if typed.is_empty() {
            TRANSCRIPTION_FALLBACK.to_string()
        } else {
            typed.to_string()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
