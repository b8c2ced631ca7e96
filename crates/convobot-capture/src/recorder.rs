//! Recording controller managing the microphone capture lifecycle.
//!
//! Drives the `Idle -> Requesting -> Recording -> Stopping -> Idle` state
//! machine; the stream buffers audio chunks while recording, and `stop`
//! drains them into a single `Attachment`. The capture stream acquired by
//! `start` is always released by `stop` or by controller teardown.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use convobot_core::error::{ConvoError, Result};
use convobot_core::types::{Attachment, AttachmentKind};

use crate::device::{CaptureDevice, CaptureStream};
use crate::state::{RecordingState, StateMachine};

/// Data owned for the duration of one capture session.
struct LiveSession {
    stream: Box<dyn CaptureStream>,
    started_at: DateTime<Utc>,
    chunks: Vec<u8>,
}

/// Owns the microphone capture lifecycle and produces recording attachments.
pub struct RecordingController {
    device: Arc<dyn CaptureDevice>,
    state: StateMachine,
    session: Mutex<Option<LiveSession>>,
    audio_mime_type: String,
}

impl RecordingController {
    /// Create a controller over the given capture device.
    pub fn new(device: Arc<dyn CaptureDevice>, audio_mime_type: impl Into<String>) -> Self {
        Self {
            device,
            state: StateMachine::new(),
            session: Mutex::new(None),
            audio_mime_type: audio_mime_type.into(),
        }
    }

    /// Returns the current recording state.
    pub fn current_state(&self) -> RecordingState {
        self.state.current()
    }

    /// Whether a capture session is live.
    pub fn is_recording(&self) -> bool {
        self.state.current() == RecordingState::Recording
    }

    /// Elapsed whole seconds since capture started, or 0 when idle.
    ///
    /// Display-only; the caller's 1-second tick reads this, and nothing in
    /// the pipeline depends on it.
    pub fn elapsed_secs(&self) -> u64 {
        let guard = self.session.lock().expect("session mutex poisoned");
        match guard.as_ref() {
            Some(session) => (Utc::now() - session.started_at).num_seconds().max(0) as u64,
            None => 0,
        }
    }

    /// Request microphone access and begin capturing.
    ///
    /// Transitions `Idle -> Requesting`, then `Requesting -> Recording` on
    /// grant. On denial or device error the controller returns to `Idle` and
    /// fails with `ConvoError::Permission`; the caller surfaces it to the
    /// user.
    pub async fn start(&self) -> Result<()> {
        self.state.transition(RecordingState::Requesting)?;

        let stream = match self.device.acquire().await {
            Ok(stream) => stream,
            Err(e) => {
                self.state.transition(RecordingState::Idle)?;
                tracing::warn!("Failed to start recording: {}", e);
                return Err(match e {
                    ConvoError::Permission(_) => e,
                    other => ConvoError::Permission(other.to_string()),
                });
            }
        };

        self.state.transition(RecordingState::Recording)?;

        let session = LiveSession {
            stream,
            started_at: Utc::now(),
            chunks: Vec::new(),
        };
        tracing::info!("Recording started");

        let mut guard = self
            .session
            .lock()
            .map_err(|e| ConvoError::InvalidState(format!("session mutex poisoned: {}", e)))?;
        *guard = Some(session);
        Ok(())
    }

    /// Stop capturing and finalize the buffered audio into an attachment.
    ///
    /// Only valid from `Recording`. The capture stream is released
    /// unconditionally before this returns, on success and failure alike.
    pub fn stop(&self) -> Result<Attachment> {
        self.state.transition(RecordingState::Stopping)?;

        let mut guard = self
            .session
            .lock()
            .map_err(|e| ConvoError::InvalidState(format!("session mutex poisoned: {}", e)))?;
        let mut session = match guard.take() {
            Some(session) => session,
            None => {
                // State said Recording but no session exists; recover.
                self.state.reset();
                return Err(ConvoError::InvalidState(
                    "no live capture session to stop".to_string(),
                ));
            }
        };
        drop(guard);

        // Drain the buffered chunks, then release the hardware.
        while let Some(chunk) = session.stream.read_chunk() {
            session.chunks.extend_from_slice(&chunk);
        }
        session.stream.release();

        let extension = self
            .audio_mime_type
            .split('/')
            .nth(1)
            .unwrap_or("webm")
            .to_string();
        let name = format!(
            "recording-{}.{}",
            session.started_at.timestamp_millis(),
            extension
        );
        let attachment = Attachment {
            kind: AttachmentKind::Recording,
            data: session.chunks,
            mime_type: self.audio_mime_type.clone(),
            name,
        };

        self.state.transition(RecordingState::Idle)?;
        tracing::info!(
            name = %attachment.name,
            size_bytes = attachment.size_bytes(),
            "Recording finalized"
        );
        Ok(attachment)
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        // Teardown must never leave a capture stream open.
        if let Ok(mut guard) = self.session.lock() {
            if let Some(session) = guard.as_mut() {
                session.stream.release();
                tracing::warn!("Capture stream released on controller teardown");
            }
            *guard = None;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
