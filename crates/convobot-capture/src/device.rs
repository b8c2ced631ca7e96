//! Capture device abstraction.
//!
//! Trait-based seam between the recording controller and the platform
//! microphone backend. Includes mock implementations for testing without
//! real audio hardware.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use convobot_core::error::{ConvoError, Result};

/// An open microphone capture stream.
///
/// Exclusively owned by the recording controller for its lifetime; nothing
/// outside the controller may hold a reference to it.
pub trait CaptureStream: Send {
    /// Drain the next buffered audio chunk, or `None` when the buffer is
    /// currently empty.
    fn read_chunk(&mut self) -> Option<Vec<u8>>;

    /// Stop the underlying hardware tracks. Must be idempotent; called on
    /// every exit path including error recovery and controller teardown.
    fn release(&mut self);
}

/// A microphone device that can be asked for a capture stream.
///
/// `acquire` models the permission prompt: it is an async suspension point
/// and fails with `ConvoError::Permission` when access is denied.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Request microphone access and open a capture stream.
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>>;
}

// =============================================================================
// Mock implementations
// =============================================================================

/// Mock capture stream backed by a queue of canned chunks.
///
/// Tracks release via a shared atomic so tests can assert that hardware
/// tracks were stopped on every exit path.
pub struct MockCaptureStream {
    pending: VecDeque<Vec<u8>>,
    released: Arc<AtomicBool>,
}

impl MockCaptureStream {
    pub fn new(chunks: Vec<Vec<u8>>, released: Arc<AtomicBool>) -> Self {
        Self {
            pending: chunks.into(),
            released,
        }
    }
}

impl CaptureStream for MockCaptureStream {
    fn read_chunk(&mut self) -> Option<Vec<u8>> {
        self.pending.pop_front()
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::Relaxed);
    }
}

/// Mock capture device that always grants access.
///
/// Every acquired stream yields the configured chunks. The `released` flag
/// reflects the most recently acquired stream.
#[derive(Clone, Default)]
pub struct MockCaptureDevice {
    chunks: Vec<Vec<u8>>,
    released: Arc<AtomicBool>,
}

impl MockCaptureDevice {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether the most recently acquired stream has been released.
    pub fn stream_released(&self) -> bool {
        self.released.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CaptureDevice for MockCaptureDevice {
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>> {
        self.released.store(false, Ordering::Relaxed);
        tracing::info!("Mock capture stream acquired");
        Ok(Box::new(MockCaptureStream::new(
            self.chunks.clone(),
            Arc::clone(&self.released),
        )))
    }
}

/// Mock capture device that always denies access.
#[derive(Debug, Clone, Default)]
pub struct DeniedCaptureDevice;

#[async_trait]
impl CaptureDevice for DeniedCaptureDevice {
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>> {
        Err(ConvoError::Permission(
            "microphone access denied".to_string(),
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================
