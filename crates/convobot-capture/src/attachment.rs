//! Attachment staging.
//!
//! Holds at most one pending attachment (file pick, drag-drop, or recording
//! output) prior to send. Enforces the size ceiling at staging time.

use std::sync::Mutex;

use convobot_core::error::{ConvoError, Result};
use convobot_core::types::Attachment;

/// Stages exactly one pending attachment for the next send.
pub struct AttachmentManager {
    staged: Mutex<Option<Attachment>>,
    max_bytes: usize,
}

impl AttachmentManager {
    /// Create a manager with the given size ceiling in bytes.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            staged: Mutex::new(None),
            max_bytes,
        }
    }

    /// Stage an attachment, replacing any currently staged one.
    ///
    /// Fails with `AttachmentTooLarge` when the attachment exceeds the size
    /// ceiling, leaving the manager unchanged.
    pub fn attach(&self, attachment: Attachment) -> Result<()> {
        let size = attachment.size_bytes();
        if size > self.max_bytes {
            return Err(ConvoError::AttachmentTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        let mut staged = self.staged.lock().expect("staged mutex poisoned");
        if let Some(previous) = staged.as_ref() {
            tracing::debug!(
                replaced = %previous.name,
                with = %attachment.name,
                "Staged attachment replaced"
            );
        }
        *staged = Some(attachment);
        Ok(())
    }

    /// Discard the staged attachment unconditionally. Always safe to call.
    pub fn clear(&self) {
        let mut staged = self.staged.lock().expect("staged mutex poisoned");
        *staged = None;
    }

    /// Consume the staged attachment for a send.
    pub fn take(&self) -> Option<Attachment> {
        let mut staged = self.staged.lock().expect("staged mutex poisoned");
        staged.take()
    }

    /// A copy of the staged attachment, if any.
    pub fn staged(&self) -> Option<Attachment> {
        let staged = self.staged.lock().expect("staged mutex poisoned");
        staged.clone()
    }

    /// Whether an attachment is currently staged.
    pub fn has_staged(&self) -> bool {
        let staged = self.staged.lock().expect("staged mutex poisoned");
        staged.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use convobot_core::types::AttachmentKind;

    fn make_attachment(name: &str, size: usize) -> Attachment {
        Attachment {
            kind: AttachmentKind::File,
            data: vec![0u8; size],
            mime_type: "application/pdf".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_attach_stages_attachment() {
        let mgr = AttachmentManager::new(1024);
        mgr.attach(make_attachment("notes.pdf", 100)).unwrap();
        assert!(mgr.has_staged());
        assert_eq!(mgr.staged().unwrap().name, "notes.pdf");
    }

    #[test]
    fn test_attach_over_limit_rejected() {
        let mgr = AttachmentManager::new(1024);
        let result = mgr.attach(make_attachment("big.pdf", 2048));
        assert!(matches!(
            result,
            Err(ConvoError::AttachmentTooLarge {
                size: 2048,
                limit: 1024
            })
        ));
        assert!(!mgr.has_staged());
    }

    #[test]
    fn test_attach_at_exact_limit_accepted() {
        let mgr = AttachmentManager::new(1024);
        mgr.attach(make_attachment("exact.pdf", 1024)).unwrap();
        assert!(mgr.has_staged());
    }

    #[test]
    fn test_over_limit_leaves_previous_staged() {
        let mgr = AttachmentManager::new(1024);
        mgr.attach(make_attachment("small.pdf", 10)).unwrap();
        assert!(mgr.attach(make_attachment("big.pdf", 2048)).is_err());
        // The previously staged attachment survives the rejection.
        assert_eq!(mgr.staged().unwrap().name, "small.pdf");
    }

    #[test]
    fn test_attach_replaces_staged() {
        let mgr = AttachmentManager::new(1024);
        mgr.attach(make_attachment("first.pdf", 10)).unwrap();
        mgr.attach(make_attachment("second.pdf", 10)).unwrap();
        assert_eq!(mgr.staged().unwrap().name, "second.pdf");
    }

    #[test]
    fn test_clear_discards_staged() {
        let mgr = AttachmentManager::new(1024);
        mgr.attach(make_attachment("notes.pdf", 10)).unwrap();
        mgr.clear();
        assert!(!mgr.has_staged());
    }

    #[test]
    fn test_clear_when_empty_is_safe() {
        let mgr = AttachmentManager::new(1024);
        mgr.clear();
        assert!(!mgr.has_staged());
    }

    #[test]
    fn test_take_consumes_staged() {
        let mgr = AttachmentManager::new(1024);
        mgr.attach(make_attachment("notes.pdf", 10)).unwrap();
        let taken = mgr.take().unwrap();
        assert_eq!(taken.name, "notes.pdf");
        assert!(!mgr.has_staged());
        assert!(mgr.take().is_none());
    }

    #[test]
    fn test_empty_attachment_accepted() {
        let mgr = AttachmentManager::new(1024);
        mgr.attach(make_attachment("empty.txt", 0)).unwrap();
        assert!(mgr.has_staged());
    }
}
