//! ConvoBot capture crate - microphone recording lifecycle and attachment staging.
//!
//! Provides the recording state machine, a trait-based capture device seam
//! with mock implementations for testing without real audio hardware, and
//! the single-slot attachment staging area.

pub mod attachment;
pub mod device;
pub mod recorder;
pub mod state;

pub use attachment::AttachmentManager;
pub use device::{CaptureDevice, CaptureStream, DeniedCaptureDevice, MockCaptureDevice};
pub use recorder::RecordingController;
pub use state::{RecordingState, StateMachine};
