//! Recording state machine with thread-safe transitions.
//!
//! Enforces valid state transitions for the microphone capture lifecycle:
//! - Idle -> Requesting (start recording, permission prompt pending)
//! - Requesting -> Recording (access granted, capture running)
//! - Requesting -> Idle (access denied or device error)
//! - Recording -> Stopping (stop requested, finalizing chunks)
//! - Stopping -> Idle (attachment produced, hardware released)

use std::fmt;
use std::sync::{Arc, Mutex};

use convobot_core::error::ConvoError;

/// Operational state of the recording controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingState {
    /// No capture in progress. Ready to start.
    Idle,
    /// Waiting on the microphone permission prompt.
    Requesting,
    /// Actively buffering audio chunks from the device.
    Recording,
    /// Finalizing buffered chunks into an attachment.
    Stopping,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "Idle"),
            RecordingState::Requesting => write!(f, "Requesting"),
            RecordingState::Recording => write!(f, "Recording"),
            RecordingState::Stopping => write!(f, "Stopping"),
        }
    }
}

impl RecordingState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &RecordingState) -> bool {
        matches!(
            (self, target),
            (RecordingState::Idle, RecordingState::Requesting)
                | (RecordingState::Requesting, RecordingState::Recording)
                | (RecordingState::Recording, RecordingState::Stopping)
                | (RecordingState::Stopping, RecordingState::Idle)
                // Permission denied or device error
                | (RecordingState::Requesting, RecordingState::Idle)
        )
    }
}

/// Thread-safe state machine for recording state transitions.
///
/// Wraps `RecordingState` in an `Arc<Mutex<>>` to allow safe concurrent
/// access. All transitions are validated before being applied, returning an
/// error if the requested transition is not permitted.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: Arc<Mutex<RecordingState>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RecordingState::Idle)),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> RecordingState {
        *self.state.lock().expect("state mutex poisoned")
    }

    /// Attempt to transition to the target state.
    ///
    /// Returns `Ok(())` if the transition is valid, or
    /// `ConvoError::InvalidState` if it is not allowed from the current state.
    pub fn transition(&self, target: RecordingState) -> Result<(), ConvoError> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&target) {
            tracing::debug!("Recording state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(ConvoError::InvalidState(format!(
                "invalid recording transition: {} -> {}",
                *state, target
            )))
        }
    }

    /// Force the state machine back to Idle (used for error recovery).
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        tracing::warn!("Recording state machine reset to Idle from {}", *state);
        *state = RecordingState::Idle;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(RecordingState::Idle.to_string(), "Idle");
        assert_eq!(RecordingState::Requesting.to_string(), "Requesting");
        assert_eq!(RecordingState::Recording.to_string(), "Recording");
        assert_eq!(RecordingState::Stopping.to_string(), "Stopping");
    }

    #[test]
    fn test_valid_transitions() {
        // Forward path
        assert!(RecordingState::Idle.can_transition_to(&RecordingState::Requesting));
        assert!(RecordingState::Requesting.can_transition_to(&RecordingState::Recording));
        assert!(RecordingState::Recording.can_transition_to(&RecordingState::Stopping));
        assert!(RecordingState::Stopping.can_transition_to(&RecordingState::Idle));

        // Denied permission exits back to Idle
        assert!(RecordingState::Requesting.can_transition_to(&RecordingState::Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot skip states
        assert!(!RecordingState::Idle.can_transition_to(&RecordingState::Recording));
        assert!(!RecordingState::Idle.can_transition_to(&RecordingState::Stopping));
        assert!(!RecordingState::Requesting.can_transition_to(&RecordingState::Stopping));

        // Cannot abandon a live recording without stopping
        assert!(!RecordingState::Recording.can_transition_to(&RecordingState::Idle));
        assert!(!RecordingState::Recording.can_transition_to(&RecordingState::Requesting));

        // Cannot transition to self
        assert!(!RecordingState::Idle.can_transition_to(&RecordingState::Idle));
        assert!(!RecordingState::Recording.can_transition_to(&RecordingState::Recording));
    }

    #[test]
    fn test_state_machine_happy_path() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), RecordingState::Idle);

        sm.transition(RecordingState::Requesting).unwrap();
        assert_eq!(sm.current(), RecordingState::Requesting);

        sm.transition(RecordingState::Recording).unwrap();
        assert_eq!(sm.current(), RecordingState::Recording);

        sm.transition(RecordingState::Stopping).unwrap();
        assert_eq!(sm.current(), RecordingState::Stopping);

        sm.transition(RecordingState::Idle).unwrap();
        assert_eq!(sm.current(), RecordingState::Idle);
    }

    #[test]
    fn test_state_machine_denied_permission_path() {
        let sm = StateMachine::new();
        sm.transition(RecordingState::Requesting).unwrap();
        sm.transition(RecordingState::Idle).unwrap();
        assert_eq!(sm.current(), RecordingState::Idle);
    }

    #[test]
    fn test_state_machine_invalid_transition() {
        let sm = StateMachine::new();
        let result = sm.transition(RecordingState::Recording);
        assert!(result.is_err());
        assert_eq!(sm.current(), RecordingState::Idle);
    }

    #[test]
    fn test_state_machine_reset() {
        let sm = StateMachine::new();
        sm.transition(RecordingState::Requesting).unwrap();
        sm.transition(RecordingState::Recording).unwrap();
        sm.reset();
        assert_eq!(sm.current(), RecordingState::Idle);
    }

    #[test]
    fn test_state_machine_clone_is_shared() {
        let sm1 = StateMachine::new();
        let sm2 = sm1.clone();

        sm1.transition(RecordingState::Requesting).unwrap();
        assert_eq!(sm2.current(), RecordingState::Requesting);
    }

    #[test]
    fn test_state_machine_transition_error_message() {
        let sm = StateMachine::new();
        let result = sm.transition(RecordingState::Stopping);
        match result {
            Err(ConvoError::InvalidState(msg)) => {
                assert!(msg.contains("Idle"));
                assert!(msg.contains("Stopping"));
            }
            _ => panic!("Expected InvalidState error variant"),
        }
    }
}
