use thiserror::Error;

/// Top-level error type for the ConvoBot pipeline.
///
/// Each variant maps to one failure class in the error taxonomy. Subsystem
/// crates construct these directly (or implement `From` conversions) so the
/// `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvoError {
    /// Microphone access was denied or the capture device failed to open.
    /// Fatal to the recording attempt only; the user must retry manually.
    #[error("Permission error: {0}")]
    Permission(String),

    /// An attachment exceeded the staging size ceiling. No state change.
    #[error("Attachment too large: {size} bytes exceeds {limit} bytes")]
    AttachmentTooLarge { size: usize, limit: usize },

    /// Transcription of a voice recording failed. Recoverable: the message
    /// pipeline degrades to typed text or a fixed placeholder.
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// The backend could not be reached at all (no response).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend responded with a non-2xx status.
    #[error("API error: {0}")]
    Api(String),

    /// A send was attempted with no content, or another precondition failed
    /// before any pipeline stage ran.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The recording state machine rejected a transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConvoError {
    fn from(err: toml::de::Error) -> Self {
        ConvoError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ConvoError {
    fn from(err: toml::ser::Error) -> Self {
        ConvoError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ConvoError {
    fn from(err: serde_json::Error) -> Self {
        ConvoError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for ConvoBot operations.
pub type Result<T> = std::result::Result<T, ConvoError>;
