//! Error types for the Chorus multimodal inference pipeline.
//!
//! Every failure family is a struct carrying a specific kind plus the source
//! location where it was raised. [`ChorusError`] wraps all of them so stages
//! can propagate with `?`.

mod backend;
mod config;
mod conversation;
mod generation;
mod placeholder;
mod speech;
mod storage;
mod task;

pub use backend::{BackendError, Stage};
pub use config::ConfigError;
pub use conversation::{ConversationError, ConversationErrorKind};
pub use generation::{GenerationError, GenerationErrorKind};
pub use placeholder::PlaceholderMismatchError;
pub use speech::{SpeechError, SpeechErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use task::{TaskConfigError, TaskConfigErrorKind};

/// Crate-level error variants.
#[derive(Debug, derive_more::From, derive_more::Display)]
pub enum ChorusErrorKind {
    /// Structurally invalid conversation
    Conversation(ConversationError),
    /// Conflicting or invalid task parameters
    TaskConfig(TaskConfigError),
    /// Prompt placeholders disagree with collected payloads
    PlaceholderMismatch(PlaceholderMismatchError),
    /// Decoder output violated the task's shape contract
    Generation(GenerationError),
    /// External collaborator failure
    Backend(BackendError),
    /// Speech continuation failure
    Speech(SpeechError),
    /// Configuration error
    Config(ConfigError),
    /// Artifact or asset I/O failure
    Storage(StorageError),
}

/// Chorus error with kind discrimination.
#[derive(Debug)]
pub struct ChorusError(Box<ChorusErrorKind>);

impl ChorusError {
    /// Create a new error from a kind.
    pub fn new(kind: ChorusErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ChorusErrorKind {
        &self.0
    }
}

impl std::fmt::Display for ChorusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Chorus Error: {}", self.0)
    }
}

impl std::error::Error for ChorusError {}

// Generic From implementation for any type that converts to ChorusErrorKind
impl<T> From<T> for ChorusError
where
    T: Into<ChorusErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Chorus operations.
pub type ChorusResult<T> = std::result::Result<T, ChorusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_survives_conversion() {
        let err: ChorusError = ConversationError::new(ConversationErrorKind::EmptyConversation).into();
        assert!(matches!(err.kind(), ChorusErrorKind::Conversation(_)));
        assert!(err.to_string().starts_with("Chorus Error: Conversation Error"));
    }

    #[test]
    fn test_backend_error_names_stage() {
        let err: ChorusError = BackendError::new(Stage::Vocoder, "device lost").into();
        let rendered = err.to_string();
        assert!(rendered.contains("vocoder"));
        assert!(rendered.contains("device lost"));
    }
}
