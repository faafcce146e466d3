//! Collaborator (backend) error types.

/// Pipeline stage that talks to an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Stage {
    /// Modality encoder adapter
    #[display("processor")]
    Processor,
    /// Shared multimodal decoder
    #[display("decoder")]
    Decoder,
    /// Token-to-text decoding
    #[display("tokenizer")]
    Tokenizer,
    /// Audio token generator (talker)
    #[display("audio_tokens")]
    AudioTokens,
    /// Waveform detokenizer
    #[display("vocoder")]
    Vocoder,
}

/// Backend error with the failing stage and source location.
///
/// Collaborator failures are carried unchanged; the message is whatever the
/// collaborator reported.
#[derive(Debug, Clone)]
pub struct BackendError {
    /// Stage whose collaborator failed
    pub stage: Stage,
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl BackendError {
    /// Create a new BackendError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use chorus_error::{BackendError, Stage};
    ///
    /// let err = BackendError::new(Stage::Decoder, "CUDA out of memory");
    /// assert!(err.message.contains("out of memory"));
    /// ```
    #[track_caller]
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            stage,
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Backend Error ({}): {} at line {} in {}",
            self.stage, self.message, self.line, self.file
        )
    }
}

impl std::error::Error for BackendError {}
