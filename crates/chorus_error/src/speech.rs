//! Speech continuation error types.

/// Specific error conditions for the speech continuation bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SpeechErrorKind {
    /// No audio token generator was configured
    #[display("No audio token generator is configured")]
    MissingTalker,
    /// Speech output was requested without a speaker profile
    #[display("Speech output requires a speaker profile")]
    MissingSpeaker,
    /// First and last hidden-state snapshots cannot be summed
    #[display("Hidden-state snapshots have incompatible shapes: {} vs {}", first, last)]
    SnapshotShape {
        /// Shape of the first snapshot
        first: String,
        /// Shape of the last snapshot
        last: String,
    },
    /// Audio token generator produced no tokens
    #[display("Audio token generator returned no tokens")]
    NoAudioTokens,
}

/// Speech continuation error with location tracking.
///
/// # Examples
///
/// ```
/// use chorus_error::{SpeechError, SpeechErrorKind};
///
/// let err = SpeechError::new(SpeechErrorKind::MissingSpeaker);
/// assert!(format!("{}", err).contains("speaker profile"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Speech Error: {} at line {} in {}", kind, line, file)]
pub struct SpeechError {
    /// The kind of error that occurred
    pub kind: SpeechErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SpeechError {
    /// Create a new speech error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SpeechErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
