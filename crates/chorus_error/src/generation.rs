//! Generation result error types.

/// Ways a decoder result can violate the task's shape contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Decoder returned no usable continuation
    #[display("Decoder returned no usable continuation for task {}", task)]
    Empty {
        /// Task name
        task: String,
    },
    /// Result variant does not match what the task requires
    #[display("Task {} expected a {} result, decoder returned {}", task, expected, found)]
    UnexpectedShape {
        /// Task name
        task: String,
        /// Expected result variant
        expected: String,
        /// Result variant returned
        found: String,
    },
    /// Batch size of the result differs from the prompt batch
    #[display("Decoder returned {} sequences for a batch of {}", returned, expected)]
    BatchMismatch {
        /// Number of prompts dispatched
        expected: usize,
        /// Number of sequences returned
        returned: usize,
    },
    /// A returned sequence is shorter than its prompt
    #[display(
        "Batch element {} has prompt length {} but sequence length {}",
        batch_index,
        prompt_len,
        sequence_len
    )]
    PromptExceedsSequence {
        /// Offending batch element
        batch_index: usize,
        /// Recorded prompt length
        prompt_len: usize,
        /// Returned sequence length
        sequence_len: usize,
    },
    /// Hidden states were requested but not captured
    #[display("Hidden states were requested but the decoder captured none")]
    MissingHiddenStates,
}

/// Generation error with location tracking.
///
/// # Examples
///
/// ```
/// use chorus_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::MissingHiddenStates);
/// assert!(format!("{}", err).contains("Hidden states"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new generation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
