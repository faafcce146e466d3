//! Malformed conversation error types.

/// Structural violations found while normalizing a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConversationErrorKind {
    /// Conversation has no turns at all
    #[display("Conversation has no turns")]
    EmptyConversation,
    /// A turn has zero content items
    #[display("Turn {} has no content items", turn)]
    EmptyTurn {
        /// Index of the offending turn
        turn: usize,
    },
    /// The first turn is not a human turn
    #[display("First turn must be from the human, found {}", role)]
    FirstTurnNotHuman {
        /// Role found on the first turn
        role: String,
    },
    /// Human and assistant turns do not alternate
    #[display("Turn {} expected role {}, found {}", turn, expected, found)]
    RoleSequence {
        /// Index of the offending turn
        turn: usize,
        /// Role that alternation requires
        expected: String,
        /// Role actually present
        found: String,
    },
    /// The last non-system turn is an assistant turn, leaving nothing to answer
    #[display("Conversation ends with an assistant turn")]
    TrailingAssistant,
}

/// Malformed conversation error with location tracking.
///
/// # Examples
///
/// ```
/// use chorus_error::{ConversationError, ConversationErrorKind};
///
/// let err = ConversationError::new(ConversationErrorKind::EmptyTurn { turn: 2 });
/// assert!(format!("{}", err).contains("Turn 2"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Conversation Error: {} at line {} in {}", kind, line, file)]
pub struct ConversationError {
    /// The kind of error that occurred
    pub kind: ConversationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ConversationError {
    /// Create a new conversation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ConversationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
