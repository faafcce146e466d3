//! Append-only conversation history.

use crate::{Input, Message, Role};
use serde::{Deserialize, Serialize};

/// Ordered turns in chronological order.
///
/// History is never rewritten: the only mutations are [`Conversation::push`]
/// and [`Conversation::append_reply`].
///
/// # Examples
///
/// ```
/// use chorus_core::{Conversation, Input, Message, Role};
///
/// let mut conversation = Conversation::new();
/// conversation.push(Message::human(vec![Input::text("What is the capital of France?")]));
/// conversation.append_reply("Paris.");
///
/// assert_eq!(conversation.len(), 2);
/// assert_eq!(*conversation.turns()[1].role(), Role::Assistant);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Message>,
}

impl Conversation {
    /// Creates an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn.
    pub fn push(&mut self, turn: Message) {
        self.turns.push(turn);
    }

    /// Appends an assistant turn holding a single text item.
    pub fn append_reply(&mut self, reply: impl Into<String>) {
        self.turns
            .push(Message::new(Role::Assistant, vec![Input::Text(reply.into())]));
    }

    /// The turns in chronological order.
    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the conversation has no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(turns: Vec<Message>) -> Self {
        Self { turns }
    }
}

impl FromIterator<Message> for Conversation {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}
