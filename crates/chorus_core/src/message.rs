//! Turn types for conversation history.

use crate::{Input, Role};
use serde::{Deserialize, Serialize};

/// One role-attributed turn. Item order is the reading order used when
/// placeholders are interleaved with text.
///
/// # Examples
///
/// ```
/// use chorus_core::{Message, Role, Input};
///
/// let message = Message::new(Role::Human, vec![Input::Text("Hello!".to_string())]);
///
/// assert_eq!(*message.role(), Role::Human);
/// assert_eq!(message.content().len(), 1);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
pub struct Message {
    /// The role of the turn's author
    role: Role,
    /// The ordered content items of the turn
    content: Vec<Input>,
}

impl Message {
    /// Creates a new message with the given role and content.
    pub fn new(role: Role, content: Vec<Input>) -> Self {
        Self { role, content }
    }

    /// A human turn.
    pub fn human(content: Vec<Input>) -> Self {
        Self::new(Role::Human, content)
    }

    /// An assistant turn.
    pub fn assistant(content: Vec<Input>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// A system turn.
    pub fn system(content: Vec<Input>) -> Self {
        Self::new(Role::System, content)
    }

    /// Returns a builder for constructing a Message.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Consumes the message, returning its content items.
    pub fn into_content(self) -> Vec<Input> {
        self.content
    }
}
