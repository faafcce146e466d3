//! Test utilities for pipeline tests.
//!
//! Mock collaborators that behave deterministically: the processor turns
//! every prompt character into its code point, the tokenizer maps code
//! points back, and the decoder "generates" a scripted reply.

#![allow(dead_code)]

pub mod mocks;

#[allow(unused_imports)]
pub use mocks::{
    DecoderBehavior, MockDecoder, MockProcessor, MockTalker, MockTokenizer, MockVocoder,
};

use chorus_core::{Conversation, Input, MediaSource, Message};

/// Single human turn holding one text item.
pub fn text_conversation(text: &str) -> Conversation {
    Conversation::from(vec![Message::human(vec![Input::text(text)])])
}

/// Single human turn with one media item followed by a question.
pub fn media_conversation(media: Input, question: &str) -> Conversation {
    Conversation::from(vec![Message::human(vec![media, Input::text(question)])])
}

/// A URL source for a numbered fixture.
pub fn fixture(name: &str) -> MediaSource {
    MediaSource::Url(format!("file:///fixtures/{}", name))
}
