//! Conversation normalization.
//!
//! Flattens a role-tagged conversation into one chat-formatted prompt with
//! a placeholder per media item, and lifts the media payloads out into
//! per-modality lists in placeholder order.

use chorus_core::{
    Conversation, Input, MediaPayload, ModelInputs, Modality, NormalizedInput, Role,
};
use chorus_error::{
    ChorusResult, ConversationError, ConversationErrorKind, PlaceholderMismatchError,
};
use strum::IntoEnumIterator;
use tracing::{debug, error, instrument};

use crate::ChatTemplate;

/// Linearizes conversations with a chat template.
#[derive(Debug, Clone)]
pub struct ConversationNormalizer {
    template: ChatTemplate,
}

impl ConversationNormalizer {
    /// Create a normalizer for the given template.
    pub fn new(template: ChatTemplate) -> Self {
        Self { template }
    }

    /// The template used for rendering.
    pub fn template(&self) -> &ChatTemplate {
        &self.template
    }

    /// Normalize a conversation.
    ///
    /// `system_prefix`, when given, is prepended to the first text item of
    /// the first human turn (or placed before its first item if the turn
    /// has no text). The rendered prompt ends with the assistant marker so
    /// the decoder continues as the assistant.
    ///
    /// # Errors
    ///
    /// - `ConversationError` for empty conversations, empty turns, a first
    ///   turn that is not human, broken human/assistant alternation or a
    ///   trailing assistant turn.
    /// - `PlaceholderMismatchError` when the rendered prompt holds a
    ///   different number of placeholders than payloads were collected,
    ///   which happens when user text contains a placeholder literal.
    #[instrument(skip_all, fields(turns = conversation.len(), prefixed = system_prefix.is_some()))]
    pub fn normalize(
        &self,
        conversation: &Conversation,
        system_prefix: Option<&str>,
    ) -> ChorusResult<NormalizedInput> {
        validate_structure(conversation)?;

        let mut normalized = NormalizedInput::default();
        let mut prompt = String::new();
        let mut pending_prefix = system_prefix.map(str::trim_end);

        for turn in conversation.turns() {
            prompt.push_str(self.template.role_marker(*turn.role()));

            if let Some(prefix) = pending_prefix {
                if !turn.content().iter().any(|item| matches!(item, Input::Text(_))) {
                    prompt.push_str(prefix);
                    prompt.push('\n');
                    pending_prefix = None;
                }
            }

            for item in turn.content() {
                match item {
                    Input::Text(text) => match pending_prefix.take() {
                        Some(prefix) => {
                            prompt.push_str(prefix);
                            prompt.push('\n');
                            prompt.push_str(text);
                        }
                        None => prompt.push_str(text),
                    },
                    Input::Image { mime, source }
                    | Input::Video { mime, source }
                    | Input::Audio { mime, source } => {
                        let Some(modality) = item.modality() else {
                            continue;
                        };
                        prompt.push_str(self.template.placeholder(modality));
                        normalized.push_payload(
                            modality,
                            MediaPayload {
                                mime: mime.clone(),
                                source: source.clone(),
                            },
                        );
                    }
                }
            }

            prompt.push_str(self.template.turn_end());
        }
        prompt.push_str(self.template.assistant_marker());
        normalized.prompt_text = prompt;

        self.verify_placeholders(&normalized)?;
        debug!(
            prompt_chars = normalized.prompt_text.len(),
            images = normalized.images.len(),
            videos = normalized.videos.len(),
            audios = normalized.audios.len(),
            "Conversation normalized"
        );
        Ok(normalized)
    }

    /// Number of `modality` placeholders in a prompt.
    pub fn count_placeholders(&self, prompt: &str, modality: Modality) -> usize {
        prompt.matches(self.template.placeholder(modality)).count()
    }

    /// Check every modality's placeholder count against its payload list.
    #[track_caller]
    pub fn verify_placeholders(
        &self,
        input: &NormalizedInput,
    ) -> Result<(), PlaceholderMismatchError> {
        for modality in Modality::iter() {
            let placeholders = self.count_placeholders(&input.prompt_text, modality);
            let payloads = input.payloads(modality).len();
            if placeholders != payloads {
                error!(%modality, placeholders, payloads, "Placeholder count mismatch");
                return Err(PlaceholderMismatchError::new(
                    "normalizer",
                    modality.to_string(),
                    placeholders,
                    payloads,
                ));
            }
        }
        Ok(())
    }
}

/// Check that the encoder adapter produced one segment per payload.
#[track_caller]
pub fn verify_encoded_segments(
    input: &NormalizedInput,
    encoded: &ModelInputs,
) -> Result<(), PlaceholderMismatchError> {
    for modality in Modality::iter() {
        let segments = encoded.segment_count(modality);
        let payloads = input.payloads(modality).len();
        if segments != payloads {
            error!(%modality, segments, payloads, "Encoded segment count mismatch");
            return Err(PlaceholderMismatchError::new(
                "processor",
                modality.to_string(),
                segments,
                payloads,
            ));
        }
    }
    Ok(())
}

fn validate_structure(conversation: &Conversation) -> Result<(), ConversationError> {
    let turns = conversation.turns();
    let Some(first) = turns.first() else {
        return Err(ConversationError::new(
            ConversationErrorKind::EmptyConversation,
        ));
    };

    if let Some(turn) = turns.iter().position(|t| t.content().is_empty()) {
        return Err(ConversationError::new(ConversationErrorKind::EmptyTurn {
            turn,
        }));
    }

    if *first.role() != Role::Human {
        return Err(ConversationError::new(
            ConversationErrorKind::FirstTurnNotHuman {
                role: first.role().to_string(),
            },
        ));
    }

    // System turns may follow the first turn and sit outside alternation.
    let mut expected = Role::Human;
    for (turn, message) in turns.iter().enumerate() {
        let role = *message.role();
        if role == Role::System {
            continue;
        }
        if role != expected {
            return Err(ConversationError::new(
                ConversationErrorKind::RoleSequence {
                    turn,
                    expected: expected.to_string(),
                    found: role.to_string(),
                },
            ));
        }
        expected = match role {
            Role::Human => Role::Assistant,
            _ => Role::Human,
        };
    }

    if expected == Role::Human {
        return Err(ConversationError::new(
            ConversationErrorKind::TrailingAssistant,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_core::{MediaSource, Message};
    use chorus_error::ChorusErrorKind;

    fn normalizer() -> ConversationNormalizer {
        ConversationNormalizer::new(ChatTemplate::default())
    }

    fn conversation_kind(result: ChorusResult<NormalizedInput>) -> ConversationErrorKind {
        match result.unwrap_err().kind() {
            ChorusErrorKind::Conversation(e) => e.kind.clone(),
            other => panic!("expected a conversation error, got {}", other),
        }
    }

    #[test]
    fn test_items_render_in_reading_order() {
        let conversation = Conversation::from(vec![Message::human(vec![
            Input::image(MediaSource::Url("a.png".into())),
            Input::text("Compare with"),
            Input::image(MediaSource::Url("b.png".into())),
        ])]);

        let normalized = normalizer().normalize(&conversation, None).unwrap();

        assert_eq!(
            normalized.prompt_text,
            "<role>HUMAN</role><IMAGE>Compare with<IMAGE><|role_end|><role>ASSISTANT</role>"
        );
        assert_eq!(normalized.images[0].source, MediaSource::Url("a.png".into()));
        assert_eq!(normalized.images[1].source, MediaSource::Url("b.png".into()));
    }

    #[test]
    fn test_prefix_joins_first_human_text() {
        let conversation = Conversation::from(vec![
            Message::human(vec![Input::text("Why is the sky blue?")]),
            Message::assistant(vec![Input::text("Rayleigh scattering.")]),
            Message::human(vec![Input::text("And sunsets?")]),
        ]);

        let normalized = normalizer()
            .normalize(&conversation, Some("Think step by step.\n"))
            .unwrap();

        assert!(normalized
            .prompt_text
            .starts_with("<role>HUMAN</role>Think step by step.\nWhy is the sky blue?"));
        assert_eq!(normalized.prompt_text.matches("Think step by step.").count(), 1);
    }

    #[test]
    fn test_prefix_leads_media_only_turn() {
        let conversation = Conversation::from(vec![Message::human(vec![Input::audio(
            MediaSource::Url("q.wav".into()),
        )])]);

        let normalized = normalizer().normalize(&conversation, Some("Answer aloud.")).unwrap();

        assert!(normalized
            .prompt_text
            .starts_with("<role>HUMAN</role>Answer aloud.\n<AUDIO>"));
        assert_eq!(normalized.audios.len(), 1);
    }

    #[test]
    fn test_structure_violations() {
        assert_eq!(
            conversation_kind(normalizer().normalize(&Conversation::new(), None)),
            ConversationErrorKind::EmptyConversation
        );

        let empty_turn = Conversation::from(vec![
            Message::human(vec![Input::text("hi")]),
            Message::assistant(vec![]),
        ]);
        assert_eq!(
            conversation_kind(normalizer().normalize(&empty_turn, None)),
            ConversationErrorKind::EmptyTurn { turn: 1 }
        );

        let assistant_first = Conversation::from(vec![Message::assistant(vec![Input::text("hi")])]);
        assert!(matches!(
            conversation_kind(normalizer().normalize(&assistant_first, None)),
            ConversationErrorKind::FirstTurnNotHuman { .. }
        ));

        let double_human = Conversation::from(vec![
            Message::human(vec![Input::text("a")]),
            Message::human(vec![Input::text("b")]),
        ]);
        assert!(matches!(
            conversation_kind(normalizer().normalize(&double_human, None)),
            ConversationErrorKind::RoleSequence { turn: 1, .. }
        ));

        let trailing = Conversation::from(vec![
            Message::human(vec![Input::text("a")]),
            Message::assistant(vec![Input::text("b")]),
        ]);
        assert_eq!(
            conversation_kind(normalizer().normalize(&trailing, None)),
            ConversationErrorKind::TrailingAssistant
        );
    }

    #[test]
    fn test_system_turn_outside_alternation() {
        let conversation = Conversation::from(vec![
            Message::human(vec![Input::text("a")]),
            Message::system(vec![Input::text("be brief")]),
            Message::assistant(vec![Input::text("b")]),
            Message::human(vec![Input::text("c")]),
        ]);
        let normalized = normalizer().normalize(&conversation, None).unwrap();
        assert!(normalized.prompt_text.contains("<role>SYSTEM</role>be brief<|role_end|>"));
    }

    #[test]
    fn test_placeholder_literal_in_text_is_fatal() {
        let conversation =
            Conversation::from(vec![Message::human(vec![Input::text("what does <IMAGE> mean")])]);
        let err = normalizer().normalize(&conversation, None).unwrap_err();
        match err.kind() {
            ChorusErrorKind::PlaceholderMismatch(e) => {
                assert_eq!(e.stage, "normalizer");
                assert_eq!((e.placeholders, e.payloads), (1, 0));
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_encoded_segments_must_match_payloads() {
        let conversation = Conversation::from(vec![Message::human(vec![
            Input::video(MediaSource::Url("clip.mp4".into())),
            Input::text("What happens?"),
        ])]);
        let normalized = normalizer().normalize(&conversation, None).unwrap();

        let mut encoded = ModelInputs::from_token_ids(vec![vec![1, 2, 3]]);
        let err = verify_encoded_segments(&normalized, &encoded).unwrap_err();
        assert_eq!(err.stage, "processor");

        encoded.video_grid_thw.push([2, 4, 4]);
        assert!(verify_encoded_segments(&normalized, &encoded).is_ok());
    }
}
