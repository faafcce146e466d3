//! Model-ready linearized conversation.

use crate::{MediaSource, Modality};
use serde::{Deserialize, Serialize};

/// A media payload lifted out of a conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPayload {
    /// Declared MIME type, if any
    pub mime: Option<String>,
    /// Where the bytes come from
    pub source: MediaSource,
}

/// A conversation flattened into one prompt plus per-modality payload lists.
///
/// The n-th placeholder of a modality in `prompt_text` anchors the n-th
/// payload of that modality's list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInput {
    /// Chat-formatted prompt with role markers and modality placeholders
    pub prompt_text: String,
    /// Image payloads in placeholder order
    pub images: Vec<MediaPayload>,
    /// Video payloads in placeholder order
    pub videos: Vec<MediaPayload>,
    /// Audio payloads in placeholder order
    pub audios: Vec<MediaPayload>,
}

impl NormalizedInput {
    /// Payload list for a modality.
    pub fn payloads(&self, modality: Modality) -> &[MediaPayload] {
        match modality {
            Modality::Image => &self.images,
            Modality::Video => &self.videos,
            Modality::Audio => &self.audios,
        }
    }

    pub(crate) fn payloads_mut(&mut self, modality: Modality) -> &mut Vec<MediaPayload> {
        match modality {
            Modality::Image => &mut self.images,
            Modality::Video => &mut self.videos,
            Modality::Audio => &mut self.audios,
        }
    }

    /// Appends a payload to its modality's list.
    pub fn push_payload(&mut self, modality: Modality, payload: MediaPayload) {
        self.payloads_mut(modality).push(payload);
    }

    /// Whether no media payloads were collected.
    pub fn is_text_only(&self) -> bool {
        self.images.is_empty() && self.videos.is_empty() && self.audios.is_empty()
    }
}
