//! Content items that make up a conversation turn.

use crate::{MediaSource, Modality};
use serde::{Deserialize, Serialize};

/// A single modality payload within a turn.
///
/// # Examples
///
/// ```
/// use chorus_core::{Input, MediaSource, Modality};
///
/// let text = Input::Text("Describe this.".to_string());
/// assert_eq!(text.modality(), None);
///
/// let image = Input::Image {
///     mime: Some("image/png".to_string()),
///     source: MediaSource::Url("file:///tmp/cat.png".to_string()),
/// };
/// assert_eq!(image.modality(), Some(Modality::Image));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Input {
    /// Plain text input.
    Text(String),

    /// Image input (PNG, JPEG, WebP, ...).
    Image {
        /// MIME type, e.g., "image/png"
        mime: Option<String>,
        /// Media source (URL, base64, or raw bytes)
        source: MediaSource,
    },

    /// Video input (MP4, WebM, ...).
    Video {
        /// MIME type, e.g., "video/mp4"
        mime: Option<String>,
        /// Media source (URL, base64, or raw bytes)
        source: MediaSource,
    },

    /// Audio input (WAV, MP3, ...).
    Audio {
        /// MIME type, e.g., "audio/wav"
        mime: Option<String>,
        /// Media source (URL, base64, or raw bytes)
        source: MediaSource,
    },
}

impl Input {
    /// Shorthand for a text item.
    pub fn text(value: impl Into<String>) -> Self {
        Input::Text(value.into())
    }

    /// Shorthand for an image item with no declared MIME type.
    pub fn image(source: MediaSource) -> Self {
        Input::Image { mime: None, source }
    }

    /// Shorthand for a video item with no declared MIME type.
    pub fn video(source: MediaSource) -> Self {
        Input::Video { mime: None, source }
    }

    /// Shorthand for an audio item with no declared MIME type.
    pub fn audio(source: MediaSource) -> Self {
        Input::Audio { mime: None, source }
    }

    /// The placeholder modality of this item, `None` for text.
    pub fn modality(&self) -> Option<Modality> {
        match self {
            Input::Text(_) => None,
            Input::Image { .. } => Some(Modality::Image),
            Input::Video { .. } => Some(Modality::Video),
            Input::Audio { .. } => Some(Modality::Audio),
        }
    }
}
