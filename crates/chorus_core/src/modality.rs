//! Non-text modalities carried by a conversation.

use serde::{Deserialize, Serialize};

/// A media modality that is spliced into the prompt through a placeholder.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Modality {
    Image,
    Video,
    Audio,
}
