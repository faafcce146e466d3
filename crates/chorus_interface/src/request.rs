//! Decoder request type.

use chorus_core::{ModelInputs, TaskConfig};

/// Everything the decoder receives for one generation call.
///
/// Owned: the decoder takes the media tensors and releases them when done.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Tokenized prompt and encoder-ready media
    pub inputs: ModelInputs,
    /// Task-specific generation configuration
    pub config: TaskConfig,
}
