//! Decoder results.

use crate::GeneratedImage;
use candle_core::Tensor;

/// What a single dispatch produced.
///
/// Consumed immediately by the trimmer or the speech bridge; never persisted.
#[derive(Debug, Clone)]
pub enum GenerationResult {
    /// Full token sequences (prompt echo + continuation), one per batch element.
    TextSequences {
        /// Token ids per batch element
        token_ids: Vec<Vec<u32>>,
    },
    /// Token sequences plus the hidden state captured at each generation step.
    TextWithHiddenStates {
        /// Token ids per batch element
        token_ids: Vec<Vec<u32>>,
        /// One snapshot per generation step, starting right after the prompt
        hidden_states: Vec<Tensor>,
    },
    /// Generated or edited image.
    Image(GeneratedImage),
}

impl GenerationResult {
    /// Variant name used in logs and errors.
    pub fn variant_name(&self) -> &'static str {
        match self {
            GenerationResult::TextSequences { .. } => "TextSequences",
            GenerationResult::TextWithHiddenStates { .. } => "TextWithHiddenStates",
            GenerationResult::Image(_) => "Image",
        }
    }

    /// Token sequences, if this is a text result.
    pub fn token_ids(&self) -> Option<&[Vec<u32>]> {
        match self {
            GenerationResult::TextSequences { token_ids }
            | GenerationResult::TextWithHiddenStates { token_ids, .. } => Some(token_ids),
            GenerationResult::Image(_) => None,
        }
    }

    /// Captured hidden states, if any.
    pub fn hidden_states(&self) -> Option<&[Tensor]> {
        match self {
            GenerationResult::TextWithHiddenStates { hidden_states, .. } => Some(hidden_states),
            _ => None,
        }
    }
}
