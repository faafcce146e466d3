//! Batched numeric inputs produced by the modality encoder adapter.

use candle_core::{DType, Tensor};
use serde::{Deserialize, Serialize};

use crate::{Modality, PixelWindow};

/// Options the encoder adapter needs from the task configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessorOptions {
    /// Extract audio features for the whisper encoder instead of the default one
    pub use_whisper_encoder: bool,
    /// Pixel-count window for image resizing
    pub pixel_window: Option<PixelWindow>,
}

/// Tokenized prompt plus encoder-ready media tensors.
///
/// `input_ids` is ragged: each batch element keeps its own prompt length,
/// which the dispatcher records before generation.
#[derive(Debug, Clone, Default)]
pub struct ModelInputs {
    /// Prompt token ids per batch element
    pub input_ids: Vec<Vec<u32>>,
    /// Attention mask per batch element, same lengths as `input_ids`
    pub attention_mask: Vec<Vec<u32>>,
    /// Flattened image patches
    pub pixel_values: Option<Tensor>,
    /// (t, h, w) grid per image payload
    pub image_grid_thw: Vec<[u32; 3]>,
    /// Flattened video patches
    pub pixel_values_videos: Option<Tensor>,
    /// (t, h, w) grid per video payload
    pub video_grid_thw: Vec<[u32; 3]>,
    /// Audio features
    pub audio_feats: Option<Tensor>,
    /// Feature length per audio payload
    pub audio_feats_lengths: Vec<u32>,
    /// (token offset, token count) of each audio placeholder span
    pub audio_placeholder_loc_lens: Vec<(u32, u32)>,
    /// Positions that receive image-generation query embeddings
    pub gen_mask: Option<Vec<Vec<u8>>>,
}

impl ModelInputs {
    /// Text-only inputs from prompt ids, with an all-ones attention mask.
    pub fn from_token_ids(input_ids: Vec<Vec<u32>>) -> Self {
        let attention_mask = input_ids.iter().map(|ids| vec![1; ids.len()]).collect();
        Self {
            input_ids,
            attention_mask,
            ..Self::default()
        }
    }

    /// Number of prompts in the batch.
    pub fn batch_size(&self) -> usize {
        self.input_ids.len()
    }

    /// Prompt length of each batch element.
    pub fn prompt_lengths(&self) -> Vec<usize> {
        self.input_ids.iter().map(Vec::len).collect()
    }

    /// Number of encoded segments for a modality.
    pub fn segment_count(&self, modality: Modality) -> usize {
        match modality {
            Modality::Image => self.image_grid_thw.len(),
            Modality::Video => self.video_grid_thw.len(),
            Modality::Audio => self.audio_feats_lengths.len(),
        }
    }

    /// Whether any video or audio features are present.
    pub fn has_video_or_audio(&self) -> bool {
        self.pixel_values_videos.is_some() || self.audio_feats.is_some()
    }

    /// Casts every floating media tensor to `dtype`.
    ///
    /// The decoder expects reduced-precision media; callers apply this
    /// before dispatch.
    pub fn to_media_dtype(mut self, dtype: DType) -> candle_core::Result<Self> {
        self.pixel_values = cast(self.pixel_values, dtype)?;
        self.pixel_values_videos = cast(self.pixel_values_videos, dtype)?;
        self.audio_feats = cast(self.audio_feats, dtype)?;
        Ok(self)
    }
}

fn cast(tensor: Option<Tensor>, dtype: DType) -> candle_core::Result<Option<Tensor>> {
    match tensor {
        Some(t) if t.dtype().is_float() && t.dtype() != dtype => Ok(Some(t.to_dtype(dtype)?)),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_prompt_lengths_are_per_element() {
        let inputs = ModelInputs::from_token_ids(vec![vec![1, 2, 3], vec![4]]);
        assert_eq!(inputs.prompt_lengths(), vec![3, 1]);
        assert_eq!(inputs.attention_mask, vec![vec![1, 1, 1], vec![1]]);
    }

    #[test]
    fn test_media_cast_leaves_ids_alone() {
        let mut inputs = ModelInputs::from_token_ids(vec![vec![7, 8]]);
        inputs.pixel_values = Some(Tensor::zeros((4, 6), DType::F32, &Device::Cpu).unwrap());
        let inputs = inputs.to_media_dtype(DType::BF16).unwrap();
        assert_eq!(inputs.pixel_values.unwrap().dtype(), DType::BF16);
        assert!(inputs.audio_feats.is_none());
        assert_eq!(inputs.input_ids, vec![vec![7, 8]]);
    }
}
