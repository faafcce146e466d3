//! Collaborator traits.

use async_trait::async_trait;
use chorus_core::{
    GenerationResult, ModelInputs, NormalizedInput, ProcessorOptions, SpeakerProfile,
    SpeechContinuationState, Waveform,
};
use chorus_error::ChorusResult;

use crate::GenerationRequest;

/// Modality encoder adapter.
///
/// Turns the linearized prompt and raw media payloads into batched numeric
/// inputs. Implementations must emit exactly one grid/segment per payload,
/// in payload order.
pub trait Processor: Send + Sync {
    /// Tokenize and encode a normalized conversation.
    fn process(
        &self,
        input: &NormalizedInput,
        options: &ProcessorOptions,
    ) -> ChorusResult<ModelInputs>;
}

/// Token-to-text decoding.
pub trait Tokenizer: Send + Sync {
    /// Decode token ids, optionally dropping special tokens.
    fn decode(&self, token_ids: &[u32], skip_special_tokens: bool) -> ChorusResult<String>;
}

/// The shared multimodal decoder.
///
/// Each call is one generation. The pipeline never retries; a failed call
/// is reported to the caller as-is.
#[async_trait]
pub trait Decoder: Send + Sync {
    /// Run generation. The result variant must follow the request's config:
    /// `Image` when `image_gen` is set, `TextWithHiddenStates` when hidden
    /// states are captured, `TextSequences` otherwise.
    async fn generate(&self, request: GenerationRequest) -> ChorusResult<GenerationResult>;

    /// Model identifier for logs.
    fn model_name(&self) -> &str;
}

/// Second-stage generator producing discrete audio tokens (the "talker").
#[async_trait]
pub trait AudioTokenGenerator: Send + Sync {
    /// Generate audio tokens for the state's text.
    ///
    /// When the state carries no reply embedding the generator must act as
    /// a plain text-to-speech engine.
    async fn generate_audio_tokens(&self, state: &SpeechContinuationState)
    -> ChorusResult<Vec<u32>>;
}

/// Detokenizer/vocoder turning audio tokens into samples.
#[async_trait]
pub trait Vocoder: Send + Sync {
    /// Synthesize a waveform in the speaker's voice.
    async fn synthesize(
        &self,
        audio_tokens: &[u32],
        speaker: &SpeakerProfile,
    ) -> ChorusResult<Waveform>;
}
