//! Speech continuation bridge.
//!
//! Carries a spoken reply from the decoder's hidden states through the
//! audio token generator ("talker") and the vocoder.

use candle_core::Tensor;
use chorus_core::{SpeakerProfile, SpeechContinuationState, Task, Waveform};
use chorus_error::{
    BackendError, ChorusResult, GenerationError, GenerationErrorKind, SpeechError,
    SpeechErrorKind, Stage,
};
use chorus_interface::{AudioTokenGenerator, Vocoder};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Sum of the first and last hidden-state snapshots.
///
/// With a single snapshot the result is that snapshot doubled.
///
/// # Errors
///
/// `GenerationError::Empty` for no snapshots, `SpeechError::SnapshotShape`
/// when the two ends differ in shape or dtype.
#[instrument(skip_all, fields(snapshots = hidden_states.len()))]
pub fn reply_embedding(hidden_states: &[Tensor]) -> ChorusResult<Tensor> {
    let (Some(first), Some(last)) = (hidden_states.first(), hidden_states.last()) else {
        error!("No hidden-state snapshots to build a reply embedding from");
        return Err(GenerationError::new(GenerationErrorKind::Empty {
            task: Task::SpeechQa.to_string(),
        })
        .into());
    };

    if first.dims() != last.dims() || first.dtype() != last.dtype() {
        return Err(SpeechError::new(SpeechErrorKind::SnapshotShape {
            first: describe(first),
            last: describe(last),
        })
        .into());
    }

    let embedding = first
        .add(last)
        .map_err(|e| BackendError::new(Stage::Decoder, format!("summing snapshots: {}", e)))?;
    debug!(shape = ?embedding.dims(), "Built reply embedding");
    Ok(embedding)
}

fn describe(tensor: &Tensor) -> String {
    format!("{:?} {:?}", tensor.dims(), tensor.dtype())
}

/// Voices replies with a talker and a vocoder.
#[derive(Clone)]
pub struct SpeechBridge {
    talker: Arc<dyn AudioTokenGenerator>,
    vocoder: Arc<dyn Vocoder>,
}

impl std::fmt::Debug for SpeechBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechBridge").finish_non_exhaustive()
    }
}

impl SpeechBridge {
    /// Create a bridge from its two collaborators.
    pub fn new(talker: Arc<dyn AudioTokenGenerator>, vocoder: Arc<dyn Vocoder>) -> Self {
        Self { talker, vocoder }
    }

    /// Build the state handed to the talker for a conversational reply.
    pub fn continuation_state(
        hidden_states: &[Tensor],
        decoded_text: impl Into<String>,
        speaker: SpeakerProfile,
    ) -> ChorusResult<SpeechContinuationState> {
        let embedding = reply_embedding(hidden_states)?;
        Ok(SpeechContinuationState::new(embedding, decoded_text, speaker))
    }

    /// Run the talker then the vocoder for `state`.
    ///
    /// A state without a reply embedding is voiced as plain text-to-speech.
    #[instrument(skip_all, fields(speaker = state.speaker_profile().name(), text_only = state.is_text_only()))]
    pub async fn voice(&self, state: &SpeechContinuationState) -> ChorusResult<Waveform> {
        let audio_tokens = self.talker.generate_audio_tokens(state).await.inspect_err(|e| {
            error!(error = %e, "Audio token generation failed");
        })?;
        if audio_tokens.is_empty() {
            error!("Audio token generator returned nothing");
            return Err(SpeechError::new(SpeechErrorKind::NoAudioTokens).into());
        }
        debug!(audio_tokens = audio_tokens.len(), "Generated audio tokens");

        let waveform = self
            .vocoder
            .synthesize(&audio_tokens, state.speaker_profile())
            .await
            .inspect_err(|e| {
                error!(error = %e, "Vocoder failed");
            })?;
        info!(duration_secs = waveform.duration_secs(), "Synthesized reply");
        Ok(waveform)
    }

    /// Voice a reply conditioned on the decoder's hidden states.
    pub async fn continue_reply(
        &self,
        hidden_states: &[Tensor],
        decoded_text: impl Into<String>,
        speaker: SpeakerProfile,
    ) -> ChorusResult<Waveform> {
        let state = Self::continuation_state(hidden_states, decoded_text, speaker)?;
        self.voice(&state).await
    }

    /// Plain text-to-speech, decoupled from any conversation.
    pub async fn speak(
        &self,
        text: impl Into<String>,
        speaker: SpeakerProfile,
    ) -> ChorusResult<Waveform> {
        let state = SpeechContinuationState::text_only(text, speaker);
        self.voice(&state).await
    }
}
