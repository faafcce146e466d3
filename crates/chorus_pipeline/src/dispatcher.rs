//! Single-call generation dispatch.
//!
//! [`GenerationDispatcher::prepare`] validates the inputs against the task
//! configuration and records each batch element's prompt length. The
//! resulting [`PreparedGeneration`] is consumed by
//! [`PreparedGeneration::dispatch`], so a prepared request can reach the
//! decoder at most once.

use chorus_core::{GenerationResult, ModelInputs, Task, TaskConfig};
use chorus_error::{
    BackendError, ChorusResult, GenerationError, GenerationErrorKind, Stage, TaskConfigError,
    TaskConfigErrorKind,
};
use chorus_interface::{Decoder, GenerationRequest};
use derive_getters::Getters;
use tracing::{debug, error, info, instrument};

use crate::{ImageGenSettings, SpecialTokens, configurator::ensure_compatible};

/// Validates requests and hands them to the decoder.
#[derive(Debug, Clone)]
pub struct GenerationDispatcher {
    tokens: SpecialTokens,
    image_gen: ImageGenSettings,
}

impl GenerationDispatcher {
    /// Create a dispatcher.
    pub fn new(tokens: SpecialTokens, image_gen: ImageGenSettings) -> Self {
        Self { tokens, image_gen }
    }

    /// Validate `inputs` for `config` and record prompt lengths.
    ///
    /// Image tasks additionally get their learnable query blocks appended:
    /// per configured scale `s`, an open marker, `s²` patch tokens flagged
    /// in `gen_mask`, and a close marker.
    ///
    /// # Errors
    ///
    /// - `TaskConfigError` when the configuration is internally
    ///   inconsistent, or when an image or speech task is given a batch
    ///   other than one (image tasks also refuse video and audio).
    /// - `BackendError` at stage `processor` for an empty batch or an
    ///   attention mask that does not line up with the prompt ids.
    #[instrument(skip_all, fields(task = %config.task(), batch = inputs.batch_size()))]
    pub fn prepare(
        &self,
        mut inputs: ModelInputs,
        config: TaskConfig,
    ) -> ChorusResult<PreparedGeneration> {
        ensure_compatible(&config)?;
        let task = *config.task();

        if inputs.batch_size() == 0 {
            return Err(BackendError::new(Stage::Processor, "processor produced an empty batch").into());
        }
        if inputs.attention_mask.is_empty() {
            inputs.attention_mask = inputs.input_ids.iter().map(|ids| vec![1; ids.len()]).collect();
        }
        if let Some(batch_index) = misaligned_mask(&inputs) {
            error!(batch_index, "Attention mask does not match prompt ids");
            return Err(BackendError::new(
                Stage::Processor,
                format!("attention mask of batch element {} does not match its prompt", batch_index),
            )
            .into());
        }

        if *config.capture_hidden_states() && inputs.batch_size() != 1 {
            return Err(rejected(task, "speech continuation requires a batch of one").into());
        }
        if config.image_gen().is_some() {
            if inputs.batch_size() != 1 {
                return Err(rejected(task, "image generation requires a batch of one").into());
            }
            if inputs.has_video_or_audio() {
                return Err(rejected(task, "image generation accepts no video or audio").into());
            }
            self.append_query_tokens(&mut inputs);
        }

        let prompt_lengths = inputs.prompt_lengths();
        debug!(?prompt_lengths, "Recorded prompt lengths");
        Ok(PreparedGeneration {
            request: GenerationRequest { inputs, config },
            prompt_lengths,
        })
    }

    fn append_query_tokens(&self, inputs: &mut ModelInputs) {
        let patch = *self.tokens.image_patch();
        let mut gen_mask: Vec<Vec<u8>> = inputs.input_ids.iter().map(|ids| vec![0; ids.len()]).collect();

        for ((ids, mask), attention) in inputs
            .input_ids
            .iter_mut()
            .zip(gen_mask.iter_mut())
            .zip(inputs.attention_mask.iter_mut())
        {
            for scale in self.image_gen.scales() {
                let queries = (*scale as usize).pow(2);
                ids.push(patch + 1);
                mask.push(0);
                ids.extend(std::iter::repeat_n(patch, queries));
                mask.extend(std::iter::repeat_n(1, queries));
                ids.push(patch + 2);
                mask.push(0);
            }
            attention.resize(ids.len(), 1);
        }
        debug!(
            scales = ?self.image_gen.scales(),
            prompt_len = inputs.input_ids.first().map(Vec::len),
            "Appended image query tokens"
        );
        inputs.gen_mask = Some(gen_mask);
    }
}

/// A validated request awaiting its one decoder call.
#[derive(Debug)]
pub struct PreparedGeneration {
    request: GenerationRequest,
    prompt_lengths: Vec<usize>,
}

impl PreparedGeneration {
    /// Task being generated.
    pub fn task(&self) -> Task {
        *self.request.config.task()
    }

    /// Prompt length per batch element, as sent to the decoder.
    pub fn prompt_lengths(&self) -> &[usize] {
        &self.prompt_lengths
    }

    /// The request the decoder will receive.
    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    /// Invoke the decoder exactly once and check the result's shape.
    ///
    /// Decoder failures are returned unchanged; nothing is retried.
    #[instrument(skip_all, fields(task = %self.task(), model = decoder.model_name()))]
    pub async fn dispatch(self, decoder: &dyn Decoder) -> ChorusResult<Dispatched> {
        let task = self.task();
        let expects_image = self.request.config.image_gen().is_some();
        let expects_hidden = *self.request.config.capture_hidden_states();
        let prompt_lengths = self.prompt_lengths;

        info!(batch = prompt_lengths.len(), "Dispatching generation");
        let result = decoder.generate(self.request).await.inspect_err(|e| {
            error!(error = %e, "Decoder failed");
        })?;

        check_shape(task, expects_image, expects_hidden, &prompt_lengths, &result)?;
        info!(result = result.variant_name(), "Generation complete");
        Ok(Dispatched {
            task,
            prompt_lengths,
            result,
        })
    }
}

/// A decoder result that satisfies its task's shape contract.
#[derive(Debug, Clone, Getters)]
pub struct Dispatched {
    /// Task that was generated
    task: Task,
    /// Prompt length per batch element
    prompt_lengths: Vec<usize>,
    /// What the decoder returned
    result: GenerationResult,
}

impl Dispatched {
    /// Split into prompt lengths and result.
    pub fn into_parts(self) -> (Vec<usize>, GenerationResult) {
        (self.prompt_lengths, self.result)
    }
}

fn misaligned_mask(inputs: &ModelInputs) -> Option<usize> {
    if inputs.attention_mask.len() != inputs.input_ids.len() {
        return Some(inputs.attention_mask.len().min(inputs.input_ids.len()));
    }
    inputs
        .input_ids
        .iter()
        .zip(&inputs.attention_mask)
        .position(|(ids, mask)| ids.len() != mask.len())
}

#[track_caller]
fn rejected(task: Task, reason: &str) -> TaskConfigError {
    TaskConfigError::new(TaskConfigErrorKind::IncompatibleParams {
        task: task.to_string(),
        reason: reason.to_string(),
    })
}

fn check_shape(
    task: Task,
    expects_image: bool,
    expects_hidden: bool,
    prompt_lengths: &[usize],
    result: &GenerationResult,
) -> Result<(), GenerationError> {
    let unexpected = |expected: &str| {
        error!(expected, found = result.variant_name(), "Decoder result has the wrong shape");
        GenerationError::new(GenerationErrorKind::UnexpectedShape {
            task: task.to_string(),
            expected: expected.to_string(),
            found: result.variant_name().to_string(),
        })
    };

    let token_ids = match (expects_image, expects_hidden, result) {
        (true, _, GenerationResult::Image(_)) => return Ok(()),
        (true, _, _) => return Err(unexpected("Image")),
        (false, true, GenerationResult::TextWithHiddenStates { token_ids, hidden_states }) => {
            if hidden_states.is_empty() {
                error!("Decoder captured no hidden states");
                return Err(GenerationError::new(GenerationErrorKind::Empty {
                    task: task.to_string(),
                }));
            }
            token_ids
        }
        (false, true, GenerationResult::TextSequences { .. }) => {
            error!("Decoder ignored the hidden-state request");
            return Err(GenerationError::new(GenerationErrorKind::MissingHiddenStates));
        }
        (false, true, _) => return Err(unexpected("TextWithHiddenStates")),
        (false, false, GenerationResult::TextSequences { token_ids }) => token_ids,
        (false, false, _) => return Err(unexpected("TextSequences")),
    };

    if token_ids.len() != prompt_lengths.len() {
        error!(expected = prompt_lengths.len(), returned = token_ids.len(), "Batch size mismatch");
        return Err(GenerationError::new(GenerationErrorKind::BatchMismatch {
            expected: prompt_lengths.len(),
            returned: token_ids.len(),
        }));
    }
    for (batch_index, (sequence, prompt_len)) in token_ids.iter().zip(prompt_lengths).enumerate() {
        if sequence.len() < *prompt_len {
            error!(batch_index, prompt_len, sequence_len = sequence.len(), "Sequence shorter than prompt");
            return Err(GenerationError::new(GenerationErrorKind::PromptExceedsSequence {
                batch_index,
                prompt_len: *prompt_len,
                sequence_len: sequence.len(),
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_core::{ImageGenParams, PixelWindow};
    use chorus_error::ChorusErrorKind;

    fn dispatcher() -> GenerationDispatcher {
        GenerationDispatcher::new(SpecialTokens::default(), ImageGenSettings::default())
    }

    fn text_config() -> TaskConfig {
        TaskConfig::builder().task(Task::PlainText).build().unwrap()
    }

    fn image_config() -> TaskConfig {
        TaskConfig::builder()
            .task(Task::TextToImage)
            .image_gen(Some(ImageGenParams::default()))
            .pixel_window(Some(PixelWindow::fixed(451_584)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_ragged_prompt_lengths_are_recorded() {
        let inputs = ModelInputs::from_token_ids(vec![vec![1, 2, 3, 4], vec![5, 6]]);
        let prepared = dispatcher().prepare(inputs, text_config()).unwrap();
        assert_eq!(prepared.prompt_lengths(), &[4, 2]);
    }

    #[test]
    fn test_image_query_blocks_follow_scales() {
        let inputs = ModelInputs::from_token_ids(vec![vec![10, 11, 12]]);
        let prepared = dispatcher().prepare(inputs, image_config()).unwrap();

        let patch = *SpecialTokens::default().image_patch();
        let ids = &prepared.request().inputs.input_ids[0];
        let queries: usize = [4usize, 8, 16].iter().map(|s| s * s).sum();
        assert_eq!(ids.len(), 3 + queries + 2 * 3);
        assert_eq!(ids[3], patch + 1);
        assert_eq!(ids[3 + 1 + 16], patch + 2);
        assert_eq!(*ids.last().unwrap(), patch + 2);

        let gen_mask = prepared.request().inputs.gen_mask.as_ref().unwrap();
        assert_eq!(gen_mask[0].len(), ids.len());
        assert_eq!(gen_mask[0].iter().filter(|m| **m == 1).count(), queries);
        assert_eq!(prepared.request().inputs.attention_mask[0].len(), ids.len());
        assert_eq!(prepared.prompt_lengths(), &[ids.len()]);
    }

    #[test]
    fn test_image_task_rejects_batches_and_audio() {
        let batch = ModelInputs::from_token_ids(vec![vec![1], vec![2]]);
        assert!(dispatcher().prepare(batch, image_config()).is_err());

        let mut with_audio = ModelInputs::from_token_ids(vec![vec![1]]);
        with_audio.audio_feats = Some(
            candle_core::Tensor::zeros((1, 4), candle_core::DType::F32, &candle_core::Device::Cpu)
                .unwrap(),
        );
        let err = dispatcher().prepare(with_audio, image_config()).unwrap_err();
        assert!(matches!(err.kind(), ChorusErrorKind::TaskConfig(_)));
    }

    #[test]
    fn test_empty_batch_is_backend_error() {
        let err = dispatcher()
            .prepare(ModelInputs::default(), text_config())
            .unwrap_err();
        match err.kind() {
            ChorusErrorKind::Backend(e) => assert_eq!(e.stage, Stage::Processor),
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_misaligned_attention_mask_is_rejected() {
        let mut inputs = ModelInputs::from_token_ids(vec![vec![1, 2, 3]]);
        inputs.attention_mask = vec![vec![1, 1]];
        assert!(dispatcher().prepare(inputs, text_config()).is_err());
    }

    #[test]
    fn test_shape_contract() {
        let lengths = [2usize];
        let sequences = GenerationResult::TextSequences {
            token_ids: vec![vec![1, 2, 3]],
        };
        assert!(check_shape(Task::PlainText, false, false, &lengths, &sequences).is_ok());

        let err = check_shape(Task::SpeechQa, false, true, &lengths, &sequences).unwrap_err();
        assert_eq!(err.kind, GenerationErrorKind::MissingHiddenStates);

        let no_states = GenerationResult::TextWithHiddenStates {
            token_ids: vec![vec![1, 2, 3]],
            hidden_states: vec![],
        };
        let err = check_shape(Task::SpeechQa, false, true, &lengths, &no_states).unwrap_err();
        assert!(matches!(err.kind, GenerationErrorKind::Empty { .. }));

        let err = check_shape(Task::TextToImage, true, false, &lengths, &sequences).unwrap_err();
        assert!(matches!(err.kind, GenerationErrorKind::UnexpectedShape { .. }));

        let short = GenerationResult::TextSequences {
            token_ids: vec![vec![1]],
        };
        let err = check_shape(Task::PlainText, false, false, &lengths, &short).unwrap_err();
        assert!(matches!(
            err.kind,
            GenerationErrorKind::PromptExceedsSequence { batch_index: 0, .. }
        ));

        let wide = GenerationResult::TextSequences {
            token_ids: vec![vec![1, 2], vec![1, 2]],
        };
        let err = check_shape(Task::PlainText, false, false, &lengths, &wide).unwrap_err();
        assert!(matches!(err.kind, GenerationErrorKind::BatchMismatch { .. }));
    }
}
