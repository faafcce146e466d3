//! Mock collaborators.

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use chorus_core::{
    GeneratedImage, GenerationResult, ModelInputs, Modality, NormalizedInput, ProcessorOptions,
    SpeakerProfile, SpeechContinuationState, TaskConfig, Waveform,
};
use chorus_error::{BackendError, ChorusResult, Stage};
use chorus_interface::{
    AudioTokenGenerator, Decoder, GenerationRequest, Processor, Tokenizer, Vocoder,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Encodes each prompt character as its code point and emits one segment
/// per payload.
#[derive(Default)]
pub struct MockProcessor {
    /// Extra prompts appended to the batch; copy `n` is the first prompt
    /// prefixed with `n + 1` '#' tokens, so prompt lengths differ
    pub extra_batch: usize,
    /// Drop the last image segment to simulate a broken encoder
    pub drop_image_segment: bool,
    /// Options seen on each call
    pub seen_options: Mutex<Vec<ProcessorOptions>>,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_options(&self) -> Option<ProcessorOptions> {
        self.seen_options.lock().unwrap().last().copied()
    }
}

fn media_tensor(count: usize) -> Option<Tensor> {
    (count > 0).then(|| Tensor::zeros((count, 8), DType::F32, &Device::Cpu).unwrap())
}

impl Processor for MockProcessor {
    fn process(
        &self,
        input: &NormalizedInput,
        options: &ProcessorOptions,
    ) -> ChorusResult<ModelInputs> {
        self.seen_options.lock().unwrap().push(*options);

        let ids: Vec<u32> = input.prompt_text.chars().map(u32::from).collect();
        let mut batch = vec![ids.clone()];
        for copy in 0..self.extra_batch {
            let mut longer = vec![u32::from('#'); copy + 1];
            longer.extend(&ids);
            batch.push(longer);
        }

        let mut inputs = ModelInputs::from_token_ids(batch);
        let images = input.payloads(Modality::Image).len();
        let image_segments = if self.drop_image_segment {
            images.saturating_sub(1)
        } else {
            images
        };
        inputs.image_grid_thw = vec![[1, 2, 2]; image_segments];
        inputs.pixel_values = media_tensor(image_segments);

        let videos = input.payloads(Modality::Video).len();
        inputs.video_grid_thw = vec![[2, 2, 2]; videos];
        inputs.pixel_values_videos = media_tensor(videos);

        let audios = input.payloads(Modality::Audio).len();
        inputs.audio_feats_lengths = vec![if options.use_whisper_encoder { 3000 } else { 100 }; audios];
        inputs.audio_feats = media_tensor(audios);
        Ok(inputs)
    }
}

/// Maps code points back to characters.
#[derive(Default)]
pub struct MockTokenizer {
    pub calls: AtomicUsize,
}

impl MockTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Tokenizer for MockTokenizer {
    fn decode(&self, token_ids: &[u32], _skip_special_tokens: bool) -> ChorusResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(token_ids.iter().filter_map(|id| char::from_u32(*id)).collect())
    }
}

/// What the mock decoder does when called.
#[derive(Debug, Clone)]
pub enum DecoderBehavior {
    /// Append this reply to every prompt, following the request's shape
    /// contract
    Reply(String),
    /// Fail with a decoder backend error
    Fail(String),
    /// Ignore the request and return this result
    Fixed(GenerationResult),
}

/// Scripted decoder that records every request.
pub struct MockDecoder {
    behavior: DecoderBehavior,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl MockDecoder {
    pub fn new(behavior: DecoderBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::new(DecoderBehavior::Reply(reply.to_string()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<TaskConfig> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|request| request.config.clone())
    }
}

#[async_trait]
impl Decoder for MockDecoder {
    async fn generate(&self, request: GenerationRequest) -> ChorusResult<GenerationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let reply = match &self.behavior {
            DecoderBehavior::Fail(message) => {
                return Err(BackendError::new(Stage::Decoder, message.clone()).into());
            }
            DecoderBehavior::Fixed(result) => return Ok(result.clone()),
            DecoderBehavior::Reply(reply) => reply,
        };

        if let Some(params) = request.config.image_gen() {
            let pixels = (*params.width() as usize) * (*params.height() as usize) * 3;
            let image = GeneratedImage::from_rgb(*params.width(), *params.height(), vec![0; pixels])?;
            return Ok(GenerationResult::Image(image));
        }

        let token_ids: Vec<Vec<u32>> = request
            .inputs
            .input_ids
            .iter()
            .map(|prompt| {
                let mut sequence = prompt.clone();
                sequence.extend(reply.chars().map(u32::from));
                sequence
            })
            .collect();

        if *request.config.capture_hidden_states() {
            // One snapshot per generated token, filled with its 1-based step.
            let hidden_states = (1..=reply.chars().count())
                .map(|step| Tensor::full(step as f32, (1, 4), &Device::Cpu).unwrap())
                .collect();
            return Ok(GenerationResult::TextWithHiddenStates {
                token_ids,
                hidden_states,
            });
        }
        Ok(GenerationResult::TextSequences { token_ids })
    }

    fn model_name(&self) -> &str {
        "mock-omni"
    }
}

/// Talker emitting one audio token per reply character.
#[derive(Default)]
pub struct MockTalker {
    /// Return no tokens at all
    pub silent: bool,
    /// Flattened reply embedding of each call, `None` for text-only calls
    pub seen_embeddings: Mutex<Vec<Option<Vec<f32>>>>,
}

impl MockTalker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embeddings(&self) -> Vec<Option<Vec<f32>>> {
        self.seen_embeddings.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioTokenGenerator for MockTalker {
    async fn generate_audio_tokens(
        &self,
        state: &SpeechContinuationState,
    ) -> ChorusResult<Vec<u32>> {
        let embedding = state
            .reply_embedding()
            .as_ref()
            .map(|t| t.flatten_all().unwrap().to_vec1::<f32>().unwrap());
        self.seen_embeddings.lock().unwrap().push(embedding);
        if self.silent {
            return Ok(Vec::new());
        }
        Ok((0..state.decoded_text().chars().count() as u32).collect())
    }
}

/// Vocoder producing 160 silent samples per audio token at 16 kHz.
#[derive(Default)]
pub struct MockVocoder {
    pub calls: AtomicUsize,
    pub speakers: Mutex<Vec<String>>,
}

impl MockVocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Vocoder for MockVocoder {
    async fn synthesize(
        &self,
        audio_tokens: &[u32],
        speaker: &SpeakerProfile,
    ) -> ChorusResult<Waveform> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.speakers.lock().unwrap().push(speaker.name().to_string());
        Ok(Waveform::new(vec![0.0; audio_tokens.len() * 160], 16_000))
    }
}
