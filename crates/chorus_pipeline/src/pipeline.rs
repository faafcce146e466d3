//! End-to-end orchestration of one conversation turn.

use candle_core::DType;
use chorus_core::{
    Conversation, GeneratedImage, GenerationResult, ModelInputs, NormalizedInput, SpeakerProfile,
    Task, TaskConfig, TaskOverrides, Waveform,
};
use chorus_error::{
    BackendError, ChorusResult, SpeechError, SpeechErrorKind, Stage, TaskConfigError,
    TaskConfigErrorKind,
};
use chorus_interface::{AudioTokenGenerator, Decoder, Processor, Tokenizer, Vocoder};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    ConversationNormalizer, Dispatched, GenerationDispatcher, OutputTrimmer, PipelineConfig,
    PreparedGeneration, SpeechBridge, TaskConfigurator, verify_encoded_segments,
};
#[cfg(feature = "metrics")]
use crate::PipelineMetrics;

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub enum PipelineOutput {
    /// One decoded reply per batch element
    Text(Vec<String>),
    /// A spoken reply with its text
    Speech {
        /// Decoded reply text
        text: String,
        /// Synthesized audio
        waveform: Waveform,
    },
    /// A generated or edited image
    Image(GeneratedImage),
}

/// Normalizer, configurator, dispatcher, trimmer and speech bridge wired to
/// a set of collaborators.
///
/// Collaborator handles are shared read-only; a pipeline holds no
/// per-conversation state, so one instance can serve conversations one
/// after another.
pub struct Pipeline {
    normalizer: ConversationNormalizer,
    configurator: TaskConfigurator,
    dispatcher: GenerationDispatcher,
    trimmer: OutputTrimmer,
    processor: Arc<dyn Processor>,
    decoder: Arc<dyn Decoder>,
    speech: Option<SpeechBridge>,
    media_dtype: DType,
    #[cfg(feature = "metrics")]
    metrics: PipelineMetrics,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("model", &self.decoder.model_name())
            .field("speech", &self.speech.is_some())
            .field("media_dtype", &self.media_dtype)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline from a validated configuration and collaborators.
    #[instrument(skip_all, fields(model = decoder.model_name()))]
    pub fn new(
        config: PipelineConfig,
        processor: Arc<dyn Processor>,
        tokenizer: Arc<dyn Tokenizer>,
        decoder: Arc<dyn Decoder>,
    ) -> ChorusResult<Self> {
        config.validate()?;
        let media_dtype = config.media().dtype()?;
        info!(?media_dtype, "Pipeline ready");
        Ok(Self {
            normalizer: ConversationNormalizer::new(config.template().clone()),
            configurator: TaskConfigurator::new(
                config.generation().clone(),
                config.tokens().clone(),
                config.image_gen().clone(),
            ),
            dispatcher: GenerationDispatcher::new(
                config.tokens().clone(),
                config.image_gen().clone(),
            ),
            trimmer: OutputTrimmer::new(tokenizer, config.template()),
            processor,
            decoder,
            speech: None,
            media_dtype,
            #[cfg(feature = "metrics")]
            metrics: PipelineMetrics::new(),
        })
    }

    /// Attach the talker and vocoder needed by speech tasks.
    pub fn with_speech(
        mut self,
        talker: Arc<dyn AudioTokenGenerator>,
        vocoder: Arc<dyn Vocoder>,
    ) -> Self {
        self.speech = Some(SpeechBridge::new(talker, vocoder));
        self
    }

    /// The speech bridge, if one is attached.
    pub fn speech(&self) -> Option<&SpeechBridge> {
        self.speech.as_ref()
    }

    /// Build the configuration for `task`.
    pub fn configure(&self, task: Task, overrides: &TaskOverrides) -> ChorusResult<TaskConfig> {
        self.configurator.configure(task, overrides)
    }

    /// Normalize a conversation under `config`.
    pub fn normalize(
        &self,
        conversation: &Conversation,
        config: &TaskConfig,
    ) -> ChorusResult<NormalizedInput> {
        self.normalizer
            .normalize(conversation, config.system_prefix().as_deref())
    }

    /// Encode a normalized conversation and cast its media to the
    /// configured precision.
    #[instrument(skip_all, fields(task = %config.task()))]
    pub fn encode(
        &self,
        normalized: &NormalizedInput,
        config: &TaskConfig,
    ) -> ChorusResult<ModelInputs> {
        let encoded = self
            .processor
            .process(normalized, &config.processor_options())?;
        verify_encoded_segments(normalized, &encoded)?;
        let encoded = encoded.to_media_dtype(self.media_dtype).map_err(|e| {
            BackendError::new(Stage::Processor, format!("casting media tensors: {}", e))
        })?;
        debug!(batch = encoded.batch_size(), "Encoded inputs");
        Ok(encoded)
    }

    /// Run one conversation through the whole pipeline.
    ///
    /// Speech tasks require a speaker and an attached speech bridge; both
    /// are checked before the decoder is called.
    #[instrument(skip_all, fields(task = %task, turns = conversation.len()))]
    pub async fn run(
        &self,
        conversation: &Conversation,
        task: Task,
        overrides: &TaskOverrides,
        speaker: Option<&SpeakerProfile>,
    ) -> ChorusResult<PipelineOutput> {
        let config = self.configure(task, overrides)?;
        let voice = if task.produces_speech() {
            let bridge = self
                .speech
                .as_ref()
                .ok_or_else(|| SpeechError::new(SpeechErrorKind::MissingTalker))?;
            let speaker = speaker.ok_or_else(|| SpeechError::new(SpeechErrorKind::MissingSpeaker))?;
            Some((bridge, speaker.clone()))
        } else {
            None
        };

        let normalized = self.normalize(conversation, &config)?;
        let encoded = self.encode(&normalized, &config)?;
        let prepared = self.dispatcher.prepare(encoded, config)?;
        let (prompt_lengths, result) = self.dispatch(prepared).await?.into_parts();

        let output = match result {
            GenerationResult::Image(image) => PipelineOutput::Image(image),
            GenerationResult::TextSequences { token_ids } => {
                PipelineOutput::Text(self.trimmer.decode_batch(&token_ids, &prompt_lengths)?)
            }
            GenerationResult::TextWithHiddenStates {
                token_ids,
                hidden_states,
            } => {
                let text = self
                    .trimmer
                    .decode_batch(&token_ids, &prompt_lengths)?
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                match voice {
                    Some((bridge, speaker)) => {
                        let waveform = bridge
                            .continue_reply(&hidden_states, text.clone(), speaker)
                            .await?;
                        PipelineOutput::Speech { text, waveform }
                    }
                    None => PipelineOutput::Text(vec![text]),
                }
            }
        };
        info!("Pipeline run complete");
        Ok(output)
    }

    /// Answer the conversation's last human turn with a text task and
    /// append the reply as an assistant turn.
    pub async fn respond(
        &self,
        conversation: &mut Conversation,
        task: Task,
        overrides: &TaskOverrides,
    ) -> ChorusResult<String> {
        if task.produces_image() || task.produces_speech() {
            return Err(TaskConfigError::new(TaskConfigErrorKind::IncompatibleParams {
                task: task.to_string(),
                reason: "respond only runs text-producing tasks".to_string(),
            })
            .into());
        }
        let reply = match self.run(conversation, task, overrides, None).await? {
            PipelineOutput::Text(texts) => texts.into_iter().next().unwrap_or_default(),
            PipelineOutput::Speech { text, .. } => text,
            PipelineOutput::Image(_) => String::new(),
        };
        conversation.append_reply(reply.clone());
        Ok(reply)
    }

    /// Plain text-to-speech through the attached speech bridge.
    pub async fn speak(&self, text: &str, speaker: &SpeakerProfile) -> ChorusResult<Waveform> {
        let bridge = self
            .speech
            .as_ref()
            .ok_or_else(|| SpeechError::new(SpeechErrorKind::MissingTalker))?;
        bridge.speak(text, speaker.clone()).await
    }

    #[cfg(not(feature = "metrics"))]
    async fn dispatch(&self, prepared: PreparedGeneration) -> ChorusResult<Dispatched> {
        prepared.dispatch(self.decoder.as_ref()).await
    }

    #[cfg(feature = "metrics")]
    async fn dispatch(&self, prepared: PreparedGeneration) -> ChorusResult<Dispatched> {
        let task = prepared.task().to_string();
        let started = std::time::Instant::now();
        let result = prepared.dispatch(self.decoder.as_ref()).await;
        match &result {
            Ok(_) => self
                .metrics
                .record_dispatch(&task, started.elapsed().as_secs_f64()),
            Err(_) => self.metrics.record_failure(&task),
        }
        result
    }
}
