//! Chorus: a multimodal conversational inference client.
//!
//! Takes a role-tagged conversation of text, image, video and audio items
//! and produces a text answer, a spoken reply or a generated image by
//! routing it through one shared multimodal decoder.
//!
//! The neural components are supplied by the caller through the traits in
//! [`chorus_interface`]; this crate re-exports everything needed to wire
//! them into a [`Pipeline`].
//!
//! # Example
//!
//! ```
//! use chorus::{Conversation, Input, Message, PipelineConfig, Task, TaskConfigurator, TaskOverrides};
//!
//! let config = PipelineConfig::default();
//! let configurator = TaskConfigurator::new(
//!     config.generation().clone(),
//!     config.tokens().clone(),
//!     config.image_gen().clone(),
//! );
//! let speech = configurator
//!     .configure(Task::SpeechQa, &TaskOverrides::default())
//!     .unwrap();
//! assert!(*speech.capture_hidden_states());
//!
//! let mut conversation = Conversation::new();
//! conversation.push(Message::human(vec![Input::text("What is the capital of France?")]));
//! assert_eq!(conversation.len(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use chorus_core::{
    Conversation, GeneratedImage, GenerationResult, ImageGenParams, ImageGenParamsBuilder, Input,
    MediaPayload, MediaSource, Message, MessageBuilder, Modality, ModelInputs, NormalizedInput,
    PixelWindow, ProcessorOptions, Role, SpeakerProfile, SpeakerValue, SpeechContinuationState,
    Task, TaskConfig, TaskConfigBuilder, TaskOverrides, Waveform, init_observability,
    shutdown_observability,
};
pub use chorus_error::{
    BackendError, ChorusError, ChorusErrorKind, ChorusResult, ConfigError, ConversationError,
    ConversationErrorKind, GenerationError, GenerationErrorKind, PlaceholderMismatchError,
    SpeechError, SpeechErrorKind, Stage, StorageError, StorageErrorKind, TaskConfigError,
    TaskConfigErrorKind,
};
pub use chorus_interface::{
    AudioTokenGenerator, Decoder, GenerationRequest, Processor, Tokenizer, Vocoder,
};
#[cfg(feature = "metrics")]
pub use chorus_pipeline::PipelineMetrics;
pub use chorus_pipeline::{
    ChatTemplate, ConversationNormalizer, Dispatched, GenerationDispatcher, GenerationSettings,
    HfTokenizer, ImageGenSettings, MediaSettings, OutputTrimmer, Pipeline, PipelineConfig,
    PipelineConfigBuilder, PipelineOutput, PreparedGeneration, SpecialTokens, SpeechBridge,
    TaskConfigurator, ensure_compatible, reply_embedding, trim_prompt, verify_encoded_segments,
};
