//! Request orchestration and task dispatch for the Chorus pipeline.
//!
//! A conversation turn flows through five stages:
//!
//! 1. [`ConversationNormalizer`] renders the conversation into one prompt
//!    with a placeholder per media item and collects the payloads.
//! 2. The [`Processor`](chorus_interface::Processor) collaborator encodes
//!    prompt and payloads into [`ModelInputs`](chorus_core::ModelInputs).
//! 3. [`TaskConfigurator`] builds the task's generation configuration.
//! 4. [`GenerationDispatcher`] validates the request, records prompt
//!    lengths and calls the decoder exactly once.
//! 5. [`OutputTrimmer`] strips prompts and decodes text; for spoken replies
//!    the [`SpeechBridge`] turns hidden states into a waveform.
//!
//! [`Pipeline`] wires all of them together.

mod config;
mod configurator;
mod dispatcher;
#[cfg(feature = "metrics")]
mod metrics;
mod normalizer;
mod pipeline;
mod speech;
mod tokenizer;
mod trimmer;

pub use config::{
    ChatTemplate, GenerationSettings, ImageGenSettings, MediaSettings, PipelineConfig,
    PipelineConfigBuilder, SpecialTokens,
};
pub use configurator::{TaskConfigurator, ensure_compatible};
pub use dispatcher::{Dispatched, GenerationDispatcher, PreparedGeneration};
#[cfg(feature = "metrics")]
pub use metrics::PipelineMetrics;
pub use normalizer::{ConversationNormalizer, verify_encoded_segments};
pub use pipeline::{Pipeline, PipelineOutput};
pub use speech::{SpeechBridge, reply_embedding};
pub use tokenizer::HfTokenizer;
pub use trimmer::{OutputTrimmer, trim_prompt};
