//! Core data types for the Chorus multimodal inference pipeline.
//!
//! This crate provides the conversation model, task configuration and
//! generation result types shared by every pipeline stage.

mod role;
mod media;
mod modality;
mod input;
mod message;
mod conversation;
mod normalized;
mod task;
mod model_inputs;
mod generated_image;
mod result;
mod speech;
mod observability;

pub use role::Role;
pub use media::MediaSource;
pub use modality::Modality;
pub use input::Input;
pub use message::{Message, MessageBuilder};
pub use conversation::Conversation;
pub use normalized::{MediaPayload, NormalizedInput};
pub use task::{
    ImageGenParams, ImageGenParamsBuilder, PixelWindow, Task, TaskConfig, TaskConfigBuilder,
    TaskOverrides,
};
pub use model_inputs::{ModelInputs, ProcessorOptions};
pub use generated_image::GeneratedImage;
pub use result::GenerationResult;
pub use speech::{SpeakerProfile, SpeakerValue, SpeechContinuationState, Waveform};
pub use observability::{init_observability, shutdown_observability};
