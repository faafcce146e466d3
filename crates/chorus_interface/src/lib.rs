//! Trait interfaces for the external collaborators of the pipeline.
//!
//! The pipeline treats every neural component as an opaque capability:
//! - [`Processor`] - tokenizes the prompt and encodes media payloads
//! - [`Tokenizer`] - maps generated token ids back to text
//! - [`Decoder`] - the shared multimodal model's `generate`
//! - [`AudioTokenGenerator`] - turns reply text (and context) into audio tokens
//! - [`Vocoder`] - turns audio tokens into waveform samples
//!
//! Capability handles are created once per process and shared read-only,
//! hence the `Send + Sync` bounds.

mod collaborators;
mod request;

pub use collaborators::{AudioTokenGenerator, Decoder, Processor, Tokenizer, Vocoder};
pub use request::GenerationRequest;
