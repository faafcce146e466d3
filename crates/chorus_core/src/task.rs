//! Task selection and per-task generation configuration.

use crate::ProcessorOptions;
use chorus_error::{TaskConfigError, TaskConfigErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the caller wants out of a conversation.
///
/// # Examples
///
/// ```
/// use chorus_core::Task;
///
/// let task = Task::from_name("speech_qa").unwrap();
/// assert_eq!(task, Task::SpeechQa);
/// assert_eq!(task.to_string(), "speech_qa");
/// assert!(Task::from_name("karaoke").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Task {
    /// Text question answering
    PlainText,
    /// Question answering over images or video
    VisionQa,
    /// Reasoning with a step-by-step system directive
    ChainOfThought,
    /// Speech recognition through the whisper encoder path
    Asr,
    /// Spoken reply: text answer plus synthesized speech
    SpeechQa,
    /// Image generation from a text prompt
    TextToImage,
    /// Image editing guided by an input image
    ImageEdit,
}

impl Task {
    /// Parses a snake_case task name.
    #[track_caller]
    pub fn from_name(name: &str) -> Result<Self, TaskConfigError> {
        match name.parse::<Task>() {
            Ok(task) => Ok(task),
            Err(_) => Err(TaskConfigError::new(TaskConfigErrorKind::UnknownTask(
                name.to_string(),
            ))),
        }
    }

    /// Whether the task produces pixels rather than tokens.
    pub fn produces_image(&self) -> bool {
        matches!(self, Task::TextToImage | Task::ImageEdit)
    }

    /// Whether the task's reply must continue into the speech bridge.
    pub fn produces_speech(&self) -> bool {
        matches!(self, Task::SpeechQa)
    }
}

/// Image generation parameters.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(default)]
#[serde(default)]
pub struct ImageGenParams {
    /// Classifier-free guidance scale
    cfg_scale: f32,
    /// Denoising steps
    steps: u32,
    /// Output width in pixels
    width: u32,
    /// Output height in pixels
    height: u32,
    /// Sampler seed
    seed: u64,
}

impl Default for ImageGenParams {
    fn default() -> Self {
        Self {
            cfg_scale: 3.5,
            steps: 30,
            width: 512,
            height: 512,
            seed: 0,
        }
    }
}

impl ImageGenParams {
    /// Returns a builder for constructing ImageGenParams.
    pub fn builder() -> ImageGenParamsBuilder {
        ImageGenParamsBuilder::default()
    }

    /// Copy of these parameters with a different canvas size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Total pixel count of the canvas.
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Bounds on the pixel count an image payload is resized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelWindow {
    /// Lower bound on width × height
    pub min_pixels: u32,
    /// Upper bound on width × height
    pub max_pixels: u32,
}

impl PixelWindow {
    /// A window whose bounds collapse onto one target value.
    pub fn fixed(target: u32) -> Self {
        Self {
            min_pixels: target,
            max_pixels: target,
        }
    }

    /// Whether both bounds are equal.
    pub fn is_fixed(&self) -> bool {
        self.min_pixels == self.max_pixels
    }
}

/// Caller-supplied adjustments applied on top of a task's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskOverrides {
    /// Generation budget
    pub max_new_tokens: Option<u32>,
    /// KV cache toggle
    pub use_cache: Option<bool>,
    /// Repetition suppression window
    pub no_repeat_ngram_size: Option<u32>,
    /// Instruction text prepended to the first human text item
    pub system_prefix: Option<String>,
    /// Image generation geometry
    pub image_gen: Option<ImageGenParams>,
}

/// Generation configuration for one dispatch.
///
/// # Examples
///
/// ```
/// use chorus_core::{Task, TaskConfig};
///
/// let config = TaskConfig::builder()
///     .task(Task::PlainText)
///     .max_new_tokens(64u32)
///     .build()
///     .unwrap();
///
/// assert_eq!(*config.no_repeat_ngram_size(), 10);
/// assert!(!config.capture_hidden_states());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct TaskConfig {
    /// Task this configuration was built for
    task: Task,
    /// Generation budget
    #[builder(default = "512")]
    max_new_tokens: u32,
    /// KV cache toggle
    #[builder(default = "true")]
    use_cache: bool,
    /// Repetition suppression window
    #[builder(default = "10")]
    no_repeat_ngram_size: u32,
    /// Token ids that end generation
    #[builder(default)]
    terminators: BTreeSet<u32>,
    /// Capture per-step hidden states for the speech bridge
    #[builder(default)]
    capture_hidden_states: bool,
    /// Route audio through the whisper encoder
    #[builder(default)]
    use_whisper_encoder: bool,
    /// Image generation parameters (image tasks only)
    #[builder(default)]
    image_gen: Option<ImageGenParams>,
    /// Pixel window imposed on accompanying image payloads
    #[builder(default)]
    pixel_window: Option<PixelWindow>,
    /// Instruction text prepended to the first human text item
    #[builder(default)]
    system_prefix: Option<String>,
}

impl TaskConfig {
    /// Returns a builder for constructing a TaskConfig.
    pub fn builder() -> TaskConfigBuilder {
        TaskConfigBuilder::default()
    }

    /// Encoder adapter options implied by this configuration.
    pub fn processor_options(&self) -> ProcessorOptions {
        ProcessorOptions {
            use_whisper_encoder: self.use_whisper_encoder,
            pixel_window: self.pixel_window,
        }
    }
}
