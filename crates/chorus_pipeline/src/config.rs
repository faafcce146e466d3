//! Pipeline configuration loaded from TOML.

use candle_core::DType;
use chorus_core::{ImageGenParams, Modality, Role};
use chorus_error::{ChorusError, ChorusResult, ConfigError};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::IntoEnumIterator;

/// Complete pipeline configuration.
///
/// Every section has working defaults, so an empty file (or
/// `PipelineConfig::default()`) is a valid configuration.
///
/// # Examples
///
/// ```
/// use chorus_pipeline::PipelineConfig;
///
/// let config: PipelineConfig = toml::from_str(
///     r#"
///     [generation]
///     max_new_tokens = 256
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(*config.generation().max_new_tokens(), 256);
/// assert_eq!(*config.generation().no_repeat_ngram_size(), 10);
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder,
)]
#[serde(default)]
#[builder(default, setter(into))]
pub struct PipelineConfig {
    /// Decoding defaults
    generation: GenerationSettings,
    /// Prompt rendering
    template: ChatTemplate,
    /// Special token ids
    tokens: SpecialTokens,
    /// Image generation defaults
    image_gen: ImageGenSettings,
    /// Media tensor precision
    media: MediaSettings,
}

impl PipelineConfig {
    /// Load and validate configuration from a TOML file.
    #[tracing::instrument(skip(path))]
    pub fn from_file(path: impl AsRef<Path>) -> ChorusResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ChorusError::from(ConfigError::new(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            )))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> ChorusResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            ChorusError::from(ConfigError::new(format!("Failed to parse config: {}", e)))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a builder for constructing a PipelineConfig.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.template.validate()?;
        self.media.dtype()?;
        if self.tokens.image_patch > u32::MAX - 2 {
            return Err(ConfigError::new(
                "tokens.image_patch leaves no room for the query block open and close ids",
            ));
        }
        if self.image_gen.target_pixels == 0 {
            return Err(ConfigError::new("image_gen.target_pixels must be positive"));
        }
        if self.image_gen.scales.is_empty() || self.image_gen.scales.contains(&0) {
            return Err(ConfigError::new(
                "image_gen.scales must list at least one positive scale",
            ));
        }
        Ok(())
    }
}

/// Decoding defaults shared by text-producing tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct GenerationSettings {
    /// Generation budget
    max_new_tokens: u32,
    /// KV cache toggle
    use_cache: bool,
    /// Repetition suppression window
    no_repeat_ngram_size: u32,
    /// Directive prepended for chain-of-thought reasoning
    chain_of_thought_prefix: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            use_cache: true,
            no_repeat_ngram_size: 10,
            chain_of_thought_prefix: "Think through the problem step by step inside <think></think> \
                tags, then give the final answer."
                .to_string(),
        }
    }
}

/// Role markers and modality placeholders used to linearize a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct ChatTemplate {
    /// Opens a human turn
    human_marker: String,
    /// Opens an assistant turn; also appended as the generation prompt
    assistant_marker: String,
    /// Opens a system turn
    system_marker: String,
    /// Closes every turn
    turn_end: String,
    /// Stands in for one image payload
    image_placeholder: String,
    /// Stands in for one video payload
    video_placeholder: String,
    /// Stands in for one audio payload
    audio_placeholder: String,
}

impl Default for ChatTemplate {
    fn default() -> Self {
        Self {
            human_marker: "<role>HUMAN</role>".to_string(),
            assistant_marker: "<role>ASSISTANT</role>".to_string(),
            system_marker: "<role>SYSTEM</role>".to_string(),
            turn_end: "<|role_end|>".to_string(),
            image_placeholder: "<IMAGE>".to_string(),
            video_placeholder: "<VIDEO>".to_string(),
            audio_placeholder: "<AUDIO>".to_string(),
        }
    }
}

impl ChatTemplate {
    /// Marker opening a turn by `role`.
    pub fn role_marker(&self, role: Role) -> &str {
        match role {
            Role::Human => &self.human_marker,
            Role::Assistant => &self.assistant_marker,
            Role::System => &self.system_marker,
        }
    }

    /// Placeholder anchoring one payload of `modality`.
    pub fn placeholder(&self, modality: Modality) -> &str {
        match modality {
            Modality::Image => &self.image_placeholder,
            Modality::Video => &self.video_placeholder,
            Modality::Audio => &self.audio_placeholder,
        }
    }

    /// Every template string that must never reach user-visible text.
    pub fn control_markers(&self) -> Vec<&str> {
        let mut markers = vec![
            self.human_marker.as_str(),
            self.assistant_marker.as_str(),
            self.system_marker.as_str(),
            self.turn_end.as_str(),
        ];
        markers.extend(Modality::iter().map(|m| self.placeholder(m)));
        markers
    }

    /// Placeholders must be non-empty and must not contain one another or
    /// any role marker, otherwise placeholder counting is ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let markers = self.control_markers();
        if let Some(empty) = markers.iter().position(|m| m.is_empty()) {
            return Err(ConfigError::new(format!(
                "template marker #{} is empty",
                empty
            )));
        }
        for modality in Modality::iter() {
            let placeholder = self.placeholder(modality);
            for other in &markers {
                if *other != placeholder && other.contains(placeholder) {
                    return Err(ConfigError::new(format!(
                        "{} placeholder '{}' occurs inside marker '{}'",
                        modality, placeholder, other
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Special token ids of the decoder's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct SpecialTokens {
    /// End of sequence
    eos: u32,
    /// End of a chat turn
    role_end: u32,
    /// Terminators for transcription
    asr_terminators: Vec<u32>,
    /// Image patch placeholder id; `+1`/`+2` open and close a query block
    image_patch: u32,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            eos: 156892,
            role_end: 156895,
            asr_terminators: vec![156892],
            image_patch: 157157,
        }
    }
}

/// Image generation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct ImageGenSettings {
    /// Parameters used when the caller supplies none
    defaults: ImageGenParams,
    /// Pixel count every accompanying image is resized to
    target_pixels: u32,
    /// Side lengths of the learnable query grids appended to the prompt
    scales: Vec<u32>,
}

impl Default for ImageGenSettings {
    fn default() -> Self {
        Self {
            defaults: ImageGenParams::default(),
            target_pixels: 451_584,
            scales: vec![4, 8, 16],
        }
    }
}

/// Precision of media tensors handed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// `bf16`, `f16` or `f32`
    pub dtype: String,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            dtype: "bf16".to_string(),
        }
    }
}

impl MediaSettings {
    /// The configured dtype.
    pub fn dtype(&self) -> Result<DType, ConfigError> {
        match self.dtype.as_str() {
            "bf16" => Ok(DType::BF16),
            "f16" => Ok(DType::F16),
            "f32" => Ok(DType::F32),
            other => Err(ConfigError::new(format!(
                "Unsupported media dtype '{}'",
                other
            ))),
        }
    }
}
