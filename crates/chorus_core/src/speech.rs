//! Speech continuation types: speaker profiles, bridge state and waveforms.

use candle_core::{Device, Tensor};
use chorus_error::{StorageError, StorageErrorKind};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, instrument};

/// One entry of a speaker profile.
#[derive(Debug, Clone, derive_more::From)]
pub enum SpeakerValue {
    /// Embedding or prompt tensor
    Tensor(Tensor),
    /// Numeric setting
    Scalar(f64),
    /// Free-form setting (prompt text, language, ...)
    Text(String),
}

/// Voice-characteristic bundle passed unmodified to the audio token
/// generator and the vocoder.
///
/// The pipeline never inspects the entries; validation belongs to the
/// collaborators that consume them.
///
/// # Examples
///
/// ```
/// use chorus_core::{SpeakerProfile, SpeakerValue};
///
/// let mut profile = SpeakerProfile::new("luna");
/// profile.insert("speed", 1.0);
/// assert!(matches!(profile.get("speed"), Some(SpeakerValue::Scalar(_))));
/// assert_eq!(profile.name(), "luna");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SpeakerProfile {
    name: String,
    entries: BTreeMap<String, SpeakerValue>,
}

impl SpeakerProfile {
    /// Creates an empty named profile.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Loads every tensor of a safetensors file into a profile named after
    /// the file stem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_safetensors(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StorageError::new(StorageErrorKind::NotFound(
                path.display().to_string(),
            )));
        }
        let tensors = candle_core::safetensors::load(path, &Device::Cpu)
            .map_err(|e| StorageError::new(StorageErrorKind::Decode(e.to_string())))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(entries = tensors.len(), speaker = %name, "Loaded speaker profile");
        Ok(Self {
            name,
            entries: tensors
                .into_iter()
                .map(|(key, tensor)| (key, SpeakerValue::Tensor(tensor)))
                .collect(),
        })
    }

    /// Profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SpeakerValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Looks up an entry.
    pub fn get(&self, key: &str) -> Option<&SpeakerValue> {
        self.entries.get(key)
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SpeakerValue)> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the profile has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the audio token generator needs to voice a reply.
///
/// `reply_embedding` of `None` selects plain text-to-speech, decoupled from
/// the conversation.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct SpeechContinuationState {
    /// Conditioning derived from the decoder's hidden states
    reply_embedding: Option<Tensor>,
    /// Reply text to voice
    decoded_text: String,
    /// Voice to use
    speaker_profile: SpeakerProfile,
}

impl SpeechContinuationState {
    /// State that conditions speech on the conversation.
    pub fn new(
        reply_embedding: Tensor,
        decoded_text: impl Into<String>,
        speaker_profile: SpeakerProfile,
    ) -> Self {
        Self {
            reply_embedding: Some(reply_embedding),
            decoded_text: decoded_text.into(),
            speaker_profile,
        }
    }

    /// State with the reply embedding withheld.
    pub fn text_only(decoded_text: impl Into<String>, speaker_profile: SpeakerProfile) -> Self {
        Self {
            reply_embedding: None,
            decoded_text: decoded_text.into(),
            speaker_profile,
        }
    }

    /// Whether the conversational context was withheld.
    pub fn is_text_only(&self) -> bool {
        self.reply_embedding.is_none()
    }
}

/// Mono waveform samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct Waveform {
    /// Sample values
    samples: Vec<f32>,
    /// Samples per second
    sample_rate: u32,
}

impl Waveform {
    /// Wraps samples at the given rate.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Writes 16-bit PCM WAV, clamping out-of-range samples.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), samples = self.samples.len()))]
    pub fn write_wav(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::new(StorageErrorKind::Io(e.to_string())))?;
        }
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let encode_err = |e: hound::Error| StorageError::new(StorageErrorKind::Encode(e.to_string()));
        let mut writer = hound::WavWriter::create(path, spec).map_err(encode_err)?;
        for sample in &self.samples {
            let clamped = if sample.is_finite() {
                sample.clamp(-1.0, 1.0)
            } else {
                0.0
            };
            writer
                .write_sample((clamped * i16::MAX as f32) as i16)
                .map_err(encode_err)?;
        }
        writer.finalize().map_err(encode_err)?;
        debug!(duration_secs = self.duration_secs(), "Wrote waveform");
        Ok(())
    }
}
