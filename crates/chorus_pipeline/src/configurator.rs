//! Task-specific generation configuration.

use chorus_core::{ImageGenParams, PixelWindow, Task, TaskConfig, TaskOverrides};
use chorus_error::{ChorusResult, TaskConfigError, TaskConfigErrorKind};
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};

use crate::{GenerationSettings, ImageGenSettings, SpecialTokens};

/// Builds a [`TaskConfig`] from a task selector and caller overrides.
#[derive(Debug, Clone)]
pub struct TaskConfigurator {
    generation: GenerationSettings,
    tokens: SpecialTokens,
    image_gen: ImageGenSettings,
}

impl TaskConfigurator {
    /// Create a configurator from the pipeline's settings.
    pub fn new(
        generation: GenerationSettings,
        tokens: SpecialTokens,
        image_gen: ImageGenSettings,
    ) -> Self {
        Self {
            generation,
            tokens,
            image_gen,
        }
    }

    /// Produce the configuration for `task`.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleParams` when the overrides conflict with the
    /// task (an `image_gen` override on a non-image task, in particular)
    /// and `InvalidImageGeometry` for unusable image parameters.
    #[instrument(skip_all, fields(task = %task))]
    pub fn configure(&self, task: Task, overrides: &TaskOverrides) -> ChorusResult<TaskConfig> {
        if overrides.image_gen.is_some() && !task.produces_image() {
            let reason = match task {
                Task::Asr => "image_gen cannot be combined with the whisper encoder path",
                Task::SpeechQa => "image_gen cannot be combined with hidden-state capture",
                _ => "image_gen is only valid for text_to_image and image_edit",
            };
            warn!(reason, "Rejecting task overrides");
            return Err(incompatible(task, reason).into());
        }

        let text_terminators: BTreeSet<u32> = [*self.tokens.eos(), *self.tokens.role_end()]
            .into_iter()
            .collect();

        let mut builder = TaskConfig::builder();
        builder
            .task(task)
            .max_new_tokens(
                overrides
                    .max_new_tokens
                    .unwrap_or(*self.generation.max_new_tokens()),
            )
            .use_cache(overrides.use_cache.unwrap_or(*self.generation.use_cache()))
            .no_repeat_ngram_size(
                overrides
                    .no_repeat_ngram_size
                    .unwrap_or(*self.generation.no_repeat_ngram_size()),
            )
            .terminators(text_terminators)
            .system_prefix(overrides.system_prefix.clone());

        match task {
            Task::PlainText | Task::VisionQa => {}
            Task::ChainOfThought => {
                let prefix = overrides
                    .system_prefix
                    .clone()
                    .unwrap_or_else(|| self.generation.chain_of_thought_prefix().clone());
                builder.system_prefix(Some(prefix));
            }
            Task::Asr => {
                builder
                    .use_whisper_encoder(true)
                    .terminators(self.tokens.asr_terminators().iter().copied().collect::<BTreeSet<_>>());
            }
            Task::SpeechQa => {
                builder.capture_hidden_states(true).use_whisper_encoder(false);
            }
            Task::TextToImage | Task::ImageEdit => {
                let params = overrides
                    .image_gen
                    .unwrap_or(*self.image_gen.defaults());
                check_geometry(task, &params)?;
                builder
                    .image_gen(Some(params))
                    .pixel_window(Some(PixelWindow::fixed(*self.image_gen.target_pixels())));
            }
        }

        let config = builder.build().map_err(|e| incompatible(task, &e.to_string()))?;
        ensure_compatible(&config)?;
        debug!(
            max_new_tokens = config.max_new_tokens(),
            capture_hidden_states = config.capture_hidden_states(),
            use_whisper_encoder = config.use_whisper_encoder(),
            image_gen = config.image_gen().is_some(),
            "Task configured"
        );
        Ok(config)
    }
}

/// Reject configurations that mix the image path with the audio or speech
/// paths.
#[track_caller]
pub fn ensure_compatible(config: &TaskConfig) -> Result<(), TaskConfigError> {
    if config.image_gen().is_some() {
        if *config.use_whisper_encoder() {
            return Err(incompatible(
                *config.task(),
                "image_gen cannot be combined with the whisper encoder path",
            ));
        }
        if *config.capture_hidden_states() {
            return Err(incompatible(
                *config.task(),
                "image_gen cannot be combined with hidden-state capture",
            ));
        }
    }
    Ok(())
}

#[track_caller]
fn incompatible(task: Task, reason: &str) -> TaskConfigError {
    TaskConfigError::new(TaskConfigErrorKind::IncompatibleParams {
        task: task.to_string(),
        reason: reason.to_string(),
    })
}

fn check_geometry(task: Task, params: &ImageGenParams) -> Result<(), TaskConfigError> {
    let reason = if *params.width() == 0 || *params.height() == 0 {
        Some(format!("{}x{} has a zero side", params.width(), params.height()))
    } else if params.width() % 16 != 0 || params.height() % 16 != 0 {
        Some(format!(
            "{}x{} is not a multiple of 16",
            params.width(),
            params.height()
        ))
    } else if *params.steps() == 0 {
        Some("steps must be positive".to_string())
    } else if !params.cfg_scale().is_finite() || *params.cfg_scale() <= 0.0 {
        Some(format!("cfg_scale {} must be finite and positive", params.cfg_scale()))
    } else {
        None
    };
    match reason {
        Some(reason) => Err(TaskConfigError::new(
            TaskConfigErrorKind::InvalidImageGeometry {
                task: task.to_string(),
                reason,
            },
        )),
        None => Ok(()),
    }
}
