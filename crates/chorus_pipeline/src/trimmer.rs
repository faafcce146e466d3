//! Prompt removal and detokenization of generated sequences.

use chorus_error::{ChorusResult, GenerationError, GenerationErrorKind};
use chorus_interface::Tokenizer;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::ChatTemplate;

/// Strip the first `prompt_len` tokens of `sequence`.
///
/// A sequence exactly as long as its prompt yields an empty continuation.
///
/// # Examples
///
/// ```
/// use chorus_pipeline::trim_prompt;
///
/// assert_eq!(trim_prompt(&[1, 2, 3, 9, 9], 3, 0).unwrap(), &[9, 9]);
/// assert!(trim_prompt(&[1, 2, 3], 3, 0).unwrap().is_empty());
/// assert!(trim_prompt(&[1, 2], 3, 0).is_err());
/// ```
#[track_caller]
pub fn trim_prompt(
    sequence: &[u32],
    prompt_len: usize,
    batch_index: usize,
) -> Result<&[u32], GenerationError> {
    sequence.get(prompt_len..).ok_or_else(|| {
        GenerationError::new(GenerationErrorKind::PromptExceedsSequence {
            batch_index,
            prompt_len,
            sequence_len: sequence.len(),
        })
    })
}

/// Turns generated sequences into user-visible text.
pub struct OutputTrimmer {
    tokenizer: Arc<dyn Tokenizer>,
    control_markers: Vec<String>,
}

impl std::fmt::Debug for OutputTrimmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputTrimmer")
            .field("control_markers", &self.control_markers)
            .finish_non_exhaustive()
    }
}

impl OutputTrimmer {
    /// Create a trimmer that scrubs the template's markers from decoded text.
    pub fn new(tokenizer: Arc<dyn Tokenizer>, template: &ChatTemplate) -> Self {
        Self {
            tokenizer,
            control_markers: template
                .control_markers()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Decode one continuation per batch element.
    ///
    /// `prompt_lengths[i]` tokens are removed from the front of
    /// `token_ids[i]`; the rest is detokenized with special tokens skipped
    /// and any role or placeholder marker text removed.
    #[instrument(skip_all, fields(batch = token_ids.len()))]
    pub fn decode_batch(
        &self,
        token_ids: &[Vec<u32>],
        prompt_lengths: &[usize],
    ) -> ChorusResult<Vec<String>> {
        if token_ids.len() != prompt_lengths.len() {
            return Err(GenerationError::new(GenerationErrorKind::BatchMismatch {
                expected: prompt_lengths.len(),
                returned: token_ids.len(),
            })
            .into());
        }

        let mut texts = Vec::with_capacity(token_ids.len());
        for (batch_index, (sequence, prompt_len)) in token_ids.iter().zip(prompt_lengths).enumerate() {
            let continuation = trim_prompt(sequence, *prompt_len, batch_index)?;
            let raw = self.tokenizer.decode(continuation, true)?;
            let text = self.scrub(&raw);
            debug!(batch_index, new_tokens = continuation.len(), chars = text.len(), "Decoded continuation");
            texts.push(text);
        }
        Ok(texts)
    }

    /// Removal can splice a new marker together, so passes repeat until
    /// none matches.
    fn scrub(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        loop {
            let before = cleaned.len();
            for marker in &self.control_markers {
                if cleaned.contains(marker.as_str()) {
                    cleaned = cleaned.replace(marker.as_str(), "");
                }
            }
            if cleaned.len() == before {
                break;
            }
        }
        cleaned.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTokenizer;

    impl Tokenizer for EchoTokenizer {
        fn decode(&self, token_ids: &[u32], _skip_special_tokens: bool) -> ChorusResult<String> {
            Ok(token_ids
                .iter()
                .map(|id| match id {
                    0 => "<|role_end|>".to_string(),
                    1 => "<role>HUMAN</role>".to_string(),
                    2 => "Hi <role>HU<IMAGE>MAN</role> there".to_string(),
                    3 => "<role>HU<VI<AUDIO>DEO>MAN</role>".to_string(),
                    other => format!("w{} ", other),
                })
                .collect())
        }
    }

    fn trimmer() -> OutputTrimmer {
        OutputTrimmer::new(Arc::new(EchoTokenizer), &ChatTemplate::default())
    }

    #[test]
    fn test_ragged_batch_trims_each_prompt() {
        let texts = trimmer()
            .decode_batch(&[vec![5, 5, 5, 7, 8], vec![5, 9]], &[3, 1])
            .unwrap();
        assert_eq!(texts, vec!["w7 w8".to_string(), "w9".to_string()]);
    }

    #[test]
    fn test_markers_never_reach_output() {
        let texts = trimmer().decode_batch(&[vec![5, 7, 0, 1]], &[1]).unwrap();
        assert_eq!(texts, vec!["w7".to_string()]);
    }

    #[test]
    fn test_marker_spliced_by_placeholder_removal_is_scrubbed() {
        let texts = trimmer().decode_batch(&[vec![5, 2]], &[1]).unwrap();
        assert_eq!(texts, vec!["Hi  there".to_string()]);
        assert!(!texts[0].contains("<role>HUMAN</role>"));
    }

    #[test]
    fn test_nested_splices_are_scrubbed() {
        let texts = trimmer().decode_batch(&[vec![5, 3]], &[1]).unwrap();
        assert_eq!(texts, vec![String::new()]);
    }

    #[test]
    fn test_prompt_length_equal_to_sequence_is_empty() {
        let texts = trimmer().decode_batch(&[vec![5, 6]], &[2]).unwrap();
        assert_eq!(texts, vec![String::new()]);
    }

    #[test]
    fn test_prompt_longer_than_sequence_names_batch_index() {
        let err = trim_prompt(&[1], 4, 3).unwrap_err();
        assert_eq!(
            err.kind,
            GenerationErrorKind::PromptExceedsSequence {
                batch_index: 3,
                prompt_len: 4,
                sequence_len: 1
            }
        );
    }
}
