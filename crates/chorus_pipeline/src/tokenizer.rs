//! Hugging Face tokenizer adapter.

use chorus_error::{BackendError, ChorusResult, Stage};
use chorus_interface::Tokenizer;
use std::path::Path;
use tracing::{debug, instrument};

/// [`Tokenizer`] backed by a `tokenizer.json` file.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
}

impl HfTokenizer {
    /// Load from a `tokenizer.json` file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> ChorusResult<Self> {
        let inner = tokenizers::Tokenizer::from_file(path.as_ref()).map_err(|e| {
            BackendError::new(
                Stage::Tokenizer,
                format!("Failed to load {}: {}", path.as_ref().display(), e),
            )
        })?;
        debug!(vocab_size = inner.get_vocab_size(true), "Tokenizer loaded");
        Ok(Self { inner })
    }

    /// Wrap an already constructed tokenizer.
    pub fn new(inner: tokenizers::Tokenizer) -> Self {
        Self { inner }
    }
}

impl Tokenizer for HfTokenizer {
    fn decode(&self, token_ids: &[u32], skip_special_tokens: bool) -> ChorusResult<String> {
        self.inner
            .decode(token_ids, skip_special_tokens)
            .map_err(|e| BackendError::new(Stage::Tokenizer, e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_error::ChorusErrorKind;

    #[test]
    fn test_missing_file_is_tokenizer_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = HfTokenizer::from_file(dir.path().join("tokenizer.json"));
        match result {
            Err(e) => match e.kind() {
                ChorusErrorKind::Backend(b) => assert_eq!(b.stage, Stage::Tokenizer),
                other => panic!("unexpected error {}", other),
            },
            Ok(_) => panic!("loaded a tokenizer from a missing file"),
        }
    }

    #[test]
    fn test_garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(HfTokenizer::from_file(&path).is_err());
    }
}
