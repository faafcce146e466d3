//! Placeholder/payload mismatch error.

/// Count mismatch between modality placeholders and collected payloads.
///
/// Always fatal: a mismatch means encoded embeddings would be spliced at the
/// wrong anchor points.
///
/// # Examples
///
/// ```
/// use chorus_error::PlaceholderMismatchError;
///
/// let err = PlaceholderMismatchError::new("normalizer", "image", 2, 1);
/// assert!(format!("{}", err).contains("2 placeholders"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Placeholder Mismatch Error: {} has {} placeholders but {} payloads (stage {}) at line {} in {}",
    modality,
    placeholders,
    payloads,
    stage,
    line,
    file
)]
pub struct PlaceholderMismatchError {
    /// Stage that detected the mismatch
    pub stage: &'static str,
    /// Modality name
    pub modality: String,
    /// Placeholders (or encoded segments) counted
    pub placeholders: usize,
    /// Payloads collected
    pub payloads: usize,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PlaceholderMismatchError {
    /// Create a new mismatch error with automatic location tracking.
    #[track_caller]
    pub fn new(
        stage: &'static str,
        modality: impl Into<String>,
        placeholders: usize,
        payloads: usize,
    ) -> Self {
        let location = std::panic::Location::caller();
        Self {
            stage,
            modality: modality.into(),
            placeholders,
            payloads,
            line: location.line(),
            file: location.file(),
        }
    }
}
