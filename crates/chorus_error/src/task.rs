//! Task configuration error types.

/// Specific error conditions raised while building a task configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskConfigErrorKind {
    /// Requested parameters cannot be combined for this task
    IncompatibleParams {
        /// Task name
        task: String,
        /// Which parameters clash
        reason: String,
    },
    /// Task selector did not name a known task
    UnknownTask(String),
    /// Image generation geometry is unusable
    InvalidImageGeometry {
        /// Task name
        task: String,
        /// What is wrong with the geometry
        reason: String,
    },
}

impl std::fmt::Display for TaskConfigErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskConfigErrorKind::IncompatibleParams { task, reason } => {
                write!(f, "Incompatible parameters for task '{}': {}", task, reason)
            }
            TaskConfigErrorKind::UnknownTask(name) => write!(f, "Unknown task '{}'", name),
            TaskConfigErrorKind::InvalidImageGeometry { task, reason } => {
                write!(f, "Invalid image geometry for task '{}': {}", task, reason)
            }
        }
    }
}

/// Task configuration error with location tracking.
///
/// Raised before any expensive work begins.
///
/// # Examples
///
/// ```
/// use chorus_error::{TaskConfigError, TaskConfigErrorKind};
///
/// let err = TaskConfigError::new(TaskConfigErrorKind::UnknownTask("dance".into()));
/// assert!(format!("{}", err).contains("dance"));
/// ```
#[derive(Debug, Clone)]
pub struct TaskConfigError {
    /// The specific error condition
    pub kind: TaskConfigErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl TaskConfigError {
    /// Create a new TaskConfigError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TaskConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for TaskConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Task Config Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for TaskConfigError {}
