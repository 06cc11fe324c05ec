//! Transformation Stage - the seam where editing backends plug in
//!
//! This module provides:
//! - TransformationStage trait for backend abstraction
//! - PlaceholderStage, which annotates instead of editing
//! - CommandStage, which pipes the document through an external program

mod command;
mod placeholder;

pub use command::{CommandStage, PROMPT_ENV, PROMPT_PLACEHOLDER};
pub use placeholder::{DEFAULT_ANNOTATION, PlaceholderStage};

/// Applies one pass's instructions to a document.
///
/// Calls are blocking from the runner's point of view. The document is moved
/// in and a complete replacement is handed back; diffs are not supported.
pub trait TransformationStage: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Produce the revised document for one pass
    fn apply(&self, prompt: &str, document: String) -> Result<String, StageError>;
}

impl<T: TransformationStage + ?Sized> TransformationStage for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn apply(&self, prompt: &str, document: String) -> Result<String, StageError> {
        (**self).apply(prompt, document)
    }
}

/// Errors a stage can report
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Command {program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Backend returned an empty document")]
    EmptyOutput,

    #[error("Backend output is not valid UTF-8: {0}")]
    InvalidOutput(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
