//! Error types for redline
//!
//! Every failure is fatal to a run; the variants carry enough context for the
//! binary to tell the user which stage or pass broke.

use std::path::PathBuf;

use thiserror::Error;

use crate::stage::StageError;

/// All error types that can occur while running the pipeline
#[derive(Debug, Error)]
pub enum RedlineError {
    /// One or more prompt files are absent; lists every missing pass id
    #[error("Missing prompt files for passes: {}", .0.join(", "))]
    PrerequisiteMissing(Vec<String>),

    /// The input document does not exist
    #[error("Input file not found: {}", .0.display())]
    InputMissing(PathBuf),

    /// A prompt could not be read when its pass came up
    #[error("Failed to load prompt for '{pass}' from {}: {source}", .path.display())]
    PromptLoad {
        pass: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transformation stage reported an error for a pass
    #[error("Step {step} ({pass}) failed: {source}")]
    Transformation {
        step: usize,
        pass: String,
        #[source]
        source: StageError,
    },

    /// The caller asked the run to stop
    #[error("Run cancelled before step {step}")]
    Cancelled { step: usize },

    /// The pass list is empty, has duplicates or unusable ids
    #[error("Invalid pass registry: {0}")]
    InvalidRegistry(String),

    /// Snapshot/output persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RedlineError {
    /// True when the failure comes from a file that does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::InputMissing(_) | Self::PrerequisiteMissing(_) => true,
            Self::PromptLoad { source, .. } | Self::Io(source) => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type alias for redline operations
pub type Result<T> = std::result::Result<T, RedlineError>;
