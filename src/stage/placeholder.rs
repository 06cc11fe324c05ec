//! Stage that leaves the text alone and appends a marker.

use super::{StageError, TransformationStage};

/// Marker appended by the placeholder stage
pub const DEFAULT_ANNOTATION: &str = "*[Note: This text would be processed by the agent in a real implementation]*";

/// Identity transform plus an annotation; never fails.
#[derive(Debug, Clone)]
pub struct PlaceholderStage {
    annotation: String,
}

impl Default for PlaceholderStage {
    fn default() -> Self {
        Self::new(DEFAULT_ANNOTATION)
    }
}

impl PlaceholderStage {
    pub fn new(annotation: impl Into<String>) -> Self {
        Self {
            annotation: annotation.into(),
        }
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }
}

impl TransformationStage for PlaceholderStage {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn apply(&self, _prompt: &str, mut document: String) -> Result<String, StageError> {
        document.push_str("\n\n");
        document.push_str(&self.annotation);
        Ok(document)
    }
}
