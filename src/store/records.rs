//! Run record types persisted to the processing log.
//!
//! A `StepRecord` is appended once per completed pass; the `RunLog` wraps
//! them once the whole run has succeeded.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::registry::PassDefinition;

/// Record of one completed pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepRecord {
    /// 1-based position in the registry
    pub step: usize,

    /// Display name of the pass
    pub pass: String,

    /// Pass id (prompt file stem)
    pub pass_id: String,

    /// Snapshot written after this pass
    pub intermediate_file: PathBuf,

    /// Character count of the pass result
    pub text_length: usize,
}

impl StepRecord {
    pub fn new(step: usize, pass: &PassDefinition, intermediate_file: PathBuf, result: &str) -> Self {
        Self {
            step,
            pass: pass.name.clone(),
            pass_id: pass.id.clone(),
            intermediate_file,
            text_length: result.chars().count(),
        }
    }
}

/// Structured record of one successful run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunLog {
    pub timestamp: DateTime<Local>,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub processing_steps: Vec<StepRecord>,
    pub total_steps: usize,
    /// Hex SHA-256 of the final document body
    pub output_sha256: String,
}

impl RunLog {
    pub fn new(
        timestamp: DateTime<Local>,
        input_file: &Path,
        output_file: &Path,
        steps: Vec<StepRecord>,
        final_document: &str,
    ) -> Self {
        Self {
            timestamp,
            input_file: input_file.to_path_buf(),
            output_file: output_file.to_path_buf(),
            total_steps: steps.len(),
            processing_steps: steps,
            output_sha256: content_digest(final_document),
        }
    }
}

/// Hex SHA-256 of a document.
pub fn content_digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
