//! Prompt Loader - Load pass instructions from the agents directory
//!
//! Each pass id maps to `<agents_dir>/<id>.md`. Content is trimmed and handed
//! out as an owned string; nothing is cached so a prompt that disappears
//! mid-run is reported when its pass comes up.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{RedlineError, Result};

/// Loads prompt files from a directory
#[derive(Debug, Clone)]
pub struct PromptLoader {
    /// Directory containing one `<id>.md` per pass
    agents_dir: PathBuf,
}

impl PromptLoader {
    /// Create a new PromptLoader for the given agents directory
    pub fn new(agents_dir: impl AsRef<Path>) -> Self {
        Self {
            agents_dir: agents_dir.as_ref().to_path_buf(),
        }
    }

    /// Load and trim the prompt for a pass
    ///
    /// # Arguments
    /// * `id` - The pass id (without .md extension)
    ///
    /// # Returns
    /// The trimmed prompt text
    pub fn load(&self, id: &str) -> Result<String> {
        let path = self.prompt_path(id);
        let content = std::fs::read_to_string(&path).map_err(|source| RedlineError::PromptLoad {
            pass: id.to_string(),
            path: path.clone(),
            source,
        })?;

        let prompt = content.trim().to_string();
        debug!("Loaded prompt '{}' ({} chars) from {}", id, prompt.len(), path.display());
        Ok(prompt)
    }

    /// Check if the prompt file for a pass exists
    pub fn exists(&self, id: &str) -> bool {
        self.prompt_path(id).is_file()
    }

    /// Get the full path for a prompt by pass id
    pub fn prompt_path(&self, id: &str) -> PathBuf {
        self.agents_dir.join(format!("{}.md", id))
    }

    /// List all prompt files in the directory, sorted by stem
    pub fn list_available(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.agents_dir).map_err(|e| {
            RedlineError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read agents directory {:?}: {}", self.agents_dir, e),
            ))
        })?;

        let mut prompts = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md")
                && let Some(stem) = path.file_stem()
                && let Some(name) = stem.to_str()
            {
                prompts.push(name.to_string());
            }
        }

        prompts.sort();
        Ok(prompts)
    }

    /// Get the agents directory path
    pub fn agents_dir(&self) -> &Path {
        &self.agents_dir
    }
}
