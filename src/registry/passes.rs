//! Pass definitions and the ordered registry.
//!
//! Each pass focuses on a single editing dimension. Order matters: the output
//! of pass N is the input of pass N+1.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RedlineError, Result};

/// One editing pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassDefinition {
    /// Stable identifier, also the prompt file stem.
    pub id: String,
    /// Human-readable name used in headers and snapshot file names.
    pub name: String,
}

impl PassDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// The standard passes, in pipeline order.
const STANDARD_PASSES: &[(&str, &str)] = &[
    ("basic-typo-reviewer", "Basic Typo Reviewer"),
    ("uk-english-standardiser", "UK English Standardiser"),
    ("flow-and-polish", "Flow and Polish"),
    ("headings", "Headings"),
    ("proofreader", "Proofreader"),
    ("add-sources", "Add Sources"),
    ("seo-reviewer", "SEO Reviewer"),
];

/// Get the standard pass list.
pub fn standard_passes() -> Vec<PassDefinition> {
    STANDARD_PASSES
        .iter()
        .map(|(id, name)| PassDefinition::new(*id, *name))
        .collect()
}

/// Check that an id can be used as a file stem.
pub fn is_filename_safe(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Ordered, validated sequence of passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassRegistry {
    passes: Vec<PassDefinition>,
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self {
            passes: standard_passes(),
        }
    }
}

impl PassRegistry {
    /// Build a registry, rejecting empty lists, unsafe ids and duplicates.
    pub fn new(passes: Vec<PassDefinition>) -> Result<Self> {
        if passes.is_empty() {
            return Err(RedlineError::InvalidRegistry("no passes defined".to_string()));
        }

        let mut seen = HashSet::new();
        for pass in &passes {
            if !is_filename_safe(&pass.id) {
                return Err(RedlineError::InvalidRegistry(format!(
                    "pass id '{}' is not filename-safe",
                    pass.id
                )));
            }
            if !seen.insert(pass.id.as_str()) {
                return Err(RedlineError::InvalidRegistry(format!("duplicate pass id '{}'", pass.id)));
            }
        }

        Ok(Self { passes })
    }

    pub fn passes(&self) -> &[PassDefinition] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PassDefinition> {
        self.passes.iter()
    }

    /// Find a pass by id.
    pub fn get(&self, id: &str) -> Option<&PassDefinition> {
        self.passes.iter().find(|p| p.id == id)
    }

    /// Every id the resolver cannot find, in registry order.
    pub fn missing<F>(&self, resolves: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        self.passes
            .iter()
            .filter(|p| !resolves(&p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    /// Fail with the complete list of unresolvable ids.
    pub fn validate<F>(&self, resolves: F) -> Result<()>
    where
        F: Fn(&str) -> bool,
    {
        let missing = self.missing(resolves);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RedlineError::PrerequisiteMissing(missing))
        }
    }
}
