//! Prompt System - per-pass instruction files
//!
//! This module loads the instruction text that drives each editing pass.

mod loader;

pub use loader::PromptLoader;
