//! redline - a linear text-revision pipeline
//!
//! A markdown document is threaded through an ordered list of editing passes.
//! Each pass pairs a prompt file with a pluggable transformation stage; the
//! result of every pass is snapshotted and the run ends with a final document
//! and a JSON run log.

pub mod error;
pub mod prompt;
pub mod registry;
pub mod runner;
pub mod stage;
pub mod store;

pub use error::{RedlineError, Result};
