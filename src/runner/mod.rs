//! Pipeline runner module - the fail-fast pass sequence.
//!
//! This module provides the core run logic, including:
//! - PipelineRunner for executing every pass in registry order
//! - RunState / AbortReason describing where a run is or why it stopped
//! - CancelFlag for caller-initiated cancellation between passes

mod pipeline_runner;
mod state;

pub use pipeline_runner::PipelineRunner;
pub use state::{AbortReason, CancelFlag, RunEvent, RunState};
