//! Runner states and progress events.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::store::StepRecord;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// Checking every pass has a prompt file
    Validating,
    /// Reading the input document
    Loading,
    /// Executing the 1-based step
    Running(usize),
    /// Writing final output and run log
    Finalizing,
    Completed,
    Aborted(AbortReason),
}

impl RunState {
    /// Completed and Aborted are final
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted(_))
    }
}

/// Why a run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    MissingPrerequisites,
    NoInput,
    StepFailure { step: usize },
    Cancelled { step: usize },
    /// Final output or run log could not be written
    FinalizeFailure,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrerequisites => write!(f, "missing prompt files"),
            Self::NoInput => write!(f, "no input document"),
            Self::StepFailure { step } => write!(f, "step {} failed", step),
            Self::Cancelled { step } => write!(f, "cancelled before step {}", step),
            Self::FinalizeFailure => write!(f, "could not write final output"),
        }
    }
}

/// Progress notifications emitted during a run.
#[derive(Debug, Clone)]
pub enum RunEvent {
    InputLoaded { chars: usize },
    StepStarted { step: usize, total: usize, pass: String },
    PromptLoaded { step: usize, chars: usize },
    StepCompleted(StepRecord),
}

/// Shared flag a caller sets to stop a run before its next stage call.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
