//! Pipeline runner - threads one document through every pass in order.
//!
//! The runner validates prompts, loads the input, then for each pass loads the
//! prompt, calls the stage, saves a snapshot and records the step. Any error
//! aborts the run on the spot: snapshots already written stay on disk, but no
//! final output or run log is produced.

use log::{info, warn};

use super::state::{AbortReason, CancelFlag, RunEvent, RunState};
use crate::error::{RedlineError, Result};
use crate::prompt::PromptLoader;
use crate::registry::PassRegistry;
use crate::stage::TransformationStage;
use crate::store::{DocumentStore, RunLog, StepRecord};

type EventHandler = Box<dyn Fn(&RunEvent) + Send>;

/// Runs a document through the pass registry with a given stage.
pub struct PipelineRunner<S>
where
    S: TransformationStage,
{
    registry: PassRegistry,
    prompts: PromptLoader,
    store: DocumentStore,
    stage: S,
    cancel: CancelFlag,
    on_event: Option<EventHandler>,
    state: RunState,
    steps: Vec<StepRecord>,
}

impl<S> PipelineRunner<S>
where
    S: TransformationStage,
{
    /// Create a new runner; all collaborators are supplied by the caller.
    pub fn new(registry: PassRegistry, prompts: PromptLoader, store: DocumentStore, stage: S) -> Self {
        Self {
            registry,
            prompts,
            store,
            stage,
            cancel: CancelFlag::new(),
            on_event: None,
            state: RunState::NotStarted,
            steps: Vec::new(),
        }
    }

    /// Use a caller-owned cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Receive progress events as the run advances.
    pub fn on_event(mut self, handler: impl Fn(&RunEvent) + Send + 'static) -> Self {
        self.on_event = Some(Box::new(handler));
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Steps completed so far; after a failure in step k this holds k-1 records.
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn registry(&self) -> &PassRegistry {
        &self.registry
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run every pass and persist the results.
    pub fn run(&mut self) -> Result<RunLog> {
        self.steps.clear();
        info!(
            "Starting run: {} passes, stage '{}'",
            self.registry.len(),
            self.stage.name()
        );

        match self.execute() {
            Ok(log) => {
                self.state = RunState::Completed;
                info!("Run completed after {} steps", log.total_steps);
                Ok(log)
            }
            Err(e) => {
                let reason = self.abort_reason(&e);
                warn!("Run aborted ({}): {}", reason, e);
                self.state = RunState::Aborted(reason);
                Err(e)
            }
        }
    }

    fn execute(&mut self) -> Result<RunLog> {
        self.state = RunState::Validating;
        let prompts = &self.prompts;
        self.registry.validate(|id| prompts.exists(id))?;

        self.state = RunState::Loading;
        let mut document = self.store.load_initial_document()?;
        let chars = document.chars().count();
        info!("Loaded input ({} chars)", chars);
        self.emit(RunEvent::InputLoaded { chars });

        let total = self.registry.len();
        for (index, pass) in self.registry.iter().enumerate() {
            let step = index + 1;
            self.state = RunState::Running(step);

            if self.cancel.is_cancelled() {
                return Err(RedlineError::Cancelled { step });
            }

            info!("Step {}/{}: {}", step, total, pass);
            self.emit(RunEvent::StepStarted {
                step,
                total,
                pass: pass.name.clone(),
            });

            let prompt = self.prompts.load(&pass.id)?;
            self.emit(RunEvent::PromptLoaded {
                step,
                chars: prompt.chars().count(),
            });

            document = self
                .stage
                .apply(&prompt, document)
                .map_err(|source| RedlineError::Transformation {
                    step,
                    pass: pass.name.clone(),
                    source,
                })?;

            let snapshot = self.store.save_intermediate(step, &pass.name, &document)?;
            let record = StepRecord::new(step, pass, snapshot, &document);
            self.emit(RunEvent::StepCompleted(record.clone()));
            self.steps.push(record);
        }

        self.state = RunState::Finalizing;
        let paths = self.store.paths();
        let log = RunLog::new(
            self.store.clock().now(),
            &paths.input,
            &paths.output,
            self.steps.clone(),
            &document,
        );
        self.store.commit_final(&document, &log)?;
        Ok(log)
    }

    fn emit(&self, event: RunEvent) {
        if let Some(handler) = &self.on_event {
            handler(&event);
        }
    }

    fn abort_reason(&self, error: &RedlineError) -> AbortReason {
        match (self.state, error) {
            (_, RedlineError::Cancelled { step }) => AbortReason::Cancelled { step: *step },
            (RunState::Validating, _) => AbortReason::MissingPrerequisites,
            (RunState::Loading, _) => AbortReason::NoInput,
            (RunState::Running(step), _) => AbortReason::StepFailure { step },
            _ => AbortReason::FinalizeFailure,
        }
    }
}
