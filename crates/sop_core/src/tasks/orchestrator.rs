use tracing::{debug, info, warn};

use crate::domain::PourCompleted;

use super::config::{PourTask, ProcedurePlan};
use super::tree::{Task, TaskError, TaskId, TaskStatus, TaskTree};

pub const DEFAULT_RESET_DELAY_SECONDS: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureOutcome {
    Successful,
    Failure,
}

/// Everything the user sees of the procedure: checklist rows, the outcome
/// banner and the failure fire.
pub trait Presentation {
    fn task_status_changed(&mut self, task: &Task, status: TaskStatus);
    fn procedure_succeeded(&mut self);
    fn procedure_failed(&mut self);
    fn fire_started(&mut self) {}
    fn fire_extinguished(&mut self) {}
    fn procedure_reset(&mut self);
}

/// Turns finished pours into leaf completions and the root outcome into
/// presentation effects, then resets the procedure for another attempt.
#[derive(Debug)]
pub struct TaskOrchestrator {
    root: TaskId,
    pours: Vec<PourTask>,
    reset_delay_seconds: f32,
    outcome: Option<ProcedureOutcome>,
    reset_countdown: Option<f32>,
    fire_burning: bool,
    history: Vec<ProcedureOutcome>,
}

impl TaskOrchestrator {
    pub fn new(plan: ProcedurePlan, reset_delay_seconds: f32) -> Self {
        Self {
            root: plan.root,
            pours: plan.pours,
            reset_delay_seconds: reset_delay_seconds.max(0.0),
            outcome: None,
            reset_countdown: None,
            fire_burning: false,
            history: Vec::new(),
        }
    }

    pub fn root(&self) -> TaskId {
        self.root
    }

    pub fn pours(&self) -> &[PourTask] {
        &self.pours
    }

    pub fn outcome(&self) -> Option<ProcedureOutcome> {
        self.outcome
    }

    pub fn history(&self) -> &[ProcedureOutcome] {
        &self.history
    }

    pub fn fire_burning(&self) -> bool {
        self.fire_burning
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_countdown.is_some()
    }

    /// Resolves the leaf expecting this pour. Returns the status recorded,
    /// or `None` when the pour matched nothing still open.
    pub fn on_pour(
        &mut self,
        pour: &PourCompleted,
        tree: &mut TaskTree,
    ) -> Result<Option<TaskStatus>, TaskError> {
        if self.outcome.is_some() {
            debug!(from = pour.from.as_str(), to = pour.to.as_str(), "pour_after_outcome");
            return Ok(None);
        }
        let Some(task) = self
            .pours
            .iter()
            .find(|task| task.from == pour.from && task.to == pour.to)
            .map(|task| task.task)
        else {
            warn!(from = pour.from.as_str(), to = pour.to.as_str(), "pour_matches_no_task");
            return Ok(None);
        };
        if tree.status(task)?.is_resolved() {
            debug!(task = tree.task(task)?.name(), "pour_for_resolved_task");
            return Ok(None);
        }
        tree.succeed(task).map(Some)
    }

    /// Forwards queued tree events and reacts to the root resolving.
    pub fn publish(
        &mut self,
        tree: &mut TaskTree,
        presentation: &mut dyn Presentation,
    ) -> Result<(), TaskError> {
        for event in tree.drain_events() {
            presentation.task_status_changed(tree.task(event.task)?, event.status);
            if event.task != self.root {
                continue;
            }
            let outcome = match event.status {
                TaskStatus::Successful => ProcedureOutcome::Successful,
                TaskStatus::Failure => ProcedureOutcome::Failure,
                TaskStatus::Reset => continue,
            };
            self.outcome = Some(outcome);
            self.history.push(outcome);
            self.reset_countdown = Some(self.reset_delay_seconds);
            info!(?outcome, attempt = self.history.len(), "procedure_finished");
            match outcome {
                ProcedureOutcome::Successful => presentation.procedure_succeeded(),
                ProcedureOutcome::Failure => {
                    presentation.procedure_failed();
                    self.fire_burning = true;
                    presentation.fire_started();
                }
            }
        }
        Ok(())
    }

    /// Counts down toward the scheduled reset. Returns `true` on the tick
    /// the procedure was reset.
    pub fn tick(
        &mut self,
        dt_seconds: f32,
        tree: &mut TaskTree,
        presentation: &mut dyn Presentation,
    ) -> Result<bool, TaskError> {
        let Some(remaining) = self.reset_countdown.as_mut() else {
            return Ok(false);
        };
        *remaining -= dt_seconds;
        if *remaining > 0.0 {
            return Ok(false);
        }
        self.reset_procedure(tree, presentation)?;
        Ok(true)
    }

    /// Puts out the fire and resets right away. Returns `false` when
    /// nothing was burning.
    pub fn extinguish(
        &mut self,
        tree: &mut TaskTree,
        presentation: &mut dyn Presentation,
    ) -> Result<bool, TaskError> {
        if !self.fire_burning {
            return Ok(false);
        }
        self.fire_burning = false;
        info!("fire_extinguished");
        presentation.fire_extinguished();
        self.reset_procedure(tree, presentation)?;
        Ok(true)
    }

    pub fn reset_procedure(
        &mut self,
        tree: &mut TaskTree,
        presentation: &mut dyn Presentation,
    ) -> Result<(), TaskError> {
        tree.reset(self.root)?;
        self.outcome = None;
        self.reset_countdown = None;
        self.fire_burning = false;
        self.publish(tree, presentation)?;
        presentation.procedure_reset();
        info!(attempts = self.history.len(), "procedure_reset");
        Ok(())
    }
}
