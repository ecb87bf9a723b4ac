//! Procedure verification: the task tree, its declarative task list and
//! the orchestrator wiring pours to leaves.

mod config;
mod orchestrator;
mod tree;

pub use config::{
    build_procedure, load_task_list, parse_task_list, PourTask, ProcedurePlan, TaskConfigError,
    TaskListEntry, TaskLogic, TaskType, ROOT_TASK_NAME,
};
pub use orchestrator::{
    Presentation, ProcedureOutcome, TaskOrchestrator, DEFAULT_RESET_DELAY_SECONDS,
};
pub use tree::{Task, TaskError, TaskEvent, TaskId, TaskStatus, TaskTree};

#[cfg(test)]
pub(crate) use orchestrator::test_presentation;
