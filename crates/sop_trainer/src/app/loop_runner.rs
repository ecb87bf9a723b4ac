use std::process::ExitCode;

use sop_core::{
    load_task_list, run_session, Session, SessionError, SessionReport, TaskConfigError,
};
use thiserror::Error;
use tracing::{debug, error, info};

use super::bootstrap::AppWiring;
use super::gameplay::{load_script, spawn_scenario, LogPresentation, ScriptError, SimWorld};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load task list: {0}")]
    TaskList(#[from] TaskConfigError),
    #[error("failed to load input script: {0}")]
    Script(#[from] ScriptError),
    #[error("session aborted: {0}")]
    Session(#[from] SessionError),
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_trainer(app) {
        Ok(report) => {
            info!(
                ticks = report.ticks_run,
                outcomes = ?report.outcomes,
                final_mode = report.final_mode.as_token(),
                "trainer_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "trainer_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_trainer(app: AppWiring) -> Result<SessionReport, AppError> {
    info!(
        root = %app.paths.root.display(),
        task_list = %app.paths.task_list.display(),
        script = %app.script_path.display(),
        mode = app.mode.as_token(),
        "startup"
    );
    let tasks = load_task_list(&app.paths.task_list)?;
    let mut session = Session::new(app.session_config, &tasks)?;
    let mut world = SimWorld::default();
    let scenario = spawn_scenario(&mut world, &mut session);
    debug!(
        clipboard = scenario.clipboard.0,
        extinguisher = scenario.extinguisher.0,
        pointer = scenario.pointer.anchor.0,
        "bench_entities"
    );
    let mut feed = load_script(&app.script_path, &scenario, &world)?;
    let mut presentation = LogPresentation::default();

    // Leaving Loading is what enables input.
    session.switch_mode(app.mode, &mut world, &mut presentation)?;
    let report = run_session(
        &app.config,
        &mut session,
        &mut world,
        &mut presentation,
        &mut feed,
    )?;
    info!(
        fire_burning = presentation.fire_burning(),
        banners = ?presentation.banners(),
        "presentation_summary"
    );
    Ok(report)
}
