use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::interaction::{InputSignal, Mode};
use crate::session::{Session, SessionError};
use crate::tasks::{Presentation, ProcedureOutcome};
use crate::world::{EntityId, SteppedWorld, Vec3};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_ticks: u64,
    /// Sleep between ticks so a run takes wall-clock time.
    pub realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks: 60 * 60 * 5,
            realtime: false,
        }
    }
}

/// One step of scripted or recorded input.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedCommand {
    Input(InputSignal),
    SwitchMode(Mode),
    /// Teleports an entity, standing in for tracked controllers and hands.
    Place { entity: EntityId, position: Vec3 },
}

pub trait InputFeed {
    /// Commands due at `tick`, in delivery order.
    fn commands_for_tick(&mut self, tick: u64) -> Vec<FeedCommand>;
    fn is_exhausted(&self) -> bool;
}

/// Commands keyed by the tick they fire on. Late commands fire on the next
/// polled tick.
#[derive(Debug, Default)]
pub struct ScheduledFeed {
    pending: VecDeque<(u64, FeedCommand)>,
}

impl ScheduledFeed {
    pub fn new(mut commands: Vec<(u64, FeedCommand)>) -> Self {
        commands.sort_by_key(|(tick, _)| *tick);
        Self {
            pending: commands.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl InputFeed for ScheduledFeed {
    fn commands_for_tick(&mut self, tick: u64) -> Vec<FeedCommand> {
        let mut due = Vec::new();
        while self
            .pending
            .front()
            .is_some_and(|(scheduled, _)| *scheduled <= tick)
        {
            if let Some((_, command)) = self.pending.pop_front() {
                due.push(command);
            }
        }
        due
    }

    fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    FeedExhausted,
    TickLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub ticks_run: u64,
    pub outcomes: Vec<ProcedureOutcome>,
    pub final_mode: Mode,
    pub stopped_by: StopReason,
}

/// Fixed-step headless loop: feed input, advance the world, deliver its
/// signals, then tick the session.
pub fn run_session<W: SteppedWorld>(
    config: &LoopConfig,
    session: &mut Session,
    world: &mut W,
    presentation: &mut dyn Presentation,
    feed: &mut dyn InputFeed,
) -> Result<SessionReport, SessionError> {
    let target_tps = config.target_tps.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    info!(
        target_tps,
        max_ticks = config.max_ticks,
        realtime = config.realtime,
        "session_started"
    );

    let mut ticks_run = 0u64;
    let mut stopped_by = StopReason::TickLimit;
    while ticks_run < config.max_ticks {
        let tick_started = Instant::now();

        for command in feed.commands_for_tick(ticks_run) {
            apply_command(command, session, world, presentation)?;
        }
        for signal in world.advance(fixed_dt_seconds) {
            session.on_world_signal(&signal, world, presentation)?;
        }
        session.tick(fixed_dt_seconds, world, presentation)?;
        ticks_run = ticks_run.saturating_add(1);

        if feed.is_exhausted() && session.is_idle() {
            stopped_by = StopReason::FeedExhausted;
            break;
        }
        if config.realtime {
            thread::sleep(compute_pace_sleep(tick_started.elapsed(), fixed_dt));
        }
    }

    if stopped_by == StopReason::TickLimit {
        warn!(max_ticks = config.max_ticks, "session_tick_limit_reached");
    }
    let report = SessionReport {
        ticks_run,
        outcomes: session.orchestrator().history().to_vec(),
        final_mode: session.interaction().mode(),
        stopped_by,
    };
    info!(
        ticks = report.ticks_run,
        attempts = report.outcomes.len(),
        stopped_by = ?report.stopped_by,
        "session_finished"
    );
    Ok(report)
}

fn apply_command<W: SteppedWorld>(
    command: FeedCommand,
    session: &mut Session,
    world: &mut W,
    presentation: &mut dyn Presentation,
) -> Result<(), SessionError> {
    match command {
        FeedCommand::Input(signal) => session.handle_input(&signal, world, presentation),
        FeedCommand::SwitchMode(mode) => session
            .switch_mode(mode, world, presentation)
            .map(|_| ()),
        FeedCommand::Place { entity, position } => {
            world.set_position(entity, position);
            Ok(())
        }
    }
}

fn compute_pace_sleep(elapsed: Duration, target: Duration) -> Duration {
    target.saturating_sub(elapsed)
}
