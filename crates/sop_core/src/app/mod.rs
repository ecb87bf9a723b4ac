mod loop_runner;

pub use loop_runner::{
    run_session, FeedCommand, InputFeed, LoopConfig, ScheduledFeed, SessionReport, StopReason,
};
