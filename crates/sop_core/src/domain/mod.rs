//! Scenario-specific behaviors layered on top of interaction events.

mod extinguisher;
mod pouring;

pub use extinguisher::ExtinguisherBehavior;
pub use pouring::{PourCompleted, PourStation, PouringBehavior};
