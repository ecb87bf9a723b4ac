//! Cross-device grab/activate interaction: selectors, per-mode handlers and
//! the per-entity interactable state machine.

mod behavior;
mod events;
pub mod handlers;
mod input;
mod interactable;
mod manager;
mod selector;

use thiserror::Error;

use crate::world::EntityId;

pub use behavior::{Behavior, BehaviorHandle, BehaviorSet};
pub use events::{Holder, InteractionEvent, InteractionEventBus, InteractionEventCounts};
pub use handlers::{ActiveHandler, InteractionHandler, XrMovement, DEFAULT_SQUEEZE_DRAG_THRESHOLD};
pub use input::{Handedness, InputSignal, InputSource, TouchButton, XrComponent};
pub use interactable::{GrabMovement, HoldState, InteractableBehavior, InteractableConfig};
pub use manager::{InteractionConfig, InteractionManager};
pub use selector::{Mode, Selector, SelectorDevice, SelectorId, SelectorIdAllocator, SelectorTable};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InteractionError {
    #[error("entity {0:?} is interactable but has no interactable behavior attached")]
    MissingBehavior(EntityId),
    #[error("selector {0:?} is not registered")]
    UnknownSelector(SelectorId),
    #[error("entity {0:?} is already grabbed")]
    AlreadyGrabbed(EntityId),
    #[error("entity {0:?} is not grabbed")]
    NotGrabbed(EntityId),
    #[error("interactable behavior is not attached to an entity")]
    BehaviorNotAttached,
}
