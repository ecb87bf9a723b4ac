use tracing::debug;

use crate::world::{EntityId, Pose, WorldEngine};

use super::behavior::Behavior;
use super::events::{Holder, InteractionEvent, InteractionEventBus};
use super::selector::Mode;
use super::InteractionError;

#[derive(Debug, Clone)]
pub struct InteractableConfig {
    pub activatable: bool,
    /// Re-parent under the anchor on grab. Off for entities with custom grab visuals.
    pub move_attached: bool,
    pub default_pose: Pose,
    pub mode_poses: Vec<(Mode, Pose)>,
}

impl Default for InteractableConfig {
    fn default() -> Self {
        Self {
            activatable: false,
            move_attached: true,
            default_pose: Pose::default(),
            mode_poses: Vec::new(),
        }
    }
}

impl InteractableConfig {
    pub fn activatable(mut self, activatable: bool) -> Self {
        self.activatable = activatable;
        self
    }

    pub fn move_attached(mut self, move_attached: bool) -> Self {
        self.move_attached = move_attached;
        self
    }

    pub fn with_default_pose(mut self, pose: Pose) -> Self {
        self.default_pose = pose;
        self
    }

    pub fn with_mode_pose(mut self, mode: Mode, pose: Pose) -> Self {
        self.mode_poses.retain(|(existing, _)| *existing != mode);
        self.mode_poses.push((mode, pose));
        self
    }

    fn pose_for(&self, mode: Mode) -> Pose {
        self.mode_poses
            .iter()
            .find(|(candidate, _)| *candidate == mode)
            .map(|(_, pose)| *pose)
            .unwrap_or(self.default_pose)
    }
}

/// How the held entity follows its holder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GrabMovement {
    /// Parent under the anchor when the entity is configured for it.
    #[default]
    FollowAnchor,
    /// The caller moves the entity itself (squeeze-and-drag).
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    Idle,
    Grabbed(Holder),
    Active(Holder),
}

/// Per-entity grab/activate state machine.
///
/// `Idle -> Grabbed -> Active -> Grabbed -> Idle`. Dropping while active
/// emits `Inactive` before `Drop`. Precondition violations are returned as
/// errors; callers treat them as fatal.
#[derive(Debug)]
pub struct InteractableBehavior {
    entity: Option<EntityId>,
    config: InteractableConfig,
    state: HoldState,
    following: bool,
}

impl InteractableBehavior {
    pub fn new(config: InteractableConfig) -> Self {
        Self {
            entity: None,
            config,
            state: HoldState::Idle,
            following: false,
        }
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    pub fn is_grabbed(&self) -> bool {
        !matches!(self.state, HoldState::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, HoldState::Active(_))
    }

    pub fn is_activatable(&self) -> bool {
        self.config.activatable
    }

    pub fn config(&self) -> &InteractableConfig {
        &self.config
    }

    fn attached_entity(&self) -> Result<EntityId, InteractionError> {
        self.entity.ok_or(InteractionError::BehaviorNotAttached)
    }

    pub fn grab(
        &mut self,
        holder: Holder,
        mode: Mode,
        movement: GrabMovement,
        world: &mut dyn WorldEngine,
        events: &mut InteractionEventBus,
    ) -> Result<(), InteractionError> {
        let entity = self.attached_entity()?;
        if self.is_grabbed() {
            return Err(InteractionError::AlreadyGrabbed(entity));
        }
        self.state = HoldState::Grabbed(holder);
        self.following = self.config.move_attached && movement == GrabMovement::FollowAnchor;
        if self.following {
            world.attach_to(entity, holder.anchor, self.config.pose_for(mode));
        }
        debug!(entity = entity.0, anchor = holder.anchor.0, "interactable_grabbed");
        events.emit(InteractionEvent::Grab { entity, holder });
        Ok(())
    }

    pub fn drop(
        &mut self,
        world: &mut dyn WorldEngine,
        events: &mut InteractionEventBus,
    ) -> Result<(), InteractionError> {
        let entity = self.attached_entity()?;
        let holder = match self.state {
            HoldState::Idle => return Err(InteractionError::NotGrabbed(entity)),
            HoldState::Grabbed(holder) => holder,
            HoldState::Active(holder) => {
                self.state = HoldState::Grabbed(holder);
                events.emit(InteractionEvent::Inactive { entity, holder });
                holder
            }
        };
        self.state = HoldState::Idle;
        if std::mem::take(&mut self.following) {
            world.detach(entity);
        }
        debug!(entity = entity.0, "interactable_dropped");
        events.emit(InteractionEvent::Drop { entity, holder });
        Ok(())
    }

    /// Returns whether the entity became active. Non-activatable entities
    /// and repeated activations are ignored.
    pub fn activate(&mut self, events: &mut InteractionEventBus) -> Result<bool, InteractionError> {
        let entity = self.attached_entity()?;
        match self.state {
            HoldState::Idle => Err(InteractionError::NotGrabbed(entity)),
            HoldState::Active(_) => Ok(false),
            HoldState::Grabbed(_) if !self.config.activatable => Ok(false),
            HoldState::Grabbed(holder) => {
                self.state = HoldState::Active(holder);
                events.emit(InteractionEvent::Active { entity, holder });
                Ok(true)
            }
        }
    }

    pub fn deactivate(
        &mut self,
        events: &mut InteractionEventBus,
    ) -> Result<bool, InteractionError> {
        let entity = self.attached_entity()?;
        match self.state {
            HoldState::Idle => Err(InteractionError::NotGrabbed(entity)),
            HoldState::Grabbed(_) => Ok(false),
            HoldState::Active(holder) => {
                self.state = HoldState::Grabbed(holder);
                events.emit(InteractionEvent::Inactive { entity, holder });
                Ok(true)
            }
        }
    }

    pub fn set_activatable(&mut self, activatable: bool, events: &mut InteractionEventBus) {
        self.config.activatable = activatable;
        if activatable {
            return;
        }
        if let (Some(entity), HoldState::Active(holder)) = (self.entity, self.state) {
            self.state = HoldState::Grabbed(holder);
            events.emit(InteractionEvent::Inactive { entity, holder });
        }
    }
}

impl Behavior for InteractableBehavior {
    fn name(&self) -> &'static str {
        "interactable"
    }

    fn attach(&mut self, entity: EntityId, _world: &mut dyn WorldEngine) {
        self.entity = Some(entity);
        self.state = HoldState::Idle;
        self.following = false;
    }

    fn detach(&mut self, world: &mut dyn WorldEngine) {
        if let Some(entity) = self.entity.take() {
            if self.is_grabbed() && self.following {
                world.detach(entity);
            }
        }
        self.state = HoldState::Idle;
        self.following = false;
    }
}
