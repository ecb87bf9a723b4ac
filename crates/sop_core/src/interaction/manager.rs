use tracing::{debug, info, trace};

use crate::world::{EntityId, WorldEngine};

use super::behavior::{BehaviorHandle, BehaviorSet};
use super::events::{Holder, InteractionEvent, InteractionEventBus};
use super::handlers::{ActiveHandler, XrMovement};
use super::input::InputSignal;
use super::interactable::{GrabMovement, InteractableBehavior, InteractableConfig};
use super::selector::{Mode, Selector, SelectorDevice, SelectorId, SelectorTable};
use super::InteractionError;

#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionConfig {
    pub xr_movement: XrMovement,
}

/// Single source of truth for the interaction mode, what each selector is
/// pointing at and who currently holds what.
#[derive(Debug)]
pub struct InteractionManager {
    config: InteractionConfig,
    mode: Mode,
    selectors: SelectorTable,
    interactables: Vec<EntityId>,
    behaviors: BehaviorSet<InteractableBehavior>,
    handler: Option<ActiveHandler>,
    active_targets: Vec<EntityId>,
}

impl InteractionManager {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            mode: Mode::Loading,
            selectors: SelectorTable::default(),
            interactables: Vec::new(),
            behaviors: BehaviorSet::default(),
            handler: None,
            active_targets: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn handler(&self) -> Option<&ActiveHandler> {
        self.handler.as_ref()
    }

    pub fn register_selector(
        &mut self,
        device: SelectorDevice,
        anchor: EntityId,
        grabber: EntityId,
        modes: &[Mode],
    ) -> SelectorId {
        let id = self.selectors.register(device, anchor, grabber, modes);
        debug!(selector = id.0, ?device, "selector_registered");
        id
    }

    pub fn selector(&self, id: SelectorId) -> Option<&Selector> {
        self.selectors.get(id)
    }

    pub fn selectors(&self) -> &SelectorTable {
        &self.selectors
    }

    pub fn is_holding(&self, id: SelectorId) -> Result<bool, InteractionError> {
        self.selectors
            .get(id)
            .map(|selector| selector.grabbed.is_some())
            .ok_or(InteractionError::UnknownSelector(id))
    }

    /// Attaches an interactable behavior and makes the entity a grab candidate.
    pub fn attach_interactable(
        &mut self,
        entity: EntityId,
        config: InteractableConfig,
        world: &mut dyn WorldEngine,
    ) -> BehaviorHandle<InteractableBehavior> {
        let handle = self
            .behaviors
            .attach(entity, InteractableBehavior::new(config), world);
        if !self.interactables.contains(&entity) {
            self.interactables.push(entity);
        }
        handle
    }

    /// Drops the entity if held, then removes both its behavior and its
    /// candidacy.
    pub fn detach_interactable(
        &mut self,
        entity: EntityId,
        world: &mut dyn WorldEngine,
        events: &mut InteractionEventBus,
    ) -> Result<Option<InteractableBehavior>, InteractionError> {
        if let Some(holder) = self.selectors.holder_of(entity) {
            self.request_grab(holder, false, world, events)?;
        }
        self.interactables.retain(|candidate| *candidate != entity);
        for selector in self.selectors.iter_mut() {
            if selector.target == Some(entity) {
                selector.target = None;
            }
        }
        Ok(self.behaviors.detach(entity, world))
    }

    /// Toggles grab candidacy without touching the attached behavior.
    pub fn set_interactable(&mut self, entity: EntityId, interactable: bool) {
        let present = self.interactables.contains(&entity);
        if interactable && !present {
            self.interactables.push(entity);
        } else if !interactable && present {
            self.interactables.retain(|candidate| *candidate != entity);
        }
    }

    pub fn is_interactable(&self, entity: EntityId) -> bool {
        self.interactables.contains(&entity)
    }

    pub fn behavior(&self, entity: EntityId) -> Option<&InteractableBehavior> {
        self.behaviors.for_entity(entity)
    }

    pub fn set_activatable(
        &mut self,
        entity: EntityId,
        activatable: bool,
        events: &mut InteractionEventBus,
    ) -> Result<(), InteractionError> {
        self.behaviors
            .for_entity_mut(entity)
            .ok_or(InteractionError::MissingBehavior(entity))?
            .set_activatable(activatable, events);
        Ok(())
    }

    pub fn active_targets(&self) -> &[EntityId] {
        &self.active_targets
    }

    /// Drops everything held by the outgoing mode's selectors, tears down the
    /// outgoing handler, then configures the incoming one.
    pub fn switch_mode(
        &mut self,
        mode: Mode,
        world: &mut dyn WorldEngine,
        events: &mut InteractionEventBus,
    ) -> Result<bool, InteractionError> {
        if mode == self.mode {
            return Ok(false);
        }
        let previous = self.mode;

        let holding: Vec<SelectorId> = self
            .selectors
            .live_in(previous)
            .filter(|selector| selector.grabbed.is_some())
            .map(|selector| selector.id)
            .collect();
        for id in holding {
            self.request_grab(id, false, world, events)?;
        }
        for selector in self.selectors.iter_mut() {
            selector.target = None;
        }
        if !self.active_targets.is_empty() {
            self.active_targets.clear();
            world.set_highlighted(&[]);
        }

        if let Some(mut outgoing) = self.handler.take() {
            outgoing.as_handler_mut().dispose();
        }

        self.mode = mode;
        events.emit(InteractionEvent::ModeChanged { from: previous, to: mode });
        info!(
            from = previous.as_token(),
            to = mode.as_token(),
            "interaction_mode_switched"
        );

        let mut incoming = ActiveHandler::for_mode(mode, self.config.xr_movement);
        if let Some(handler) = incoming.as_mut() {
            handler.as_handler_mut().configure(&self.selectors);
        }
        self.handler = incoming;
        Ok(true)
    }

    /// Routes a raw device signal to the live handler if it subscribed to
    /// the signal's source.
    pub fn handle_input(
        &mut self,
        signal: &InputSignal,
        world: &mut dyn WorldEngine,
        events: &mut InteractionEventBus,
    ) -> Result<(), InteractionError> {
        let Some(mut handler) = self.handler.take() else {
            trace!(mode = self.mode.as_token(), "input_ignored_without_handler");
            return Ok(());
        };
        let result = if handler
            .as_handler()
            .subscriptions()
            .contains(&signal.source())
        {
            handler
                .as_handler_mut()
                .handle_input(signal, self, world, events)
        } else {
            trace!(source = ?signal.source(), "input_ignored_unsubscribed");
            Ok(())
        };
        self.handler = Some(handler);
        result
    }

    /// Per-frame callback: handler movement first, then target negotiation.
    pub fn tick(&mut self, world: &mut dyn WorldEngine) -> Result<(), InteractionError> {
        if let Some(mut handler) = self.handler.take() {
            let result = handler.as_handler_mut().on_tick(self, world);
            self.handler = Some(handler);
            result?;
        }
        self.negotiate_targets(world);
        Ok(())
    }

    /// Picks, for every idle live selector, the nearest overlapping
    /// interactable not held by anyone. Ties keep the first candidate seen.
    pub fn negotiate_targets(&mut self, world: &mut dyn WorldEngine) {
        let held: Vec<EntityId> = self
            .selectors
            .iter()
            .filter_map(|selector| selector.grabbed)
            .collect();
        let mode = self.mode;
        let interactables = &self.interactables;
        let mut active_targets = Vec::new();

        for selector in self.selectors.iter_mut() {
            if !selector.is_live_in(mode) {
                continue;
            }
            if selector.grabbed.is_some() {
                selector.target = None;
                continue;
            }

            let mut best: Option<(f32, EntityId)> = None;
            if let Some(origin) = world.position(selector.grabber) {
                for &entity in interactables {
                    if held.contains(&entity) || !world.intersects(entity, selector.grabber) {
                        continue;
                    }
                    let Some(position) = world.position(entity) else {
                        continue;
                    };
                    let distance = position.distance(origin);
                    match best {
                        Some((best_distance, _)) if best_distance <= distance => {}
                        _ => best = Some((distance, entity)),
                    }
                }
            }

            let next = best.map(|(_, entity)| entity);
            if next != selector.target {
                trace!(
                    selector = selector.id.0,
                    target = ?next.map(|entity| entity.0),
                    "selector_target_changed"
                );
            }
            selector.target = next;
            if let Some(target) = next {
                if !active_targets.contains(&target) {
                    active_targets.push(target);
                }
            }
        }

        if active_targets != self.active_targets {
            world.set_highlighted(&active_targets);
            self.active_targets = active_targets;
        }
    }

    pub fn request_grab(
        &mut self,
        id: SelectorId,
        grab: bool,
        world: &mut dyn WorldEngine,
        events: &mut InteractionEventBus,
    ) -> Result<bool, InteractionError> {
        self.request_grab_with(id, grab, GrabMovement::FollowAnchor, world, events)
    }

    /// Returns whether a grab or drop actually happened. Grabbing with no
    /// target, grabbing while already holding and dropping empty-handed are
    /// no-ops.
    pub fn request_grab_with(
        &mut self,
        id: SelectorId,
        grab: bool,
        movement: GrabMovement,
        world: &mut dyn WorldEngine,
        events: &mut InteractionEventBus,
    ) -> Result<bool, InteractionError> {
        let selector = self
            .selectors
            .get(id)
            .ok_or(InteractionError::UnknownSelector(id))?;
        let holder = Holder {
            anchor: selector.anchor,
            grabber: selector.grabber,
        };
        let (grabbed, target) = (selector.grabbed, selector.target);

        if grab {
            if grabbed.is_some() {
                return Ok(false);
            }
            let Some(target) = target else {
                trace!(selector = id.0, "grab_without_target");
                return Ok(false);
            };
            if self.selectors.holder_of(target).is_some() {
                // Another selector committed this candidate since the last negotiation.
                if let Some(selector) = self.selectors.get_mut(id) {
                    selector.target = None;
                }
                return Ok(false);
            }
            self.behaviors
                .for_entity_mut(target)
                .ok_or(InteractionError::MissingBehavior(target))?
                .grab(holder, self.mode, movement, world, events)?;
            if let Some(selector) = self.selectors.get_mut(id) {
                selector.grabbed = Some(target);
                selector.target = None;
            }
            self.active_targets.retain(|entity| *entity != target);
            Ok(true)
        } else {
            let Some(entity) = grabbed else {
                return Ok(false);
            };
            self.behaviors
                .for_entity_mut(entity)
                .ok_or(InteractionError::MissingBehavior(entity))?
                .drop(world, events)?;
            if let Some(selector) = self.selectors.get_mut(id) {
                selector.grabbed = None;
            }
            Ok(true)
        }
    }

    /// Forwards activation to the held entity's behavior, which ignores it
    /// when the entity is not activatable.
    pub fn request_activate(
        &mut self,
        id: SelectorId,
        activate: bool,
        events: &mut InteractionEventBus,
    ) -> Result<bool, InteractionError> {
        let selector = self
            .selectors
            .get(id)
            .ok_or(InteractionError::UnknownSelector(id))?;
        let Some(entity) = selector.grabbed else {
            return Ok(false);
        };
        let behavior = self
            .behaviors
            .for_entity_mut(entity)
            .ok_or(InteractionError::MissingBehavior(entity))?;
        if activate {
            behavior.activate(events)
        } else {
            behavior.deactivate(events)
        }
    }
}
