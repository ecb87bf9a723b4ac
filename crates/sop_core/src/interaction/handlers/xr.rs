use tracing::debug;

use crate::interaction::events::InteractionEventBus;
use crate::interaction::input::{
    ControllerStates, Handedness, InputSignal, InputSource, XrComponent,
};
use crate::interaction::interactable::GrabMovement;
use crate::interaction::manager::InteractionManager;
use crate::interaction::selector::{Mode, SelectorDevice, SelectorId, SelectorTable};
use crate::interaction::InteractionError;
use crate::world::{Vec3, WorldEngine};

use super::InteractionHandler;

pub const DEFAULT_SQUEEZE_DRAG_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XrMovement {
    /// Held entities are parented to the controller anchor.
    AttachToController,
    /// Held entities are moved by the controller's frame-to-frame
    /// displacement while squeeze stays at or above `threshold`.
    SqueezeDrag { threshold: f32 },
}

impl Default for XrMovement {
    fn default() -> Self {
        Self::AttachToController
    }
}

/// Squeeze grabs, main trigger activates, one selector per controller.
#[derive(Debug)]
pub struct XrHandler {
    movement: XrMovement,
    selectors: [Option<SelectorId>; 2],
    states: ControllerStates,
    drag_engaged: [bool; 2],
    last_anchor_position: [Option<Vec3>; 2],
    subscriptions: Vec<InputSource>,
}

impl XrHandler {
    pub fn new(movement: XrMovement) -> Self {
        Self {
            movement,
            selectors: [None; 2],
            states: ControllerStates::default(),
            drag_engaged: [false; 2],
            last_anchor_position: [None; 2],
            subscriptions: Vec::new(),
        }
    }

    pub fn movement(&self) -> XrMovement {
        self.movement
    }

    fn handle_squeeze(
        &mut self,
        hand: Handedness,
        selector: SelectorId,
        was_pressed: bool,
        manager: &mut InteractionManager,
        world: &mut dyn WorldEngine,
        events: &mut InteractionEventBus,
    ) -> Result<(), InteractionError> {
        let pressed = self.states.is_pressed(hand, XrComponent::Squeeze);
        match self.movement {
            XrMovement::AttachToController => {
                if pressed && !was_pressed {
                    manager.request_grab(selector, true, world, events)?;
                } else if !pressed && was_pressed {
                    manager.request_grab(selector, false, world, events)?;
                }
            }
            XrMovement::SqueezeDrag { threshold } => {
                let slot = hand.index();
                let engaged = self.states.value(hand, XrComponent::Squeeze) >= threshold;
                if engaged && !self.drag_engaged[slot] {
                    self.drag_engaged[slot] = true;
                    let grabbed = manager.request_grab_with(
                        selector,
                        true,
                        GrabMovement::Manual,
                        world,
                        events,
                    )?;
                    if grabbed {
                        self.last_anchor_position[slot] = manager
                            .selector(selector)
                            .and_then(|selector| world.position(selector.anchor));
                        debug!(?hand, "xr_drag_started");
                    }
                } else if !engaged && self.drag_engaged[slot] {
                    self.drag_engaged[slot] = false;
                    self.last_anchor_position[slot] = None;
                    manager.request_grab(selector, false, world, events)?;
                }
            }
        }
        Ok(())
    }
}

impl InteractionHandler for XrHandler {
    fn configure(&mut self, selectors: &SelectorTable) {
        self.subscriptions.clear();
        for hand in Handedness::ALL {
            let selector = selectors.find_live(Mode::Xr, SelectorDevice::Controller(hand));
            self.selectors[hand.index()] = selector;
            if selector.is_some() {
                self.subscriptions.push(InputSource::XrController(hand));
            }
        }
    }

    fn subscriptions(&self) -> &[InputSource] {
        &self.subscriptions
    }

    fn handle_input(
        &mut self,
        signal: &InputSignal,
        manager: &mut InteractionManager,
        world: &mut dyn WorldEngine,
        events: &mut InteractionEventBus,
    ) -> Result<(), InteractionError> {
        let InputSignal::Xr {
            hand,
            component,
            value,
            pressed,
        } = *signal
        else {
            return Ok(());
        };
        let Some(selector) = self.selectors[hand.index()] else {
            return Ok(());
        };

        let was_pressed = self.states.is_pressed(hand, component);
        self.states.set(hand, component, value, pressed);

        match component {
            XrComponent::Squeeze => {
                self.handle_squeeze(hand, selector, was_pressed, manager, world, events)
            }
            XrComponent::Trigger => {
                if pressed != was_pressed {
                    manager.request_activate(selector, pressed, events)?;
                }
                Ok(())
            }
        }
    }

    fn on_tick(
        &mut self,
        manager: &mut InteractionManager,
        world: &mut dyn WorldEngine,
    ) -> Result<(), InteractionError> {
        if !matches!(self.movement, XrMovement::SqueezeDrag { .. }) {
            return Ok(());
        }
        for hand in Handedness::ALL {
            let slot = hand.index();
            let Some(selector_id) = self.selectors[slot] else {
                continue;
            };
            if !self.drag_engaged[slot] {
                continue;
            }
            let selector = manager
                .selector(selector_id)
                .ok_or(InteractionError::UnknownSelector(selector_id))?;
            let Some(held) = selector.grabbed() else {
                continue;
            };
            let Some(current) = world.position(selector.anchor) else {
                continue;
            };
            if let (Some(last), Some(held_position)) =
                (self.last_anchor_position[slot], world.position(held))
            {
                let delta = current - last;
                if delta.length_squared() > 0.0 {
                    world.set_position(held, held_position + delta);
                }
            }
            self.last_anchor_position[slot] = Some(current);
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.selectors = [None; 2];
        self.states = ControllerStates::default();
        self.drag_engaged = [false; 2];
        self.last_anchor_position = [None; 2];
        self.subscriptions.clear();
    }
}
