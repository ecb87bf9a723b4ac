use tracing::trace;
use winit::event::{ElementState, MouseButton};

use crate::interaction::events::InteractionEventBus;
use crate::interaction::input::{InputSignal, InputSource};
use crate::interaction::manager::InteractionManager;
use crate::interaction::selector::{Mode, SelectorDevice, SelectorId, SelectorTable};
use crate::interaction::InteractionError;
use crate::world::WorldEngine;

use super::InteractionHandler;

/// Left button toggles grab/drop, right button is held to activate.
#[derive(Debug, Default)]
pub struct DesktopHandler {
    selector: Option<SelectorId>,
    subscriptions: Vec<InputSource>,
}

impl InteractionHandler for DesktopHandler {
    fn configure(&mut self, selectors: &SelectorTable) {
        self.selector = selectors.find_live(Mode::Desktop, SelectorDevice::Pointer);
        self.subscriptions.clear();
        if self.selector.is_some() {
            self.subscriptions.push(InputSource::Pointer);
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
        let (Some(selector), InputSignal::Pointer { button, state }) = (self.selector, signal)
        else {
            return Ok(());
        };

        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => {
                let holding = manager.is_holding(selector)?;
                manager.request_grab(selector, !holding, world, events)?;
            }
            (MouseButton::Right, ElementState::Pressed) => {
                manager.request_activate(selector, true, events)?;
            }
            (MouseButton::Right, ElementState::Released) => {
                manager.request_activate(selector, false, events)?;
            }
            _ => trace!(?button, ?state, "desktop_input_unmapped"),
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.selector = None;
        self.subscriptions.clear();
    }
}
