use crate::interaction::events::InteractionEventBus;
use crate::interaction::input::{InputSignal, InputSource, TouchButton};
use crate::interaction::manager::InteractionManager;
use crate::interaction::selector::{Mode, SelectorDevice, SelectorId, SelectorTable};
use crate::interaction::InteractionError;
use crate::world::WorldEngine;

use super::InteractionHandler;

/// On-screen "Grab" toggles, "Use" is held to activate.
#[derive(Debug, Default)]
pub struct MobileHandler {
    selector: Option<SelectorId>,
    subscriptions: Vec<InputSource>,
}

impl InteractionHandler for MobileHandler {
    fn configure(&mut self, selectors: &SelectorTable) {
        self.selector = selectors.find_live(Mode::Mobile, SelectorDevice::Pointer);
        self.subscriptions.clear();
        if self.selector.is_some() {
            self.subscriptions.push(InputSource::TouchButtons);
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
        let (Some(selector), InputSignal::Touch { button, pressed }) = (self.selector, signal)
        else {
            return Ok(());
        };

        match button {
            TouchButton::Grab if *pressed => {
                let holding = manager.is_holding(selector)?;
                manager.request_grab(selector, !holding, world, events)?;
            }
            TouchButton::Grab => {}
            TouchButton::Use => {
                manager.request_activate(selector, *pressed, events)?;
            }
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.selector = None;
        self.subscriptions.clear();
    }
}
