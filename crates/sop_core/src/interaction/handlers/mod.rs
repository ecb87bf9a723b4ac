mod desktop;
mod mobile;
mod xr;

pub use desktop::DesktopHandler;
pub use mobile::MobileHandler;
pub use xr::{XrHandler, XrMovement, DEFAULT_SQUEEZE_DRAG_THRESHOLD};

use crate::world::WorldEngine;

use super::events::InteractionEventBus;
use super::input::{InputSignal, InputSource};
use super::manager::InteractionManager;
use super::selector::{Mode, SelectorTable};
use super::InteractionError;

/// Strategy contract shared by the per-mode handlers.
///
/// A handler only decides *when* grab/activate requests fire; what is
/// targeted stays with the manager. `dispose` must be idempotent and safe
/// on a handler that was never configured.
pub trait InteractionHandler {
    fn configure(&mut self, selectors: &SelectorTable);

    fn subscriptions(&self) -> &[InputSource];

    fn handle_input(
        &mut self,
        signal: &InputSignal,
        manager: &mut InteractionManager,
        world: &mut dyn WorldEngine,
        events: &mut InteractionEventBus,
    ) -> Result<(), InteractionError>;

    fn on_tick(
        &mut self,
        _manager: &mut InteractionManager,
        _world: &mut dyn WorldEngine,
    ) -> Result<(), InteractionError> {
        Ok(())
    }

    fn dispose(&mut self);
}

/// The one live handler, tagged by mode.
#[derive(Debug)]
pub enum ActiveHandler {
    Desktop(DesktopHandler),
    Mobile(MobileHandler),
    Xr(XrHandler),
}

impl ActiveHandler {
    /// `Loading` has no handler; input is ignored until a real mode is entered.
    pub fn for_mode(mode: Mode, xr_movement: XrMovement) -> Option<Self> {
        match mode {
            Mode::Desktop => Some(Self::Desktop(DesktopHandler::default())),
            Mode::Mobile => Some(Self::Mobile(MobileHandler::default())),
            Mode::Xr => Some(Self::Xr(XrHandler::new(xr_movement))),
            Mode::Loading => None,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Desktop(_) => Mode::Desktop,
            Self::Mobile(_) => Mode::Mobile,
            Self::Xr(_) => Mode::Xr,
        }
    }

    pub fn as_handler(&self) -> &dyn InteractionHandler {
        match self {
            Self::Desktop(handler) => handler,
            Self::Mobile(handler) => handler,
            Self::Xr(handler) => handler,
        }
    }

    pub fn as_handler_mut(&mut self) -> &mut dyn InteractionHandler {
        match self {
            Self::Desktop(handler) => handler,
            Self::Mobile(handler) => handler,
            Self::Xr(handler) => handler,
        }
    }
}
