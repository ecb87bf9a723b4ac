use tracing::debug;

use crate::interaction::{Behavior, InteractionEvent};
use crate::world::{EntityId, WorldEngine};

/// Sprays while held and active. Spraying only matters while a fire burns.
#[derive(Debug, Default)]
pub struct ExtinguisherBehavior {
    entity: Option<EntityId>,
    spraying: bool,
}

impl ExtinguisherBehavior {
    pub fn is_spraying(&self) -> bool {
        self.spraying
    }

    /// Returns `true` when this event started a spray.
    pub fn on_interaction(&mut self, event: &InteractionEvent) -> bool {
        let Some(entity) = self.entity else {
            return false;
        };
        match *event {
            InteractionEvent::Active { entity: target, .. } if target == entity => {
                self.spraying = true;
                debug!(entity = entity.0, "extinguisher_spraying");
                true
            }
            InteractionEvent::Inactive { entity: target, .. }
            | InteractionEvent::Drop { entity: target, .. }
                if target == entity =>
            {
                self.spraying = false;
                false
            }
            _ => false,
        }
    }
}

impl Behavior for ExtinguisherBehavior {
    fn name(&self) -> &'static str {
        "extinguisher"
    }

    fn attach(&mut self, entity: EntityId, _world: &mut dyn WorldEngine) {
        self.entity = Some(entity);
        self.spraying = false;
    }

    fn detach(&mut self, _world: &mut dyn WorldEngine) {
        self.entity = None;
        self.spraying = false;
    }
}
