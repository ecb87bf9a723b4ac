use tracing::{debug, warn};

use crate::interaction::{Behavior, BehaviorHandle, BehaviorSet, InteractionEvent};
use crate::world::{Animation, EntityId, WorldEngine, WorldSignal};

/// A finished pour between two labelled cylinders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PourCompleted {
    pub from: String,
    pub to: String,
    pub source: EntityId,
    pub target: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingPour {
    target: EntityId,
    target_label: String,
}

#[derive(Debug)]
pub struct PouringBehavior {
    label: String,
    entity: Option<EntityId>,
    pending: Option<PendingPour>,
}

impl PouringBehavior {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entity: None,
            pending: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_pouring(&self) -> bool {
        self.pending.is_some()
    }
}

impl Behavior for PouringBehavior {
    fn name(&self) -> &'static str {
        "pouring"
    }

    fn attach(&mut self, entity: EntityId, _world: &mut dyn WorldEngine) {
        self.entity = Some(entity);
        self.pending = None;
    }

    fn detach(&mut self, _world: &mut dyn WorldEngine) {
        self.entity = None;
        self.pending = None;
    }
}

/// The set of pourable cylinders and the pours they have finished.
///
/// Activating a held cylinder starts a pour into the nearest other cylinder
/// it overlaps. The pour only counts once its animation reports back.
#[derive(Debug, Default)]
pub struct PourStation {
    cylinders: BehaviorSet<PouringBehavior>,
    completed: Vec<PourCompleted>,
}

impl PourStation {
    pub fn add_cylinder(
        &mut self,
        entity: EntityId,
        label: impl Into<String>,
        world: &mut dyn WorldEngine,
    ) -> BehaviorHandle<PouringBehavior> {
        self.cylinders
            .attach(entity, PouringBehavior::new(label), world)
    }

    pub fn cylinder(&self, handle: BehaviorHandle<PouringBehavior>) -> Option<&PouringBehavior> {
        self.cylinders.get(handle)
    }

    pub fn cylinder_entities(&self) -> Vec<EntityId> {
        self.cylinders.iter().map(|(entity, _)| entity).collect()
    }

    pub fn is_pouring(&self) -> bool {
        self.cylinders
            .iter()
            .any(|(_, cylinder)| cylinder.is_pouring())
    }

    pub fn on_interaction(&mut self, event: &InteractionEvent, world: &mut dyn WorldEngine) {
        let InteractionEvent::Active { entity, .. } = *event else {
            return;
        };
        let Some(source) = self.cylinders.for_entity(entity) else {
            return;
        };
        if source.is_pouring() {
            debug!(cylinder = source.label(), "pour_ignored_while_animating");
            return;
        }

        let origin = world.position(entity);
        let mut best: Option<(f32, EntityId, String)> = None;
        for (candidate, cylinder) in self.cylinders.iter() {
            if candidate == entity || !world.intersects(entity, candidate) {
                continue;
            }
            let distance = match (origin, world.position(candidate)) {
                (Some(origin), Some(position)) => origin.distance(position),
                _ => f32::MAX,
            };
            match best {
                Some((best_distance, _, _)) if best_distance <= distance => {}
                _ => best = Some((distance, candidate, cylinder.label().to_string())),
            }
        }

        let Some((_, target, target_label)) = best else {
            warn!(cylinder = source.label(), "pour_without_target");
            return;
        };
        if let Some(cylinder) = self.cylinders.for_entity_mut(entity) {
            debug!(from = cylinder.label(), to = target_label.as_str(), "pour_started");
            cylinder.pending = Some(PendingPour {
                target,
                target_label,
            });
            world.play_animation(entity, Animation::Pour);
        }
    }

    pub fn on_world_signal(&mut self, signal: &WorldSignal) {
        let WorldSignal::AnimationFinished {
            entity,
            animation: Animation::Pour,
        } = *signal
        else {
            return;
        };
        let Some(cylinder) = self.cylinders.for_entity_mut(entity) else {
            return;
        };
        let Some(pour) = cylinder.pending.take() else {
            return;
        };
        debug!(from = cylinder.label(), to = pour.target_label.as_str(), "pour_completed");
        self.completed.push(PourCompleted {
            from: cylinder.label.clone(),
            to: pour.target_label,
            source: entity,
            target: pour.target,
        });
    }

    /// Cancels in-flight pours and sends every cylinder back to its spawn.
    pub fn respawn_all(&mut self, world: &mut dyn WorldEngine) {
        for (entity, cylinder) in self.cylinders.iter_mut() {
            cylinder.pending = None;
            world.play_animation(entity, Animation::Respawn);
        }
        self.completed.clear();
    }

    pub fn drain_completed(&mut self) -> Vec<PourCompleted> {
        std::mem::take(&mut self.completed)
    }
}
