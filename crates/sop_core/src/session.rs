use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{ExtinguisherBehavior, PourStation, PouringBehavior};
use crate::interaction::{
    BehaviorHandle, BehaviorSet, InputSignal, InteractableConfig, InteractionConfig,
    InteractionError, InteractionEventBus, InteractionManager, Mode,
};
use crate::tasks::{
    build_procedure, Presentation, TaskConfigError, TaskError, TaskListEntry, TaskOrchestrator,
    TaskTree, DEFAULT_RESET_DELAY_SECONDS,
};
use crate::world::{EntityId, WorldEngine, WorldSignal};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Interaction(#[from] InteractionError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Config(#[from] TaskConfigError),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub interaction: InteractionConfig,
    pub reset_delay_seconds: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interaction: InteractionConfig::default(),
            reset_delay_seconds: DEFAULT_RESET_DELAY_SECONDS,
        }
    }
}

/// One training session: interaction state, the procedure tree and the
/// scenario behaviors.
///
/// Every entry point runs a full cascade before returning: interaction
/// events reach the domain behaviors, finished pours reach the task tree,
/// and task changes reach the presentation.
#[derive(Debug)]
pub struct Session {
    interaction: InteractionManager,
    interaction_events: InteractionEventBus,
    tree: TaskTree,
    orchestrator: TaskOrchestrator,
    pour_station: PourStation,
    extinguishers: BehaviorSet<ExtinguisherBehavior>,
}

impl Session {
    pub fn new(config: SessionConfig, tasks: &[TaskListEntry]) -> Result<Self, SessionError> {
        let mut tree = TaskTree::default();
        let plan = build_procedure(tasks, &mut tree)?;
        // Construction events describe the initial checklist, not changes.
        tree.drain_events();
        Ok(Self {
            interaction: InteractionManager::new(config.interaction),
            interaction_events: InteractionEventBus::default(),
            tree,
            orchestrator: TaskOrchestrator::new(plan, config.reset_delay_seconds),
            pour_station: PourStation::default(),
            extinguishers: BehaviorSet::default(),
        })
    }

    pub fn interaction(&self) -> &InteractionManager {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut InteractionManager {
        &mut self.interaction
    }

    pub fn tree(&self) -> &TaskTree {
        &self.tree
    }

    pub fn orchestrator(&self) -> &TaskOrchestrator {
        &self.orchestrator
    }

    pub fn pour_station(&self) -> &PourStation {
        &self.pour_station
    }

    pub fn interaction_events(&self) -> &InteractionEventBus {
        &self.interaction_events
    }

    /// Nothing is animating and no reset is scheduled.
    pub fn is_idle(&self) -> bool {
        !self.pour_station.is_pouring() && !self.orchestrator.reset_pending()
    }

    /// A labelled cylinder: grabbable, activatable and able to pour.
    pub fn add_cylinder(
        &mut self,
        entity: EntityId,
        label: &str,
        config: InteractableConfig,
        world: &mut dyn WorldEngine,
    ) -> BehaviorHandle<PouringBehavior> {
        self.interaction
            .attach_interactable(entity, config.activatable(true), world);
        debug!(entity = entity.0, label, "cylinder_added");
        self.pour_station.add_cylinder(entity, label, world)
    }

    pub fn add_extinguisher(
        &mut self,
        entity: EntityId,
        config: InteractableConfig,
        world: &mut dyn WorldEngine,
    ) -> BehaviorHandle<ExtinguisherBehavior> {
        self.interaction
            .attach_interactable(entity, config.activatable(true), world);
        self.extinguishers
            .attach(entity, ExtinguisherBehavior::default(), world)
    }

    /// Grabbable scenery with no domain behavior, such as the clipboard.
    pub fn add_prop(
        &mut self,
        entity: EntityId,
        config: InteractableConfig,
        world: &mut dyn WorldEngine,
    ) {
        self.interaction.attach_interactable(entity, config, world);
    }

    pub fn switch_mode(
        &mut self,
        mode: Mode,
        world: &mut dyn WorldEngine,
        presentation: &mut dyn Presentation,
    ) -> Result<bool, SessionError> {
        let switched = self
            .interaction
            .switch_mode(mode, world, &mut self.interaction_events)?;
        self.settle(world, presentation)?;
        Ok(switched)
    }

    pub fn handle_input(
        &mut self,
        signal: &InputSignal,
        world: &mut dyn WorldEngine,
        presentation: &mut dyn Presentation,
    ) -> Result<(), SessionError> {
        self.interaction
            .handle_input(signal, world, &mut self.interaction_events)?;
        self.settle(world, presentation)
    }

    pub fn on_world_signal(
        &mut self,
        signal: &WorldSignal,
        world: &mut dyn WorldEngine,
        presentation: &mut dyn Presentation,
    ) -> Result<(), SessionError> {
        self.pour_station.on_world_signal(signal);
        self.settle(world, presentation)
    }

    pub fn tick(
        &mut self,
        dt_seconds: f32,
        world: &mut dyn WorldEngine,
        presentation: &mut dyn Presentation,
    ) -> Result<(), SessionError> {
        self.interaction.tick(world)?;
        self.settle(world, presentation)?;
        if self
            .orchestrator
            .tick(dt_seconds, &mut self.tree, presentation)?
        {
            self.respawn_cylinders(world)?;
        }
        Ok(())
    }

    /// Releases held cylinders through the manager before the world moves
    /// them back to their spawn points.
    fn respawn_cylinders(&mut self, world: &mut dyn WorldEngine) -> Result<(), SessionError> {
        for entity in self.pour_station.cylinder_entities() {
            if let Some(holder) = self.interaction.selectors().holder_of(entity) {
                self.interaction
                    .request_grab(holder, false, world, &mut self.interaction_events)?;
                debug!(entity = entity.0, "held_cylinder_released_for_respawn");
            }
        }
        for event in self.interaction_events.drain() {
            self.pour_station.on_interaction(&event, world);
            for (_, extinguisher) in self.extinguishers.iter_mut() {
                extinguisher.on_interaction(&event);
            }
        }
        self.pour_station.respawn_all(world);
        Ok(())
    }

    fn settle(
        &mut self,
        world: &mut dyn WorldEngine,
        presentation: &mut dyn Presentation,
    ) -> Result<(), SessionError> {
        let mut extinguish = false;
        for event in self.interaction_events.drain() {
            self.pour_station.on_interaction(&event, world);
            for (_, extinguisher) in self.extinguishers.iter_mut() {
                extinguish |= extinguisher.on_interaction(&event);
            }
        }

        for pour in self.pour_station.drain_completed() {
            if let Some(status) = self.orchestrator.on_pour(&pour, &mut self.tree)? {
                info!(from = pour.from.as_str(), to = pour.to.as_str(), ?status, "pour_evaluated");
            }
        }
        self.orchestrator.publish(&mut self.tree, presentation)?;

        if extinguish
            && self
                .orchestrator
                .extinguish(&mut self.tree, presentation)?
        {
            self.respawn_cylinders(world)?;
        }
        Ok(())
    }
}
