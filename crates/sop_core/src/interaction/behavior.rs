use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use crate::world::{EntityId, WorldEngine};

/// Capability contract for anything attached 1:1 to a world entity.
pub trait Behavior {
    fn name(&self) -> &'static str;

    /// Called once before the first attach.
    fn init(&mut self) {}

    fn attach(&mut self, entity: EntityId, world: &mut dyn WorldEngine);

    fn detach(&mut self, world: &mut dyn WorldEngine);
}

/// Typed handle returned at attach time, replaces lookup by behavior name.
pub struct BehaviorHandle<B> {
    entity: EntityId,
    _kind: PhantomData<fn() -> B>,
}

impl<B> BehaviorHandle<B> {
    pub fn entity(&self) -> EntityId {
        self.entity
    }
}

impl<B> Clone for BehaviorHandle<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for BehaviorHandle<B> {}

impl<B> PartialEq for BehaviorHandle<B> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

impl<B> Eq for BehaviorHandle<B> {}

impl<B> fmt::Debug for BehaviorHandle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorHandle")
            .field("entity", &self.entity)
            .finish()
    }
}

/// All behaviors of one kind, keyed by the entity they are attached to.
#[derive(Debug)]
pub struct BehaviorSet<B> {
    by_entity: BTreeMap<EntityId, B>,
}

impl<B> Default for BehaviorSet<B> {
    fn default() -> Self {
        Self {
            by_entity: BTreeMap::new(),
        }
    }
}

impl<B: Behavior> BehaviorSet<B> {
    /// Attaches `behavior` to `entity`, replacing (and detaching) any previous one.
    pub fn attach(
        &mut self,
        entity: EntityId,
        mut behavior: B,
        world: &mut dyn WorldEngine,
    ) -> BehaviorHandle<B> {
        if let Some(mut previous) = self.by_entity.remove(&entity) {
            previous.detach(world);
        }
        behavior.init();
        behavior.attach(entity, world);
        self.by_entity.insert(entity, behavior);
        BehaviorHandle {
            entity,
            _kind: PhantomData,
        }
    }

    pub fn detach(&mut self, entity: EntityId, world: &mut dyn WorldEngine) -> Option<B> {
        let mut behavior = self.by_entity.remove(&entity)?;
        behavior.detach(world);
        Some(behavior)
    }

    pub fn get(&self, handle: BehaviorHandle<B>) -> Option<&B> {
        self.by_entity.get(&handle.entity)
    }

    pub fn get_mut(&mut self, handle: BehaviorHandle<B>) -> Option<&mut B> {
        self.by_entity.get_mut(&handle.entity)
    }

    pub fn for_entity(&self, entity: EntityId) -> Option<&B> {
        self.by_entity.get(&entity)
    }

    pub fn for_entity_mut(&mut self, entity: EntityId) -> Option<&mut B> {
        self.by_entity.get_mut(&entity)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.by_entity.contains_key(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &B)> {
        self.by_entity.iter().map(|(entity, behavior)| (*entity, behavior))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut B)> {
        self.by_entity
            .iter_mut()
            .map(|(entity, behavior)| (*entity, behavior))
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}
