#[derive(Debug, Clone)]
struct SimEntity {
    name: String,
    spawn: Vec3,
    /// World position while unparented, stale while parented.
    position: Vec3,
    radius: f32,
    parent: Option<(EntityId, Pose)>,
    animation: Option<(Animation, f32)>,
}

/// Headless stand-in for the 3D engine.
///
/// Interaction volumes are spheres. Parenting keeps the child at its
/// parent's position plus the pose offset; pose rotation is not simulated.
#[derive(Debug, Default)]
pub(crate) struct SimWorld {
    entities: BTreeMap<EntityId, SimEntity>,
    next_id: u64,
    highlighted: Vec<EntityId>,
}

impl SimWorld {
    pub(crate) fn spawn(&mut self, name: &str, position: Vec3, radius: f32) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.entities.insert(
            id,
            SimEntity {
                name: name.to_string(),
                spawn: position,
                position,
                radius,
                parent: None,
                animation: None,
            },
        );
        debug!(entity = id.0, name, "sim_entity_spawned");
        id
    }

    pub(crate) fn entity_named(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, entity)| entity.name == name)
            .map(|(id, _)| *id)
    }

    pub(crate) fn name_of(&self, entity: EntityId) -> Option<&str> {
        self.entities.get(&entity).map(|entity| entity.name.as_str())
    }

    pub(crate) fn parent_of(&self, entity: EntityId) -> Option<EntityId> {
        self.entities
            .get(&entity)
            .and_then(|entity| entity.parent)
            .map(|(parent, _)| parent)
    }

    #[cfg(test)]
    pub(crate) fn highlighted(&self) -> &[EntityId] {
        &self.highlighted
    }

    #[cfg(test)]
    pub(crate) fn is_animating(&self, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|entity| entity.animation.is_some())
    }

    fn resolve_position(&self, entity: EntityId, depth: usize) -> Option<Vec3> {
        let record = self.entities.get(&entity)?;
        match record.parent {
            Some((parent, pose)) if depth < MAX_PARENT_DEPTH => self
                .resolve_position(parent, depth + 1)
                .map(|base| base + pose.offset),
            _ => Some(record.position),
        }
    }
}

impl WorldEngine for SimWorld {
    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.resolve_position(entity, 0)
    }

    fn set_position(&mut self, entity: EntityId, position: Vec3) {
        let parent_position = self
            .parent_of(entity)
            .and_then(|parent| self.position(parent));
        let Some(record) = self.entities.get_mut(&entity) else {
            warn!(entity = entity.0, "sim_move_unknown_entity");
            return;
        };
        match (record.parent.as_mut(), parent_position) {
            (Some((_, pose)), Some(base)) => pose.offset = position - base,
            _ => record.position = position,
        }
    }

    fn intersects(&self, a: EntityId, b: EntityId) -> bool {
        if a == b {
            return false;
        }
        let (Some(first), Some(second)) = (self.entities.get(&a), self.entities.get(&b)) else {
            return false;
        };
        match (self.position(a), self.position(b)) {
            (Some(pa), Some(pb)) => pa.distance(pb) <= first.radius + second.radius,
            _ => false,
        }
    }

    fn attach_to(&mut self, entity: EntityId, parent: EntityId, pose: Pose) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.parent = Some((parent, pose));
        }
    }

    fn detach(&mut self, entity: EntityId) {
        let current = self.position(entity);
        if let Some(record) = self.entities.get_mut(&entity) {
            if let Some(position) = current {
                record.position = position;
            }
            record.parent = None;
        }
    }

    fn set_highlighted(&mut self, entities: &[EntityId]) {
        self.highlighted = entities.to_vec();
        debug!(count = entities.len(), "sim_highlight_changed");
    }

    fn play_animation(&mut self, entity: EntityId, animation: Animation) {
        let duration = match animation {
            Animation::Pour => POUR_ANIMATION_SECONDS,
            Animation::Respawn => RESPAWN_ANIMATION_SECONDS,
        };
        debug!(
            entity = entity.0,
            name = self.name_of(entity).unwrap_or("<unknown>"),
            ?animation,
            "sim_animation_started"
        );
        if let Some(record) = self.entities.get_mut(&entity) {
            record.animation = Some((animation, duration));
        }
    }
}

impl SteppedWorld for SimWorld {
    fn advance(&mut self, dt_seconds: f32) -> Vec<WorldSignal> {
        let mut signals = Vec::new();
        for (id, record) in self.entities.iter_mut() {
            let Some((animation, remaining)) = record.animation.as_mut() else {
                continue;
            };
            *remaining -= dt_seconds;
            if *remaining > 0.0 {
                continue;
            }
            let animation = *animation;
            record.animation = None;
            if animation == Animation::Respawn {
                record.position = record.spawn;
                record.parent = None;
            }
            signals.push(WorldSignal::AnimationFinished {
                entity: *id,
                animation,
            });
        }
        signals
    }
}
