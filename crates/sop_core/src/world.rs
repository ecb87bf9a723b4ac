use std::ops::{Add, Sub};

/// Opaque handle into the world engine. The core never owns entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length_squared().sqrt()
    }

    pub fn scale(self, factor: f32) -> Vec3 {
        Vec3 {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

/// Local placement of an attached entity relative to its parent.
/// `rotation_euler` is in radians, applied by the world engine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub offset: Vec3,
    pub rotation_euler: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Animation {
    Pour,
    Respawn,
}

/// Completion callbacks reported by the world engine between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldSignal {
    AnimationFinished {
        entity: EntityId,
        animation: Animation,
    },
}

/// Narrow seam to the 3D engine that owns entities, rendering and effects.
///
/// The interaction core only reads positions and overlap tests and asks the
/// engine to parent, move, highlight and animate. Implementations decide
/// what an "interaction volume" is; `intersects` must be symmetric.
pub trait WorldEngine {
    fn position(&self, entity: EntityId) -> Option<Vec3>;
    fn set_position(&mut self, entity: EntityId, position: Vec3);
    fn intersects(&self, a: EntityId, b: EntityId) -> bool;
    fn attach_to(&mut self, entity: EntityId, parent: EntityId, pose: Pose);
    fn detach(&mut self, entity: EntityId);
    fn set_highlighted(&mut self, entities: &[EntityId]);
    fn play_animation(&mut self, entity: EntityId, animation: Animation);
}

/// A world that owns its own clock, as a headless simulation does.
pub trait SteppedWorld: WorldEngine {
    /// Advances animations by `dt_seconds` and reports the ones that finished.
    fn advance(&mut self, dt_seconds: f32) -> Vec<WorldSignal>;
}

#[cfg(test)]
pub(crate) mod test_world {
    use std::collections::{HashMap, HashSet};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum WorldCall {
        Attach(EntityId, EntityId, Pose),
        Detach(EntityId),
        Animate(EntityId, Animation),
    }

    /// Scriptable engine double: positions and overlaps are set directly.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingWorld {
        pub positions: HashMap<EntityId, Vec3>,
        pub overlaps: HashSet<(EntityId, EntityId)>,
        pub highlighted: Vec<EntityId>,
        pub calls: Vec<WorldCall>,
        pub finished_calls: usize,
    }

    impl RecordingWorld {
        pub(crate) fn place(&mut self, entity: EntityId, position: Vec3) {
            self.positions.insert(entity, position);
        }

        pub(crate) fn overlap(&mut self, a: EntityId, b: EntityId) {
            self.overlaps.insert((a, b));
            self.overlaps.insert((b, a));
        }

        pub(crate) fn separate(&mut self, a: EntityId, b: EntityId) {
            self.overlaps.remove(&(a, b));
            self.overlaps.remove(&(b, a));
        }
    }

    impl WorldEngine for RecordingWorld {
        fn position(&self, entity: EntityId) -> Option<Vec3> {
            self.positions.get(&entity).copied()
        }

        fn set_position(&mut self, entity: EntityId, position: Vec3) {
            self.positions.insert(entity, position);
        }

        fn intersects(&self, a: EntityId, b: EntityId) -> bool {
            self.overlaps.contains(&(a, b))
        }

        fn attach_to(&mut self, entity: EntityId, parent: EntityId, pose: Pose) {
            self.calls.push(WorldCall::Attach(entity, parent, pose));
        }

        fn detach(&mut self, entity: EntityId) {
            self.calls.push(WorldCall::Detach(entity));
        }

        fn set_highlighted(&mut self, entities: &[EntityId]) {
            self.highlighted = entities.to_vec();
        }

        fn play_animation(&mut self, entity: EntityId, animation: Animation) {
            self.calls.push(WorldCall::Animate(entity, animation));
        }
    }

    /// Every animation finishes on the step after it starts.
    impl SteppedWorld for RecordingWorld {
        fn advance(&mut self, _dt_seconds: f32) -> Vec<WorldSignal> {
            let signals = self
                .calls
                .get(self.finished_calls..)
                .unwrap_or_default()
                .iter()
                .filter_map(|call| match *call {
                    WorldCall::Animate(entity, animation) => {
                        Some(WorldSignal::AnimationFinished { entity, animation })
                    }
                    _ => None,
                })
                .collect();
            self.finished_calls = self.calls.len();
            signals
        }
    }
}
