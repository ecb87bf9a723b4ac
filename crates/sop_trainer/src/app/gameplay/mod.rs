use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sop_core::{
    Animation, EntityId, FeedCommand, Handedness, InputSignal, InteractableConfig, Mode, Pose,
    Presentation, ScheduledFeed, SelectorDevice, Session, SteppedWorld, Task, TaskStatus,
    TouchButton, Vec3, WorldEngine, WorldSignal, XrComponent,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::event::{ElementState, MouseButton};

const POUR_ANIMATION_SECONDS: f32 = 1.5;
const RESPAWN_ANIMATION_SECONDS: f32 = 0.5;
const MAX_PARENT_DEPTH: usize = 8;
const XR_PRESSED_THRESHOLD: f32 = 0.5;

const CYLINDER_RADIUS: f32 = 0.1;
const CYLINDER_SPAWNS: [(&str, Vec3); 3] = [
    ("A", Vec3::new(-0.6, 1.0, 0.0)),
    ("B", Vec3::new(0.0, 1.0, 0.0)),
    ("C", Vec3::new(0.6, 1.0, 0.0)),
];
const CLIPBOARD_SPAWN: Vec3 = Vec3::new(1.2, 1.0, 0.0);
const EXTINGUISHER_SPAWN: Vec3 = Vec3::new(-1.4, 0.5, 0.0);
const PROP_RADIUS: f32 = 0.15;

const POINTER_ANCHOR_SPAWN: Vec3 = Vec3::new(0.0, 1.6, 1.5);
const POINTER_RETICLE_SPAWN: Vec3 = Vec3::new(0.0, 1.6, 1.0);
const POINTER_RADIUS: f32 = 0.05;
/// Held objects float in front of and below the camera on desktop/mobile.
const POINTER_HOLD_OFFSET: Vec3 = Vec3::new(0.0, -0.3, -0.6);

const CONTROLLER_RADIUS: f32 = 0.03;
const CONTROLLER_GRABBER_RADIUS: f32 = 0.06;
const CONTROLLER_GRABBER_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -0.05);
const XR_HOLD_OFFSET: Vec3 = Vec3::new(0.0, -0.1, 0.0);
const LEFT_CONTROLLER_SPAWN: Vec3 = Vec3::new(-0.3, 1.2, 0.6);
const RIGHT_CONTROLLER_SPAWN: Vec3 = Vec3::new(0.3, 1.2, 0.6);

include!("sim_world.rs");
include!("scenario.rs");
include!("script.rs");
include!("presentation.rs");

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
