#[derive(Debug, Clone, Copy)]
pub(crate) struct ControllerRig {
    pub(crate) anchor: EntityId,
    pub(crate) grabber: EntityId,
}

/// Entity handles for the chemistry bench.
#[derive(Debug, Clone)]
pub(crate) struct Scenario {
    pub(crate) cylinders: Vec<(String, EntityId)>,
    pub(crate) clipboard: EntityId,
    pub(crate) extinguisher: EntityId,
    pub(crate) pointer: ControllerRig,
    pub(crate) left: ControllerRig,
    pub(crate) right: ControllerRig,
}

impl Scenario {
    #[cfg(test)]
    pub(crate) fn cylinder(&self, label: &str) -> Option<EntityId> {
        self.cylinders
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, entity)| *entity)
    }

    pub(crate) fn controller(&self, hand: Handedness) -> ControllerRig {
        match hand {
            Handedness::Left => self.left,
            Handedness::Right => self.right,
        }
    }
}

fn held_object_config() -> InteractableConfig {
    InteractableConfig::default()
        .with_default_pose(Pose {
            offset: POINTER_HOLD_OFFSET,
            rotation_euler: Vec3::ZERO,
        })
        .with_mode_pose(
            Mode::Xr,
            Pose {
                offset: XR_HOLD_OFFSET,
                rotation_euler: Vec3::ZERO,
            },
        )
}

fn spawn_controller(world: &mut SimWorld, name: &str, spawn: Vec3) -> ControllerRig {
    let anchor = world.spawn(name, spawn, CONTROLLER_RADIUS);
    let grabber = world.spawn(
        &format!("{name}_grabber"),
        spawn + CONTROLLER_GRABBER_OFFSET,
        CONTROLLER_GRABBER_RADIUS,
    );
    world.attach_to(
        grabber,
        anchor,
        Pose {
            offset: CONTROLLER_GRABBER_OFFSET,
            rotation_euler: Vec3::ZERO,
        },
    );
    ControllerRig { anchor, grabber }
}

/// Spawns the bench and wires every entity and selector into the session.
pub(crate) fn spawn_scenario(world: &mut SimWorld, session: &mut Session) -> Scenario {
    let mut cylinders = Vec::with_capacity(CYLINDER_SPAWNS.len());
    for (label, position) in CYLINDER_SPAWNS {
        let entity = world.spawn(
            &format!("cylinder_{}", label.to_ascii_lowercase()),
            position,
            CYLINDER_RADIUS,
        );
        session.add_cylinder(entity, label, held_object_config(), world);
        cylinders.push((label.to_string(), entity));
    }

    let clipboard = world.spawn("clipboard", CLIPBOARD_SPAWN, PROP_RADIUS);
    session.add_prop(clipboard, held_object_config(), world);
    let extinguisher = world.spawn("extinguisher", EXTINGUISHER_SPAWN, PROP_RADIUS);
    session.add_extinguisher(extinguisher, held_object_config(), world);

    let pointer = ControllerRig {
        anchor: world.spawn("pointer_anchor", POINTER_ANCHOR_SPAWN, POINTER_RADIUS),
        grabber: world.spawn("pointer_reticle", POINTER_RETICLE_SPAWN, POINTER_RADIUS),
    };
    let left = spawn_controller(world, "left_controller", LEFT_CONTROLLER_SPAWN);
    let right = spawn_controller(world, "right_controller", RIGHT_CONTROLLER_SPAWN);

    let interaction = session.interaction_mut();
    interaction.register_selector(
        SelectorDevice::Pointer,
        pointer.anchor,
        pointer.grabber,
        &[Mode::Desktop, Mode::Mobile],
    );
    for (hand, rig) in [(Handedness::Left, left), (Handedness::Right, right)] {
        interaction.register_selector(
            SelectorDevice::Controller(hand),
            rig.anchor,
            rig.grabber,
            &[Mode::Xr],
        );
    }

    info!(
        cylinders = cylinders.len(),
        selectors = interaction.selectors().len(),
        "scenario_spawned"
    );
    Scenario {
        cylinders,
        clipboard,
        extinguisher,
        pointer,
        left,
        right,
    }
}
