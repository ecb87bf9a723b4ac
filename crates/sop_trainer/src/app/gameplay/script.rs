#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScriptPointerButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScriptButtonState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScriptTouchButton {
    Grab,
    Use,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScriptHand {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScriptXrComponent {
    Squeeze,
    Trigger,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ScriptAction {
    Pointer {
        button: ScriptPointerButton,
        state: ScriptButtonState,
    },
    Touch {
        button: ScriptTouchButton,
        pressed: bool,
    },
    Xr {
        hand: ScriptHand,
        component: ScriptXrComponent,
        value: f32,
        #[serde(default)]
        pressed: Option<bool>,
    },
    XrPose {
        hand: ScriptHand,
        position: [f32; 3],
    },
    Move {
        entity: String,
        position: [f32; 3],
    },
    SwitchMode {
        mode: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptStep {
    tick: u64,
    action: ScriptAction,
}

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("read input script '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse input script at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("steps[{index}]: unknown entity '{name}'")]
    UnknownEntity { index: usize, name: String },
    #[error("steps[{index}]: unknown mode '{mode}'")]
    UnknownMode { index: usize, mode: String },
    #[error("steps[{index}]: position must be finite")]
    NonFinitePosition { index: usize },
}

impl From<ScriptHand> for Handedness {
    fn from(hand: ScriptHand) -> Self {
        match hand {
            ScriptHand::Left => Handedness::Left,
            ScriptHand::Right => Handedness::Right,
        }
    }
}

fn parse_script_steps(raw: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, Vec<ScriptStep>>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        ScriptError::Parse {
            path,
            source: error.into_inner(),
        }
    })
}

fn to_vec3(index: usize, [x, y, z]: [f32; 3]) -> Result<Vec3, ScriptError> {
    let position = Vec3::new(x, y, z);
    if position.is_finite() {
        Ok(position)
    } else {
        Err(ScriptError::NonFinitePosition { index })
    }
}

fn compile_step(
    index: usize,
    action: ScriptAction,
    scenario: &Scenario,
    world: &SimWorld,
) -> Result<FeedCommand, ScriptError> {
    let command = match action {
        ScriptAction::Pointer { button, state } => FeedCommand::Input(InputSignal::Pointer {
            button: match button {
                ScriptPointerButton::Left => MouseButton::Left,
                ScriptPointerButton::Right => MouseButton::Right,
                ScriptPointerButton::Middle => MouseButton::Middle,
            },
            state: match state {
                ScriptButtonState::Pressed => ElementState::Pressed,
                ScriptButtonState::Released => ElementState::Released,
            },
        }),
        ScriptAction::Touch { button, pressed } => FeedCommand::Input(InputSignal::Touch {
            button: match button {
                ScriptTouchButton::Grab => TouchButton::Grab,
                ScriptTouchButton::Use => TouchButton::Use,
            },
            pressed,
        }),
        ScriptAction::Xr {
            hand,
            component,
            value,
            pressed,
        } => FeedCommand::Input(InputSignal::Xr {
            hand: hand.into(),
            component: match component {
                ScriptXrComponent::Squeeze => XrComponent::Squeeze,
                ScriptXrComponent::Trigger => XrComponent::Trigger,
            },
            value,
            pressed: pressed.unwrap_or(value >= XR_PRESSED_THRESHOLD),
        }),
        ScriptAction::XrPose { hand, position } => FeedCommand::Place {
            entity: scenario.controller(hand.into()).anchor,
            position: to_vec3(index, position)?,
        },
        ScriptAction::Move { entity, position } => FeedCommand::Place {
            entity: world
                .entity_named(&entity)
                .ok_or(ScriptError::UnknownEntity {
                    index,
                    name: entity.clone(),
                })?,
            position: to_vec3(index, position)?,
        },
        ScriptAction::SwitchMode { mode } => FeedCommand::SwitchMode(
            Mode::from_token(&mode).ok_or(ScriptError::UnknownMode { index, mode })?,
        ),
    };
    Ok(command)
}

/// Parses a JSON input script and resolves entity names against the bench.
pub(crate) fn parse_script(
    raw: &str,
    scenario: &Scenario,
    world: &SimWorld,
) -> Result<ScheduledFeed, ScriptError> {
    let steps = parse_script_steps(raw)?;
    let mut commands = Vec::with_capacity(steps.len());
    for (index, step) in steps.into_iter().enumerate() {
        commands.push((step.tick, compile_step(index, step.action, scenario, world)?));
    }
    info!(steps = commands.len(), "input_script_loaded");
    Ok(ScheduledFeed::new(commands))
}

pub(crate) fn load_script(
    path: &Path,
    scenario: &Scenario,
    world: &SimWorld,
) -> Result<ScheduledFeed, ScriptError> {
    let raw = fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&raw, scenario, world)
}
