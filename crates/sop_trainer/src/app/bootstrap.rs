use std::env;
use std::path::PathBuf;

use sop_core::{
    resolve_app_paths, AppPaths, InteractionConfig, LoopConfig, Mode, SessionConfig,
    StartupError, XrMovement, DEFAULT_SQUEEZE_DRAG_THRESHOLD,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MODE_ENV_VAR: &str = "SOPTRAINER_MODE";
const SCRIPT_ENV_VAR: &str = "SOPTRAINER_SCRIPT";
const REALTIME_ENV_VAR: &str = "SOPTRAINER_REALTIME";
const XR_DRAG_ENV_VAR: &str = "SOPTRAINER_XR_DRAG";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session_config: SessionConfig,
    pub(crate) mode: Mode,
    pub(crate) paths: AppPaths,
    pub(crate) script_path: PathBuf,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== SOP Trainer Startup ===");

    let paths = resolve_app_paths()?;
    let mode = parse_mode(read_env(MODE_ENV_VAR).as_deref());
    let script_name =
        read_env(SCRIPT_ENV_VAR).unwrap_or_else(|| default_script_for(mode).to_string());
    let config = LoopConfig {
        realtime: parse_flag(read_env(REALTIME_ENV_VAR).as_deref()),
        ..LoopConfig::default()
    };
    let session_config = session_config_for(read_env(XR_DRAG_ENV_VAR).as_deref());

    Ok(AppWiring {
        script_path: paths.scripts_dir.join(script_name),
        config,
        session_config,
        mode,
        paths,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn read_env(var: &'static str) -> Option<String> {
    match env::var(var) {
        Ok(value) => Some(value),
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(env_var = var, error = %err, "unable to read env var; using default");
            None
        }
    }
}

fn parse_mode(raw: Option<&str>) -> Mode {
    let Some(raw) = raw else {
        return Mode::Desktop;
    };
    match Mode::from_token(raw) {
        Some(Mode::Loading) | None => {
            warn!(
                env_var = MODE_ENV_VAR,
                value = raw,
                "expected desktop, mobile or xr; falling back to desktop"
            );
            Mode::Desktop
        }
        Some(mode) => mode,
    }
}

fn default_script_for(mode: Mode) -> &'static str {
    match mode {
        Mode::Mobile => "mobile_out_of_order.json",
        Mode::Xr => "xr_pour_in_order.json",
        Mode::Desktop | Mode::Loading => "desktop_pour_in_order.json",
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|value| value.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

fn session_config_for(xr_drag: Option<&str>) -> SessionConfig {
    SessionConfig {
        interaction: InteractionConfig {
            xr_movement: parse_xr_movement(xr_drag),
        },
        ..SessionConfig::default()
    }
}

/// Unset keeps controller parenting. A bare flag enables squeeze-drag at
/// the default threshold, a number in (0, 1] sets the threshold.
fn parse_xr_movement(raw: Option<&str>) -> XrMovement {
    let Some(raw) = raw else {
        return XrMovement::AttachToController;
    };
    if parse_flag(Some(raw)) {
        return XrMovement::SqueezeDrag {
            threshold: DEFAULT_SQUEEZE_DRAG_THRESHOLD,
        };
    }
    match raw.trim().parse::<f32>() {
        Ok(threshold) if threshold > 0.0 && threshold <= 1.0 => {
            XrMovement::SqueezeDrag { threshold }
        }
        _ => {
            warn!(
                env_var = XR_DRAG_ENV_VAR,
                value = raw,
                "invalid squeeze-drag threshold; keeping controller parenting"
            );
            XrMovement::AttachToController
        }
    }
}
