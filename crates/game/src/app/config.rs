use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use adventure_engine::{LoopConfig, ScriptedInputEvent, SceneKey, SolverOptions, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub(crate) const CONFIG_ENV_VAR: &str = "ADVENTURE_CONFIG";

/// Contents of `config/game.json`. Every field is optional; missing ones
/// fall back to [`GameConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub start_scene: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_ticks: u64,
    pub enabled_mods: Vec<String>,
    pub solver: SolverOptions,
    /// Timed input replayed by the headless runner.
    pub script: Vec<ScriptStep>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            start_scene: "harbor".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_ticks: 600,
            enabled_mods: Vec::new(),
            solver: SolverOptions::default(),
            script: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum ScriptStep {
    /// Left click at a window pixel.
    Click { tick: u64, x: f32, y: f32 },
    /// Right click at a window pixel.
    Look { tick: u64, x: f32, y: f32 },
    Quit { tick: u64 },
}

impl ScriptStep {
    pub(crate) fn to_input_event(self) -> ScriptedInputEvent {
        match self {
            ScriptStep::Click { tick, x, y } => ScriptedInputEvent::LeftClick {
                tick,
                position_px: Vec2::new(x, y),
            },
            ScriptStep::Look { tick, x, y } => ScriptedInputEvent::RightClick {
                tick,
                position_px: Vec2::new(x, y),
            },
            ScriptStep::Quit { tick } => ScriptedInputEvent::Quit { tick },
        }
    }
}

impl GameConfig {
    pub(crate) fn loop_config(&self) -> LoopConfig {
        let target_tps = self.target_tps.max(1);
        LoopConfig {
            start_scene: SceneKey::new(self.start_scene.clone()),
            window_width: self.window_width,
            window_height: self.window_height,
            target_tps,
            frame_delta: Duration::from_secs_f64(1.0 / target_tps as f64),
            max_ticks: self.max_ticks,
            ..LoopConfig::default()
        }
    }

    pub(crate) fn script_events(&self) -> Vec<ScriptedInputEvent> {
        self.script.iter().map(|step| step.to_input_event()).collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.start_scene.trim().is_empty() {
            return Err(invalid("start_scene", "must not be empty"));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(invalid("window_width/window_height", "must be > 0"));
        }
        if self.target_tps == 0 {
            return Err(invalid("target_tps", "must be > 0"));
        }
        for (idx, step) in self.script.iter().enumerate() {
            let finite = match *step {
                ScriptStep::Click { x, y, .. } | ScriptStep::Look { x, y, .. } => {
                    x.is_finite() && y.is_finite()
                }
                ScriptStep::Quit { .. } => true,
            };
            if !finite {
                return Err(invalid(&format!("script[{idx}]"), "coordinates must be finite"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path} at {field_path}: {message}")]
    Parse {
        path: PathBuf,
        field_path: String,
        message: String,
    },
    #[error("invalid config value at {field}: {message}")]
    Invalid { field: String, message: String },
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// `ADVENTURE_CONFIG` names an explicit file that must exist; otherwise the
/// default path is optional.
pub(crate) fn load_game_config(default_path: &Path) -> Result<GameConfig, ConfigError> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => load_game_config_from(Path::new(&path), true),
        _ => load_game_config_from(default_path, false),
    }
}

pub(crate) fn load_game_config_from(
    path: &Path,
    required: bool,
) -> Result<GameConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound && !required => {
            info!(path = %path.display(), "config_defaults");
            return Ok(GameConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let config = parse_game_config(&raw, path)?;
    info!(
        path = %path.display(),
        start_scene = %config.start_scene,
        script_steps = config.script.len(),
        "config_loaded"
    );
    Ok(config)
}

pub(crate) fn parse_game_config(raw: &str, path: &Path) -> Result<GameConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config = serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer).map_err(
        |error| {
            let field_path = error.path().to_string();
            let source = error.into_inner();
            ConfigError::Parse {
                path: path.to_path_buf(),
                field_path: if field_path.is_empty() {
                    ".".to_string()
                } else {
                    field_path
                },
                message: source.to_string(),
            }
        },
    )?;
    config.validate()?;
    Ok(config)
}
