use adventure_engine::{
    load_scene_database, resolve_app_paths, ContentLoadError, ContentLoadRequest, LoopConfig,
    Scene, SceneDatabase, SceneKey, ScriptedInput, StartupError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_game_config, ConfigError, GameConfig};
use super::gameplay;

const ENABLED_MODS_ENV_VAR: &str = "ADVENTURE_ENABLED_MODS";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scenes: Vec<(SceneKey, Box<dyn Scene>)>,
    pub(crate) input: ScriptedInput,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Content(#[from] ContentLoadError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Adventure Startup ===");

    let app_paths = resolve_app_paths()?;
    info!(root = %app_paths.root.display(), "app_paths_resolved");

    let game_config = load_game_config(&app_paths.config_path)?;
    let request = ContentLoadRequest {
        enabled_mods: parse_enabled_mods_from_env()
            .unwrap_or_else(|| game_config.enabled_mods.clone()),
    };
    let database = load_scene_database(&app_paths, &request)?;

    Ok(wire(&game_config, &database))
}

fn wire(game_config: &GameConfig, database: &SceneDatabase) -> AppWiring {
    AppWiring {
        config: game_config.loop_config(),
        scenes: gameplay::build_scenes(database, game_config.solver),
        input: ScriptedInput::new(game_config.script_events()),
    }
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

/// `None` when the variable is unset, so the config file's list applies.
fn parse_enabled_mods_from_env() -> Option<Vec<String>> {
    std::env::var(ENABLED_MODS_ENV_VAR)
        .ok()
        .map(|raw| parse_enabled_mods(&raw))
}

fn parse_enabled_mods(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use adventure_engine::AppPaths;
    use tempfile::TempDir;

    use super::*;
    use crate::app::config::{load_game_config_from, ScriptStep};

    fn repo_root() -> std::path::PathBuf {
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
    }

    #[test]
    fn enabled_mods_are_split_and_trimmed() {
        assert_eq!(
            parse_enabled_mods(" night , ,extra"),
            vec!["night".to_string(), "extra".to_string()]
        );
        assert!(parse_enabled_mods("").is_empty());
    }

    #[test]
    fn wiring_registers_every_scene_and_script() {
        let temp = TempDir::new().expect("tempdir");
        let app_paths = AppPaths::from_root(temp.path());
        fs::create_dir_all(&app_paths.base_content_dir).expect("base");
        fs::write(
            app_paths.base_content_dir.join("scenes.xml"),
            r#"<Scenes>
                <SceneDef><name>harbor</name><enablePathfinding>false</enablePathfinding></SceneDef>
                <SceneDef><name>town</name><enablePathfinding>false</enablePathfinding></SceneDef>
            </Scenes>"#,
        )
        .expect("write");
        let database =
            load_scene_database(&app_paths, &ContentLoadRequest::default()).expect("load");

        let mut game_config = GameConfig::default();
        game_config.script = vec![ScriptStep::Quit { tick: 5 }];
        let wiring = wire(&game_config, &database);

        let keys = wiring
            .scenes
            .iter()
            .map(|(key, _)| key.as_str().to_string())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["harbor".to_string(), "town".to_string()]);
        assert_eq!(wiring.config.start_scene, SceneKey::new("harbor"));
        assert_eq!(wiring.input.remaining_events(), 1);
    }

    #[test]
    fn shipped_config_and_scenes_load_together() {
        let app_paths = AppPaths::from_root(repo_root());
        let game_config = load_game_config_from(&app_paths.config_path, true).expect("config");
        let database = load_scene_database(
            &app_paths,
            &ContentLoadRequest {
                enabled_mods: game_config.enabled_mods.clone(),
            },
        )
        .expect("scenes");

        assert!(database.scene_by_name(&game_config.start_scene).is_some());
        assert!(database.scene_by_name("town").is_some());
        let wiring = wire(&game_config, &database);
        assert_eq!(wiring.scenes.len(), database.len());
        assert_eq!(wiring.input.remaining_events(), game_config.script.len());
    }
}
