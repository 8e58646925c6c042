use adventure_engine::{
    screen_to_world_px, CharacterKind, CharacterSpawn, EntityId, InputSnapshot, Movable, Scene,
    SceneCommand, SceneDatabase, SceneDef, SceneError, SceneKey, SceneWorld, SolverOptions, Vec2,
    WalkOutcome,
};
use tracing::{debug, info};

/// World-unit radius around a character's feet that counts as clicking it.
const CHARACTER_PICK_RADIUS: f32 = 24.0;
/// How far from an NPC the player stops before talking.
const TALK_DISTANCE: f32 = 32.0;

include!("types.rs");
include!("scene_impl.rs");
include!("util.rs");

/// One scene per definition, keyed by scene name.
pub(crate) fn build_scenes(
    database: &SceneDatabase,
    solver: SolverOptions,
) -> Vec<(SceneKey, Box<dyn Scene>)> {
    database
        .scenes()
        .iter()
        .map(|def| {
            let scene: Box<dyn Scene> = Box::new(AdventureScene::new(def.clone(), solver));
            (SceneKey::new(def.name.clone()), scene)
        })
        .collect()
}
