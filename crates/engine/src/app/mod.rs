mod character;
mod input;
mod loop_runner;
mod scene;
mod view;

pub use character::{
    step_toward, Character, CharacterKind, CharacterSpawn, Movable, ARRIVAL_THRESHOLD,
};
pub use input::{InputSnapshot, InputSource, ScriptedInput, ScriptedInputEvent};
pub use loop_runner::{run_app, AppError, LoopConfig, RunSummary};
pub use scene::{
    Camera2D, EntityId, Scene, SceneCommand, SceneError, SceneKey, SceneLayout,
    SceneRegistryError, SceneWorld, Vec2, WalkOutcome,
};
pub use view::{screen_to_world_px, world_to_screen_px, DisplayTransform, LogicalSize, Viewport};
