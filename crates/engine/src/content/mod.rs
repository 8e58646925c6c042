mod compiler;
mod database;
mod discovery;

pub use compiler::{load_scene_database, ContentErrorCode, ContentLoadError, SourceLocation};
pub use database::{CharacterDef, ExitDef, SceneDatabase, SceneDef, SceneDefId};
pub use discovery::{ContentLoadRequest, DiscoveryError};
