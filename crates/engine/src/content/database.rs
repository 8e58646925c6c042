use std::collections::HashMap;
use std::path::PathBuf;

use crate::app::{LogicalSize, SceneLayout, Vec2};
use crate::nav::{Bounds, NavigationSettings, SolverOptions, WalkableArea};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneDefId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterDef {
    pub name: String,
    pub position: Vec2,
    pub walk_speed: f32,
    pub player: bool,
}

/// Clickable hotspot leading to another scene. The walker first goes to
/// `walk_to`, then the scene switches.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitDef {
    pub name: String,
    pub target_scene: String,
    pub hotspot: Bounds,
    pub walk_to: Vec2,
}

#[derive(Debug, Clone)]
pub struct SceneDef {
    pub id: SceneDefId,
    pub name: String,
    pub logical_size: LogicalSize,
    pub world_width: f32,
    pub world_height: f32,
    pub enable_pathfinding: bool,
    pub navigation_cell_size: u32,
    pub walkable_area: WalkableArea,
    pub characters: Vec<CharacterDef>,
    pub exits: Vec<ExitDef>,
    pub mod_id: String,
    pub source_file: PathBuf,
}

impl SceneDef {
    pub fn layout(&self) -> SceneLayout {
        SceneLayout::new(self.logical_size, self.world_width, self.world_height)
    }

    pub fn navigation_settings(&self, solver: SolverOptions) -> NavigationSettings {
        NavigationSettings {
            enable_pathfinding: self.enable_pathfinding,
            cell_size: self.navigation_cell_size,
            solver,
        }
    }

    pub fn exit_at(&self, point: Vec2) -> Option<&ExitDef> {
        self.exits.iter().rev().find(|exit| exit.hotspot.contains(point))
    }
}

#[derive(Debug, Default, Clone)]
pub struct SceneDatabase {
    scenes: Vec<SceneDef>,
    scene_ids_by_name: HashMap<String, SceneDefId>,
}

impl SceneDatabase {
    pub(crate) fn from_scene_defs(mut scenes: Vec<SceneDef>) -> Self {
        let mut scene_ids_by_name = HashMap::with_capacity(scenes.len());
        for (idx, scene) in scenes.iter_mut().enumerate() {
            let id = SceneDefId(idx as u32);
            scene.id = id;
            scene_ids_by_name.insert(scene.name.clone(), id);
        }
        Self {
            scenes,
            scene_ids_by_name,
        }
    }

    pub fn scene_id_by_name(&self, name: &str) -> Option<SceneDefId> {
        self.scene_ids_by_name.get(name).copied()
    }

    pub fn scene(&self, id: SceneDefId) -> Option<&SceneDef> {
        self.scenes.get(id.0 as usize)
    }

    pub fn scene_by_name(&self, name: &str) -> Option<&SceneDef> {
        self.scene_id_by_name(name).and_then(|id| self.scene(id))
    }

    /// Sorted by scene name.
    pub fn scenes(&self) -> &[SceneDef] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
