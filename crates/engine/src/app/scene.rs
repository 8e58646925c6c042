use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::nav::{
    Bounds, NavError, NavPath, NavigationGrid, NavigationSettings, SceneNavigation, WalkableArea,
};

use super::character::{Character, CharacterSpawn, Movable, ARRIVAL_THRESHOLD};
use super::input::InputSnapshot;
use super::view::LogicalSize;

/// Scene identifier; scenes are registered and switched by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneKey(String);

impl SceneKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    HardResetTo(SceneKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        Vec2 {
            x: other.x - self.x,
            y: other.y - self.y,
        }
        .length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// `position` is the world-space point shown at the top-left corner of the
/// logical view.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
}

impl Camera2D {
    pub fn view_to_world(&self, view: Vec2) -> Vec2 {
        Vec2 {
            x: view.x + self.position.x,
            y: view.y + self.position.y,
        }
    }

    pub fn world_to_view(&self, world: Vec2) -> Vec2 {
        Vec2 {
            x: world.x - self.position.x,
            y: world.y - self.position.y,
        }
    }

    /// Keeps the view inside the scene. A scene narrower than the view pins
    /// the camera to the scene's minimum edge.
    pub fn clamp_to_scene(&mut self, world: Bounds, view: LogicalSize) {
        let max_x = (world.max.x - view.width as f32).max(world.min.x);
        let max_y = (world.max.y - view.height as f32).max(world.min.y);
        self.position.x = self.position.x.clamp(world.min.x, max_x);
        self.position.y = self.position.y.clamp(world.min.y, max_y);
    }

    pub fn center_on(&mut self, target: Vec2, world: Bounds, view: LogicalSize) {
        self.position = Vec2 {
            x: target.x - view.width as f32 * 0.5,
            y: target.y - view.height as f32 * 0.5,
        };
        self.clamp_to_scene(world, view);
    }
}

/// Scene dimensions: the logical view size and the (possibly larger,
/// scrolling) world extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLayout {
    pub logical_size: LogicalSize,
    pub world_bounds: Bounds,
}

impl SceneLayout {
    pub fn new(logical_size: LogicalSize, world_width: f32, world_height: f32) -> Self {
        Self {
            logical_size,
            world_bounds: Bounds::from_size(world_width, world_height),
        }
    }
}

impl Default for SceneLayout {
    fn default() -> Self {
        let logical_size = LogicalSize::default();
        Self::new(
            logical_size,
            logical_size.width as f32,
            logical_size.height as f32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Started,
    AlreadyThere,
    Unreachable,
    UnknownCharacter,
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene '{scene}' has an invalid navigation setup: {source}")]
    Navigation {
        scene: String,
        #[source]
        source: NavError,
    },
    #[error("scene '{scene}' failed to load: {message}")]
    Load { scene: String, message: String },
    #[error("scene '{scene}' is not registered")]
    UnknownScene { scene: SceneKey },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneRegistryError {
    #[error("no scenes registered")]
    Empty,
    #[error("scene '{key}' registered more than once")]
    DuplicateScene { key: SceneKey },
    #[error("start scene '{key}' is not registered")]
    UnknownStartScene { key: SceneKey },
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Per-scene state handed to a [`Scene`]: layout, camera, navigation and
/// characters. Spawns and despawns are deferred until `apply_pending`.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    characters: Vec<Character>,
    pending_spawns: Vec<Character>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    camera: Camera2D,
    layout: SceneLayout,
    navigation: SceneNavigation,
}

impl SceneWorld {
    /// Installs layout and walkable area. Walkable regions must lie inside
    /// the world bounds. With pathfinding enabled the grid is built here, so
    /// configuration errors surface at scene load rather than on the first
    /// click.
    pub fn configure(
        &mut self,
        layout: SceneLayout,
        area: WalkableArea,
        settings: NavigationSettings,
    ) -> Result<(), NavError> {
        let mut navigation = SceneNavigation::new(area, settings)?;
        navigation.confine_to(layout.world_bounds)?;
        if settings.enable_pathfinding {
            navigation.setup_navigation()?;
        }
        self.layout = layout;
        self.navigation = navigation;
        self.camera
            .clamp_to_scene(layout.world_bounds, layout.logical_size);
        Ok(())
    }

    pub fn layout(&self) -> SceneLayout {
        self.layout
    }

    pub fn setup_navigation(&mut self) -> Result<Arc<NavigationGrid>, NavError> {
        self.navigation.setup_navigation()
    }

    /// Endpoints are clamped into the scene's world bounds first; `None`
    /// means no walkable route exists.
    pub fn find_path(
        &mut self,
        start_x: f32,
        start_y: f32,
        end_x: f32,
        end_y: f32,
    ) -> Option<NavPath> {
        let bounds = self.layout.world_bounds;
        let start = bounds.clamp(Vec2::new(start_x, start_y));
        let end = bounds.clamp(Vec2::new(end_x, end_y));
        self.navigation.find_path(start, end)
    }

    pub fn walkable_area(&self) -> &WalkableArea {
        self.navigation.area()
    }

    pub fn navigation_settings(&self) -> NavigationSettings {
        self.navigation.settings()
    }

    pub fn navigation(&self) -> &SceneNavigation {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut SceneNavigation {
        &mut self.navigation
    }

    pub fn spawn_character(&mut self, spawn: CharacterSpawn) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Character::from_spawn(id, spawn));
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.characters.iter().any(|character| character.id() == id);
        let pending_spawn = self
            .pending_spawns
            .iter()
            .any(|character| character.id() == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_spawns.is_empty() {
            for mut character in self.pending_spawns.drain(..) {
                character.applied_spawn_order = self.next_applied_spawn_order;
                self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
                self.characters.push(character);
            }
        }

        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.characters
                .retain(|character| pending.binary_search(&character.id()).is_err());
            self.pending_despawns.clear();
        }
    }

    pub fn clear(&mut self) {
        self.characters.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera2D::default();
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn character(&self, id: EntityId) -> Option<&Character> {
        self.characters.iter().find(|character| character.id() == id)
    }

    pub fn character_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.characters
            .iter_mut()
            .find(|character| character.id() == id)
    }

    pub fn player(&self) -> Option<&Character> {
        self.characters.iter().find(|character| character.is_player())
    }

    /// Topmost (most recently spawned) character within `radius` of `point`.
    pub fn character_at(&self, point: Vec2, radius: f32) -> Option<EntityId> {
        self.characters
            .iter()
            .filter(|character| character.position().distance(point) <= radius)
            .max_by_key(|character| character.applied_spawn_order)
            .map(Character::id)
    }

    /// Plans a route from the character's position to `target` and starts
    /// walking it.
    pub fn walk_to(&mut self, id: EntityId, target: Vec2) -> WalkOutcome {
        let Some(start) = self.character(id).map(|character| character.position()) else {
            return WalkOutcome::UnknownCharacter;
        };
        let path = self.find_path(start.x, start.y, target.x, target.y);
        let Some(character) = self.character_mut(id) else {
            return WalkOutcome::UnknownCharacter;
        };

        match path {
            None => {
                character.stop();
                debug!(
                    character = character.name(),
                    target_x = target.x,
                    target_y = target.y,
                    "walk_unreachable"
                );
                WalkOutcome::Unreachable
            }
            Some(path) if path.length() <= ARRIVAL_THRESHOLD => {
                character.stop();
                WalkOutcome::AlreadyThere
            }
            Some(path) => {
                debug!(
                    character = character.name(),
                    waypoints = path.waypoint_count(),
                    length = path.length(),
                    "walk_started"
                );
                character.follow_path(path);
                WalkOutcome::Started
            }
        }
    }

    /// Advances every walking character; returns those that arrived.
    pub fn advance_characters(&mut self, fixed_dt_seconds: f32) -> Vec<EntityId> {
        let mut arrived = Vec::new();
        for character in &mut self.characters {
            if character.advance(fixed_dt_seconds) {
                arrived.push(character.id());
            }
        }
        arrived
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn center_camera_on(&mut self, target: Vec2) {
        self.camera.center_on(
            target,
            self.layout.world_bounds,
            self.layout.logical_size,
        );
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld) -> Result<(), SceneError>;
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

struct SceneRuntime {
    key: SceneKey,
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    fn load(&mut self) -> Result<(), SceneError> {
        let (scene, world) = (&mut self.scene, &mut self.world);
        scene.load(world)?;
        self.is_loaded = true;
        Ok(())
    }

    fn unload(&mut self) {
        let (scene, world) = (&mut self.scene, &mut self.world);
        scene.unload(world);
        self.world.clear();
        self.is_loaded = false;
    }
}

/// Owns every registered scene and its world. Only the active scene is
/// updated; inactive worlds are frozen until switched back to.
pub(crate) struct SceneMachine {
    runtimes: Vec<SceneRuntime>,
    active: usize,
}

impl SceneMachine {
    pub(crate) fn new(
        scenes: Vec<(SceneKey, Box<dyn Scene>)>,
        active_scene: &SceneKey,
    ) -> Result<Self, SceneRegistryError> {
        if scenes.is_empty() {
            return Err(SceneRegistryError::Empty);
        }
        let mut runtimes = Vec::<SceneRuntime>::with_capacity(scenes.len());
        for (key, scene) in scenes {
            if runtimes.iter().any(|runtime| runtime.key == key) {
                return Err(SceneRegistryError::DuplicateScene { key });
            }
            runtimes.push(SceneRuntime {
                key,
                scene,
                world: SceneWorld::default(),
                is_loaded: false,
            });
        }
        let active = runtimes
            .iter()
            .position(|runtime| &runtime.key == active_scene)
            .ok_or_else(|| SceneRegistryError::UnknownStartScene {
                key: active_scene.clone(),
            })?;
        Ok(Self { runtimes, active })
    }

    pub(crate) fn active_scene(&self) -> &SceneKey {
        &self.runtimes[self.active].key
    }

    pub(crate) fn load_active(&mut self) -> Result<(), SceneError> {
        let runtime = &mut self.runtimes[self.active];
        if runtime.is_loaded {
            return Ok(());
        }
        runtime.load()
    }

    pub(crate) fn update_active(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> SceneCommand {
        let runtime = &mut self.runtimes[self.active];
        let (scene, world) = (&mut runtime.scene, &mut runtime.world);
        scene.update(fixed_dt_seconds, input, world)
    }

    pub(crate) fn apply_pending_active(&mut self) {
        self.runtimes[self.active].world.apply_pending();
    }

    pub(crate) fn active_world(&self) -> &SceneWorld {
        &self.runtimes[self.active].world
    }

    #[cfg(test)]
    pub(crate) fn active_world_mut(&mut self) -> &mut SceneWorld {
        &mut self.runtimes[self.active].world
    }

    pub(crate) fn debug_title_active(&self) -> Option<String> {
        let runtime = &self.runtimes[self.active];
        runtime.scene.debug_title(&runtime.world)
    }

    pub(crate) fn switch_to(&mut self, next_scene: &SceneKey) -> Result<bool, SceneError> {
        let next = self.index_of(next_scene)?;
        if next == self.active {
            return Ok(false);
        }

        if !self.runtimes[next].is_loaded {
            self.runtimes[next].load()?;
            info!(scene = %next_scene, "scene_loaded");
        }
        self.active = next;
        Ok(true)
    }

    pub(crate) fn hard_reset_to(&mut self, next_scene: &SceneKey) -> Result<bool, SceneError> {
        let next = self.index_of(next_scene)?;
        let runtime = &mut self.runtimes[next];
        if runtime.is_loaded {
            runtime.unload();
        }
        runtime.world.clear();
        runtime.load()?;
        let changed = self.active != next;
        self.active = next;
        Ok(changed)
    }

    pub(crate) fn shutdown_all(&mut self) {
        for runtime in &mut self.runtimes {
            if runtime.is_loaded {
                runtime.unload();
                debug!(scene = %runtime.key, "scene_unloaded");
            }
        }
    }

    fn index_of(&self, key: &SceneKey) -> Result<usize, SceneError> {
        self.runtimes
            .iter()
            .position(|runtime| &runtime.key == key)
            .ok_or_else(|| SceneError::UnknownScene { scene: key.clone() })
    }
}
