use crate::nav::NavPath;

use super::{EntityId, Vec2};

/// Distance under which a walker counts as standing on a waypoint.
pub const ARRIVAL_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterKind {
    Player,
    Npc,
}

/// Anything the scene can send along a navigation path.
pub trait Movable {
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);
    /// World units per second.
    fn walk_speed(&self) -> f32;
    fn follow_path(&mut self, path: NavPath);
    fn stop(&mut self);
    fn is_walking(&self) -> bool;
    /// Moves along the current path. Returns true on the tick the final
    /// waypoint is reached.
    fn advance(&mut self, fixed_dt_seconds: f32) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSpawn {
    pub name: String,
    pub kind: CharacterKind,
    pub position: Vec2,
    pub walk_speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    id: EntityId,
    name: String,
    kind: CharacterKind,
    position: Vec2,
    walk_speed: f32,
    route: Option<NavPath>,
    next_waypoint: usize,
    pub(crate) applied_spawn_order: u64,
}

impl Character {
    pub(crate) fn from_spawn(id: EntityId, spawn: CharacterSpawn) -> Self {
        Self {
            id,
            name: spawn.name,
            kind: spawn.kind,
            position: spawn.position,
            walk_speed: spawn.walk_speed.max(0.0),
            route: None,
            next_waypoint: 0,
            applied_spawn_order: 0,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CharacterKind {
        self.kind
    }

    pub fn is_player(&self) -> bool {
        self.kind == CharacterKind::Player
    }

    /// Waypoints not yet reached, in walking order.
    pub fn remaining_waypoints(&self) -> &[Vec2] {
        match &self.route {
            Some(route) => &route.waypoints()[self.next_waypoint.min(route.waypoint_count())..],
            None => &[],
        }
    }

    pub fn destination(&self) -> Option<Vec2> {
        self.route.as_ref().map(NavPath::last)
    }
}

impl Movable for Character {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn walk_speed(&self) -> f32 {
        self.walk_speed
    }

    fn follow_path(&mut self, path: NavPath) {
        self.route = Some(path);
        self.next_waypoint = 0;
    }

    fn stop(&mut self) {
        self.route = None;
        self.next_waypoint = 0;
    }

    fn is_walking(&self) -> bool {
        self.route.is_some()
    }

    fn advance(&mut self, fixed_dt_seconds: f32) -> bool {
        let Some(route) = &self.route else {
            return false;
        };

        // Leftover step budget carries over to the next waypoint so speed is
        // independent of how densely the path is sampled.
        let mut budget = self.walk_speed * fixed_dt_seconds;
        while let Some(&target) = route.waypoints().get(self.next_waypoint) {
            let distance = self.position.distance(target);
            if distance <= budget || distance <= ARRIVAL_THRESHOLD {
                self.position = target;
                budget = (budget - distance).max(0.0);
                self.next_waypoint += 1;
                continue;
            }
            let (next, _) = step_toward(self.position, target, budget, 1.0, ARRIVAL_THRESHOLD);
            self.position = next;
            return false;
        }

        self.route = None;
        self.next_waypoint = 0;
        true
    }
}

pub fn step_toward(
    current: Vec2,
    target: Vec2,
    speed: f32,
    fixed_dt_seconds: f32,
    arrival_threshold: f32,
) -> (Vec2, bool) {
    let dx = target.x - current.x;
    let dy = target.y - current.y;
    let distance_sq = dx * dx + dy * dy;
    let threshold_sq = arrival_threshold * arrival_threshold;
    if distance_sq <= threshold_sq {
        return (target, true);
    }

    let distance = distance_sq.sqrt();
    let max_step = speed * fixed_dt_seconds;
    if max_step >= distance {
        return (target, true);
    }

    let inv_distance = distance.recip();
    (
        Vec2 {
            x: current.x + dx * inv_distance * max_step,
            y: current.y + dy * inv_distance * max_step,
        },
        false,
    )
}
