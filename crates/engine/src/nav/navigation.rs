use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::Vec2;

use super::grid::NavigationGrid;
use super::polygon::PolygonRegion;
use super::smooth::smooth_path;
use super::solver::{PathfindingSolver, SolverOptions};
use super::walkable::{Bounds, WalkableArea};
use super::NavError;

pub const DEFAULT_NAVIGATION_CELL_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationSettings {
    /// Build the grid eagerly when the scene is configured.
    pub enable_pathfinding: bool,
    pub cell_size: u32,
    pub solver: SolverOptions,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            enable_pathfinding: true,
            cell_size: DEFAULT_NAVIGATION_CELL_SIZE,
            solver: SolverOptions::default(),
        }
    }
}

impl NavigationSettings {
    pub fn validate(&self) -> Result<(), NavError> {
        if self.cell_size == 0 {
            return Err(NavError::InvalidCellSize { cell_size: 0 });
        }
        Ok(())
    }
}

/// Ordered world-space waypoints. Never empty: an unreachable destination is
/// represented by the absence of a `NavPath`, not by an empty one.
#[derive(Debug, Clone, PartialEq)]
pub struct NavPath {
    waypoints: Vec<Vec2>,
}

impl NavPath {
    pub fn new(waypoints: Vec<Vec2>) -> Option<Self> {
        if waypoints.is_empty() {
            return None;
        }
        Some(Self { waypoints })
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    pub fn first(&self) -> Vec2 {
        self.waypoints[0]
    }

    pub fn last(&self) -> Vec2 {
        self.waypoints[self.waypoints.len() - 1]
    }

    pub fn length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }

    pub fn into_waypoints(self) -> Vec<Vec2> {
        self.waypoints
    }
}

/// Owns a scene's walkable area and the grid rasterized from it.
///
/// The grid is never mutated in place: `setup_navigation` builds a new one
/// and swaps the `Arc`, so anyone still holding the previous grid keeps a
/// complete, consistent snapshot.
#[derive(Debug, Default)]
pub struct SceneNavigation {
    area: WalkableArea,
    settings: NavigationSettings,
    scene_bounds: Option<Bounds>,
    grid: Option<Arc<NavigationGrid>>,
}

impl SceneNavigation {
    pub fn new(area: WalkableArea, settings: NavigationSettings) -> Result<Self, NavError> {
        settings.validate()?;
        Ok(Self {
            area,
            settings,
            scene_bounds: None,
            grid: None,
        })
    }

    pub fn area(&self) -> &WalkableArea {
        &self.area
    }

    pub fn settings(&self) -> NavigationSettings {
        self.settings
    }

    /// Requires every walkable region, now and on later edits, to lie inside
    /// `bounds`. Obstacles may overhang.
    pub fn confine_to(&mut self, bounds: Bounds) -> Result<(), NavError> {
        for region in self.area.regions() {
            check_region_bounds(region, bounds)?;
        }
        self.scene_bounds = Some(bounds);
        Ok(())
    }

    pub fn scene_bounds(&self) -> Option<Bounds> {
        self.scene_bounds
    }

    pub fn add_region(&mut self, region: PolygonRegion) -> Result<(), NavError> {
        if let Some(bounds) = self.scene_bounds {
            check_region_bounds(&region, bounds)?;
        }
        self.area.add_region(region)?;
        self.invalidate();
        Ok(())
    }

    pub fn remove_region(&mut self, name: &str) -> Option<PolygonRegion> {
        let removed = self.area.remove_region(name)?;
        self.invalidate();
        Some(removed)
    }

    /// Returns false when the region is missing, or when it would become a
    /// walkable region outside the confining bounds.
    pub fn set_region_walkable(&mut self, name: &str, walkable: bool) -> bool {
        if let (true, Some(bounds), Some(region)) =
            (walkable, self.scene_bounds, self.area.region(name))
        {
            if !bounds.encloses(&region.bounds()) {
                return false;
            }
        }
        let revision = self.area.revision();
        if !self.area.set_region_walkable(name, walkable) {
            return false;
        }
        if self.area.revision() != revision {
            self.invalidate();
        }
        true
    }

    pub fn set_cell_size(&mut self, cell_size: u32) -> Result<(), NavError> {
        let settings = NavigationSettings {
            cell_size,
            ..self.settings
        };
        settings.validate()?;
        if settings != self.settings {
            self.settings = settings;
            self.invalidate();
        }
        Ok(())
    }

    /// Rasterizes the current area into a fresh grid and swaps it in.
    pub fn setup_navigation(&mut self) -> Result<Arc<NavigationGrid>, NavError> {
        let grid = Arc::new(NavigationGrid::build(&self.area, self.settings.cell_size)?);
        info!(
            width = grid.width(),
            height = grid.height(),
            cell_size = grid.cell_size(),
            walkable_cells = grid.walkable_cell_count(),
            revision = grid.source_revision(),
            "navigation_ready"
        );
        self.grid = Some(Arc::clone(&grid));
        Ok(grid)
    }

    pub fn invalidate(&mut self) {
        if self.grid.take().is_some() {
            debug!(revision = self.area.revision(), "navigation_invalidated");
        }
    }

    /// True when a grid exists and matches the area's current revision.
    pub fn is_ready(&self) -> bool {
        self.grid
            .as_ref()
            .is_some_and(|grid| grid.source_revision() == self.area.revision())
    }

    pub fn try_grid(&self) -> Option<Arc<NavigationGrid>> {
        self.grid.clone()
    }

    /// # Panics
    ///
    /// Panics when called before [`SceneNavigation::setup_navigation`]; that
    /// is a sequencing bug in the caller.
    pub fn grid(&self) -> Arc<NavigationGrid> {
        match &self.grid {
            Some(grid) => Arc::clone(grid),
            None => panic!("navigation grid requested before setup_navigation"),
        }
    }

    /// Shortest walkable path, building the grid first if it is missing or
    /// stale. `None` means unreachable (or nothing to navigate).
    pub fn find_path(&mut self, start: Vec2, end: Vec2) -> Option<NavPath> {
        let grid = if self.is_ready() {
            self.grid()
        } else {
            match self.setup_navigation() {
                Ok(grid) => grid,
                Err(error) => {
                    warn!(error = %error, "navigation_setup_failed");
                    return None;
                }
            }
        };
        self.find_path_on(&grid, start, end)
    }

    /// Runs a query against a specific grid snapshot.
    pub fn find_path_on(&self, grid: &NavigationGrid, start: Vec2, end: Vec2) -> Option<NavPath> {
        let solver = PathfindingSolver::with_options(grid, self.settings.solver);
        let cell_path = solver.find_path(start, end)?;
        let waypoints = smooth_path(grid, &self.area, &cell_path, start, end);
        debug!(
            cells = cell_path.cells.len(),
            waypoints = waypoints.len(),
            expanded_nodes = cell_path.expanded_nodes,
            start_snapped = cell_path.start_snapped,
            end_snapped = cell_path.end_snapped,
            "path_found"
        );
        NavPath::new(waypoints)
    }
}

fn check_region_bounds(region: &PolygonRegion, bounds: Bounds) -> Result<(), NavError> {
    if region.walkable() && !bounds.encloses(&region.bounds()) {
        return Err(NavError::RegionOutsideBounds {
            region: region.name().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::Bounds;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2 { x, y }
    }

    fn rect(name: &str, walkable: bool, x0: f32, y0: f32, x1: f32, y1: f32) -> PolygonRegion {
        PolygonRegion::new(
            name,
            walkable,
            vec![v(x0, y0), v(x1, y0), v(x1, y1), v(x0, y1)],
        )
        .expect("rect")
    }

    fn navigation(regions: Vec<PolygonRegion>) -> SceneNavigation {
        SceneNavigation::new(
            WalkableArea::from_regions(regions).expect("area"),
            NavigationSettings::default(),
        )
        .expect("navigation")
    }

    fn assert_near(actual: Vec2, expected: Vec2, tolerance: f32) {
        assert!(
            actual.distance(expected) <= tolerance,
            "{actual:?} not within {tolerance} of {expected:?}"
        );
    }

    #[test]
    fn path_endpoints_match_request_in_open_room() {
        let mut nav = navigation(vec![rect("floor", true, 0.0, 0.0, 800.0, 600.0)]);
        let path = nav
            .find_path(v(100.0, 100.0), v(700.0, 500.0))
            .expect("path");
        assert_near(path.first(), v(100.0, 100.0), 20.0);
        assert_near(path.last(), v(700.0, 500.0), 20.0);
        let scene = Bounds::from_size(800.0, 600.0);
        for waypoint in path.waypoints() {
            assert!(scene.contains(*waypoint), "{waypoint:?} out of scene");
        }
    }

    #[test]
    fn separated_regions_are_unreachable() {
        let mut nav = navigation(vec![
            rect("left", true, 0.0, 0.0, 300.0, 600.0),
            rect("right", true, 500.0, 0.0, 800.0, 600.0),
            rect("gap", false, 300.0, 0.0, 500.0, 600.0),
        ]);
        assert!(nav.find_path(v(150.0, 300.0), v(650.0, 300.0)).is_none());
    }

    #[test]
    fn path_detours_around_obstacle() {
        let mut nav = navigation(vec![
            rect("floor", true, 0.0, 0.0, 800.0, 600.0),
            rect("crate", false, 350.0, 250.0, 450.0, 350.0),
        ]);
        let path = nav
            .find_path(v(300.0, 300.0), v(500.0, 300.0))
            .expect("path");
        assert!(path.waypoint_count() > 2, "{:?}", path.waypoints());
        let blocked = Bounds::new(v(350.0, 250.0), v(450.0, 350.0));
        for waypoint in path.waypoints() {
            assert!(!blocked.contains(*waypoint), "{waypoint:?} inside crate");
            assert!(nav.area().is_walkable(*waypoint));
        }
        assert!(path.length() > 200.0);
    }

    #[test]
    fn identical_queries_are_deterministic() {
        let mut nav = navigation(vec![
            rect("floor", true, 0.0, 0.0, 800.0, 600.0),
            rect("crate", false, 350.0, 250.0, 450.0, 350.0),
        ]);
        let first = nav.find_path(v(300.0, 300.0), v(500.0, 300.0));
        let second = nav.find_path(v(300.0, 300.0), v(500.0, 300.0));
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn start_equal_to_end_is_single_waypoint() {
        let mut nav = navigation(vec![rect("floor", true, 0.0, 0.0, 800.0, 600.0)]);
        let path = nav
            .find_path(v(412.5, 233.0), v(412.5, 233.0))
            .expect("path");
        assert_eq!(path.waypoints(), &[v(412.5, 233.0)]);
        assert_eq!(path.length(), 0.0);
    }

    #[test]
    fn find_path_builds_grid_lazily() {
        let mut nav = navigation(vec![rect("floor", true, 0.0, 0.0, 320.0, 240.0)]);
        assert!(!nav.is_ready());
        assert!(nav.try_grid().is_none());
        nav.find_path(v(10.0, 10.0), v(300.0, 200.0)).expect("path");
        assert!(nav.is_ready());
    }

    #[test]
    #[should_panic(expected = "navigation grid requested before setup_navigation")]
    fn grid_before_setup_panics() {
        let nav = navigation(vec![rect("floor", true, 0.0, 0.0, 320.0, 240.0)]);
        let _ = nav.grid();
    }

    #[test]
    fn rebuild_swaps_grid_and_leaves_old_snapshot_intact() {
        let mut nav = navigation(vec![rect("floor", true, 0.0, 0.0, 320.0, 240.0)]);
        let before = nav.setup_navigation().expect("grid");
        let probe = before.world_to_cell(v(160.0, 120.0));
        nav.add_region(rect("well", false, 128.0, 96.0, 192.0, 144.0))
            .expect("well");
        assert!(!nav.is_ready());
        let after = nav.setup_navigation().expect("grid");

        assert!(!Arc::ptr_eq(&before, &after));
        assert!(before.is_cell_walkable(probe));
        assert!(!after.is_cell_walkable(probe));
    }

    #[test]
    fn region_edits_change_subsequent_paths() {
        let mut nav = navigation(vec![rect("floor", true, 0.0, 0.0, 800.0, 600.0)]);
        assert!(nav.find_path(v(100.0, 300.0), v(700.0, 300.0)).is_some());

        nav.add_region(rect("river", false, 380.0, 0.0, 420.0, 600.0))
            .expect("river");
        assert!(nav.find_path(v(100.0, 300.0), v(700.0, 300.0)).is_none());

        assert!(nav.set_region_walkable("river", true));
        assert!(nav.find_path(v(100.0, 300.0), v(700.0, 300.0)).is_some());

        nav.remove_region("river").expect("removed");
        assert!(nav.find_path(v(100.0, 300.0), v(700.0, 300.0)).is_some());
    }

    #[test]
    fn empty_area_yields_no_path_instead_of_panicking() {
        let mut nav = SceneNavigation::default();
        assert!(nav.find_path(v(0.0, 0.0), v(10.0, 10.0)).is_none());
        assert!(nav.try_grid().is_none());
    }

    #[test]
    fn zero_cell_size_is_a_configuration_error() {
        let err = SceneNavigation::new(
            WalkableArea::new(),
            NavigationSettings {
                cell_size: 0,
                ..NavigationSettings::default()
            },
        )
        .expect_err("invalid");
        assert_eq!(err, NavError::InvalidCellSize { cell_size: 0 });

        let mut nav = SceneNavigation::default();
        assert!(nav.set_cell_size(0).is_err());
        assert!(nav.set_cell_size(8).is_ok());
        assert_eq!(nav.settings().cell_size, 8);
    }

    #[test]
    fn off_area_click_snaps_to_walkable_stand_in() {
        let mut nav = navigation(vec![
            rect("floor", true, 0.0, 0.0, 800.0, 600.0),
            rect("fountain", false, 300.0, 200.0, 500.0, 400.0),
        ]);
        let path = nav
            .find_path(v(100.0, 300.0), v(400.0, 300.0))
            .expect("path");
        let last = path.last();
        assert!(nav.area().is_walkable(last), "{last:?}");
        assert_near(last, v(400.0, 300.0), 120.0);
    }

    #[test]
    fn confined_navigation_rejects_walkable_regions_past_scene_edge() {
        let scene = Bounds::from_size(800.0, 600.0);
        let mut nav = navigation(vec![rect("floor", true, 0.0, 0.0, 800.0, 800.0)]);
        assert_eq!(
            nav.confine_to(scene),
            Err(NavError::RegionOutsideBounds {
                region: "floor".to_string()
            })
        );
        assert_eq!(nav.scene_bounds(), None);

        let mut nav = navigation(vec![
            rect("floor", true, 0.0, 0.0, 800.0, 600.0),
            rect("wall", false, 350.0, 0.0, 450.0, 650.0),
        ]);
        nav.confine_to(scene).expect("overhanging obstacle is allowed");
        assert_eq!(
            nav.add_region(rect("ledge", true, 700.0, 500.0, 900.0, 700.0)),
            Err(NavError::RegionOutsideBounds {
                region: "ledge".to_string()
            })
        );
        assert!(nav.area().region("ledge").is_none());
        assert!(!nav.set_region_walkable("wall", true));
        assert!(!nav.area().region("wall").expect("wall").walkable());

        // The wall spans the scene's full height, so there is no way around.
        assert!(nav.find_path(v(300.0, 300.0), v(500.0, 300.0)).is_none());
    }
}
