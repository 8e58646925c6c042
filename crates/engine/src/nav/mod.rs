mod grid;
mod navigation;
mod polygon;
mod smooth;
mod solver;
mod walkable;

use thiserror::Error;

pub use grid::{GridCell, NavigationGrid, MAX_GRID_CELLS};
pub use navigation::{NavPath, NavigationSettings, SceneNavigation, DEFAULT_NAVIGATION_CELL_SIZE};
pub use polygon::{PolygonRegion, EDGE_EPSILON};
pub use smooth::smooth_path;
pub use solver::{CellPath, PathfindingSolver, SolverOptions, DEFAULT_SNAP_RADIUS_CELLS};
pub use walkable::{Bounds, WalkableArea};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("region name must not be empty")]
    EmptyRegionName,
    #[error("region '{region}' needs at least 3 vertices, got {count}")]
    TooFewVertices { region: String, count: usize },
    #[error("region '{region}' has a non-finite vertex at index {index}")]
    NonFiniteVertex { region: String, index: usize },
    #[error("region '{region}' has zero area")]
    DegeneratePolygon { region: String },
    #[error("region '{region}' is self-intersecting (edges {first} and {second} cross)")]
    SelfIntersecting {
        region: String,
        first: usize,
        second: usize,
    },
    #[error("walkable region '{region}' extends outside the scene bounds")]
    RegionOutsideBounds { region: String },
    #[error("duplicate region name '{name}' in walkable area")]
    DuplicateRegionName { name: String },
    #[error("navigation cell size must be > 0, got {cell_size}")]
    InvalidCellSize { cell_size: i64 },
    #[error("walkable area has no regions to rasterize")]
    EmptyWalkableArea,
    #[error("navigation grid of {width}x{height} cells exceeds the limit of {limit} cells")]
    GridTooLarge { width: u64, height: u64, limit: u64 },
}
