use tracing::debug;

use crate::app::Vec2;

use super::walkable::{Bounds, WalkableArea};
use super::NavError;

/// Upper bound on `width * height` accepted by [`NavigationGrid::build`].
pub const MAX_GRID_CELLS: u64 = 4_194_304;

/// Column/row address of a grid cell. May lie outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub col: i32,
    pub row: i32,
}

impl GridCell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub(crate) fn offset(self, dcol: i32, drow: i32) -> Self {
        Self {
            col: self.col.saturating_add(dcol),
            row: self.row.saturating_add(drow),
        }
    }
}

/// Grid convention:
/// - `origin` is the walkable area's bounds minimum; cell (0,0) spans
///   `origin .. origin + cell_size` on both axes.
/// - A cell is walkable iff its center is walkable in the source area.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationGrid {
    origin: Vec2,
    cell_size: u32,
    width: u32,
    height: u32,
    walkable: Vec<bool>,
    walkable_count: usize,
    source_revision: u64,
}

impl NavigationGrid {
    pub fn build(area: &WalkableArea, cell_size: u32) -> Result<Self, NavError> {
        if cell_size == 0 {
            return Err(NavError::InvalidCellSize { cell_size: 0 });
        }
        let bounds = area.bounds().ok_or(NavError::EmptyWalkableArea)?;
        let size = cell_size as f32;
        let width = ((bounds.width() / size).ceil() as u64).max(1);
        let height = ((bounds.height() / size).ceil() as u64).max(1);
        if width.saturating_mul(height) > MAX_GRID_CELLS {
            return Err(NavError::GridTooLarge {
                width,
                height,
                limit: MAX_GRID_CELLS,
            });
        }

        let mut grid = Self {
            origin: bounds.min,
            cell_size,
            width: width as u32,
            height: height as u32,
            walkable: Vec::with_capacity((width * height) as usize),
            walkable_count: 0,
            source_revision: area.revision(),
        };
        for row in 0..grid.height as i32 {
            for col in 0..grid.width as i32 {
                let center = grid.cell_to_world(GridCell { col, row });
                let walkable = area.is_walkable(center);
                if walkable {
                    grid.walkable_count += 1;
                }
                grid.walkable.push(walkable);
            }
        }

        debug!(
            width = grid.width,
            height = grid.height,
            cell_size,
            walkable_cells = grid.walkable_count,
            revision = grid.source_revision,
            "navigation_grid_rasterized"
        );
        Ok(grid)
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.walkable.len()
    }

    pub fn walkable_cell_count(&self) -> usize {
        self.walkable_count
    }

    /// Revision of the walkable area this grid was rasterized from.
    pub fn source_revision(&self) -> u64 {
        self.source_revision
    }

    /// World-space rectangle covered by the grid. Can extend past the area
    /// bounds by up to one cell on the max sides.
    pub fn extent(&self) -> Bounds {
        let size = self.cell_size as f32;
        Bounds {
            min: self.origin,
            max: Vec2 {
                x: self.origin.x + self.width as f32 * size,
                y: self.origin.y + self.height as f32 * size,
            },
        }
    }

    pub fn world_to_cell(&self, world: Vec2) -> GridCell {
        let size = self.cell_size as f32;
        GridCell {
            col: ((world.x - self.origin.x) / size).floor() as i32,
            row: ((world.y - self.origin.y) / size).floor() as i32,
        }
    }

    /// Center of `cell` in world space. Defined for out-of-range cells too.
    pub fn cell_to_world(&self, cell: GridCell) -> Vec2 {
        let size = self.cell_size as f32;
        Vec2 {
            x: self.origin.x + (cell.col as f32 + 0.5) * size,
            y: self.origin.y + (cell.row as f32 + 0.5) * size,
        }
    }

    pub fn cell_rect(&self, cell: GridCell) -> Bounds {
        let size = self.cell_size as f32;
        let min = Vec2 {
            x: self.origin.x + cell.col as f32 * size,
            y: self.origin.y + cell.row as f32 * size,
        };
        Bounds {
            min,
            max: Vec2 {
                x: min.x + size,
                y: min.y + size,
            },
        }
    }

    pub fn contains_cell(&self, cell: GridCell) -> bool {
        cell.col >= 0
            && cell.row >= 0
            && (cell.col as u32) < self.width
            && (cell.row as u32) < self.height
    }

    pub fn is_cell_walkable(&self, cell: GridCell) -> bool {
        self.index_of(cell)
            .and_then(|index| self.walkable.get(index))
            .copied()
            .unwrap_or(false)
    }

    pub fn clamp_cell(&self, cell: GridCell) -> GridCell {
        GridCell {
            col: cell.col.clamp(0, self.width as i32 - 1),
            row: cell.row.clamp(0, self.height as i32 - 1),
        }
    }

    pub(crate) fn index_of(&self, cell: GridCell) -> Option<usize> {
        if !self.contains_cell(cell) {
            return None;
        }
        Some(cell.row as usize * self.width as usize + cell.col as usize)
    }

    pub(crate) fn cell_at(&self, index: usize) -> GridCell {
        GridCell {
            col: (index % self.width as usize) as i32,
            row: (index / self.width as usize) as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::PolygonRegion;

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

    fn area(regions: Vec<PolygonRegion>) -> WalkableArea {
        WalkableArea::from_regions(regions).expect("area")
    }

    #[test]
    fn dimensions_round_up_partial_cells() {
        let grid = NavigationGrid::build(
            &area(vec![rect("floor", true, 0.0, 0.0, 800.0, 600.0)]),
            16,
        )
        .expect("grid");
        assert_eq!(grid.width(), 50);
        assert_eq!(grid.height(), 38);
        assert_eq!(grid.cell_count(), 50 * 38);
    }

    #[test]
    fn origin_follows_area_bounds() {
        let grid = NavigationGrid::build(
            &area(vec![rect("floor", true, 100.0, 50.0, 164.0, 114.0)]),
            16,
        )
        .expect("grid");
        assert_eq!(grid.origin(), v(100.0, 50.0));
        assert_eq!(grid.world_to_cell(v(100.0, 50.0)), GridCell::new(0, 0));
        assert_eq!(grid.world_to_cell(v(131.9, 82.0)), GridCell::new(1, 2));
        assert_eq!(grid.world_to_cell(v(99.0, 49.0)), GridCell::new(-1, -1));
        assert_eq!(grid.cell_to_world(GridCell::new(0, 0)), v(108.0, 58.0));
    }

    #[test]
    fn world_cell_round_trip_stays_within_one_cell() {
        let grid = NavigationGrid::build(
            &area(vec![rect("floor", true, 0.0, 0.0, 1024.0, 768.0)]),
            16,
        )
        .expect("grid");
        let mut y = 0.0;
        while y <= 768.0 {
            let mut x = 0.0;
            while x <= 1024.0 {
                let p = v(x, y);
                let back = grid.cell_to_world(grid.world_to_cell(p));
                let dx = back.x - p.x;
                let dy = back.y - p.y;
                assert!(
                    (dx * dx + dy * dy).sqrt() <= 16.0,
                    "round trip drifted for {p:?}: {back:?}"
                );
                x += 7.3;
            }
            y += 5.9;
        }
    }

    #[test]
    fn cells_are_sampled_at_their_center() {
        // Obstacle covers x in [0, 20]: cell 0 (center 8) blocked, cell 1
        // (center 24) walkable even though its left part overlaps.
        let grid = NavigationGrid::build(
            &area(vec![
                rect("floor", true, 0.0, 0.0, 64.0, 16.0),
                rect("crate", false, 0.0, 0.0, 20.0, 16.0),
            ]),
            16,
        )
        .expect("grid");
        assert!(!grid.is_cell_walkable(GridCell::new(0, 0)));
        assert!(grid.is_cell_walkable(GridCell::new(1, 0)));
        assert_eq!(grid.walkable_cell_count(), 3);
    }

    #[test]
    fn out_of_range_cells_are_blocked() {
        let grid = NavigationGrid::build(
            &area(vec![rect("floor", true, 0.0, 0.0, 32.0, 32.0)]),
            16,
        )
        .expect("grid");
        assert!(grid.is_cell_walkable(GridCell::new(1, 1)));
        assert!(!grid.is_cell_walkable(GridCell::new(2, 0)));
        assert!(!grid.is_cell_walkable(GridCell::new(-1, 0)));
        assert!(!grid.is_cell_walkable(GridCell::new(0, i32::MAX)));
        assert_eq!(grid.clamp_cell(GridCell::new(-4, 9)), GridCell::new(0, 1));
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        let err = NavigationGrid::build(
            &area(vec![rect("floor", true, 0.0, 0.0, 32.0, 32.0)]),
            0,
        )
        .expect_err("zero");
        assert_eq!(err, NavError::InvalidCellSize { cell_size: 0 });
    }

    #[test]
    fn empty_area_is_rejected() {
        let err = NavigationGrid::build(&WalkableArea::new(), 16).expect_err("empty");
        assert_eq!(err, NavError::EmptyWalkableArea);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let err = NavigationGrid::build(
            &area(vec![rect("plain", true, 0.0, 0.0, 100_000.0, 100_000.0)]),
            1,
        )
        .expect_err("too large");
        assert!(matches!(err, NavError::GridTooLarge { .. }));
    }

    #[test]
    fn grid_records_source_revision() {
        let mut source = area(vec![rect("floor", true, 0.0, 0.0, 32.0, 32.0)]);
        source
            .add_region(rect("rug", true, 0.0, 0.0, 8.0, 8.0))
            .expect("rug");
        let grid = NavigationGrid::build(&source, 16).expect("grid");
        assert_eq!(grid.source_revision(), source.revision());
    }
}
