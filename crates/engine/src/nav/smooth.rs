use crate::app::Vec2;

use super::grid::{GridCell, NavigationGrid};
use super::solver::CellPath;
use super::walkable::WalkableArea;

/// Turns a raw cell path into world waypoints.
///
/// Runs of cells stepping in the same direction collapse to their end
/// points, then the first and last waypoints are replaced by the caller's
/// requested coordinates (or the closest walkable stand-in when a requested
/// coordinate is not walkable). Consecutive duplicates are dropped, so a
/// start equal to the end yields exactly one waypoint.
pub fn smooth_path(
    grid: &NavigationGrid,
    area: &WalkableArea,
    cell_path: &CellPath,
    exact_start: Vec2,
    exact_end: Vec2,
) -> Vec<Vec2> {
    let cells = &cell_path.cells;
    let mut waypoints = Vec::with_capacity(cells.len().min(16) + 1);
    for (index, cell) in cells.iter().enumerate() {
        let is_turn = index > 0
            && index + 1 < cells.len()
            && step_direction(cells[index - 1], *cell) != step_direction(*cell, cells[index + 1]);
        if index == 0 || index + 1 == cells.len() || is_turn {
            waypoints.push(grid.cell_to_world(*cell));
        }
    }

    let start = resolve_endpoint(grid, area, exact_start, cell_path.start_cell);
    let end = resolve_endpoint(grid, area, exact_end, cell_path.end_cell);
    match waypoints.len() {
        0 => {
            waypoints.push(start);
            waypoints.push(end);
        }
        1 => {
            waypoints[0] = start;
            waypoints.push(end);
        }
        count => {
            waypoints[0] = start;
            waypoints[count - 1] = end;
        }
    }
    waypoints.dedup();
    waypoints
}

fn step_direction(from: GridCell, to: GridCell) -> (i32, i32) {
    ((to.col - from.col).signum(), (to.row - from.row).signum())
}

fn resolve_endpoint(
    grid: &NavigationGrid,
    area: &WalkableArea,
    exact: Vec2,
    snapped_cell: GridCell,
) -> Vec2 {
    if area.is_walkable(exact) {
        return exact;
    }

    let rect = grid.cell_rect(snapped_cell);
    let inset = (grid.cell_size() as f32 * 0.25).min(0.5);
    let inside_cell = Vec2 {
        x: exact.x.clamp(rect.min.x + inset, rect.max.x - inset),
        y: exact.y.clamp(rect.min.y + inset, rect.max.y - inset),
    };
    if area.is_walkable(inside_cell) {
        inside_cell
    } else {
        grid.cell_to_world(snapped_cell)
    }
}
