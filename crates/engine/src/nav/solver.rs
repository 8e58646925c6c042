use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::Vec2;

use super::grid::{GridCell, NavigationGrid};

pub const DEFAULT_SNAP_RADIUS_CELLS: u32 = 16;

const ORTHOGONAL_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

// Fixed order for determinism: N, E, S, W, NE, SE, SW, NW (rows grow downward).
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Largest Chebyshev ring scanned when an endpoint lands on a blocked cell.
    pub snap_radius_cells: u32,
    pub allow_diagonal: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            snap_radius_cells: DEFAULT_SNAP_RADIUS_CELLS,
            allow_diagonal: true,
        }
    }
}

/// Raw solver output: walkable cells from the (snapped) start to the
/// (snapped) end, inclusive. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPath {
    pub cells: Vec<GridCell>,
    pub start_cell: GridCell,
    pub end_cell: GridCell,
    pub start_snapped: bool,
    pub end_snapped: bool,
    pub expanded_nodes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f_cost: u32,
    h_cost: u32,
    insertion_order: u64,
    index: usize,
}

impl OpenNode {
    fn key(&self) -> (u32, u32, u64) {
        (self.f_cost, self.h_cost, self.insertion_order)
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the smallest key first.
        other.key().cmp(&self.key())
    }
}

/// A* over a [`NavigationGrid`].
pub struct PathfindingSolver<'a> {
    grid: &'a NavigationGrid,
    options: SolverOptions,
}

impl<'a> PathfindingSolver<'a> {
    pub fn new(grid: &'a NavigationGrid) -> Self {
        Self::with_options(grid, SolverOptions::default())
    }

    pub fn with_options(grid: &'a NavigationGrid, options: SolverOptions) -> Self {
        Self { grid, options }
    }

    pub fn find_path(&self, start_world: Vec2, end_world: Vec2) -> Option<CellPath> {
        let Some((start_cell, start_snapped)) = self.snap_to_walkable(start_world) else {
            debug!(x = start_world.x, y = start_world.y, "path_start_not_snappable");
            return None;
        };
        let Some((end_cell, end_snapped)) = self.snap_to_walkable(end_world) else {
            debug!(x = end_world.x, y = end_world.y, "path_end_not_snappable");
            return None;
        };

        let (cells, expanded_nodes) = if start_cell == end_cell {
            (vec![start_cell], 0)
        } else {
            let (cells, expanded_nodes) = self.search(start_cell, end_cell);
            let Some(cells) = cells else {
                debug!(
                    start_col = start_cell.col,
                    start_row = start_cell.row,
                    end_col = end_cell.col,
                    end_row = end_cell.row,
                    expanded_nodes,
                    "path_unreachable"
                );
                return None;
            };
            (cells, expanded_nodes)
        };

        Some(CellPath {
            cells,
            start_cell,
            end_cell,
            start_snapped,
            end_snapped,
            expanded_nodes,
        })
    }

    /// Maps `world` to a walkable cell, scanning outward when its own cell is
    /// blocked. Points outside the grid are clamped onto its extent first.
    /// Returns the cell and whether it differs from the point's own cell.
    pub fn snap_to_walkable(&self, world: Vec2) -> Option<(GridCell, bool)> {
        if !world.x.is_finite() || !world.y.is_finite() {
            return None;
        }
        let grid = self.grid;
        let raw_cell = grid.world_to_cell(world);
        if grid.is_cell_walkable(raw_cell) {
            return Some((raw_cell, false));
        }

        let anchor_cell = grid.clamp_cell(raw_cell);
        let anchor = grid.extent().clamp(world);
        if grid.is_cell_walkable(anchor_cell) {
            return Some((anchor_cell, true));
        }

        // The anchor lies inside the grid, so no ring past the larger grid
        // dimension can hold a cell.
        let max_radius = self
            .options
            .snap_radius_cells
            .min(grid.width().max(grid.height()));
        let cell_size = grid.cell_size() as f32;
        let mut best: Option<(f32, GridCell)> = None;
        for radius in 1..=max_radius as i32 {
            if let Some((best_distance_sq, _)) = best {
                let ring_floor = (radius as f32 - 0.5) * cell_size;
                if ring_floor * ring_floor > best_distance_sq {
                    break;
                }
            }
            for (dcol, drow) in ring_offsets(radius) {
                let candidate = anchor_cell.offset(dcol, drow);
                if !grid.is_cell_walkable(candidate) {
                    continue;
                }
                let center = grid.cell_to_world(candidate);
                let dx = center.x - anchor.x;
                let dy = center.y - anchor.y;
                let distance_sq = dx * dx + dy * dy;
                if is_closer(distance_sq, candidate, best) {
                    best = Some((distance_sq, candidate));
                }
            }
        }

        best.map(|(_, cell)| (cell, true))
    }

    fn search(&self, start: GridCell, goal: GridCell) -> (Option<Vec<GridCell>>, usize) {
        let grid = self.grid;
        let (Some(start_index), Some(goal_index)) = (grid.index_of(start), grid.index_of(goal))
        else {
            return (None, 0);
        };

        let node_count = grid.cell_count();
        let mut closed = vec![false; node_count];
        let mut best_g = vec![u32::MAX; node_count];
        let mut parent = vec![None::<usize>; node_count];
        let mut open = BinaryHeap::new();
        let mut next_insertion = 0u64;
        let mut expanded = 0usize;

        best_g[start_index] = 0;
        let start_h = self.heuristic(start, goal);
        open.push(OpenNode {
            f_cost: start_h,
            h_cost: start_h,
            insertion_order: next_insertion,
            index: start_index,
        });
        next_insertion += 1;

        while let Some(current) = open.pop() {
            if closed[current.index] {
                continue;
            }
            closed[current.index] = true;
            expanded += 1;

            if current.index == goal_index {
                return (
                    reconstruct_path(grid, &parent, start_index, goal_index),
                    expanded,
                );
            }

            let cell = grid.cell_at(current.index);
            let current_g = best_g[current.index];
            for (dcol, drow) in NEIGHBOR_OFFSETS {
                let diagonal = dcol != 0 && drow != 0;
                if diagonal && !self.options.allow_diagonal {
                    continue;
                }
                let neighbor = cell.offset(dcol, drow);
                let Some(neighbor_index) = grid.index_of(neighbor) else {
                    continue;
                };
                if closed[neighbor_index] || !grid.is_cell_walkable(neighbor) {
                    continue;
                }
                if diagonal
                    && (!grid.is_cell_walkable(cell.offset(dcol, 0))
                        || !grid.is_cell_walkable(cell.offset(0, drow)))
                {
                    continue;
                }

                let step = if diagonal {
                    DIAGONAL_COST
                } else {
                    ORTHOGONAL_COST
                };
                let tentative_g = current_g.saturating_add(step);
                if tentative_g >= best_g[neighbor_index] {
                    continue;
                }

                best_g[neighbor_index] = tentative_g;
                parent[neighbor_index] = Some(current.index);
                let h_cost = self.heuristic(neighbor, goal);
                open.push(OpenNode {
                    f_cost: tentative_g.saturating_add(h_cost),
                    h_cost,
                    insertion_order: next_insertion,
                    index: neighbor_index,
                });
                next_insertion += 1;
            }
        }

        (None, expanded)
    }

    fn heuristic(&self, a: GridCell, b: GridCell) -> u32 {
        let dx = a.col.abs_diff(b.col);
        let dy = a.row.abs_diff(b.row);
        if self.options.allow_diagonal {
            let (long, short) = (dx.max(dy), dx.min(dy));
            long.saturating_mul(ORTHOGONAL_COST)
                .saturating_add(short.saturating_mul(DIAGONAL_COST - ORTHOGONAL_COST))
        } else {
            dx.saturating_add(dy).saturating_mul(ORTHOGONAL_COST)
        }
    }
}

/// Offsets on the perimeter of the Chebyshev ring at `radius` (>= 1), each
/// visited once.
fn ring_offsets(radius: i32) -> impl Iterator<Item = (i32, i32)> {
    let edges = (-radius..=radius).flat_map(move |dcol| [(dcol, -radius), (dcol, radius)]);
    let sides = (1 - radius..radius).flat_map(move |drow| [(-radius, drow), (radius, drow)]);
    edges.chain(sides)
}

fn is_closer(distance_sq: f32, candidate: GridCell, best: Option<(f32, GridCell)>) -> bool {
    match best {
        None => true,
        Some((best_distance_sq, best_cell)) => {
            if distance_sq != best_distance_sq {
                distance_sq < best_distance_sq
            } else {
                (candidate.row, candidate.col) < (best_cell.row, best_cell.col)
            }
        }
    }
}

fn reconstruct_path(
    grid: &NavigationGrid,
    parent: &[Option<usize>],
    start_index: usize,
    goal_index: usize,
) -> Option<Vec<GridCell>> {
    let mut cursor = goal_index;
    let mut indices = vec![cursor];
    while cursor != start_index {
        cursor = parent.get(cursor).copied().flatten()?;
        indices.push(cursor);
    }
    indices.reverse();
    Some(indices.into_iter().map(|index| grid.cell_at(index)).collect())
}
