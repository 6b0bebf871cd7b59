//! A* pathfinding over a grid laid on the continuous battle map
//!
//! Walls are impassable except at gate apertures; costed terrain multiplies
//! step cost. Paths come back as world-space waypoints.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ahash::AHashMap;
use ordered_float::OrderedFloat;

use crate::battle::battle_map::BattleMap;
use crate::core::types::Vec2;

type Cell = (i32, i32);

const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Traversal cost grid derived from a map
#[derive(Debug, Clone, PartialEq)]
pub struct NavGrid {
    pub cell_size: f32,
    pub cols: i32,
    pub rows: i32,
    costs: Vec<f32>,
}

impl NavGrid {
    /// Rasterise the map. A cell is wall if any of nine sample points in it is
    /// wall, so thin rings cannot leak through diagonals.
    pub fn build(map: &BattleMap, cell_size: f32) -> Self {
        let cell_size = cell_size.max(1.0);
        let cols = axis_cells(map.width, cell_size);
        let rows = axis_cells(map.height, cell_size);
        let mut costs = Vec::with_capacity(cell_count(cols, rows));

        for row in 0..rows {
            for col in 0..cols {
                let min = Vec2::new(col as f32 * cell_size, row as f32 * cell_size);
                let blocked = (0..3).any(|sy| {
                    (0..3).any(|sx| {
                        let sample = Vec2::new(
                            min.x + cell_size * sx as f32 / 2.0,
                            min.y + cell_size * sy as f32 / 2.0,
                        );
                        map.is_wall(map.clamp(sample))
                    })
                });
                let cost = if blocked {
                    f32::INFINITY
                } else {
                    let center = min + Vec2::new(cell_size / 2.0, cell_size / 2.0);
                    map.terrain_at(map.clamp(center))
                        .map_or(1.0, |kind| kind.path_cost())
                };
                costs.push(cost);
            }
        }

        Self {
            cell_size,
            cols,
            rows,
            costs,
        }
    }

    pub fn cell_of(&self, point: Vec2) -> Cell {
        let col = ((point.x / self.cell_size).floor() as i32).clamp(0, self.cols - 1);
        let row = ((point.y / self.cell_size).floor() as i32).clamp(0, self.rows - 1);
        (col, row)
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        Vec2::new(
            (cell.0 as f32 + 0.5) * self.cell_size,
            (cell.1 as f32 + 0.5) * self.cell_size,
        )
    }

    /// Step cost multiplier of a cell; out of grid is impassable
    pub fn cost(&self, cell: Cell) -> f32 {
        if cell.0 < 0 || cell.1 < 0 || cell.0 >= self.cols || cell.1 >= self.rows {
            return f32::INFINITY;
        }
        self.costs[cell.1 as usize * self.cols as usize + cell.0 as usize]
    }

    pub fn is_passable(&self, cell: Cell) -> bool {
        self.cost(cell).is_finite()
    }
}

fn axis_cells(extent: f32, cell_size: f32) -> i32 {
    (extent / cell_size).ceil().max(1.0) as i32
}

/// Cells in a `cols` by `rows` grid, counted in `usize` so wide maps do not
/// overflow `i32`
fn cell_count(cols: i32, rows: i32) -> usize {
    cols.max(0) as usize * rows.max(0) as usize
}

/// Octile distance in cell units
fn octile(a: Cell, b: Cell) -> f32 {
    let dx = (a.0 - b.0).abs() as f32;
    let dy = (a.1 - b.1).abs() as f32;
    dx.max(dy) + (std::f32::consts::SQRT_2 - 1.0) * dx.min(dy)
}

/// Find a path from `start` to `goal`
///
/// Returns world waypoints (cell centers, last one replaced by `goal`), or
/// None when the goal is unreachable.
pub fn find_path(grid: &NavGrid, start: Vec2, goal: Vec2) -> Option<Vec<Vec2>> {
    let start_cell = grid.cell_of(start);
    let goal_cell = grid.cell_of(goal);

    if !grid.is_passable(goal_cell) {
        return None;
    }
    if start_cell == goal_cell {
        return Some(vec![goal]);
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<Cell, Cell> = AHashMap::new();
    let mut g_scores: AHashMap<Cell, f32> = AHashMap::new();

    g_scores.insert(start_cell, 0.0);
    open_set.push(Reverse((OrderedFloat(octile(start_cell, goal_cell)), start_cell)));

    while let Some(Reverse((OrderedFloat(f_cost), current))) = open_set.pop() {
        if current == goal_cell {
            return Some(reconstruct_path(grid, &came_from, current, goal));
        }

        let current_g = *g_scores.get(&current).unwrap_or(&f32::INFINITY);
        // Stale heap entry
        if f_cost > current_g + octile(current, goal_cell) + 1e-3 {
            continue;
        }

        for (dx, dy) in NEIGHBORS {
            let neighbor = (current.0 + dx, current.1 + dy);
            let cost = grid.cost(neighbor);
            if cost.is_infinite() {
                continue;
            }

            let diagonal = dx != 0 && dy != 0;
            if diagonal
                && !grid.is_passable((current.0 + dx, current.1))
                && !grid.is_passable((current.0, current.1 + dy))
            {
                continue;
            }

            let step = if diagonal { std::f32::consts::SQRT_2 } else { 1.0 };
            let tentative_g = current_g + step * cost;
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current);
                g_scores.insert(neighbor, tentative_g);
                let f = tentative_g + octile(neighbor, goal_cell);
                open_set.push(Reverse((OrderedFloat(f), neighbor)));
            }
        }
    }

    None
}

fn reconstruct_path(
    grid: &NavGrid,
    came_from: &AHashMap<Cell, Cell>,
    mut current: Cell,
    goal: Vec2,
) -> Vec<Vec2> {
    let mut cells = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        cells.push(prev);
        current = prev;
    }
    // Drop the start cell; the unit is already there
    cells.pop();
    cells.reverse();

    let mut waypoints: Vec<Vec2> = cells.into_iter().map(|c| grid.cell_center(c)).collect();
    if let Some(last) = waypoints.last_mut() {
        *last = goal;
    }
    waypoints
}
