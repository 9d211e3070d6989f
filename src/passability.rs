//! Connectivity questions shared by movement, pathfinding and the
//! generator's repair pass.

use std::collections::VecDeque;

use crate::grid::{Dir, Grid, Pos};

/// An agent may step from `from` to `to`: adjacent, no wall between them
/// and `to` is not a solid block.
pub fn can_step(grid: &Grid, from: Pos, to: Pos) -> bool {
    grid.is_passable(from, to) && !grid.is_fully_enclosed(to)
}

pub fn is_valid_position(grid: &Grid, pos: Pos) -> bool {
    grid.in_bounds(pos) && !grid.is_fully_enclosed(pos)
}

/// Reachable neighbours indexed like [`Dir::ALL`].
pub fn valid_moves(grid: &Grid, pos: Pos) -> [Option<Pos>; 4] {
    Dir::ALL.map(|dir| grid.step(pos, dir).filter(|&next| can_step(grid, pos, next)))
}

pub fn open_moves(grid: &Grid, pos: Pos) -> Vec<Pos> {
    valid_moves(grid, pos).into_iter().flatten().collect()
}

pub fn has_valid_moves(grid: &Grid, pos: Pos) -> bool {
    valid_moves(grid, pos).iter().any(Option::is_some)
}

/// Flood fill over [`can_step`] edges, indexed by [`Grid::index`].
pub fn reachable_from(grid: &Grid, start: Pos) -> Vec<bool> {
    let mut seen = vec![false; grid.size() * grid.size()];
    if !grid.in_bounds(start) {
        return seen;
    }
    let mut queue = VecDeque::new();
    seen[grid.index(start)] = true;
    queue.push_back(start);
    while let Some(pos) = queue.pop_front() {
        for next in valid_moves(grid, pos).into_iter().flatten() {
            let idx = grid.index(next);
            if !seen[idx] {
                seen[idx] = true;
                queue.push_back(next);
            }
        }
    }
    seen
}

pub fn unreachable_cells(grid: &Grid, start: Pos) -> Vec<Pos> {
    let seen = reachable_from(grid, start);
    grid.positions()
        .filter(|&pos| is_valid_position(grid, pos) && !seen[grid.index(pos)])
        .collect()
}

pub fn is_fully_connected(grid: &Grid, start: Pos) -> bool {
    unreachable_cells(grid, start).is_empty()
}

/// Nearest valid cell around `origin`, scanning Manhattan rings of radius
/// `1..=max_radius`.
pub fn nearest_valid_cell(grid: &Grid, origin: Pos, max_radius: usize) -> Option<Pos> {
    for radius in 1..=max_radius as isize {
        for drow in -radius..=radius {
            for dcol in -radius..=radius {
                if drow.abs() + dcol.abs() != radius {
                    continue;
                }
                if let Some(pos) = origin.offset(drow, dcol) {
                    if is_valid_position(grid, pos) {
                        return Some(pos);
                    }
                }
            }
        }
    }
    None
}
