//! Shortest-path search over the passability graph.
//!
//! Both searches return the full cell sequence from start to goal
//! inclusive. Callers normally take only [`first_step`].

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use crate::grid::{Dir, Grid, Pos};
use crate::passability::can_step;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    pub path: Option<Vec<Pos>>,
    /// Nodes taken off the frontier.
    pub expanded: usize,
}

impl Search {
    fn failed(expanded: usize) -> Self {
        Self {
            path: None,
            expanded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: usize,
    h: usize,
    row: usize,
    col: usize,
}

pub fn astar(grid: &Grid, start: Pos, goal: Pos) -> Option<Vec<Pos>> {
    astar_search(grid, start, goal).path
}

/// A* with the Manhattan heuristic. Ties on `f` go to the lower `h`, then
/// to the lower row and column. Gives up after `size * size` expansions.
pub fn astar_search(grid: &Grid, start: Pos, goal: Pos) -> Search {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return Search::failed(0);
    }
    let budget = grid.size() * grid.size();
    let mut g_score = vec![usize::MAX; budget];
    let mut came_from: Vec<Option<usize>> = vec![None; budget];
    let mut closed = vec![false; budget];
    let mut open = BinaryHeap::new();

    let h = start.manhattan(goal);
    g_score[grid.index(start)] = 0;
    open.push(Reverse(OpenNode {
        f: h,
        h,
        row: start.row,
        col: start.col,
    }));

    let mut expanded = 0;
    while let Some(Reverse(node)) = open.pop() {
        let current = Pos::new(node.row, node.col);
        let idx = grid.index(current);
        if closed[idx] {
            continue;
        }
        if expanded >= budget {
            log::debug!("A* budget exhausted between {start:?} and {goal:?}");
            break;
        }
        expanded += 1;
        closed[idx] = true;

        if current == goal {
            return Search {
                path: Some(reconstruct(grid, &came_from, idx)),
                expanded,
            };
        }

        let tentative = g_score[idx] + 1;
        for dir in Dir::ALL {
            let Some(next) = grid.step(current, dir) else {
                continue;
            };
            let nidx = grid.index(next);
            if closed[nidx] || !can_step(grid, current, next) {
                continue;
            }
            if tentative < g_score[nidx] {
                g_score[nidx] = tentative;
                came_from[nidx] = Some(idx);
                let h = next.manhattan(goal);
                open.push(Reverse(OpenNode {
                    f: tentative + h,
                    h,
                    row: next.row,
                    col: next.col,
                }));
            }
        }
    }
    Search::failed(expanded)
}

pub fn bfs(grid: &Grid, start: Pos, goal: Pos) -> Option<Vec<Pos>> {
    bfs_search(grid, start, goal).path
}

/// Breadth-first search; neighbours are queued in [`Dir::ALL`] order.
pub fn bfs_search(grid: &Grid, start: Pos, goal: Pos) -> Search {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return Search::failed(0);
    }
    let cells = grid.size() * grid.size();
    let mut came_from: Vec<Option<usize>> = vec![None; cells];
    let mut seen = vec![false; cells];
    let mut queue = VecDeque::new();
    seen[grid.index(start)] = true;
    queue.push_back(start);

    let mut expanded = 0;
    while let Some(current) = queue.pop_front() {
        expanded += 1;
        let idx = grid.index(current);
        if current == goal {
            return Search {
                path: Some(reconstruct(grid, &came_from, idx)),
                expanded,
            };
        }
        for dir in Dir::ALL {
            let Some(next) = grid.step(current, dir) else {
                continue;
            };
            let nidx = grid.index(next);
            if seen[nidx] || !can_step(grid, current, next) {
                continue;
            }
            seen[nidx] = true;
            came_from[nidx] = Some(idx);
            queue.push_back(next);
        }
    }
    Search::failed(expanded)
}

pub fn first_step(path: &[Pos]) -> Option<Pos> {
    path.get(1).copied()
}

fn reconstruct(grid: &Grid, came_from: &[Option<usize>], goal: usize) -> Vec<Pos> {
    let mut path = vec![grid.pos_at(goal)];
    let mut cursor = goal;
    while let Some(prev) = came_from[cursor] {
        path.push(grid.pos_at(prev));
        cursor = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_contiguous(grid: &Grid, path: &[Pos]) -> bool {
        path.windows(2).all(|pair| can_step(grid, pair[0], pair[1]))
    }

    #[test]
    fn start_equals_goal_is_a_single_cell_path() {
        let grid = Grid::open(3);
        let origin = Pos::new(1, 1);
        assert_eq!(astar(&grid, origin, origin), Some(vec![origin]));
        assert_eq!(bfs(&grid, origin, origin), Some(vec![origin]));
    }

    #[test]
    fn open_grid_path_is_manhattan_length() {
        let grid = Grid::open(6);
        let start = Pos::new(0, 0);
        let goal = Pos::new(4, 5);
        let path = astar(&grid, start, goal).unwrap();
        assert_eq!(path.len(), 10);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert!(is_contiguous(&grid, &path));
    }

    #[test]
    fn routes_around_blocks() {
        let mut grid = Grid::open(5);
        for row in 0..4 {
            grid.add_block(Pos::new(row, 2));
        }
        let start = Pos::new(0, 0);
        let goal = Pos::new(0, 4);
        let astar_path = astar(&grid, start, goal).unwrap();
        let bfs_path = bfs(&grid, start, goal).unwrap();
        assert_eq!(astar_path.len(), 13);
        assert_eq!(bfs_path.len(), astar_path.len());
        assert!(astar_path.iter().all(|&p| !grid.is_fully_enclosed(p)));
        let step = first_step(&astar_path).unwrap();
        assert_eq!(step.manhattan(start), 1);
    }

    #[test]
    fn unreachable_goal_reports_no_path() {
        let mut grid = Grid::open(4);
        for row in 0..4 {
            grid.add_block(Pos::new(row, 1));
        }
        let start = Pos::new(0, 0);
        let goal = Pos::new(3, 3);
        let search = astar_search(&grid, start, goal);
        assert_eq!(search.path, None);
        assert!(search.expanded <= 16);
        assert_eq!(bfs(&grid, start, goal), None);
    }

    #[test]
    fn goal_on_block_is_unreachable() {
        let mut grid = Grid::open(3);
        grid.add_block(Pos::new(2, 2));
        assert_eq!(astar(&grid, Pos::new(0, 0), Pos::new(2, 2)), None);
        assert_eq!(bfs(&grid, Pos::new(0, 0), Pos::new(2, 2)), None);
    }

    #[test]
    fn out_of_bounds_endpoints_fail_fast() {
        let grid = Grid::open(3);
        let search = astar_search(&grid, Pos::new(0, 0), Pos::new(5, 5));
        assert_eq!(search, Search::failed(0));
    }

    #[test]
    fn identical_inputs_give_identical_paths() {
        let grid = Grid::open(7);
        let a = astar(&grid, Pos::new(0, 0), Pos::new(6, 6));
        let b = astar(&grid, Pos::new(0, 0), Pos::new(6, 6));
        assert_eq!(a, b);
    }
}
