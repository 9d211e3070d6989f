//! Maze generation: randomized depth-first carving, braided variants and an
//! open arcade-style layout.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ConfigError;
use crate::grid::{Dir, Grid, Pos};
use crate::passability::{is_valid_position, reachable_from};

const EXTRA_WALL_FRACTION: f64 = 0.25;
const LOOP_WALL_CHANCE: f64 = 0.7;
const DIAGONAL_STEP_CHANCE: f64 = 0.8;
const BLOCK_MARGIN: usize = 2;
const SCATTER_MIN_CENTER_DISTANCE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MazeType {
    /// Spanning tree: exactly one simple path between any two cells.
    Perfect,
    Imperfect,
    Open,
}

impl MazeType {
    pub const ALL: [MazeType; 3] = [MazeType::Perfect, MazeType::Imperfect, MazeType::Open];

    pub fn label(self) -> &'static str {
        match self {
            MazeType::Perfect => "perfect",
            MazeType::Imperfect => "imperfect",
            MazeType::Open => "open",
        }
    }

    pub fn next(self) -> Self {
        match self {
            MazeType::Perfect => MazeType::Imperfect,
            MazeType::Imperfect => MazeType::Open,
            MazeType::Open => MazeType::Perfect,
        }
    }
}

impl fmt::Display for MazeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MazeType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perfect" => Ok(MazeType::Perfect),
            "imperfect" => Ok(MazeType::Imperfect),
            "open" | "pacman" => Ok(MazeType::Open),
            _ => Err(ConfigError::UnknownMazeType(s.to_string())),
        }
    }
}

/// Builds a traversable `size`x`size` maze. Every variant ends with a
/// connectivity repair from `(0,0)` and the entrance/exit carve-out.
pub fn generate(size: usize, maze_type: MazeType, rng: &mut impl Rng) -> Grid {
    let mut grid = match maze_type {
        MazeType::Perfect => {
            let mut grid = Grid::new(size);
            carve_perfect(&mut grid, rng);
            grid
        }
        MazeType::Imperfect => {
            let mut grid = Grid::new(size);
            carve_perfect(&mut grid, rng);
            add_random_openings(&mut grid, rng);
            add_loops(&mut grid, rng);
            add_connective_passages(&mut grid, rng);
            grid
        }
        MazeType::Open => build_open_layout(size, rng),
    };

    let repaired = repair_connectivity(&mut grid);
    grid.open_entrance_and_exit();
    log::debug!(
        "generated {maze_type} maze {size}x{size}: {} open edges, {repaired} repairs",
        grid.open_edge_count()
    );
    grid
}

/// Randomized depth-first carve from `(0,0)` with an explicit stack.
pub fn carve_perfect(grid: &mut Grid, rng: &mut impl Rng) {
    if grid.size() == 0 {
        return;
    }
    let start = Pos::new(0, 0);
    let mut stack = vec![start];
    grid.mark_visited(start);

    while let Some(&current) = stack.last() {
        let neighbors: Vec<Pos> = Dir::ALL
            .into_iter()
            .filter_map(|dir| grid.step(current, dir))
            .filter(|&next| !grid.is_visited(next))
            .collect();

        match neighbors.choose(rng) {
            Some(&next) => {
                grid.remove_wall(current, next);
                grid.mark_visited(next);
                stack.push(next);
            }
            None => {
                stack.pop();
            }
        }
    }
}

fn random_dir(rng: &mut impl Rng) -> Dir {
    Dir::ALL[rng.gen_range(0..Dir::ALL.len())]
}

/// Knocks out roughly a quarter of the cell count in random walls.
fn add_random_openings(grid: &mut Grid, rng: &mut impl Rng) {
    let size = grid.size();
    let attempts = (size as f64 * size as f64 * EXTRA_WALL_FRACTION) as usize;
    for _ in 0..attempts {
        let pos = Pos::new(rng.gen_range(0..size), rng.gen_range(0..size));
        grid.remove_wall_towards(pos, random_dir(rng));
    }
}

/// Opens small 2x2 or 3x3 areas to break up dead ends.
fn add_loops(grid: &mut Grid, rng: &mut impl Rng) {
    let size = grid.size();
    if size < 5 {
        return;
    }
    let loops = (size / 3).max(3);
    for _ in 0..loops {
        let area = Pos::new(rng.gen_range(2..size - 2), rng.gen_range(2..size - 2));
        let span = if rng.gen_bool(0.5) { 2 } else { 3 };
        for drow in 0..span {
            for dcol in 0..span {
                let row = (area.row + drow).min(size - 1);
                let col = (area.col + dcol).min(size - 1);
                let pos = Pos::new(row, col);
                if rng.gen_bool(LOOP_WALL_CHANCE) {
                    grid.remove_wall_towards(pos, Dir::Right);
                    grid.remove_wall_towards(pos, Dir::Down);
                }
            }
        }
    }
}

/// Long horizontal and vertical runs plus short diagonal staircases.
fn add_connective_passages(grid: &mut Grid, rng: &mut impl Rng) {
    let size = grid.size();
    if size < 3 {
        return;
    }
    let runs = (size / 4).max(2);
    for i in 0..runs {
        let row = (i + 1) * size / (runs + 1);
        for col in (1..size - 1).step_by(2) {
            grid.remove_wall_towards(Pos::new(row, col), Dir::Right);
        }
    }
    for i in 0..runs {
        let col = (i + 1) * size / (runs + 1);
        for row in (1..size - 1).step_by(2) {
            grid.remove_wall_towards(Pos::new(row, col), Dir::Down);
        }
    }

    if size < 4 {
        return;
    }
    let diagonals = (size / 3).max(3);
    for _ in 0..diagonals {
        let start = Pos::new(rng.gen_range(1..size - 2), rng.gen_range(1..size - 2));
        for step in 0..3 {
            let pos = Pos::new(start.row + step, start.col + step);
            if pos.row >= size - 1 || pos.col >= size - 1 {
                break;
            }
            if rng.gen_bool(DIAGONAL_STEP_CHANCE) {
                let dir = if step % 2 == 0 { Dir::Right } else { Dir::Down };
                grid.remove_wall_towards(pos, dir);
            }
        }
    }
}

/// Open floor, boundary ring, corner blocks, central house, barriers,
/// optional tunnel mouths and finally forced corridors.
fn build_open_layout(size: usize, rng: &mut impl Rng) -> Grid {
    let mut grid = Grid::open(size);
    if size == 0 {
        return grid;
    }
    add_boundary_ring(&mut grid);

    let center = size / 2;
    add_corner_blocks(&mut grid);
    add_house(&mut grid, center);
    add_barriers(&mut grid, rng);
    if size >= 15 {
        add_tunnels(&mut grid, center);
    }
    clear_corridors(&mut grid);
    grid
}

fn add_boundary_ring(grid: &mut Grid) {
    let last = grid.size() - 1;
    for i in 0..grid.size() {
        grid.set_wall(Pos::new(0, i), Dir::Up, true);
        grid.set_wall(Pos::new(last, i), Dir::Down, true);
        grid.set_wall(Pos::new(i, 0), Dir::Left, true);
        grid.set_wall(Pos::new(i, last), Dir::Right, true);
    }
}

/// Solid rectangle clipped to the interior (never touches row/col 0 or the
/// last row/col).
fn add_rect_block(grid: &mut Grid, top: usize, left: usize, height: usize, width: usize) {
    let limit = grid.size().saturating_sub(1);
    for row in top.max(1)..(top + height).min(limit) {
        for col in left.max(1)..(left + width).min(limit) {
            grid.add_block(Pos::new(row, col));
        }
    }
}

fn add_corner_blocks(grid: &mut Grid) {
    let size = grid.size();
    if size < 8 {
        return;
    }
    let block = (size / 12).max(1);
    let far = size - BLOCK_MARGIN - block;
    for (top, left) in [
        (BLOCK_MARGIN, BLOCK_MARGIN),
        (BLOCK_MARGIN, far),
        (far, BLOCK_MARGIN),
        (far, far),
    ] {
        add_rect_block(grid, top, left, block, block);
    }
}

/// Hollow square around the centre with gaps in the middle of its top and
/// bottom edges.
fn add_house(grid: &mut Grid, center: usize) {
    let size = grid.size();
    let house = (size / 8).max(2);
    let (Some(top), Some(left)) = (
        center.checked_sub(house / 2),
        center.checked_sub(house / 2),
    ) else {
        return;
    };
    let bottom = top + house - 1;
    let right = left + house - 1;
    for row in top..=bottom {
        for col in left..=right {
            if row < 1 || col < 1 || row >= size - 1 || col >= size - 1 {
                continue;
            }
            let on_edge = row == top || row == bottom || col == left || col == right;
            let is_gap = col == center && (row == top || row == bottom);
            if on_edge && !is_gap {
                grid.add_block(Pos::new(row, col));
            }
        }
    }
}

fn add_barriers(grid: &mut Grid, rng: &mut impl Rng) {
    let size = grid.size();
    if size >= 10 {
        let near = size / 4;
        let far = 3 * size / 4;
        for (row, col) in [(near, near), (near, far - 1), (far, near), (far, far - 1)] {
            add_rect_block(grid, row, col, 1, 2);
        }
    }

    if size >= 12 {
        let center = Pos::new(size / 2, size / 2);
        let count = (size / 8).max(2);
        for _ in 0..count {
            let pos = Pos::new(3 + rng.gen_range(0..size - 6), 3 + rng.gen_range(0..size - 6));
            if pos.manhattan(center) > SCATTER_MIN_CENTER_DISTANCE {
                grid.add_block(pos);
            }
        }
    }
}

fn add_tunnels(grid: &mut Grid, row: usize) {
    let last = grid.size() - 1;
    for col in [0, 1, last - 1, last] {
        let pos = Pos::new(row, col);
        if grid.is_fully_enclosed(pos) {
            continue;
        }
        grid.clear_around(pos);
    }
    grid.set_wall(Pos::new(row, 0), Dir::Left, false);
    grid.set_wall(Pos::new(row, last), Dir::Right, false);
}

/// Clears every wall between non-block cells along the rows and columns at
/// one and two thirds of the grid.
fn clear_corridors(grid: &mut Grid) {
    let size = grid.size();
    let lines = [size / 3, 2 * size / 3];
    for line in lines {
        if line == 0 || line >= size - 1 {
            continue;
        }
        for i in 1..size - 1 {
            for pos in [Pos::new(line, i), Pos::new(i, line)] {
                if !grid.is_fully_enclosed(pos) {
                    grid.clear_around(pos);
                }
            }
        }
    }
}

/// Joins every valid cell to the component of `(0,0)`. Opens a wall between
/// a reachable cell and an unreachable floor cell where one exists; failing
/// that, opens the block next to the reachable region that lies closest to
/// the stranded cells. Returns the number of walls opened.
pub fn repair_connectivity(grid: &mut Grid) -> usize {
    let size = grid.size();
    if size == 0 {
        return 0;
    }
    let origin = Pos::new(0, 0);
    if grid.is_fully_enclosed(origin) {
        // A lone sealed start cell: give it one way out.
        if let Some(next) = grid.step(origin, Dir::Right).or(grid.step(origin, Dir::Down)) {
            grid.remove_wall(origin, next);
        }
    }

    let mut opened = 0;
    for _ in 0..size * size {
        let seen = reachable_from(grid, origin);
        let stranded: Vec<Pos> = grid
            .positions()
            .filter(|&pos| is_valid_position(grid, pos) && !seen[grid.index(pos)])
            .collect();
        if stranded.is_empty() {
            break;
        }

        if let Some((from, to)) = find_bridge(grid, &seen, &stranded) {
            grid.remove_wall(from, to);
        } else if let Some((from, block)) = find_block_to_open(grid, &seen, &stranded) {
            grid.remove_wall(from, block);
        } else {
            log::warn!("connectivity repair stalled with {} stranded cells", stranded.len());
            break;
        }
        opened += 1;
    }
    opened
}

fn find_bridge(grid: &Grid, seen: &[bool], stranded: &[Pos]) -> Option<(Pos, Pos)> {
    stranded.iter().find_map(|&cell| {
        Dir::ALL.into_iter().find_map(|dir| {
            let next = grid.step(cell, dir)?;
            let reachable = seen[grid.index(next)] && is_valid_position(grid, next);
            reachable.then_some((next, cell))
        })
    })
}

fn find_block_to_open(grid: &Grid, seen: &[bool], stranded: &[Pos]) -> Option<(Pos, Pos)> {
    grid.positions()
        .filter(|&pos| grid.is_fully_enclosed(pos))
        .filter_map(|block| {
            let from = Dir::ALL.into_iter().find_map(|dir| {
                grid.step(block, dir)
                    .filter(|&next| seen[grid.index(next)] && is_valid_position(grid, next))
            })?;
            let distance = stranded.iter().map(|s| s.manhattan(block)).min()?;
            Some((distance, from, block))
        })
        .min_by_key(|&(distance, from, block)| (distance, block, from))
        .map(|(_, from, block)| (from, block))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::passability::is_fully_connected;

    #[test]
    fn perfect_maze_is_a_spanning_tree() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = generate(10, MazeType::Perfect, &mut rng);
        assert_eq!(grid.open_edge_count(), 99);
        let seen = reachable_from(&grid, Pos::new(0, 0));
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn imperfect_maze_has_cycles_and_stays_connected() {
        let mut rng = StdRng::seed_from_u64(11);
        let grid = generate(12, MazeType::Imperfect, &mut rng);
        assert!(grid.open_edge_count() > 12 * 12 - 1);
        assert!(is_fully_connected(&grid, Pos::new(0, 0)));
        assert!(grid.walls_are_symmetric());
    }

    #[test]
    fn open_layout_has_blocks_and_house() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = generate(16, MazeType::Open, &mut rng);
        let blocks = grid.positions().filter(|&p| grid.is_fully_enclosed(p)).count();
        assert!(blocks > 0);
        // Top-left corner block sits at the margin.
        assert!(grid.is_fully_enclosed(Pos::new(BLOCK_MARGIN, BLOCK_MARGIN)));
        // House gap in the middle of its top edge stays open.
        assert!(!grid.is_fully_enclosed(Pos::new(7, 8)));
        assert!(is_fully_connected(&grid, Pos::new(0, 0)));
    }

    #[test]
    fn open_layout_tunnel_mouths_are_open() {
        let mut rng = StdRng::seed_from_u64(5);
        let grid = generate(15, MazeType::Open, &mut rng);
        assert!(!grid.has_wall(Pos::new(7, 0), Dir::Left));
        assert!(!grid.has_wall(Pos::new(7, 14), Dir::Right));
    }

    #[test]
    fn repair_joins_sealed_pocket() {
        let mut grid = Grid::open(5);
        // Wall off the bottom-right 2x2 corner with a ring of blocks.
        for (row, col) in [(2, 2), (2, 3), (2, 4), (3, 2), (4, 2)] {
            grid.add_block(Pos::new(row, col));
        }
        assert!(!is_fully_connected(&grid, Pos::new(0, 0)));
        let opened = repair_connectivity(&mut grid);
        assert!(opened >= 1);
        assert!(is_fully_connected(&grid, Pos::new(0, 0)));
        assert!(grid.walls_are_symmetric());
    }

    #[test]
    fn parses_maze_type_names() {
        assert_eq!("Perfect".parse::<MazeType>(), Ok(MazeType::Perfect));
        assert_eq!("pacman".parse::<MazeType>(), Ok(MazeType::Open));
        assert!("hex".parse::<MazeType>().is_err());
    }
}
