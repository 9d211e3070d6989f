use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{MAX_POWER_PELLETS, PELLET_DENSITY};
use crate::ghost::Ghost;
use crate::grid::{Grid, Pos};
use crate::maze::{self, MazeType};
use crate::passability::is_valid_position;

pub const PLAYER_START: Pos = Pos::new(0, 0);
pub const MAX_GHOSTS: usize = 4;
const MIN_SPAWN_DISTANCE: usize = 5;
const POWER_PELLET_CLEARANCE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectibleKind {
    Pellet,
    PowerPellet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collectible {
    pub cell: Pos,
    pub kind: CollectibleKind,
    collected: bool,
}

impl Collectible {
    pub fn new(cell: Pos, kind: CollectibleKind) -> Self {
        Self {
            cell,
            kind,
            collected: false,
        }
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Marks the collectible taken. False if it already was.
    pub fn collect(&mut self) -> bool {
        !std::mem::replace(&mut self.collected, true)
    }
}

#[derive(Debug, Clone)]
pub struct Level {
    pub grid: Grid,
    pub pellets: Vec<Collectible>,
    pub power_pellets: Vec<Collectible>,
    pub ghosts: Vec<Ghost>,
}

impl Level {
    pub fn build(size: usize, maze_type: MazeType, rng: &mut impl Rng) -> Self {
        let mut grid = maze::generate(size, maze_type, rng);
        let pellets = place_pellets(&mut grid, PLAYER_START, rng);
        let power_pellets = place_power_pellets(&grid, PLAYER_START, rng);
        let ghosts = spawn_ghosts(&grid, PLAYER_START, rng);
        log::debug!(
            "level {size}x{size}: {} pellets, {} power pellets, {} ghosts",
            pellets.len(),
            power_pellets.len(),
            ghosts.len()
        );
        Self {
            grid,
            pellets,
            power_pellets,
            ghosts,
        }
    }
}

/// Scatters regular pellets over valid cells other than `start` and mirrors
/// them into the grid's pellet flags.
pub fn place_pellets(grid: &mut Grid, start: Pos, rng: &mut impl Rng) -> Vec<Collectible> {
    grid.clear_pellets();
    let cells: Vec<Pos> = grid
        .positions()
        .filter(|&pos| pos != start && is_valid_position(grid, pos))
        .collect();
    let mut pellets = Vec::new();
    for pos in cells {
        if rng.gen_bool(PELLET_DENSITY) {
            grid.set_pellet(pos, true);
            pellets.push(Collectible::new(pos, CollectibleKind::Pellet));
        }
    }
    pellets
}

fn power_pellet_candidates(grid: &Grid) -> Vec<Pos> {
    let n = grid.size();
    if n < 2 {
        return Vec::new();
    }
    let (near, far, center) = (1, n - 2, n / 2);
    let mut spots = vec![
        Pos::new(near, near),
        Pos::new(near, far),
        Pos::new(far, near),
        Pos::new(far, far),
    ];
    if let Some(edge) = n.checked_sub(3) {
        spots.extend([
            Pos::new(2, center),
            Pos::new(edge, center),
            Pos::new(center, 2),
            Pos::new(center, edge),
        ]);
    }
    let mut candidates: Vec<Pos> = Vec::new();
    for pos in spots {
        if is_valid_position(grid, pos) && !candidates.contains(&pos) {
            candidates.push(pos);
        }
    }
    candidates
}

/// Up to four power pellets on inner corners and edge midpoints, none right
/// next to the player start.
pub fn place_power_pellets(grid: &Grid, start: Pos, rng: &mut impl Rng) -> Vec<Collectible> {
    let mut candidates = power_pellet_candidates(grid);
    candidates.shuffle(rng);
    candidates
        .into_iter()
        .take(MAX_POWER_PELLETS)
        .filter(|pos| pos.manhattan(start) >= POWER_PELLET_CLEARANCE)
        .map(|pos| Collectible::new(pos, CollectibleKind::PowerPellet))
        .collect()
}

pub fn ghost_count(size: usize) -> usize {
    MAX_GHOSTS.min(size / 5 + 1)
}

/// Distinct spawn cells, preferring ones far from `start`. Falls back to
/// any valid cell and finally to a fixed default.
pub fn ghost_spawn_cells(grid: &Grid, start: Pos, count: usize, rng: &mut impl Rng) -> Vec<Pos> {
    let min_distance = MIN_SPAWN_DISTANCE.max(grid.size() / 3);
    let (mut eligible, mut relaxed): (Vec<Pos>, Vec<Pos>) = grid
        .positions()
        .filter(|&pos| pos != start && is_valid_position(grid, pos))
        .partition(|pos| pos.manhattan(start) >= min_distance);
    eligible.shuffle(rng);
    relaxed.shuffle(rng);

    let preferred = eligible.len();
    let mut candidates = eligible.into_iter().chain(relaxed);
    let fallback = if grid.in_bounds(Pos::new(1, 1)) {
        Pos::new(1, 1)
    } else {
        start
    };
    (0..count)
        .map(|i| {
            if i == preferred {
                log::warn!("only {preferred} spawn cells at distance {min_distance}, relaxing");
            }
            candidates.next().unwrap_or_else(|| {
                log::warn!("no free spawn cell for ghost {i}, using {fallback:?}");
                fallback
            })
        })
        .collect()
}

pub fn spawn_ghosts(grid: &Grid, start: Pos, rng: &mut impl Rng) -> Vec<Ghost> {
    let count = ghost_count(grid.size());
    ghost_spawn_cells(grid, start, count, rng)
        .into_iter()
        .enumerate()
        .map(|(id, spawn)| Ghost::new(id, spawn))
        .collect()
}
