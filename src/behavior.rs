//! Per-ghost decisions: which behavior applies this tick and which
//! neighbouring cell it leads to.
//!
//! Every behavior is an ordered chain of [`Strategy`] values tried until one
//! proposes a cell.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::RESCUE_RADIUS;
use crate::ghost::{Behavior, GhostState};
use crate::grid::{Dir, Grid, Pos};
use crate::passability::{nearest_valid_cell, open_moves, valid_moves};
use crate::pathfinding::{astar, bfs, first_step};

const CHASE_SOFTEN_DISTANCE: usize = 5;
const AMBUSH_SOFTEN_DISTANCE: usize = 4;
const RANDOM_TOWARD_CHANCE: f64 = 0.7;
const SCATTER_NOISE: f64 = 0.3;

/// Resolves the behavior a ghost acts on. A downed player makes every ghost
/// flee; otherwise frightened ghosts flee and eaten ones head home. Grace
/// softens close-range chasing into scatter.
pub fn effective_behavior(
    base: Behavior,
    state: GhostState,
    player_down: bool,
    in_grace: bool,
    distance: usize,
) -> Behavior {
    if player_down {
        return Behavior::Flee;
    }
    match state {
        GhostState::Frightened => return Behavior::Flee,
        GhostState::Eaten | GhostState::Returning => return Behavior::Return,
        _ => {}
    }
    match base {
        Behavior::Chase if in_grace && distance <= CHASE_SOFTEN_DISTANCE => Behavior::Scatter,
        Behavior::Ambush if in_grace && distance <= AMBUSH_SOFTEN_DISTANCE => Behavior::Scatter,
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    AStar,
    Bfs,
    /// Step along the dominant axis toward the target, if open.
    Direct,
    /// Valid move ranked by Manhattan distance plus a little noise.
    NoisyHeuristic,
    Nearest,
    AnyValid,
    /// Valid move that increases the distance from the target the most.
    Away,
}

impl Strategy {
    pub fn propose(self, grid: &Grid, from: Pos, target: Pos, rng: &mut impl Rng) -> Option<Pos> {
        match self {
            Strategy::AStar => astar(grid, from, target).as_deref().and_then(first_step),
            Strategy::Bfs => bfs(grid, from, target).as_deref().and_then(first_step),
            Strategy::Direct => {
                let dir = direction_toward(from, target);
                valid_moves(grid, from)[dir.index()]
            }
            Strategy::NoisyHeuristic => open_moves(grid, from)
                .into_iter()
                .map(|next| {
                    let score = next.manhattan(target) as f64 + rng.gen::<f64>() * SCATTER_NOISE;
                    (next, score)
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(next, _)| next),
            Strategy::Nearest => open_moves(grid, from)
                .into_iter()
                .min_by_key(|next| next.manhattan(target)),
            Strategy::AnyValid => open_moves(grid, from).choose(rng).copied(),
            Strategy::Away => {
                let current = from.manhattan(target);
                open_moves(grid, from)
                    .into_iter()
                    .filter(|next| next.manhattan(target) > current)
                    .max_by_key(|next| next.manhattan(target))
            }
        }
    }
}

/// Dominant-axis direction; vertical wins ties.
fn direction_toward(from: Pos, to: Pos) -> Dir {
    let drow = to.row as isize - from.row as isize;
    let dcol = to.col as isize - from.col as isize;
    if dcol.abs() > drow.abs() {
        if dcol > 0 {
            Dir::Right
        } else {
            Dir::Left
        }
    } else if drow > 0 {
        Dir::Down
    } else {
        Dir::Up
    }
}

/// Strategy chain for a behavior. `Random` rolls its branch here.
pub fn chain(behavior: Behavior, rng: &mut impl Rng) -> &'static [Strategy] {
    use Strategy::*;
    match behavior {
        Behavior::Chase => &[AStar, Direct, NoisyHeuristic, Nearest],
        Behavior::Scatter => &[NoisyHeuristic, Direct, Nearest],
        Behavior::Ambush => &[Bfs, AStar, NoisyHeuristic, Nearest],
        Behavior::Random => {
            if rng.gen_bool(RANDOM_TOWARD_CHANCE) {
                &[Nearest, AnyValid]
            } else {
                &[AnyValid]
            }
        }
        Behavior::Flee => &[Away, AnyValid],
        Behavior::Return => &[AStar, Nearest],
    }
}

const LAST_RESORT: [Strategy; 2] = [Strategy::Nearest, Strategy::AnyValid];

/// Picks the next cell for a ghost at `from`. Returning ghosts aim for
/// `spawn`, everything else is measured against the player.
pub fn decide(
    grid: &Grid,
    from: Pos,
    behavior: Behavior,
    player: Pos,
    spawn: Pos,
    rng: &mut impl Rng,
) -> Option<Pos> {
    let target = if behavior == Behavior::Return { spawn } else { player };
    for strategy in chain(behavior, rng) {
        if let Some(next) = strategy.propose(grid, from, target, rng) {
            return Some(next);
        }
    }
    if behavior == Behavior::Return {
        return None;
    }
    let next = LAST_RESORT
        .iter()
        .find_map(|strategy| strategy.propose(grid, from, player, rng));
    log::debug!("{behavior:?} chain exhausted at {from:?}, last resort gave {next:?}");
    next
}

/// Wait between two ghost moves. Shrinks as the player gets closer and is
/// longer while the ghost is still in its grace period.
pub fn move_interval(in_grace: bool, distance: usize, rng: &mut impl Rng) -> Duration {
    let (low, high) = if in_grace {
        (600, 1_000)
    } else if distance <= 3 {
        (200, 400)
    } else if distance <= 6 {
        (300, 500)
    } else {
        (400, 600)
    };
    Duration::from_millis(rng.gen_range(low..high))
}

/// Nearest standable cell around `pos`, or `fallback` when the
/// neighbourhood is solid.
pub fn rescue_cell(grid: &Grid, pos: Pos, fallback: Pos) -> Pos {
    match nearest_valid_cell(grid, pos, RESCUE_RADIUS) {
        Some(cell) => cell,
        None => {
            log::warn!("no valid cell within {RESCUE_RADIUS} of {pos:?}, using {fallback:?}");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn downed_player_overrides_everything() {
        for state in [GhostState::Normal, GhostState::Frightened, GhostState::Returning] {
            assert_eq!(
                effective_behavior(Behavior::Chase, state, true, false, 10),
                Behavior::Flee
            );
        }
    }

    #[test]
    fn state_overrides_base_behavior() {
        assert_eq!(
            effective_behavior(Behavior::Ambush, GhostState::Frightened, false, false, 2),
            Behavior::Flee
        );
        assert_eq!(
            effective_behavior(Behavior::Random, GhostState::Returning, false, false, 2),
            Behavior::Return
        );
        assert_eq!(
            effective_behavior(Behavior::Random, GhostState::Normal, false, false, 2),
            Behavior::Random
        );
    }

    #[test]
    fn grace_softens_close_pursuit() {
        let normal = GhostState::Normal;
        assert_eq!(effective_behavior(Behavior::Chase, normal, false, true, 5), Behavior::Scatter);
        assert_eq!(effective_behavior(Behavior::Chase, normal, false, true, 6), Behavior::Chase);
        assert_eq!(effective_behavior(Behavior::Ambush, normal, false, true, 4), Behavior::Scatter);
        assert_eq!(effective_behavior(Behavior::Ambush, normal, false, true, 5), Behavior::Ambush);
        assert_eq!(effective_behavior(Behavior::Chase, normal, false, false, 1), Behavior::Chase);
    }

    #[test]
    fn chase_steps_onto_shortest_route() {
        let mut grid = Grid::open(3);
        grid.add_block(Pos::new(0, 1));
        let next = decide(
            &grid,
            Pos::new(0, 0),
            Behavior::Chase,
            Pos::new(0, 2),
            Pos::new(2, 2),
            &mut rng(),
        );
        assert_eq!(next, Some(Pos::new(1, 0)));
    }

    #[test]
    fn flee_moves_away_from_player() {
        let grid = Grid::open(5);
        let from = Pos::new(2, 2);
        let player = Pos::new(2, 1);
        let next = decide(&grid, from, Behavior::Flee, player, from, &mut rng()).unwrap();
        assert!(next.manhattan(player) > from.manhattan(player));
    }

    #[test]
    fn flee_in_a_dead_end_still_moves() {
        // Only exit leads toward the player.
        let mut grid = Grid::new(3);
        grid.remove_wall(Pos::new(0, 0), Pos::new(0, 1));
        grid.remove_wall(Pos::new(0, 1), Pos::new(0, 2));
        let next = decide(
            &grid,
            Pos::new(0, 2),
            Behavior::Flee,
            Pos::new(0, 0),
            Pos::new(0, 2),
            &mut rng(),
        );
        assert_eq!(next, Some(Pos::new(0, 1)));
    }

    #[test]
    fn return_heads_for_spawn() {
        let grid = Grid::open(4);
        let next = decide(
            &grid,
            Pos::new(3, 0),
            Behavior::Return,
            Pos::new(3, 3),
            Pos::new(0, 0),
            &mut rng(),
        );
        assert_eq!(next, Some(Pos::new(2, 0)));
    }

    #[test]
    fn boxed_in_ghost_has_no_move() {
        let grid = Grid::new(3);
        let mut rng = rng();
        for behavior in [Behavior::Chase, Behavior::Scatter, Behavior::Random, Behavior::Flee] {
            assert_eq!(
                decide(&grid, Pos::new(1, 1), behavior, Pos::new(0, 0), Pos::new(1, 1), &mut rng),
                None
            );
        }
    }

    /// 3x3 with a dead end at (0,0): the greedy step from (0,1) toward
    /// (2,0) goes there, the real route goes round the right side.
    fn hook() -> Grid {
        let mut grid = Grid::new(3);
        for (a, b) in [
            ((0, 0), (0, 1)),
            ((0, 1), (0, 2)),
            ((0, 2), (1, 2)),
            ((1, 2), (2, 2)),
            ((2, 2), (2, 1)),
            ((2, 1), (2, 0)),
        ] {
            grid.remove_wall(Pos::new(a.0, a.1), Pos::new(b.0, b.1));
        }
        grid
    }

    #[test]
    fn scatter_is_greedy_where_chase_and_ambush_route() {
        let grid = hook();
        let (from, player) = (Pos::new(0, 1), Pos::new(2, 0));
        let mut rng = rng();
        for _ in 0..20 {
            assert_eq!(
                decide(&grid, from, Behavior::Scatter, player, from, &mut rng),
                Some(Pos::new(0, 0))
            );
        }
        for behavior in [Behavior::Chase, Behavior::Ambush] {
            assert_eq!(
                decide(&grid, from, behavior, player, from, &mut rng),
                Some(Pos::new(0, 2))
            );
        }
        assert_eq!(chain(Behavior::Ambush, &mut rng)[..2], [Strategy::Bfs, Strategy::AStar]);
    }

    #[test]
    fn scatter_noise_breaks_ties_both_ways() {
        let grid = Grid::open(5);
        let (from, player) = (Pos::new(2, 2), Pos::new(0, 0));
        let mut rng = rng();
        let picks: Vec<Pos> = (0..200)
            .filter_map(|_| decide(&grid, from, Behavior::Scatter, player, from, &mut rng))
            .collect();
        assert!(picks.iter().all(|p| p.manhattan(player) == 3));
        assert!(picks.contains(&Pos::new(1, 2)));
        assert!(picks.contains(&Pos::new(2, 1)));
    }

    #[test]
    fn random_leans_toward_player() {
        let mut rng = rng();
        let toward = (0..2_000)
            .filter(|_| chain(Behavior::Random, &mut rng)[0] == Strategy::Nearest)
            .count();
        assert!((1_250..1_550).contains(&toward), "toward = {toward}");

        // Nearest takes the first improving move; any-valid spreads over all four.
        let grid = Grid::open(5);
        let (from, player) = (Pos::new(2, 2), Pos::new(0, 0));
        let picks: Vec<Pos> = (0..2_000)
            .filter_map(|_| decide(&grid, from, Behavior::Random, player, from, &mut rng))
            .collect();
        let nearest = picks.iter().filter(|&&p| p == Pos::new(1, 2)).count();
        let away = picks.iter().filter(|&&p| p == Pos::new(3, 2)).count();
        assert!((1_400..1_700).contains(&nearest), "nearest = {nearest}");
        assert!(away > 50 && away < 300, "away = {away}");
    }

    #[test]
    fn direct_prefers_dominant_axis() {
        assert_eq!(direction_toward(Pos::new(2, 2), Pos::new(2, 0)), Dir::Left);
        assert_eq!(direction_toward(Pos::new(2, 2), Pos::new(4, 3)), Dir::Down);
        assert_eq!(direction_toward(Pos::new(2, 2), Pos::new(1, 3)), Dir::Up);
    }

    #[test]
    fn intervals_tighten_with_proximity() {
        let mut rng = rng();
        for _ in 0..50 {
            let close = move_interval(false, 2, &mut rng);
            assert!(close >= Duration::from_millis(200) && close < Duration::from_millis(400));
            let far = move_interval(false, 12, &mut rng);
            assert!(far >= Duration::from_millis(400) && far < Duration::from_millis(600));
            let grace = move_interval(true, 1, &mut rng);
            assert!(grace >= Duration::from_millis(600) && grace < Duration::from_millis(1_000));
        }
    }

    #[test]
    fn rescue_falls_back_when_solid() {
        let grid = Grid::new(4);
        assert_eq!(rescue_cell(&grid, Pos::new(2, 2), Pos::new(0, 0)), Pos::new(0, 0));

        let mut open = Grid::open(4);
        open.add_block(Pos::new(2, 2));
        assert_eq!(rescue_cell(&open, Pos::new(2, 2), Pos::new(0, 0)).manhattan(Pos::new(2, 2)), 1);
    }
}
