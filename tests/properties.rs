use std::time::Duration;

use maze_chase::maze::generate;
use maze_chase::passability::{is_fully_connected, is_valid_position};
use maze_chase::pathfinding::{astar_search, bfs_search};
use maze_chase::{
    Dir, GameConfig, GameEvent, GhostState, Grid, InputIntent, MazeType, Pos, Session,
    SessionStatus,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn maze(size: usize, maze_type: MazeType, seed: u64) -> Grid {
    generate(size, maze_type, &mut StdRng::seed_from_u64(seed))
}

#[test]
fn perfect_mazes_are_spanning_trees() {
    for size in [2, 3, 5, 8, 13] {
        for seed in 0..8 {
            let grid = maze(size, MazeType::Perfect, seed);
            assert_eq!(grid.open_edge_count(), size * size - 1, "size {size} seed {seed}");
            assert!(is_fully_connected(&grid, Pos::new(0, 0)));
            assert!(grid.walls_are_symmetric());
        }
    }
}

#[test]
fn ten_by_ten_perfect_maze() {
    let grid = maze(10, MazeType::Perfect, 2024);
    assert_eq!(grid.open_edge_count(), 99);
    assert!(grid.positions().all(|pos| is_valid_position(&grid, pos)));
}

#[test]
fn every_maze_type_is_connected_with_entrance_and_exit() {
    for maze_type in MazeType::ALL {
        for seed in 0..6 {
            let grid = maze(12, maze_type, seed);
            let last = grid.size() - 1;
            assert!(grid.walls_are_symmetric(), "{maze_type} seed {seed}");
            assert!(is_fully_connected(&grid, Pos::new(0, 0)), "{maze_type} seed {seed}");
            assert!(!grid.has_wall(Pos::new(0, 0), Dir::Left));
            assert!(!grid.has_wall(Pos::new(last, last), Dir::Right));
            assert!(is_valid_position(&grid, Pos::new(0, 0)));
        }
    }
}

#[test]
fn loops_only_add_edges() {
    for seed in 0..6 {
        let imperfect = maze(10, MazeType::Imperfect, seed);
        assert!(imperfect.open_edge_count() >= 99);
    }
}

#[test]
fn astar_matches_bfs_lengths() {
    for maze_type in MazeType::ALL {
        let grid = maze(7, maze_type, 17);
        let cells: Vec<Pos> = grid
            .positions()
            .filter(|&pos| is_valid_position(&grid, pos))
            .collect();
        for &start in &cells {
            for &goal in &cells {
                let a = astar_search(&grid, start, goal);
                let b = bfs_search(&grid, start, goal);
                let a_len = a.path.as_ref().map(Vec::len);
                let b_len = b.path.as_ref().map(Vec::len);
                assert_eq!(a_len, b_len, "{maze_type} {start:?} -> {goal:?}");
                assert!(a.expanded <= grid.size() * grid.size());
                if let Some(path) = a.path {
                    assert_eq!(path.first(), Some(&start));
                    assert_eq!(path.last(), Some(&goal));
                }
            }
        }
    }
}

#[test]
fn session_round_trip() {
    let mut session = Session::new(&GameConfig::with_seed(77));
    assert_eq!(session.status(), SessionStatus::Ready);

    session.start(10, MazeType::Perfect);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Playing);
    assert_eq!(snapshot.lives, 3);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.ghost_count(), 3);
    assert!(snapshot
        .ghosts
        .iter()
        .all(|ghost| ghost.state == GhostState::Normal && ghost.cell != Pos::new(0, 0)));
    assert!(!snapshot.has_pellet(Pos::new(0, 0)));
    assert!(!snapshot.grace_left.is_zero());

    // Ten seconds of play; score and lives only ever move one way.
    let mut last_score = 0;
    let mut last_lives = 3;
    for frame in 0..600 {
        let dir = Dir::ALL[(frame / 40) % 4];
        session.tick(Duration::from_millis(16), &InputIntent::moving(dir));
        let snapshot = session.snapshot();
        assert!(snapshot.score >= last_score);
        assert!(snapshot.lives <= last_lives);
        assert!(snapshot.pellets_collected <= snapshot.total_pellets);
        last_score = snapshot.score;
        last_lives = snapshot.lives;
        if !session.is_playing() {
            break;
        }
    }

    let events = session.drain_events();
    assert!(events.iter().filter(|e| **e == GameEvent::Won).count() <= 1);
    session.reset();
    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.snapshot().ghost_count(), 0);
}

#[test]
fn ticks_do_nothing_before_start() {
    let mut session = Session::new(&GameConfig::with_seed(3));
    let before = session.snapshot();
    session.tick(Duration::from_secs(1), &InputIntent::moving(Dir::Right));
    assert_eq!(session.snapshot(), before);
    assert!(session.drain_events().is_empty());
}
