//! Simulation core for a grid maze chase game.
//!
//! The session owns the maze grid, the player, the ghosts and the
//! collectibles. Front-ends feed it [`InputIntent`]s and frame deltas and
//! read back [`Snapshot`]s plus discrete [`GameEvent`]s.

pub mod behavior;
pub mod config;
pub mod countdown;
pub mod ghost;
pub mod grid;
pub mod level;
pub mod maze;
pub mod passability;
pub mod pathfinding;
pub mod player;
pub mod session;
pub mod snapshot;

pub use config::{ConfigError, GameConfig};
pub use ghost::{Behavior, GhostState, IllegalTransition};
pub use grid::{Dir, Grid, Pos};
pub use maze::MazeType;
pub use player::{InputIntent, LifeState};
pub use session::{Session, SessionStatus};
pub use snapshot::{EffectKind, GameEvent, Snapshot};
