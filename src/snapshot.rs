//! Read-only view of a session for renderers, plus the discrete events the
//! core emits between snapshots.

use std::time::Duration;

use crate::ghost::{Behavior, GhostState, Rgba};
use crate::grid::{Dir, Pos};
use crate::player::LifeState;
use crate::session::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    PelletCollect,
    PowerPelletCollect,
    GhostEaten,
    PowerModeStart,
    PowerModeEnd,
    PlayerHit,
}

/// Effect position in cell units: `x` runs along columns, `z` along rows,
/// cell centres sit on `.5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub z: f32,
}

impl Anchor {
    pub fn at(pos: Pos) -> Self {
        Self {
            x: pos.col as f32 + 0.5,
            z: pos.row as f32 + 0.5,
        }
    }

    pub fn between(from: Pos, to: Pos, progress: f32) -> Self {
        let a = Self::at(from);
        let b = Self::at(to);
        let t = progress.clamp(0.0, 1.0);
        Self {
            x: a.x + (b.x - a.x) * t,
            z: a.z + (b.z - a.z) * t,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Effect { kind: EffectKind, anchor: Anchor },
    DashStarted,
    DashEnded,
    OverheadStarted,
    OverheadEnded,
    ViewReset,
    GhostRespawned { id: usize },
    PlayerRespawned,
    PlayerRescued { cell: Pos },
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub cell: Pos,
    pub target: Option<Pos>,
    pub progress: f32,
    pub life: LifeState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GhostView {
    pub id: usize,
    pub cell: Pos,
    pub target: Option<Pos>,
    pub progress: f32,
    pub state: GhostState,
    pub behavior: Behavior,
    pub tint: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectibleView {
    pub cell: Pos,
    pub collected: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbilityView {
    pub active_left: Duration,
    pub cooldown_left: Duration,
}

impl AbilityView {
    pub fn is_active(&self) -> bool {
        !self.active_left.is_zero()
    }

    pub fn is_ready(&self) -> bool {
        self.active_left.is_zero() && self.cooldown_left.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub size: usize,
    /// Row-major wall flags, ordered like [`Dir::ALL`].
    pub walls: Vec<[bool; 4]>,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub pellets: Vec<CollectibleView>,
    pub power_pellets: Vec<CollectibleView>,
    pub score: u32,
    pub lives: u32,
    pub status: SessionStatus,
    pub power_time_left: Duration,
    pub ghosts_eaten: u32,
    pub dash: AbilityView,
    pub overhead: AbilityView,
    pub grace_left: Duration,
    pub respawn_left: Duration,
    pub protection_left: Duration,
    pub light_level: f32,
    pub pellets_collected: usize,
    pub total_pellets: usize,
    pub power_pellets_collected: usize,
    pub total_power_pellets: usize,
}

impl Snapshot {
    pub fn has_wall(&self, pos: Pos, dir: Dir) -> bool {
        if pos.row >= self.size || pos.col >= self.size {
            return true;
        }
        self.walls[pos.row * self.size + pos.col][dir.index()]
    }

    pub fn is_block(&self, pos: Pos) -> bool {
        Dir::ALL.iter().all(|&dir| self.has_wall(pos, dir))
    }

    pub fn ghost_count(&self) -> usize {
        self.ghosts.len()
    }

    pub fn has_pellet(&self, pos: Pos) -> bool {
        self.pellets.iter().any(|p| p.cell == pos && !p.collected)
    }

    pub fn has_power_pellet(&self, pos: Pos) -> bool {
        self.power_pellets.iter().any(|p| p.cell == pos && !p.collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_interpolate_between_cell_centres() {
        let from = Pos::new(1, 1);
        let to = Pos::new(1, 2);
        assert_eq!(Anchor::at(from), Anchor { x: 1.5, z: 1.5 });
        assert_eq!(Anchor::between(from, to, 0.5), Anchor { x: 2.0, z: 1.5 });
        assert_eq!(Anchor::between(from, to, 3.0), Anchor::at(to));
    }

    #[test]
    fn ability_view_flags() {
        let idle = AbilityView::default();
        assert!(idle.is_ready());
        let cooling = AbilityView {
            active_left: Duration::ZERO,
            cooldown_left: Duration::from_secs(4),
        };
        assert!(!cooling.is_ready());
        assert!(!cooling.is_active());
    }
}
