use std::time::Duration;

use crate::config::{PROTECTION_TIME, START_LIVES};
use crate::countdown::Countdown;
use crate::grid::{Dir, Pos};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    Active,
    /// Lost a life; frozen until the manual respawn action.
    AwaitingManualRespawn,
    /// Back in play, invulnerable and stationary for a short window.
    ProtectedRespawn,
}

/// Per-tick input, already debounced by whoever polls the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputIntent {
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    /// Dash.
    pub primary_action: bool,
    /// Overhead view.
    pub secondary_action: bool,
    pub reset_view: bool,
    pub manual_respawn: bool,
}

impl InputIntent {
    pub fn moving(dir: Dir) -> Self {
        let mut intent = Self::default();
        match dir {
            Dir::Up => intent.move_up = true,
            Dir::Down => intent.move_down = true,
            Dir::Left => intent.move_left = true,
            Dir::Right => intent.move_right = true,
        }
        intent
    }

    /// One direction per tick; up beats down beats left beats right.
    pub fn direction(&self) -> Option<Dir> {
        if self.move_up {
            Some(Dir::Up)
        } else if self.move_down {
            Some(Dir::Down)
        } else if self.move_left {
            Some(Dir::Left)
        } else if self.move_right {
            Some(Dir::Right)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub cell: Pos,
    target: Pos,
    moving: bool,
    pub progress: f32,
    pub lives: u32,
    life: LifeState,
    pub protection: Countdown,
    pub pellets_collected: usize,
    pub power_pellets_collected: usize,
}

impl Player {
    pub fn new(start: Pos) -> Self {
        Self {
            cell: start,
            target: start,
            moving: false,
            progress: 0.0,
            lives: START_LIVES,
            life: LifeState::Active,
            protection: Countdown::idle(),
            pellets_collected: 0,
            power_pellets_collected: 0,
        }
    }

    pub fn life(&self) -> LifeState {
        self.life
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn target(&self) -> Option<Pos> {
        self.moving.then_some(self.target)
    }

    pub fn can_move(&self) -> bool {
        self.life == LifeState::Active
    }

    pub fn is_vulnerable(&self) -> bool {
        self.life == LifeState::Active
    }

    /// Ghosts treat a player who is waiting or protected as out of reach.
    pub fn is_down(&self) -> bool {
        self.life != LifeState::Active
    }

    pub fn begin_move(&mut self, to: Pos) {
        self.target = to;
        self.moving = true;
        self.progress = 0.0;
    }

    /// Animates at `speed` cells per second; returns true on arrival.
    pub fn advance(&mut self, dt: Duration, speed: f32) -> bool {
        if !self.moving {
            return false;
        }
        self.progress += dt.as_secs_f32() * speed;
        if self.progress < 1.0 {
            return false;
        }
        self.cell = self.target;
        self.moving = false;
        self.progress = 0.0;
        true
    }

    pub fn place(&mut self, pos: Pos) {
        self.cell = pos;
        self.target = pos;
        self.moving = false;
        self.progress = 0.0;
    }

    /// Takes a hit. Returns true when that was the last life.
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.place(self.cell);
        self.protection.clear();
        self.life = LifeState::AwaitingManualRespawn;
        self.lives == 0
    }

    pub fn manual_respawn(&mut self) -> bool {
        if self.life != LifeState::AwaitingManualRespawn {
            return false;
        }
        self.life = LifeState::ProtectedRespawn;
        self.protection.set(PROTECTION_TIME);
        true
    }

    /// Returns true when protection ends on this tick.
    pub fn tick_protection(&mut self, dt: Duration) -> bool {
        if self.life != LifeState::ProtectedRespawn || !self.protection.tick(dt) {
            return false;
        }
        self.life = LifeState::Active;
        true
    }
}
