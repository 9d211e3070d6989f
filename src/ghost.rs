use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::config::{FLASH_PHASE_MS, FLASH_WINDOW, GHOST_RESPAWN_TIME, RESPAWN_BUFFER};
use crate::countdown::Countdown;
use crate::grid::Pos;

/// Lifecycle of a ghost. Speed and tint are derived from it, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GhostState {
    Normal,
    Frightened,
    Eaten,
    Returning,
    Respawning,
}

impl GhostState {
    pub fn speed(self) -> f32 {
        match self {
            GhostState::Normal => 2.0,
            GhostState::Frightened => 1.6,
            GhostState::Eaten | GhostState::Returning => 3.0,
            GhostState::Respawning => 0.0,
        }
    }

    pub fn can_become(self, next: GhostState) -> bool {
        use GhostState::*;
        matches!(
            (self, next),
            (Normal, Frightened)
                | (Frightened, Eaten)
                | (Frightened, Normal)
                | (Eaten, Returning)
                | (Returning, Respawning)
                | (Respawning, Normal)
                | (Respawning, Frightened)
        )
    }

    /// States in which touching the player matters at all.
    pub fn is_dangerous(self) -> bool {
        matches!(self, GhostState::Normal | GhostState::Frightened)
    }

    pub fn label(self) -> &'static str {
        match self {
            GhostState::Normal => "normal",
            GhostState::Frightened => "frightened",
            GhostState::Eaten => "eaten",
            GhostState::Returning => "returning",
            GhostState::Respawning => "respawning",
        }
    }
}

impl fmt::Display for GhostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal ghost transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: GhostState,
    pub to: GhostState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behavior {
    Chase,
    Scatter,
    Ambush,
    Random,
    Flee,
    Return,
}

impl Behavior {
    /// Base behaviors handed out to the roster, in order.
    pub const ROSTER: [Behavior; 4] = [
        Behavior::Chase,
        Behavior::Scatter,
        Behavior::Ambush,
        Behavior::Random,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const RED: Rgba = Rgba::rgb(1.0, 0.0, 0.0);
    pub const PINK: Rgba = Rgba::rgb(1.0, 0.5, 1.0);
    pub const CYAN: Rgba = Rgba::rgb(0.0, 1.0, 1.0);
    pub const ORANGE: Rgba = Rgba::rgb(1.0, 0.5, 0.0);
    pub const BLUE: Rgba = Rgba::rgb(0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);
    pub const GRAY: Rgba = Rgba::rgb(0.5, 0.5, 0.5);
    pub const FADED: Rgba = Rgba {
        r: 0.3,
        g: 0.3,
        b: 0.3,
        a: 0.5,
    };

    pub const ROSTER: [Rgba; 4] = [Rgba::RED, Rgba::PINK, Rgba::CYAN, Rgba::ORANGE];
}

/// Display tint for a ghost. Frightened ghosts flash white during the last
/// stretch of power mode.
pub fn tint_of(state: GhostState, base: Rgba, power_left: Duration) -> Rgba {
    match state {
        GhostState::Normal => base,
        GhostState::Frightened => {
            let flashing = !power_left.is_zero() && power_left <= FLASH_WINDOW;
            if flashing && (power_left.as_millis() / FLASH_PHASE_MS) % 2 == 0 {
                Rgba::WHITE
            } else {
                Rgba::BLUE
            }
        }
        GhostState::Eaten | GhostState::Returning => Rgba::GRAY,
        GhostState::Respawning => Rgba::FADED,
    }
}

/// How long a ghost waits at home: the rest of any running power mode
/// plus a buffer, or the flat respawn time.
pub fn respawn_delay(power_left: Duration) -> Duration {
    if power_left.is_zero() {
        GHOST_RESPAWN_TIME
    } else {
        power_left + RESPAWN_BUFFER
    }
}

const GRACE_BASE: Duration = Duration::from_millis(1_500);
const GRACE_STEP: Duration = Duration::from_millis(300);
const FIRST_MOVE_DELAY: Duration = Duration::from_millis(600);
const FIRST_MOVE_STAGGER: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct Ghost {
    pub id: usize,
    pub cell: Pos,
    target: Pos,
    moving: bool,
    pub progress: f32,
    pub behavior: Behavior,
    state: GhostState,
    spawn: Pos,
    pub base_tint: Rgba,
    pub grace: Countdown,
    pub respawn: Countdown,
    /// Time left before the ghost may start its next move.
    pub next_move: Countdown,
}

impl Ghost {
    pub fn new(id: usize, spawn: Pos) -> Self {
        let slot = id % Behavior::ROSTER.len();
        let index = id as u32;
        Self {
            id,
            cell: spawn,
            target: spawn,
            moving: false,
            progress: 0.0,
            behavior: Behavior::ROSTER[slot],
            state: GhostState::Normal,
            spawn,
            base_tint: Rgba::ROSTER[slot],
            grace: Countdown::start(GRACE_BASE + GRACE_STEP * index),
            respawn: Countdown::idle(),
            next_move: Countdown::start(FIRST_MOVE_DELAY + FIRST_MOVE_STAGGER * index),
        }
    }

    pub fn state(&self) -> GhostState {
        self.state
    }

    pub fn spawn(&self) -> Pos {
        self.spawn
    }

    pub fn speed(&self) -> f32 {
        self.state.speed()
    }

    pub fn tint(&self, power_left: Duration) -> Rgba {
        tint_of(self.state, self.base_tint, power_left)
    }

    /// The single lifecycle mutator. Rejected edges leave the state alone.
    pub fn set_state(&mut self, next: GhostState) -> Result<(), IllegalTransition> {
        if !self.state.can_become(next) {
            return Err(IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        log::debug!("ghost {} {} -> {}", self.id, self.state, next);
        self.state = next;
        Ok(())
    }

    pub fn in_grace(&self) -> bool {
        self.grace.is_running()
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn target(&self) -> Option<Pos> {
        self.moving.then_some(self.target)
    }

    /// Starts a move toward `to`; the following one waits at least `wait`.
    pub fn begin_move(&mut self, to: Pos, wait: Duration) {
        self.target = to;
        self.moving = true;
        self.progress = 0.0;
        self.next_move.set(wait);
    }

    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.moving {
            return false;
        }
        self.progress += dt.as_secs_f32() * self.speed();
        if self.progress < 1.0 {
            return false;
        }
        self.cell = self.target;
        self.moving = false;
        self.progress = 0.0;
        true
    }

    /// Teleports onto `pos`, cancelling any move.
    pub fn place(&mut self, pos: Pos) {
        self.cell = pos;
        self.target = pos;
        self.moving = false;
        self.progress = 0.0;
    }

    pub fn is_home(&self) -> bool {
        !self.moving && self.cell == self.spawn
    }

    /// Same cell, or heading into it.
    pub fn touches(&self, pos: Pos) -> bool {
        self.cell == pos || (self.moving && self.target == pos)
    }

    pub fn start_respawn(&mut self, delay: Duration) -> Result<(), IllegalTransition> {
        self.set_state(GhostState::Respawning)?;
        self.place(self.spawn);
        self.respawn.set(delay);
        Ok(())
    }

    /// Ticks the home countdown. On expiry the ghost comes back Frightened
    /// if power mode is still running, Normal otherwise.
    pub fn tick_respawn(
        &mut self,
        dt: Duration,
        power_active: bool,
    ) -> Result<bool, IllegalTransition> {
        if self.state != GhostState::Respawning || !self.respawn.tick(dt) {
            return Ok(false);
        }
        let next = if power_active {
            GhostState::Frightened
        } else {
            GhostState::Normal
        };
        self.set_state(next)?;
        self.place(self.spawn);
        self.next_move.set(FIRST_MOVE_DELAY);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [GhostState; 5] = [
        GhostState::Normal,
        GhostState::Frightened,
        GhostState::Eaten,
        GhostState::Returning,
        GhostState::Respawning,
    ];

    #[test]
    fn only_lifecycle_edges_are_legal() {
        let legal = [
            (GhostState::Normal, GhostState::Frightened),
            (GhostState::Frightened, GhostState::Eaten),
            (GhostState::Frightened, GhostState::Normal),
            (GhostState::Eaten, GhostState::Returning),
            (GhostState::Returning, GhostState::Respawning),
            (GhostState::Respawning, GhostState::Normal),
            (GhostState::Respawning, GhostState::Frightened),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_become(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn rejected_transition_keeps_state() {
        let mut ghost = Ghost::new(0, Pos::new(3, 3));
        let err = ghost.set_state(GhostState::Returning).unwrap_err();
        assert_eq!(
            err,
            IllegalTransition {
                from: GhostState::Normal,
                to: GhostState::Returning
            }
        );
        assert_eq!(ghost.state(), GhostState::Normal);
    }

    #[test]
    fn full_cycle_through_respawn() {
        let mut ghost = Ghost::new(1, Pos::new(2, 2));
        ghost.set_state(GhostState::Frightened).unwrap();
        ghost.set_state(GhostState::Eaten).unwrap();
        ghost.set_state(GhostState::Returning).unwrap();
        ghost.start_respawn(Duration::from_millis(1_500)).unwrap();
        assert_eq!(ghost.speed(), 0.0);
        assert!(!ghost.tick_respawn(Duration::from_millis(1_000), false).unwrap());
        assert!(ghost.tick_respawn(Duration::from_millis(600), false).unwrap());
        assert_eq!(ghost.state(), GhostState::Normal);
        assert_eq!(ghost.cell, Pos::new(2, 2));
    }

    #[test]
    fn respawn_waits_out_power_mode() {
        assert_eq!(
            respawn_delay(Duration::from_millis(500)),
            Duration::from_millis(1_500)
        );
        assert_eq!(respawn_delay(Duration::ZERO), GHOST_RESPAWN_TIME);
    }

    #[test]
    fn frightened_tint_flashes_near_expiry() {
        let base = Rgba::RED;
        let state = GhostState::Frightened;
        assert_eq!(tint_of(state, base, Duration::from_millis(5_000)), Rgba::BLUE);
        assert_eq!(tint_of(state, base, Duration::from_millis(1_900)), Rgba::BLUE);
        assert_eq!(tint_of(state, base, Duration::from_millis(1_700)), Rgba::WHITE);
        assert_eq!(tint_of(GhostState::Normal, base, Duration::ZERO), base);
        assert_eq!(tint_of(GhostState::Respawning, base, Duration::ZERO).a, 0.5);
    }

    #[test]
    fn movement_animates_at_state_speed() {
        let mut ghost = Ghost::new(0, Pos::new(0, 0));
        ghost.begin_move(Pos::new(0, 1), Duration::from_millis(700));
        assert_eq!(ghost.next_move.remaining(), Duration::from_millis(700));
        assert!(ghost.touches(Pos::new(0, 1)));
        assert!(!ghost.advance(Duration::from_millis(250)));
        assert!(ghost.advance(Duration::from_millis(250)));
        assert_eq!(ghost.cell, Pos::new(0, 1));
        assert_eq!(ghost.target(), None);
    }

    #[test]
    fn roster_staggers_grace_and_first_move() {
        let third = Ghost::new(2, Pos::new(1, 1));
        assert_eq!(third.behavior, Behavior::Ambush);
        assert_eq!(third.base_tint, Rgba::CYAN);
        assert_eq!(third.grace.remaining(), Duration::from_millis(2_100));
        assert_eq!(third.next_move.remaining(), Duration::from_millis(1_000));
    }
}
