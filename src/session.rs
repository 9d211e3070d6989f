//! One running game: owns the maze, the agents and every timer, and
//! advances them by frame deltas.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::behavior::{decide, effective_behavior, move_interval, rescue_cell};
use crate::config::{
    clamp_size, GameConfig, DASH_COOLDOWN, DASH_DURATION, DASH_SPEED_MULTIPLIER,
    GHOST_BONUS_BASE, LIGHT_DECAY_INTERVAL, LIGHT_MAX, LIGHT_MIN, LIGHT_STEP, OVERHEAD_COOLDOWN,
    OVERHEAD_DURATION, PELLET_SCORE, PLAYER_BASE_SPEED, POWER_MODE_DURATION, POWER_PELLET_SCORE,
};
use crate::countdown::{Ability, Countdown};
use crate::ghost::{respawn_delay, Ghost, GhostState};
use crate::grid::{Grid, Pos};
use crate::level::{Collectible, Level, PLAYER_START};
use crate::maze::{self, MazeType};
use crate::passability::{can_step, has_valid_moves, is_valid_position};
use crate::player::{InputIntent, Player};
use crate::snapshot::{
    AbilityView, Anchor, CollectibleView, EffectKind, GameEvent, GhostView, PlayerView, Snapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Ready,
    Playing,
    Won,
    Lost,
}

impl SessionStatus {
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Ready => "Ready",
            SessionStatus::Playing => "Playing",
            SessionStatus::Won => "You Win!",
            SessionStatus::Lost => "Game Over",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PowerMode {
    countdown: Countdown,
    ghosts_eaten: u32,
}

impl PowerMode {
    pub fn is_active(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn time_left(&self) -> Duration {
        self.countdown.remaining()
    }

    pub fn ghosts_eaten(&self) -> u32 {
        self.ghosts_eaten
    }

    pub fn activate(&mut self) {
        self.countdown.set(POWER_MODE_DURATION);
        self.ghosts_eaten = 0;
    }

    /// Bonus for the next ghost eaten in this activation: base, then doubled
    /// for each ghost already eaten.
    pub fn next_bonus(&mut self) -> u32 {
        let bonus = GHOST_BONUS_BASE.saturating_mul(2u32.saturating_pow(self.ghosts_eaten));
        self.ghosts_eaten += 1;
        bonus
    }

    /// Returns true on the tick power mode runs out.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.countdown.tick(dt)
    }
}

/// Light level after `since_pickup` without collecting anything.
pub fn light_level(since_pickup: Duration) -> f32 {
    let Some(decaying) = since_pickup.checked_sub(LIGHT_DECAY_INTERVAL) else {
        return LIGHT_MAX;
    };
    let steps = (decaying.as_millis() / LIGHT_DECAY_INTERVAL.as_millis()) as f32;
    (LIGHT_MAX - steps * LIGHT_STEP).max(LIGHT_MIN)
}

pub struct Session {
    rng: StdRng,
    status: SessionStatus,
    size: usize,
    maze_type: MazeType,
    grid: Grid,
    player: Player,
    ghosts: Vec<Ghost>,
    pellets: Vec<Collectible>,
    power_pellets: Vec<Collectible>,
    score: u32,
    power: PowerMode,
    dash: Ability,
    overhead: Ability,
    since_pickup: Duration,
    events: Vec<GameEvent>,
}

impl Session {
    pub fn new(config: &GameConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let size = clamp_size(config.maze_size);
        let grid = maze::generate(size, config.maze_type, &mut rng);
        Self {
            rng,
            status: SessionStatus::Ready,
            size,
            maze_type: config.maze_type,
            grid,
            player: Player::new(PLAYER_START),
            ghosts: Vec::new(),
            pellets: Vec::new(),
            power_pellets: Vec::new(),
            score: 0,
            power: PowerMode::default(),
            dash: Ability::new(DASH_DURATION, DASH_COOLDOWN),
            overhead: Ability::new(OVERHEAD_DURATION, OVERHEAD_COOLDOWN),
            since_pickup: Duration::ZERO,
            events: Vec::new(),
        }
    }

    pub fn start(&mut self, size: usize, maze_type: MazeType) {
        self.size = clamp_size(size);
        self.maze_type = maze_type;
        let level = Level::build(self.size, maze_type, &mut self.rng);
        self.install(level);
        self.player = Player::new(PLAYER_START);
        self.clear_progress();
        self.status = SessionStatus::Playing;
        log::info!(
            "started {} {}x{} game: {} pellets, {} ghosts",
            self.maze_type,
            self.size,
            self.size,
            self.pellets.len(),
            self.ghosts.len()
        );
    }

    /// Back to `Ready` on a new maze with nothing on it.
    pub fn reset(&mut self) {
        self.grid = maze::generate(self.size, self.maze_type, &mut self.rng);
        self.pellets.clear();
        self.power_pellets.clear();
        self.ghosts.clear();
        self.player = Player::new(PLAYER_START);
        self.clear_progress();
        self.status = SessionStatus::Ready;
        log::info!("session reset");
    }

    /// New maze of `maze_type`. A game in progress keeps its score and
    /// lives; pellets, ghosts and the player are placed afresh.
    pub fn regenerate(&mut self, maze_type: MazeType) {
        self.maze_type = maze_type;
        if self.status != SessionStatus::Playing {
            self.grid = maze::generate(self.size, maze_type, &mut self.rng);
            self.pellets.clear();
            self.power_pellets.clear();
            self.ghosts.clear();
            self.player.place(PLAYER_START);
            log::info!("regenerated {maze_type} maze");
            return;
        }
        let level = Level::build(self.size, maze_type, &mut self.rng);
        self.install(level);
        self.player.place(PLAYER_START);
        self.player.pellets_collected = 0;
        self.player.power_pellets_collected = 0;
        self.power = PowerMode::default();
        self.since_pickup = Duration::ZERO;
        log::info!("regenerated {maze_type} maze mid-game, score {}", self.score);
    }

    fn install(&mut self, level: Level) {
        self.grid = level.grid;
        self.pellets = level.pellets;
        self.power_pellets = level.power_pellets;
        self.ghosts = level.ghosts;
    }

    fn clear_progress(&mut self) {
        self.score = 0;
        self.power = PowerMode::default();
        self.dash.reset();
        self.overhead.reset();
        self.since_pickup = Duration::ZERO;
        self.events.clear();
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == SessionStatus::Playing
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn maze_type(&self) -> MazeType {
        self.maze_type
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn power(&self) -> &PowerMode {
        &self.power
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn tick(&mut self, dt: Duration, intent: &InputIntent) {
        if !self.is_playing() {
            return;
        }
        self.apply_actions(intent);
        self.update_player(dt, intent);
        if !self.is_playing() {
            return;
        }
        self.update_ghosts(dt);
        self.resolve_collisions();
        if !self.is_playing() {
            return;
        }
        self.update_timers(dt);
    }

    fn apply_actions(&mut self, intent: &InputIntent) {
        if intent.primary_action && self.dash.try_activate() {
            log::debug!("dash on");
            self.events.push(GameEvent::DashStarted);
        }
        if intent.secondary_action && self.overhead.try_activate() {
            log::debug!("overhead view on");
            self.events.push(GameEvent::OverheadStarted);
        }
        if intent.reset_view {
            self.events.push(GameEvent::ViewReset);
        }
        if intent.manual_respawn && self.player.manual_respawn() {
            log::info!("player respawned at {:?}", self.player.cell);
            self.events.push(GameEvent::PlayerRespawned);
        }
    }

    fn player_speed(&self) -> f32 {
        if self.dash.is_active() {
            PLAYER_BASE_SPEED * DASH_SPEED_MULTIPLIER
        } else {
            PLAYER_BASE_SPEED
        }
    }

    fn update_player(&mut self, dt: Duration, intent: &InputIntent) {
        if !self.player.is_moving() && self.player.can_move() {
            if let Some(dir) = intent.direction() {
                let from = self.player.cell;
                match self.grid.step(from, dir) {
                    Some(next) if can_step(&self.grid, from, next) => self.player.begin_move(next),
                    _ if !has_valid_moves(&self.grid, from) => self.rescue_player(),
                    _ => {}
                }
            }
        }
        let speed = self.player_speed();
        if self.player.advance(dt, speed) {
            self.on_player_arrival();
        }
    }

    fn rescue_player(&mut self) {
        let stuck = self.player.cell;
        let spot = rescue_cell(&self.grid, stuck, PLAYER_START);
        log::warn!("player stuck at {stuck:?}, moved to {spot:?}");
        self.player.place(spot);
        self.events.push(GameEvent::PlayerRescued { cell: spot });
    }

    fn on_player_arrival(&mut self) {
        let cell = self.player.cell;
        if !is_valid_position(&self.grid, cell) {
            self.rescue_player();
            return;
        }
        self.collect_at(cell);
        self.resolve_collisions();
        if self.is_playing() && self.player.pellets_collected >= self.pellets.len() {
            self.status = SessionStatus::Won;
            self.events.push(GameEvent::Won);
            log::info!("all pellets collected, final score {}", self.score);
        }
    }

    fn collect_at(&mut self, cell: Pos) {
        for pellet in self.pellets.iter_mut().filter(|p| p.cell == cell) {
            if pellet.collect() {
                self.score = self.score.saturating_add(PELLET_SCORE);
                self.player.pellets_collected += 1;
                self.grid.set_pellet(cell, false);
                self.since_pickup = Duration::ZERO;
                self.events.push(GameEvent::Effect {
                    kind: EffectKind::PelletCollect,
                    anchor: Anchor::at(cell),
                });
            }
        }
        let mut empowered = false;
        for power_pellet in self.power_pellets.iter_mut().filter(|p| p.cell == cell) {
            if power_pellet.collect() {
                self.score = self.score.saturating_add(POWER_PELLET_SCORE);
                self.player.power_pellets_collected += 1;
                self.since_pickup = Duration::ZERO;
                self.events.push(GameEvent::Effect {
                    kind: EffectKind::PowerPelletCollect,
                    anchor: Anchor::at(cell),
                });
                empowered = true;
            }
        }
        if empowered {
            self.activate_power();
        }
    }

    fn activate_power(&mut self) {
        self.power.activate();
        for ghost in &mut self.ghosts {
            if ghost.state() == GhostState::Normal {
                if let Err(err) = ghost.set_state(GhostState::Frightened) {
                    log::warn!("{err}");
                }
            }
        }
        self.events.push(GameEvent::Effect {
            kind: EffectKind::PowerModeStart,
            anchor: Anchor::at(self.player.cell),
        });
        log::info!("power mode for {:?}", POWER_MODE_DURATION);
    }

    /// Settles every ghost touching the player: frightened ghosts are eaten
    /// while power mode runs, anything else dangerous costs a life.
    fn resolve_collisions(&mut self) {
        if !self.is_playing() || !self.player.is_vulnerable() {
            return;
        }
        let cell = self.player.cell;
        for idx in 0..self.ghosts.len() {
            let ghost = &self.ghosts[idx];
            if !ghost.touches(cell) || !ghost.state().is_dangerous() {
                continue;
            }
            if ghost.state() == GhostState::Frightened && self.power.is_active() {
                self.eat_ghost(idx);
            } else {
                self.hit_player();
                break;
            }
        }
    }

    fn eat_ghost(&mut self, idx: usize) {
        let bonus = self.power.next_bonus();
        self.score = self.score.saturating_add(bonus);
        let ghost = &mut self.ghosts[idx];
        let anchor = Anchor::between(
            ghost.cell,
            ghost.target().unwrap_or(ghost.cell),
            ghost.progress,
        );
        if let Err(err) = ghost
            .set_state(GhostState::Eaten)
            .and_then(|()| ghost.set_state(GhostState::Returning))
        {
            log::warn!("{err}");
        }
        log::info!("ghost {} eaten for {bonus}", ghost.id);
        self.events.push(GameEvent::Effect {
            kind: EffectKind::GhostEaten,
            anchor,
        });
    }

    fn hit_player(&mut self) {
        self.events.push(GameEvent::Effect {
            kind: EffectKind::PlayerHit,
            anchor: Anchor::at(self.player.cell),
        });
        let out_of_lives = self.player.lose_life();
        log::info!("player hit, {} lives left", self.player.lives);
        if out_of_lives {
            self.status = SessionStatus::Lost;
            self.events.push(GameEvent::Lost);
            log::info!("game over, final score {}", self.score);
        }
    }

    fn update_ghosts(&mut self, dt: Duration) {
        let power_left = self.power.time_left();
        let player_cell = self.player.cell;
        let player_down = self.player.is_down();
        let Self {
            grid,
            ghosts,
            rng,
            events,
            ..
        } = self;
        for ghost in ghosts.iter_mut() {
            ghost.grace.tick(dt);
            ghost.next_move.tick(dt);
            match ghost.tick_respawn(dt, !power_left.is_zero()) {
                Ok(true) => {
                    log::debug!("ghost {} back as {}", ghost.id, ghost.state());
                    events.push(GameEvent::GhostRespawned { id: ghost.id });
                }
                Ok(false) => {}
                Err(err) => log::warn!("{err}"),
            }

            if !ghost.is_moving() {
                plan_move(grid, ghost, player_cell, player_down, power_left, rng);
            }
            if ghost.advance(dt) {
                settle_if_home(ghost, power_left);
            }
        }
    }

    fn update_timers(&mut self, dt: Duration) {
        if self.player.tick_protection(dt) {
            log::debug!("respawn protection over");
        }
        if self.power.tick(dt) {
            for ghost in &mut self.ghosts {
                if ghost.state() == GhostState::Frightened {
                    if let Err(err) = ghost.set_state(GhostState::Normal) {
                        log::warn!("{err}");
                    }
                }
            }
            self.events.push(GameEvent::Effect {
                kind: EffectKind::PowerModeEnd,
                anchor: Anchor::at(self.player.cell),
            });
            log::info!("power mode over");
        }
        if self.dash.tick(dt) {
            self.events.push(GameEvent::DashEnded);
        }
        if self.overhead.tick(dt) {
            self.events.push(GameEvent::OverheadEnded);
        }
        self.since_pickup = self.since_pickup.saturating_add(dt);
    }

    pub fn light_level(&self) -> f32 {
        if self.is_playing() {
            light_level(self.since_pickup)
        } else {
            LIGHT_MAX
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let power_left = self.power.time_left();
        let walls = self
            .grid
            .positions()
            .map(|pos| self.grid.cell(pos).map_or([true; 4], |cell| cell.walls()))
            .collect();
        let collectibles = |items: &[Collectible]| -> Vec<CollectibleView> {
            items
                .iter()
                .map(|item| CollectibleView {
                    cell: item.cell,
                    collected: item.is_collected(),
                })
                .collect()
        };
        Snapshot {
            size: self.size,
            walls,
            player: PlayerView {
                cell: self.player.cell,
                target: self.player.target(),
                progress: self.player.progress,
                life: self.player.life(),
            },
            ghosts: self
                .ghosts
                .iter()
                .map(|ghost| GhostView {
                    id: ghost.id,
                    cell: ghost.cell,
                    target: ghost.target(),
                    progress: ghost.progress,
                    state: ghost.state(),
                    behavior: ghost.behavior,
                    tint: ghost.tint(power_left),
                })
                .collect(),
            pellets: collectibles(&self.pellets),
            power_pellets: collectibles(&self.power_pellets),
            score: self.score,
            lives: self.player.lives,
            status: self.status,
            power_time_left: power_left,
            ghosts_eaten: self.power.ghosts_eaten(),
            dash: AbilityView {
                active_left: self.dash.time_left(),
                cooldown_left: self.dash.cooldown_left(),
            },
            overhead: AbilityView {
                active_left: self.overhead.time_left(),
                cooldown_left: self.overhead.cooldown_left(),
            },
            grace_left: self
                .ghosts
                .iter()
                .map(|ghost| ghost.grace.remaining())
                .max()
                .unwrap_or_default(),
            respawn_left: self
                .ghosts
                .iter()
                .filter(|ghost| ghost.state() == GhostState::Respawning)
                .map(|ghost| ghost.respawn.remaining())
                .max()
                .unwrap_or_default(),
            protection_left: self.player.protection.remaining(),
            light_level: self.light_level(),
            pellets_collected: self.player.pellets_collected,
            total_pellets: self.pellets.len(),
            power_pellets_collected: self.player.power_pellets_collected,
            total_power_pellets: self.power_pellets.len(),
        }
    }
}

fn settle_if_home(ghost: &mut Ghost, power_left: Duration) -> bool {
    if ghost.state() != GhostState::Returning || !ghost.is_home() {
        return false;
    }
    let delay = respawn_delay(power_left);
    match ghost.start_respawn(delay) {
        Ok(()) => {
            log::debug!("ghost {} home, respawning in {delay:?}", ghost.id);
            true
        }
        Err(err) => {
            log::warn!("{err}");
            false
        }
    }
}

fn plan_move(
    grid: &Grid,
    ghost: &mut Ghost,
    player: Pos,
    player_down: bool,
    power_left: Duration,
    rng: &mut StdRng,
) {
    if ghost.state() == GhostState::Respawning {
        return;
    }
    if !is_valid_position(grid, ghost.cell) {
        let spot = rescue_cell(grid, ghost.cell, ghost.spawn());
        log::warn!("ghost {} stuck at {:?}, moved to {spot:?}", ghost.id, ghost.cell);
        ghost.place(spot);
        return;
    }
    if settle_if_home(ghost, power_left) || ghost.next_move.is_running() {
        return;
    }
    let distance = ghost.cell.manhattan(player);
    let behavior = effective_behavior(
        ghost.behavior,
        ghost.state(),
        player_down,
        ghost.in_grace(),
        distance,
    );
    if let Some(next) = decide(grid, ghost.cell, behavior, player, ghost.spawn(), rng) {
        let wait = move_interval(ghost.in_grace(), distance, rng);
        ghost.begin_move(next, wait);
    }
}
