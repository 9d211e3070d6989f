use std::time::Duration;

use thiserror::Error;

use crate::maze::MazeType;

pub const DEFAULT_MAZE_SIZE: usize = 10;
pub const MIN_MAZE_SIZE: usize = 2;
pub const MAX_MAZE_SIZE: usize = 40;
pub const DEFAULT_RENDER_FPS: u64 = 60;

pub const START_LIVES: u32 = 3;
pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const GHOST_BONUS_BASE: u32 = 200;
pub const PELLET_DENSITY: f64 = 0.8;
pub const MAX_POWER_PELLETS: usize = 4;

pub const POWER_MODE_DURATION: Duration = Duration::from_millis(8_000);
pub const GHOST_RESPAWN_TIME: Duration = Duration::from_millis(15_000);
pub const RESPAWN_BUFFER: Duration = Duration::from_millis(1_000);
pub const PROTECTION_TIME: Duration = Duration::from_millis(3_000);
pub const FLASH_WINDOW: Duration = Duration::from_millis(2_000);
pub const FLASH_PHASE_MS: u128 = 200;

pub const PLAYER_BASE_SPEED: f32 = 2.5;
pub const DASH_DURATION: Duration = Duration::from_millis(3_000);
pub const DASH_COOLDOWN: Duration = Duration::from_millis(12_000);
pub const DASH_SPEED_MULTIPLIER: f32 = 1.5;
pub const OVERHEAD_DURATION: Duration = Duration::from_millis(7_000);
pub const OVERHEAD_COOLDOWN: Duration = Duration::from_millis(20_000);

pub const LIGHT_MAX: f32 = 2.0;
pub const LIGHT_MIN: f32 = 0.1;
pub const LIGHT_STEP: f32 = 0.2;
pub const LIGHT_DECAY_INTERVAL: Duration = Duration::from_millis(3_000);

pub const RESCUE_RADIUS: usize = 3;

const ENV_SIZE: &str = "MAZE_CHASE_SIZE";
const ENV_TYPE: &str = "MAZE_CHASE_TYPE";
const ENV_SEED: &str = "MAZE_CHASE_SEED";
const ENV_FPS: &str = "MAZE_CHASE_FPS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: `{value}` is not a number")]
    InvalidNumber { key: String, value: String },
    #[error("{key}: {value} is outside {min}..={max}")]
    OutOfRange {
        key: String,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("unknown maze type `{0}` (expected perfect, imperfect or open)")]
    UnknownMazeType(String),
    #[error("unknown setting `{0}`")]
    UnknownKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub maze_size: usize,
    pub maze_type: MazeType,
    /// Fixed seed for reproducible runs; entropy when absent.
    pub seed: Option<u64>,
    pub render_fps: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            maze_size: DEFAULT_MAZE_SIZE,
            maze_type: MazeType::Perfect,
            seed: None,
            render_fps: DEFAULT_RENDER_FPS,
        }
    }
}

impl GameConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Builds a config from the process environment. Bad values are logged
    /// and replaced by their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for key in [ENV_SIZE, ENV_TYPE, ENV_SEED, ENV_FPS] {
            if let Ok(value) = std::env::var(key) {
                if let Err(err) = config.apply(key, &value) {
                    log::warn!("ignoring {key}: {err}");
                }
            }
        }
        config
    }

    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            ENV_SIZE => {
                let size = parse_number(key, value)?;
                self.maze_size = clamp_size(check_range(key, size, 1, 1_000)? as usize);
            }
            ENV_TYPE => self.maze_type = value.parse()?,
            ENV_SEED => self.seed = Some(parse_number(key, value)?),
            ENV_FPS => self.render_fps = check_range(key, parse_number(key, value)?, 1, 1_000)?,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

pub fn clamp_size(size: usize) -> usize {
    size.clamp(MIN_MAZE_SIZE, MAX_MAZE_SIZE)
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn check_range(key: &str, value: u64, min: u64, max: u64) -> Result<u64, ConfigError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            key: key.to_string(),
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_each_setting() {
        let mut config = GameConfig::default();
        config.apply(ENV_SIZE, "15").unwrap();
        config.apply(ENV_TYPE, "imperfect").unwrap();
        config.apply(ENV_SEED, " 42 ").unwrap();
        config.apply(ENV_FPS, "30").unwrap();
        assert_eq!(config.maze_size, 15);
        assert_eq!(config.maze_type, MazeType::Imperfect);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.render_fps, 30);
    }

    #[test]
    fn size_is_clamped_into_playable_range() {
        let mut config = GameConfig::default();
        config.apply(ENV_SIZE, "1").unwrap();
        assert_eq!(config.maze_size, MIN_MAZE_SIZE);
        config.apply(ENV_SIZE, "500").unwrap();
        assert_eq!(config.maze_size, MAX_MAZE_SIZE);
    }

    #[test]
    fn bad_values_leave_config_untouched() {
        let mut config = GameConfig::default();
        assert!(matches!(
            config.apply(ENV_SIZE, "ten"),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            config.apply(ENV_FPS, "0"),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert_eq!(
            config.apply(ENV_TYPE, "spiral"),
            Err(ConfigError::UnknownMazeType("spiral".to_string()))
        );
        assert_eq!(config, GameConfig::default());
    }
}
