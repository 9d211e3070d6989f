//! Frame-delta timers shared by power mode, abilities, respawn and
//! movement gating.

use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: Duration,
}

impl Countdown {
    pub const fn idle() -> Self {
        Self {
            remaining: Duration::ZERO,
        }
    }

    pub const fn start(duration: Duration) -> Self {
        Self {
            remaining: duration,
        }
    }

    pub fn set(&mut self, duration: Duration) {
        self.remaining = duration;
    }

    pub fn clear(&mut self) {
        self.remaining = Duration::ZERO;
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        !self.remaining.is_zero()
    }

    /// Advances by `dt`, clamping at zero. Returns true only on the call
    /// that brings a running countdown to zero.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if self.remaining.is_zero() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(dt);
        self.remaining.is_zero()
    }
}

/// A timed ability with a cooldown that starts on activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ability {
    duration: Duration,
    cooldown_len: Duration,
    active: Countdown,
    cooldown: Countdown,
}

impl Ability {
    pub const fn new(duration: Duration, cooldown_len: Duration) -> Self {
        Self {
            duration,
            cooldown_len,
            active: Countdown::idle(),
            cooldown: Countdown::idle(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_running()
    }

    pub fn is_ready(&self) -> bool {
        !self.active.is_running() && !self.cooldown.is_running()
    }

    pub fn time_left(&self) -> Duration {
        self.active.remaining()
    }

    pub fn cooldown_left(&self) -> Duration {
        self.cooldown.remaining()
    }

    pub fn try_activate(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.active.set(self.duration);
        self.cooldown.set(self.cooldown_len);
        true
    }

    /// Returns true when the active window ends on this tick.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.cooldown.tick(dt);
        self.active.tick(dt)
    }

    pub fn reset(&mut self) {
        self.active.clear();
        self.cooldown.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn countdown_fires_once_and_clamps() {
        let mut timer = Countdown::start(ms(100));
        assert!(!timer.tick(ms(60)));
        assert_eq!(timer.remaining(), ms(40));
        assert!(timer.tick(ms(60)));
        assert_eq!(timer.remaining(), Duration::ZERO);
        assert!(!timer.tick(ms(60)));
        assert!(!timer.is_running());
    }

    #[test]
    fn ability_respects_cooldown() {
        let mut dash = Ability::new(ms(300), ms(1_200));
        assert!(dash.try_activate());
        assert!(dash.is_active());
        assert!(!dash.try_activate());

        assert!(dash.tick(ms(300)));
        assert!(!dash.is_active());
        assert_eq!(dash.cooldown_left(), ms(900));
        assert!(!dash.try_activate());

        dash.tick(ms(900));
        assert!(dash.is_ready());
        assert!(dash.try_activate());
    }
}
