//! Game-world time: time-of-day values and the simulation clock

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;

pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// A time-of-day value, wrapped to one day
///
/// Schedules compare these directly; ordering within the day is all that
/// matters, absolute calendar days are kept by the embedding game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldTime(u32);

impl WorldTime {
    pub fn new(seconds: u32) -> Self {
        Self(seconds % SECONDS_PER_DAY)
    }

    pub fn hm(hour: u32, minute: u32) -> Self {
        Self::new(hour * 3600 + minute * 60)
    }

    pub fn seconds(self) -> u32 {
        self.0
    }

    pub fn hour(self) -> u32 {
        self.0 / 3600
    }

    pub fn minute(self) -> u32 {
        (self.0 / 60) % 60
    }
}

/// Monotonic simulation clock plus the wrapped time-of-day
///
/// `tick_count` advances in simulation milliseconds and never wraps;
/// perception timers and trigger time barriers compare against it.
#[derive(Debug, Clone, Default)]
pub struct WorldClock {
    time_of_day_ms: u64,
    tick_count: Tick,
    /// Game milliseconds elapsed per real millisecond
    pub time_scale: u64,
}

impl WorldClock {
    pub fn new() -> Self {
        Self {
            time_of_day_ms: 0,
            tick_count: 0,
            time_scale: 14,
        }
    }

    pub fn with_time(time: WorldTime) -> Self {
        let mut c = Self::new();
        c.set_time(time);
        c
    }

    pub fn set_time(&mut self, time: WorldTime) {
        self.time_of_day_ms = u64::from(time.seconds()) * 1000;
    }

    /// Advance by `dt` real milliseconds
    pub fn advance(&mut self, dt: u64) {
        self.tick_count += dt;
        self.time_of_day_ms =
            (self.time_of_day_ms + dt * self.time_scale) % (u64::from(SECONDS_PER_DAY) * 1000);
    }

    pub fn time(&self) -> WorldTime {
        WorldTime::new((self.time_of_day_ms / 1000) as u32)
    }

    pub fn tick_count(&self) -> Tick {
        self.tick_count
    }
}
