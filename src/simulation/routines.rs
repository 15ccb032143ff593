//! Time-of-day schedules for interactive-object states

use crate::world::time::WorldTime;

/// One schedule entry: from `time` onward the scheme is in `state`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobRoutine {
    pub time: WorldTime,
    pub state: i32,
}

/// A named schedule plus the currently broadcast state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobStates {
    pub scheme: String,
    pub cur_state: i32,
    pub routines: Vec<MobRoutine>,
}

impl MobStates {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            cur_state: 0,
            routines: Vec::new(),
        }
    }

    /// State due at `t`: the most recent entry at or before `t`, wrapping
    /// around to the last entry of the previous day; 0 on an empty schedule
    pub fn state_by_time(&self, t: WorldTime) -> i32 {
        for r in self.routines.iter().rev() {
            if r.time <= t {
                return r.state;
            }
        }
        if let Some(last) = self.routines.last() {
            return last.state;
        }
        0
    }

    /// Insert keeping entries sorted by time
    pub fn add(&mut self, routine: MobRoutine) {
        self.routines.push(routine);
        self.routines.sort_by_key(|r| r.time);
    }
}
