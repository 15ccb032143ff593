//! Passive-perception broadcast
//!
//! Passive perceptions are indirect "someone nearby noticed something"
//! signals. They are queued during a tick and delivered in a batch on the
//! next tick, so events generated mid-tick can never retroactively affect
//! actors that already ran in the same tick.

use glam::Vec3;

use crate::core::types::{InstanceId, NpcId};

/// Perception kinds shared between active and passive delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PercKind {
    AssessPlayer = 0,
    AssessEnemy = 1,
    AssessFighter = 2,
    AssessBody = 3,
    AssessItem = 4,
    AssessMurder = 5,
    AssessDefeat = 6,
    AssessDamage = 7,
    AssessFightSound = 8,
    AssessWarn = 9,
    CatchThief = 10,
}

impl PercKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::AssessPlayer,
            1 => Self::AssessEnemy,
            2 => Self::AssessFighter,
            3 => Self::AssessBody,
            4 => Self::AssessItem,
            5 => Self::AssessMurder,
            6 => Self::AssessDefeat,
            7 => Self::AssessDamage,
            8 => Self::AssessFightSound,
            9 => Self::AssessWarn,
            10 => Self::CatchThief,
            _ => return None,
        })
    }
}

/// One queued passive perception
///
/// Participants are weak references; delivery re-validates them against the
/// registry. Lives for exactly one tick boundary.
#[derive(Debug, Clone)]
pub struct PerceptionMsg {
    pub what: PercKind,
    pub pos: Vec3,
    pub self_npc: NpcId,
    pub other: NpcId,
    pub victim: NpcId,
    pub item: Option<InstanceId>,
}

/// Queue of passive perceptions awaiting next-tick delivery
#[derive(Debug, Default)]
pub struct PerceptionBus {
    queue: Vec<PerceptionMsg>,
}

impl PerceptionBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue; never delivers synchronously
    pub fn send(&mut self, msg: PerceptionMsg) {
        self.queue.push(msg);
    }

    /// Swap the queue with an empty one and return the previous contents
    ///
    /// Called exactly once per tick, before any NPC processing, so that
    /// everything sent during this tick lands in the next batch.
    pub fn drain(&mut self) -> Vec<PerceptionMsg> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
