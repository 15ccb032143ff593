//! Trigger graph: named event-delivery nodes
//!
//! Trigger names are not unique; an event fires every node whose name
//! matches its target. Nodes may additionally own a spatial volume (zone
//! triggers, tested against near NPCs every tick) and may subscribe to
//! per-tick callbacks.

use glam::Vec3;

use crate::core::types::{NpcId, Tick};

/// Event kinds carried through the trigger graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerCmd {
    Trigger = 0,
    Untrigger = 1,
    Enable = 2,
    Disable = 3,
    ToggleEnable = 4,
    Startup = 5,
    StartupFirstTime = 6,
}

impl TriggerCmd {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Trigger,
            1 => Self::Untrigger,
            2 => Self::Enable,
            3 => Self::Disable,
            4 => Self::ToggleEnable,
            5 => Self::Startup,
            6 => Self::StartupFirstTime,
            _ => return None,
        })
    }
}

/// An event in flight between trigger nodes
///
/// An event with a time barrier in the future is re-queued untouched once
/// per tick until the barrier passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Name of the receiving node(s); not guaranteed unique
    pub target: String,
    /// Name of the emitting node, empty for external events
    pub emitter: String,
    pub cmd: TriggerCmd,
    pub time_barrier: Option<Tick>,
}

impl TriggerEvent {
    pub fn new(target: impl Into<String>, emitter: impl Into<String>, cmd: TriggerCmd) -> Self {
        Self {
            target: target.into(),
            emitter: emitter.into(),
            cmd,
            time_barrier: None,
        }
    }

    pub fn with_barrier(mut self, barrier: Tick) -> Self {
        self.time_barrier = Some(barrier);
        self
    }
}

/// Axis-aligned trigger volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxVolume {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoxVolume {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.min.x <= p.x
            && p.x <= self.max.x
            && self.min.y <= p.y
            && p.y <= self.max.y
            && self.min.z <= p.z
            && p.z <= self.max.z
    }
}

/// Node behavior variants
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerKind {
    /// Forward every activation to another named target
    Relay { target: String },
    /// Fire the target once every `required` activations
    Counter { target: String, required: u32, count: u32 },
    /// On activation, emit one event per entry, delayed by its barrier
    Sequence { entries: Vec<(String, u64)> },
    /// While tick-subscribed, fire the target every `period` ticks
    Timer { target: String, period: u64, next_at: Tick },
    /// Fire the target on world entry; optionally only on the very first one
    WorldStart { target: String, only_first_time: bool },
    /// Record activations for gameplay code to poll
    Latch { activated: bool, count: u32 },
}

/// A named node in the trigger graph
#[derive(Debug, Clone)]
pub struct Trigger {
    pub name: String,
    pub kind: TriggerKind,
    volume: Option<BoxVolume>,
    enabled: bool,
    inside: Vec<NpcId>,
}

impl Trigger {
    pub fn new(name: impl Into<String>, kind: TriggerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            volume: None,
            enabled: true,
            inside: Vec::new(),
        }
    }

    pub fn with_volume(mut self, volume: BoxVolume) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn has_volume(&self) -> bool {
        self.volume.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Zone test against a feet position
    pub fn check_pos(&self, p: Vec3) -> bool {
        self.volume.map(|v| v.contains(p)).unwrap_or(false)
    }

    /// Deliver a queued event addressed to this node
    pub fn process_event(&mut self, e: &TriggerEvent, now: Tick) -> Vec<TriggerEvent> {
        match e.cmd {
            TriggerCmd::Enable => {
                self.enabled = true;
                Vec::new()
            }
            TriggerCmd::Disable => {
                self.enabled = false;
                Vec::new()
            }
            TriggerCmd::ToggleEnable => {
                self.enabled = !self.enabled;
                Vec::new()
            }
            TriggerCmd::Untrigger => {
                if let TriggerKind::Latch { activated, .. } = &mut self.kind {
                    *activated = false;
                }
                Vec::new()
            }
            TriggerCmd::Trigger => self.activate(now),
            // startup commands arrive through process_on_start
            TriggerCmd::Startup | TriggerCmd::StartupFirstTime => Vec::new(),
        }
    }

    /// One-time world-entry broadcast
    pub fn process_on_start(&mut self, e: &TriggerEvent) -> Vec<TriggerEvent> {
        match &mut self.kind {
            TriggerKind::WorldStart {
                target,
                only_first_time,
            } => {
                if *only_first_time && e.cmd != TriggerCmd::StartupFirstTime {
                    return Vec::new();
                }
                vec![TriggerEvent::new(
                    target.clone(),
                    self.name.clone(),
                    TriggerCmd::Trigger,
                )]
            }
            TriggerKind::Latch { count, .. } => {
                *count += 1;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Reconcile zone membership; fires on entry only
    ///
    /// `inside_now` is the subset of near NPCs whose feet are inside the
    /// volume this tick.
    pub fn update_intersections(&mut self, inside_now: &[NpcId], now: Tick) -> Vec<TriggerEvent> {
        let mut out = Vec::new();
        for &npc in inside_now {
            if !self.inside.contains(&npc) {
                out.extend(self.activate(now));
            }
        }
        self.inside.clear();
        self.inside.extend_from_slice(inside_now);
        out
    }

    /// Per-tick callback for tick-subscribed nodes
    pub fn tick(&mut self, now: Tick) -> Vec<TriggerEvent> {
        if !self.enabled {
            return Vec::new();
        }
        if let TriggerKind::Timer {
            target,
            period,
            next_at,
        } = &mut self.kind
        {
            if now >= *next_at {
                *next_at = now + *period;
                return vec![TriggerEvent::new(
                    target.clone(),
                    self.name.clone(),
                    TriggerCmd::Trigger,
                )];
            }
        }
        Vec::new()
    }

    fn activate(&mut self, now: Tick) -> Vec<TriggerEvent> {
        if !self.enabled {
            return Vec::new();
        }
        match &mut self.kind {
            TriggerKind::Relay { target } => vec![TriggerEvent::new(
                target.clone(),
                self.name.clone(),
                TriggerCmd::Trigger,
            )],
            TriggerKind::Counter {
                target,
                required,
                count,
            } => {
                *count += 1;
                if *count >= *required {
                    *count = 0;
                    vec![TriggerEvent::new(
                        target.clone(),
                        self.name.clone(),
                        TriggerCmd::Trigger,
                    )]
                } else {
                    Vec::new()
                }
            }
            TriggerKind::Sequence { entries } => entries
                .iter()
                .map(|(target, delay)| {
                    TriggerEvent::new(target.clone(), self.name.clone(), TriggerCmd::Trigger)
                        .with_barrier(now + delay)
                })
                .collect(),
            TriggerKind::Timer { .. } | TriggerKind::WorldStart { .. } => Vec::new(),
            TriggerKind::Latch { activated, count } => {
                *activated = true;
                *count += 1;
                Vec::new()
            }
        }
    }
}
