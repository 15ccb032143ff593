//! Core identifier types used throughout the simulation

use serde::{Deserialize, Serialize};

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Script-instance symbol for NPC and item templates
pub type InstanceId = u32;

/// Sentinel for "no instance"
pub const NO_INSTANCE: InstanceId = u32::MAX;

/// Stable identifier for an NPC
///
/// Assigned monotonically, never reused within a session, preserved across
/// save/load. Externally held ids must be re-validated against the registry
/// before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NpcId(pub u64);

/// Stable identifier for a world item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Stable identifier for an interactive object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InteractiveId(pub u64);
