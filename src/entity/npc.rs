//! Non-player characters: state, senses and perception bookkeeping
//!
//! The AI itself lives in the embedding game; this layer owns the state the
//! world tick needs: processing policy, life-state flags, the perception
//! timer and the weak target reference.

use glam::Vec3;

use crate::core::config;
use crate::core::types::{InstanceId, InteractiveId, NpcId, Tick};
use crate::entity::item::Inventory;
use crate::simulation::perception::PercKind;
use crate::world::LineOfSight;

/// Per-NPC level-of-detail tier, reassigned every tick from the distance to
/// the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessPolicy {
    Player,
    AiNormal,
    AiFar,
    AiFar2,
}

/// Sense capability bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensesBit(pub u8);

impl SensesBit {
    pub const NONE: SensesBit = SensesBit(0);
    pub const SEE: SensesBit = SensesBit(1 << 0);
    pub const HEAR: SensesBit = SensesBit(1 << 1);
    pub const SMELL: SensesBit = SensesBit(1 << 2);

    pub fn any(self) -> bool {
        self.0 != 0
    }
}

impl std::ops::BitOr for SensesBit {
    type Output = SensesBit;
    fn bitor(self, rhs: Self) -> Self {
        SensesBit(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for SensesBit {
    type Output = SensesBit;
    fn bitand(self, rhs: Self) -> Self {
        SensesBit(self.0 & rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeaponState {
    #[default]
    NoWeapon,
    Melee,
    Range,
}

/// One delivered perception, kept for the embedding AI to consume
#[derive(Debug, Clone, Copy)]
pub struct PerceptionRecord {
    pub kind: PercKind,
    pub other: Option<NpcId>,
    pub victim: Option<NpcId>,
    pub item: Option<InstanceId>,
    pub distance: f32,
    pub tick: Tick,
}

#[derive(Debug, Clone)]
pub struct Npc {
    id: NpcId,
    instance: InstanceId,
    pub name: String,
    pos: Vec3,
    dir: Vec3,
    policy: ProcessPolicy,
    /// Vertical offset from the anchor to the feet, used by zone triggers
    pub translate_y: f32,

    pub senses: SensesBit,
    pub senses_range: f32,
    perc_next_time: Tick,
    pub perc_interval: Tick,

    target: Option<NpcId>,
    attached_point: Option<String>,
    start_point: Option<String>,
    interactive: Option<InteractiveId>,
    pub inventory: Inventory,

    dead: bool,
    down: bool,
    /// Focus-disabled NPCs are skipped by target search entirely
    pub no_focus: bool,
    pub weapon: WeaponState,
    pub attacking: bool,

    anim_time: u64,
    last_perception: Option<PerceptionRecord>,
    perception_count: u64,
}

impl Npc {
    pub fn new(id: NpcId, instance: InstanceId, name: impl Into<String>) -> Self {
        Self {
            id,
            instance,
            name: name.into(),
            pos: Vec3::ZERO,
            dir: Vec3::Z,
            policy: ProcessPolicy::AiFar2,
            translate_y: 0.0,
            senses: SensesBit::SEE | SensesBit::HEAR | SensesBit::SMELL,
            senses_range: 2000.0,
            perc_next_time: 0,
            perc_interval: 1000,
            target: None,
            attached_point: None,
            start_point: None,
            interactive: None,
            inventory: Inventory::new(),
            dead: false,
            down: false,
            no_focus: false,
            weapon: WeaponState::NoWeapon,
            attacking: false,
            anim_time: 0,
            last_perception: None,
            perception_count: 0,
        }
    }

    pub fn id(&self) -> NpcId {
        self.id
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn position(&self) -> Vec3 {
        self.pos
    }

    pub fn set_position(&mut self, pos: Vec3) {
        self.pos = pos;
    }

    pub fn direction(&self) -> Vec3 {
        self.dir
    }

    pub fn set_direction(&mut self, dir: Vec3) {
        self.dir = dir;
    }

    /// Heading angle in radians on the ground plane
    pub fn rotation_rad(&self) -> f32 {
        self.dir.z.atan2(self.dir.x)
    }

    pub fn eye_position(&self) -> Vec3 {
        self.pos + Vec3::new(0.0, config::config().eye_height, 0.0)
    }

    pub fn qdist_to(&self, p: Vec3) -> f32 {
        (self.pos - p).length_squared()
    }

    pub fn process_policy(&self) -> ProcessPolicy {
        self.policy
    }

    pub fn set_process_policy(&mut self, policy: ProcessPolicy) {
        self.policy = policy;
    }

    pub fn is_player(&self) -> bool {
        self.policy == ProcessPolicy::Player
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn set_dead(&mut self, dead: bool) {
        self.dead = dead;
    }

    pub fn is_down(&self) -> bool {
        self.down || self.dead
    }

    pub fn set_down(&mut self, down: bool) {
        self.down = down;
    }

    pub fn target(&self) -> Option<NpcId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<NpcId>) {
        self.target = target;
    }

    pub fn attached_point(&self) -> Option<&str> {
        self.attached_point.as_deref()
    }

    pub fn attach_to_point(&mut self, point: Option<String>) {
        if self.start_point.is_none() {
            self.start_point = point.clone();
        }
        self.attached_point = point;
    }

    pub fn start_point(&self) -> Option<&str> {
        self.start_point.as_deref()
    }

    /// Restore both waypoint anchors from a save, bypassing the
    /// first-attach bookkeeping
    pub(crate) fn restore_points(&mut self, start: Option<String>, attached: Option<String>) {
        self.start_point = start;
        self.attached_point = attached;
    }

    pub fn interactive(&self) -> Option<InteractiveId> {
        self.interactive
    }

    pub fn set_interactive(&mut self, mob: Option<InteractiveId>) {
        self.interactive = mob;
    }

    pub fn perc_next_time(&self) -> Tick {
        self.perc_next_time
    }

    pub fn set_perc_time(&mut self, t: Tick) {
        self.perc_next_time = t;
    }

    /// Advance per-entity state by `dt` milliseconds
    pub fn tick(&mut self, dt: u64) {
        self.anim_time += dt;
        if self.attacking && self.target.is_none() {
            self.attacking = false;
        }
    }

    /// Animation-state update; runs on the parallel fan-out and touches only
    /// this NPC's private state
    pub fn update_animation(&mut self) {
        self.anim_time = self.anim_time.wrapping_add(1);
    }

    /// Animation clock the renderer derives the pose from
    pub fn anim_time(&self) -> u64 {
        self.anim_time
    }

    /// Which senses reach `other_pos`
    ///
    /// `range_override` substitutes another NPC's senses range (passive
    /// perception tests the victim with the instigator's range).
    pub fn can_sense(
        &self,
        other_pos: Vec3,
        range_override: Option<f32>,
        los: &dyn LineOfSight,
    ) -> SensesBit {
        let range = range_override.unwrap_or(self.senses_range);
        if self.qdist_to(other_pos) > range * range {
            return SensesBit::NONE;
        }
        let mut bits = self.senses & (SensesBit::HEAR | SensesBit::SMELL);
        if (self.senses & SensesBit::SEE).any() && los.can_see(self.eye_position(), other_pos) {
            bits = bits | SensesBit::SEE;
        }
        bits
    }

    /// Deliver one passive perception
    pub fn perception_process_event(
        &mut self,
        other: NpcId,
        victim: NpcId,
        distance: f32,
        kind: PercKind,
        item: Option<InstanceId>,
        now: Tick,
    ) {
        self.last_perception = Some(PerceptionRecord {
            kind,
            other: Some(other),
            victim: Some(victim),
            item,
            distance,
            tick: now,
        });
        self.perception_count += 1;
        if self.target.is_none() && matches!(kind, PercKind::AssessDamage | PercKind::AssessMurder)
        {
            self.target = Some(other);
        }
    }

    /// Active perceive-the-player call; reschedules the perception timer
    pub fn perception_process_player(&mut self, player: NpcId, distance: f32, now: Tick) {
        self.last_perception = Some(PerceptionRecord {
            kind: PercKind::AssessPlayer,
            other: Some(player),
            victim: None,
            item: None,
            distance,
            tick: now,
        });
        self.perception_count += 1;
        self.perc_next_time = now + self.perc_interval;
    }

    pub fn last_perception(&self) -> Option<&PerceptionRecord> {
        self.last_perception.as_ref()
    }

    pub fn perception_count(&self) -> u64 {
        self.perception_count
    }

    /// Send the NPC back to its routine start point at world reset
    ///
    /// Returns false when the NPC has no live routine anymore (dead); the
    /// registry retires such NPCs to the invalid holding list.
    pub fn reset_position_to_start(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.attached_point = self.start_point.clone();
        self.down = false;
        self.target = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::NoOcclusion;

    fn npc(id: u64) -> Npc {
        Npc::new(NpcId(id), 1, "test")
    }

    #[test]
    fn test_senses_fail_outside_range() {
        let mut n = npc(1);
        n.senses_range = 100.0;
        let far = Vec3::new(500.0, 0.0, 0.0);
        assert!(!n.can_sense(far, None, &NoOcclusion).any());
        assert!(n.can_sense(far, Some(1000.0), &NoOcclusion).any());
    }

    #[test]
    fn test_active_perception_reschedules_timer() {
        let mut n = npc(1);
        n.perc_interval = 500;
        n.perception_process_player(NpcId(2), 10.0, 1000);
        assert_eq!(n.perc_next_time(), 1500);
        assert_eq!(n.perception_count(), 1);
    }

    #[test]
    fn test_damage_perception_acquires_target() {
        let mut n = npc(1);
        n.perception_process_event(NpcId(2), NpcId(3), 50.0, PercKind::AssessDamage, None, 0);
        assert_eq!(n.target(), Some(NpcId(2)));
    }

    #[test]
    fn test_reset_retires_dead_npc() {
        let mut n = npc(1);
        n.attach_to_point(Some("START".into()));
        n.attach_to_point(Some("MARKET".into()));
        assert!(n.reset_position_to_start());
        assert_eq!(n.attached_point(), Some("START"));

        n.set_dead(true);
        assert!(!n.reset_position_to_start());
    }
}
