//! Interactive objects: usable world furniture driven by mob-state schedules

use glam::Vec3;

use crate::core::types::{InteractiveId, NpcId};
use crate::entity::item::Inventory;

/// A usable placed object (bed, bench, forge, chest, lever)
///
/// Owned by the world object list; NPCs attach to it by id.
#[derive(Debug, Clone)]
pub struct Interactive {
    id: InteractiveId,
    /// Placed-object name, matched by container tag queries
    pub name: String,
    /// Mob class name, matched by `available_mob` lookups
    pub scheme: String,
    pos: Vec3,
    /// Must equal the search option's focus-override mode to be targetable
    pub override_focus: bool,
    state: i32,
    occupied_by: Option<NpcId>,
    pub inventory: Inventory,
    anim_time: u64,
}

impl Interactive {
    pub fn new(id: InteractiveId, name: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            scheme: scheme.into(),
            pos: Vec3::ZERO,
            override_focus: false,
            state: 0,
            occupied_by: None,
            inventory: Inventory::new(),
            anim_time: 0,
        }
    }

    pub fn id(&self) -> InteractiveId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.pos
    }

    pub fn set_position(&mut self, pos: Vec3) {
        self.pos = pos;
    }

    pub fn state(&self) -> i32 {
        self.state
    }

    pub fn set_state(&mut self, state: i32) {
        self.state = state;
    }

    pub fn check_mob_name(&self, dest: &str) -> bool {
        self.scheme == dest
    }

    /// Free for another NPC to use
    pub fn is_available(&self) -> bool {
        self.occupied_by.is_none()
    }

    pub fn occupied_by(&self) -> Option<NpcId> {
        self.occupied_by
    }

    pub fn attach(&mut self, npc: NpcId) -> bool {
        if self.occupied_by.is_some() {
            return false;
        }
        self.occupied_by = Some(npc);
        true
    }

    pub fn detach(&mut self, npc: NpcId) {
        if self.occupied_by == Some(npc) {
            self.occupied_by = None;
        }
    }

    /// Restore occupancy from a save
    pub(crate) fn set_occupied(&mut self, npc: Option<NpcId>) {
        self.occupied_by = npc;
    }

    pub fn tick(&mut self, dt: u64) {
        self.anim_time += dt;
    }

    /// Animation-state update; parallel fan-out, private state only
    pub fn update_animation(&mut self) {
        self.anim_time = self.anim_time.wrapping_add(1);
    }

    /// Animation clock the renderer derives the pose from
    pub fn anim_time(&self) -> u64 {
        self.anim_time
    }

    /// Return to the schedule-driven rest state at world reset
    pub fn reset_position_to_start(&mut self) {
        self.occupied_by = None;
        self.state = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_is_exclusive() {
        let mut mob = Interactive::new(InteractiveId(1), "BENCH_1", "BENCH");
        assert!(mob.attach(NpcId(1)));
        assert!(!mob.attach(NpcId(2)));
        assert!(!mob.is_available());

        mob.detach(NpcId(2)); // not the occupant
        assert_eq!(mob.occupied_by(), Some(NpcId(1)));
        mob.detach(NpcId(1));
        assert!(mob.is_available());
    }

    #[test]
    fn test_reset_frees_and_rests() {
        let mut mob = Interactive::new(InteractiveId(1), "BED_1", "BED");
        mob.attach(NpcId(9));
        mob.set_state(2);
        mob.reset_position_to_start();
        assert!(mob.is_available());
        assert_eq!(mob.state(), 0);
    }
}
