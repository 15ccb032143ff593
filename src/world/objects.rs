//! World object registry
//!
//! Owns every dynamic entity: NPCs, items, interactive objects, static
//! decoration, projectiles, trigger nodes and the passive-perception queue.
//! External code holds ids only and re-validates them here before use.

use glam::Vec3;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::config;
use crate::core::types::{InstanceId, InteractiveId, ItemId, NpcId, Tick, NO_INSTANCE};
use crate::entity::{Bullet, Interactive, Item, Npc, ProcessPolicy, WeaponState};
use crate::simulation::perception::{PercKind, PerceptionBus, PerceptionMsg};
use crate::simulation::routines::{MobRoutine, MobStates};
use crate::spatial::SpatialIndex;
use crate::world::time::WorldTime;
use crate::world::triggers::{Trigger, TriggerCmd, TriggerEvent};
use crate::world::vob::Vob;
use crate::world::waypoints::WaypointGraph;
use crate::world::{ItemVisuals, ScreenProjection};

/// Handle to a registered trigger node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerId(pub usize);

/// Non-interactive placed decoration
#[derive(Debug, Clone)]
pub struct StaticObj {
    pub name: String,
    pub pos: Vec3,
}

pub struct WorldObjects {
    pub(crate) npcs: Vec<Npc>,
    /// NPCs retired from the live set but kept alive for outstanding
    /// references; never revived by the core itself
    pub(crate) npc_invalid: Vec<Npc>,
    pub(crate) items: Vec<Item>,
    pub(crate) item_index: SpatialIndex<ItemId>,
    pub(crate) interactives: Vec<Interactive>,
    pub(crate) interactive_index: SpatialIndex<InteractiveId>,
    pub(crate) statics: Vec<StaticObj>,
    pub(crate) root_vobs: Vec<Vob>,

    pub(crate) triggers: Vec<Trigger>,
    /// Trigger-node subsets; nodes are append-only so indices stay stable
    pub(crate) triggers_zn: Vec<usize>,
    pub(crate) triggers_tk: Vec<usize>,
    pub(crate) trigger_events: Vec<TriggerEvent>,

    pub(crate) bullets: Vec<Bullet>,
    pub(crate) perc_bus: PerceptionBus,
    pub(crate) routines: Vec<MobStates>,
    pub(crate) npc_near: Vec<NpcId>,

    next_npc_id: u64,
    next_item_id: u64,
    next_interactive_id: u64,
}

impl WorldObjects {
    pub fn new() -> Self {
        let cfg = config::config();
        Self {
            npcs: Vec::new(),
            npc_invalid: Vec::new(),
            items: Vec::new(),
            item_index: SpatialIndex::new(cfg.grid_cell_size),
            interactives: Vec::new(),
            interactive_index: SpatialIndex::new(cfg.grid_cell_size),
            statics: Vec::new(),
            root_vobs: Vec::new(),
            triggers: Vec::new(),
            triggers_zn: Vec::new(),
            triggers_tk: Vec::new(),
            trigger_events: Vec::new(),
            bullets: Vec::new(),
            perc_bus: PerceptionBus::new(),
            routines: Vec::new(),
            npc_near: Vec::with_capacity(cfg.near_reserve),
            next_npc_id: 0,
            next_item_id: 0,
            next_interactive_id: 0,
        }
    }

    pub(crate) fn alloc_npc_id(&mut self) -> NpcId {
        let id = NpcId(self.next_npc_id);
        self.next_npc_id += 1;
        id
    }

    fn alloc_item_id(&mut self) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        id
    }

    pub(crate) fn bump_id_floor(&mut self, npc: u64, item: u64) {
        self.next_npc_id = self.next_npc_id.max(npc);
        self.next_item_id = self.next_item_id.max(item);
    }

    // === NPCS ===

    /// Spawn an NPC at a named waypoint
    ///
    /// A locked point falls back to the nearest unlocked successor. An
    /// unknown waypoint is a data error: logged, nothing is spawned.
    pub fn add_npc(
        &mut self,
        instance: InstanceId,
        waypoints: &WaypointGraph,
        at: &str,
    ) -> Option<NpcId> {
        let Some(mut point) = waypoints.find_point(at) else {
            tracing::error!("add_npc: invalid waypoint \"{at}\"");
            return None;
        };
        if point.locked {
            if let Some(next) = waypoints.find_next_point(point) {
                point = next;
            }
        }
        let id = self.alloc_npc_id();
        let mut npc = Npc::new(id, instance, "");
        npc.set_position(point.pos);
        npc.set_direction(point.dir);
        npc.attach_to_point(Some(point.name.clone()));
        self.npcs.push(npc);
        Some(id)
    }

    /// Spawn an NPC at a raw position
    pub fn add_npc_at(&mut self, instance: InstanceId, pos: Vec3) -> NpcId {
        let id = self.alloc_npc_id();
        let mut npc = Npc::new(id, instance, "");
        npc.set_position(pos);
        self.npcs.push(npc);
        id
    }

    /// Insert an externally constructed player entity at a named waypoint,
    /// taking ownership
    pub fn insert_player(
        &mut self,
        mut npc: Npc,
        waypoints: &WaypointGraph,
        at: &str,
    ) -> Option<NpcId> {
        let Some(mut point) = waypoints.find_point(at) else {
            tracing::error!("insert_player: invalid waypoint \"{at}\"");
            return None;
        };
        if point.locked {
            if let Some(next) = waypoints.find_next_point(point) {
                point = next;
            }
        }
        npc.set_position(point.pos);
        npc.set_direction(point.dir);
        npc.attach_to_point(Some(point.name.clone()));
        npc.set_process_policy(ProcessPolicy::Player);
        let id = npc.id();
        self.npcs.push(npc);
        Some(id)
    }

    /// Move an NPC out of the live set without destroying it
    pub fn take_npc(&mut self, id: NpcId) -> Option<Npc> {
        let i = self.npcs.iter().position(|n| n.id() == id)?;
        // swap-remove; the per-tick sort restores id order
        Some(self.npcs.swap_remove(i))
    }

    /// Lifecycle hook for retired NPCs; the embedding game decides revival
    pub fn take_invalid_npc(&mut self, id: NpcId) -> Option<Npc> {
        let i = self.npc_invalid.iter().position(|n| n.id() == id)?;
        Some(self.npc_invalid.swap_remove(i))
    }

    pub fn npc(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.id() == id)
    }

    pub fn npc_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|n| n.id() == id)
    }

    /// Storage index of an NPC, `None` when absent
    pub fn npc_index(&self, id: NpcId) -> Option<u32> {
        self.npcs.iter().position(|n| n.id() == id).map(|i| i as u32)
    }

    /// Storage index of an item, `None` when absent
    pub fn item_index_of(&self, id: ItemId) -> Option<u32> {
        self.items.iter().position(|i| i.id() == id).map(|i| i as u32)
    }

    pub fn npc_count(&self) -> usize {
        self.npcs.len()
    }

    pub fn npcs(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.iter()
    }

    pub fn find_hero(&self) -> Option<NpcId> {
        self.npcs
            .iter()
            .find(|n| n.process_policy() == ProcessPolicy::Player)
            .map(Npc::id)
    }

    pub fn find_npc_by_instance(&self, instance: InstanceId) -> Option<NpcId> {
        self.npcs
            .iter()
            .find(|n| n.instance() == instance)
            .map(Npc::id)
    }

    /// Visit the cached near-player set
    pub fn detect_npc_near(&self, mut f: impl FnMut(&Npc)) {
        for id in &self.npc_near {
            if let Some(npc) = self.npc(*id) {
                f(npc);
            }
        }
    }

    /// Visit every NPC within a sphere
    pub fn detect_npc(&self, center: Vec3, radius: f32, mut f: impl FnMut(&Npc)) {
        let max_q = radius * radius;
        for npc in &self.npcs {
            if npc.qdist_to(center) < max_q {
                f(npc);
            }
        }
    }

    /// Confirm that an externally held NPC reference is still live
    pub fn validate_npc(&self, id: NpcId) -> Option<NpcId> {
        self.npcs.iter().any(|n| n.id() == id).then_some(id)
    }

    // === ITEMS ===

    /// Spawn an item, optionally at a named waypoint
    ///
    /// Unlike NPC spawning, a missing point is tolerated: the item lands at
    /// the origin and the embedding game places it.
    pub fn add_item(
        &mut self,
        instance: InstanceId,
        waypoints: &WaypointGraph,
        at: Option<&str>,
        visuals: &dyn ItemVisuals,
    ) -> Option<ItemId> {
        if instance == NO_INSTANCE {
            return None;
        }
        let id = self.alloc_item_id();
        let mut item = Item::new(id, instance);
        if let Some(point) = at.and_then(|name| waypoints.find_point(name)) {
            item.set_position(point.pos);
            item.set_direction(point.dir);
        }
        item.view = visuals.item_view(instance);
        let pos = item.position();
        self.items.push(item);
        self.item_index.add(id, pos);
        Some(id)
    }

    /// Move an item out of the registry without destroying it
    pub fn take_item(&mut self, id: ItemId) -> Option<Item> {
        let i = self.items.iter().position(|it| it.id() == id)?;
        let item = self.items.swap_remove(i);
        self.item_index.del(id);
        Some(item)
    }

    /// Remove and destroy an item
    pub fn remove_item(&mut self, id: ItemId) {
        let _ = self.take_item(id);
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn validate_item(&self, id: ItemId) -> Option<ItemId> {
        self.item_index.has_object(id).then_some(id)
    }

    /// Count of an item instance inside the tagged interactive's inventory
    pub fn has_items(&self, tag: &str, instance: InstanceId) -> u32 {
        for mob in &self.interactives {
            if mob.name == tag {
                return mob.inventory.item_count(instance);
            }
        }
        0
    }

    // === INTERACTIVES, STATICS, VOBS ===

    pub fn add_interactive(&mut self, name: &str, scheme: &str, pos: Vec3) -> InteractiveId {
        let id = InteractiveId(self.next_interactive_id);
        self.next_interactive_id += 1;
        let mut mob = Interactive::new(id, name, scheme);
        mob.set_position(pos);
        self.interactives.push(mob);
        self.interactive_index.add(id, pos);
        id
    }

    pub fn add_static(&mut self, obj: StaticObj) {
        self.statics.push(obj);
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    pub fn add_root_vob(&mut self, vob: Vob) {
        self.root_vobs.push(vob);
    }

    /// Rebuild hint after bulk topology changes
    pub fn invalidate_vob_index(&mut self) {
        self.interactive_index.invalidate();
    }

    pub fn interactive(&self, id: InteractiveId) -> Option<&Interactive> {
        self.interactives.iter().find(|i| i.id() == id)
    }

    pub fn interactive_mut(&mut self, id: InteractiveId) -> Option<&mut Interactive> {
        self.interactives.iter_mut().find(|i| i.id() == id)
    }

    pub fn interactive_count(&self) -> usize {
        self.interactives.len()
    }

    pub fn validate_interactive(&self, id: InteractiveId) -> Option<InteractiveId> {
        self.interactive_index.has_object(id).then_some(id)
    }

    pub fn interactives(&self) -> impl Iterator<Item = &Interactive> {
        self.interactives.iter()
    }

    /// Current broadcast state of a named vob node
    pub fn vob_mob_state(&self, name: &str) -> Option<i32> {
        self.root_vobs
            .iter()
            .find_map(|v| v.find(name))
            .map(Vob::mob_state)
    }

    pub fn routine_count(&self) -> usize {
        self.routines.len()
    }

    // === PROJECTILES ===

    /// Fire a projectile; velocity is the normalized direction times `speed`
    pub fn shoot_bullet(
        &mut self,
        item: InstanceId,
        origin: Vec3,
        dir: Vec3,
        speed: f32,
    ) -> &mut Bullet {
        self.bullets.push(Bullet::new(item, origin, dir, speed));
        let last = self.bullets.len() - 1;
        &mut self.bullets[last]
    }

    pub fn bullet_count(&self) -> usize {
        self.bullets.len()
    }

    // === TRIGGERS ===

    /// Register a trigger node; zoned nodes join the intersection pass
    pub fn add_trigger(&mut self, trigger: Trigger) -> TriggerId {
        let idx = self.triggers.len();
        if trigger.has_volume() {
            self.triggers_zn.push(idx);
        }
        self.triggers.push(trigger);
        TriggerId(idx)
    }

    pub fn trigger(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(id.0)
    }

    /// Enqueue an event for the next trigger pass
    pub fn trigger_event(&mut self, e: TriggerEvent) {
        self.trigger_events.push(e);
    }

    pub fn pending_trigger_events(&self) -> usize {
        self.trigger_events.len()
    }

    /// Deliver one event, or re-queue it when its time barrier is pending
    pub(crate) fn exec_trigger_event(&mut self, e: TriggerEvent, now: Tick) {
        if e.time_barrier.is_some_and(|b| b > now) {
            self.trigger_event(e);
            return;
        }

        // trigger names are not unique: every match fires
        let mut emitted = false;
        let mut follow_ups = Vec::new();
        for t in &mut self.triggers {
            if t.name == e.target {
                follow_ups.extend(t.process_event(&e, now));
                emitted = true;
            }
        }
        self.trigger_events.extend(follow_ups);
        if !emitted {
            tracing::debug!("unable to process trigger: \"{}\"", e.target);
        }
    }

    /// One-time world-entry broadcast
    pub fn trigger_on_start(&mut self, first_time: bool) {
        let cmd = if first_time {
            TriggerCmd::StartupFirstTime
        } else {
            TriggerCmd::Startup
        };
        let evt = TriggerEvent::new("", "", cmd);
        let mut follow_ups = Vec::new();
        for t in &mut self.triggers {
            follow_ups.extend(t.process_on_start(&evt));
        }
        self.trigger_events.extend(follow_ups);
    }

    /// Subscribe a node to per-tick callbacks; idempotent
    pub fn enable_ticks(&mut self, id: TriggerId) {
        if !self.triggers_tk.contains(&id.0) {
            self.triggers_tk.push(id.0);
        }
    }

    /// Unsubscribe; swap-remove, order among subscribers is not observable
    pub fn disable_ticks(&mut self, id: TriggerId) {
        if let Some(i) = self.triggers_tk.iter().position(|&t| t == id.0) {
            self.triggers_tk.swap_remove(i);
        }
    }

    // === MOB STATES ===

    /// Insert a schedule entry, keeping the named schedule sorted by time
    pub fn set_mob_routine(&mut self, time: WorldTime, scheme: &str, state: i32) {
        let routine = MobRoutine { time, state };
        for r in &mut self.routines {
            if r.scheme == scheme {
                r.add(routine);
                return;
            }
        }
        let mut states = MobStates::new(scheme);
        states.add(routine);
        self.routines.push(states);
    }

    /// Broadcast a mob-state change to the vob tree and the interactives
    pub fn set_mob_state(&mut self, scheme: &str, state: i32) {
        for vob in &mut self.root_vobs {
            vob.set_mob_state(scheme, state);
        }
        for mob in &mut self.interactives {
            if mob.check_mob_name(scheme) {
                mob.set_state(state);
            }
        }
    }

    // === PASSIVE PERCEPTION ===

    /// Enqueue a passive perception for next-tick delivery
    pub fn send_passive_perc(
        &mut self,
        self_npc: NpcId,
        other: NpcId,
        victim: NpcId,
        what: PercKind,
    ) {
        self.send_passive_perc_item(self_npc, other, victim, None, what);
    }

    /// Variant carrying an item of interest
    pub fn send_passive_perc_item(
        &mut self,
        self_npc: NpcId,
        other: NpcId,
        victim: NpcId,
        item: Option<InstanceId>,
        what: PercKind,
    ) {
        let Some(pos) = self.npc(self_npc).map(Npc::position) else {
            return;
        };
        self.perc_bus.send(PerceptionMsg {
            what,
            pos,
            self_npc,
            other,
            victim,
            item,
        });
    }

    // === PARALLEL PHASES ===

    /// Animation-state fan-out; every worker touches only its own entity
    pub fn update_animation(&mut self) {
        self.npcs.par_iter_mut().for_each(Npc::update_animation);
        self.interactives
            .par_iter_mut()
            .for_each(Interactive::update_animation);
    }

    /// Is any live NPC currently attacking `dst`?
    ///
    /// Read-only parallel reduction; writers only ever set the flag, so the
    /// race is an idempotent OR.
    pub fn is_targeted(&self, dst: NpcId) -> bool {
        let flag = AtomicBool::new(false);
        self.npcs.par_iter().for_each(|npc| {
            if Self::is_targeted_by(npc, dst) {
                flag.store(true, Ordering::Relaxed);
            }
        });
        flag.load(Ordering::Relaxed)
    }

    pub fn is_targeted_by(npc: &Npc, dst: NpcId) -> bool {
        if npc.target() != Some(dst) {
            return false;
        }
        if npc.process_policy() != ProcessPolicy::AiNormal || npc.weapon == WeaponState::NoWeapon {
            return false;
        }
        npc.attacking
    }

    // === WORLD RESET ===

    /// Send everything back to its routine start
    ///
    /// NPCs that no longer have a live routine are retired to the invalid
    /// holding list: detached, parked out of world, kept for references.
    pub fn reset_positions_to_start(&mut self, waypoints: &WaypointGraph) {
        for mob in &mut self.interactives {
            mob.reset_position_to_start();
        }

        let mut i = 0;
        while i < self.npcs.len() {
            if self.npcs[i].reset_position_to_start() {
                if let Some(pos) = self.npcs[i]
                    .start_point()
                    .and_then(|p| waypoints.find_point(p))
                    .map(|p| p.pos)
                {
                    self.npcs[i].set_position(pos);
                }
                i += 1;
            } else {
                let mut npc = self.npcs.remove(i);
                npc.attach_to_point(None);
                npc.set_position(Vec3::new(-1000.0, -1000.0, -1000.0));
                self.npc_invalid.push(npc);
            }
        }
    }

    // === DEBUG OVERLAY ===

    /// Walk interactive screen positions for the debug overlay
    pub fn march_interactives(
        &self,
        projection: &dyn ScreenProjection,
        f: &mut dyn FnMut(InteractiveId, f32, f32),
    ) {
        for mob in &self.interactives {
            if let Some((x, y)) = projection.project(mob.position()) {
                f(mob.id(), x, y);
            }
        }
    }
}

impl Default for WorldObjects {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::waypoints::WaypointDef;

    fn graph() -> WaypointGraph {
        let mut g = WaypointGraph::new();
        g.add(WaypointDef {
            name: "WP_GATE".into(),
            position: [0.0, 0.0, 0.0],
            direction: [0.0, 0.0, 1.0],
            locked: false,
            links: vec!["WP_MARKET".into()],
        });
        g.add(WaypointDef {
            name: "WP_MARKET".into(),
            position: [500.0, 0.0, 0.0],
            direction: [0.0, 0.0, 1.0],
            locked: false,
            links: vec![],
        });
        g
    }

    #[test]
    fn test_spawn_at_unknown_waypoint_yields_nothing() {
        let mut w = WorldObjects::new();
        assert_eq!(w.add_npc(1, &graph(), "WP_NOWHERE"), None);
        assert_eq!(w.npc_count(), 0);
    }

    #[test]
    fn test_spawn_at_locked_point_falls_back_to_successor() {
        let mut w = WorldObjects::new();
        let mut g = graph();
        g.set_locked("WP_GATE", true);
        let id = w.add_npc(1, &g, "WP_GATE").unwrap();
        let npc = w.npc(id).unwrap();
        assert_eq!(npc.attached_point(), Some("WP_MARKET"));
        assert_eq!(npc.position(), Vec3::new(500.0, 0.0, 0.0));
    }

    #[test]
    fn test_validate_npc_after_take() {
        let mut w = WorldObjects::new();
        let id = w.add_npc_at(1, Vec3::ZERO);
        assert_eq!(w.validate_npc(id), Some(id));

        let taken = w.take_npc(id).unwrap();
        assert_eq!(taken.id(), id);
        assert_eq!(w.validate_npc(id), None);
        assert_eq!(w.npc_index(id), None);
    }

    #[test]
    fn test_validate_item_after_remove() {
        let mut w = WorldObjects::new();
        let g = graph();
        let id = w
            .add_item(700, &g, Some("WP_MARKET"), &crate::world::NoVisuals)
            .unwrap();
        assert_eq!(w.validate_item(id), Some(id));
        assert_eq!(
            w.item(id).unwrap().position(),
            Vec3::new(500.0, 0.0, 0.0)
        );

        w.remove_item(id);
        assert_eq!(w.validate_item(id), None);
        assert_eq!(w.item_index_of(id), None);
    }

    #[test]
    fn test_spawning_no_instance_item_is_a_noop() {
        let mut w = WorldObjects::new();
        let g = graph();
        assert_eq!(
            w.add_item(crate::core::types::NO_INSTANCE, &g, None, &crate::world::NoVisuals),
            None
        );
    }

    #[test]
    fn test_insert_player_becomes_hero() {
        let mut w = WorldObjects::new();
        let id = w.alloc_npc_id();
        let npc = Npc::new(id, 1000, "hero");
        let inserted = w.insert_player(npc, &graph(), "WP_GATE").unwrap();
        assert_eq!(inserted, id);
        assert_eq!(w.find_hero(), Some(id));
    }

    #[test]
    fn test_find_npc_by_instance() {
        let mut w = WorldObjects::new();
        let a = w.add_npc_at(10, Vec3::ZERO);
        let _b = w.add_npc_at(20, Vec3::ZERO);
        assert_eq!(w.find_npc_by_instance(10), Some(a));
        assert_eq!(w.find_npc_by_instance(99), None);
    }

    #[test]
    fn test_detect_npc_sphere() {
        let mut w = WorldObjects::new();
        w.add_npc_at(1, Vec3::ZERO);
        w.add_npc_at(2, Vec3::new(50.0, 0.0, 0.0));
        w.add_npc_at(3, Vec3::new(500.0, 0.0, 0.0));

        let mut hits = 0;
        w.detect_npc(Vec3::ZERO, 100.0, |_| hits += 1);
        assert_eq!(hits, 2);
    }

    #[test]
    fn test_has_items_by_container_tag() {
        let mut w = WorldObjects::new();
        let id = w.add_interactive("CHEST_GATE", "CHEST", Vec3::ZERO);
        w.interactive_mut(id).unwrap().inventory.add(42, 3);
        assert_eq!(w.has_items("CHEST_GATE", 42), 3);
        assert_eq!(w.has_items("CHEST_GATE", 7), 0);
        assert_eq!(w.has_items("NO_SUCH_CHEST", 42), 0);
    }

    #[test]
    fn test_is_targeted_requires_drawn_weapon_and_attack() {
        let mut w = WorldObjects::new();
        let victim = w.add_npc_at(1, Vec3::ZERO);
        let attacker = w.add_npc_at(2, Vec3::new(10.0, 0.0, 0.0));

        assert!(!w.is_targeted(victim));

        let a = w.npc_mut(attacker).unwrap();
        a.set_target(Some(victim));
        a.set_process_policy(ProcessPolicy::AiNormal);
        a.weapon = WeaponState::Melee;
        a.attacking = true;
        assert!(w.is_targeted(victim));

        w.npc_mut(attacker).unwrap().weapon = WeaponState::NoWeapon;
        assert!(!w.is_targeted(victim));
    }

    #[test]
    fn test_reset_retires_dead_npcs_to_holding_list() {
        let mut w = WorldObjects::new();
        let g = graph();
        let alive = w.add_npc(1, &g, "WP_GATE").unwrap();
        let dead = w.add_npc(2, &g, "WP_MARKET").unwrap();
        w.npc_mut(dead).unwrap().set_dead(true);

        w.reset_positions_to_start(&g);

        assert_eq!(w.validate_npc(alive), Some(alive));
        assert_eq!(w.validate_npc(dead), None);

        // retired, parked out of world, still reachable through the hook
        let parked = w.take_invalid_npc(dead).unwrap();
        assert_eq!(parked.position(), Vec3::new(-1000.0, -1000.0, -1000.0));
        assert_eq!(parked.attached_point(), None);
    }

    #[test]
    fn test_set_mob_routine_creates_then_extends() {
        let mut w = WorldObjects::new();
        w.set_mob_routine(WorldTime::hm(20, 0), "BED", 1);
        w.set_mob_routine(WorldTime::hm(7, 0), "BED", 0);
        w.set_mob_routine(WorldTime::hm(9, 0), "FORGE", 1);

        assert_eq!(w.routines.len(), 2);
        let bed = &w.routines[0];
        assert_eq!(bed.scheme, "BED");
        let times: Vec<_> = bed.routines.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![WorldTime::hm(7, 0), WorldTime::hm(20, 0)]);
    }

    #[test]
    fn test_set_mob_state_reaches_vobs_and_interactives() {
        let mut w = WorldObjects::new();
        let mob = w.add_interactive("BED_1", "BED", Vec3::ZERO);
        w.add_root_vob(Vob::new("BED_1_VOB").with_scheme("BED"));

        w.set_mob_state("BED", 2);
        assert_eq!(w.interactive(mob).unwrap().state(), 2);
        assert_eq!(w.root_vobs[0].mob_state(), 2);
    }

    #[test]
    fn test_enable_ticks_is_idempotent() {
        let mut w = WorldObjects::new();
        let t = w.add_trigger(Trigger::new(
            "PULSE",
            crate::world::triggers::TriggerKind::Latch {
                activated: false,
                count: 0,
            },
        ));
        w.enable_ticks(t);
        w.enable_ticks(t);
        assert_eq!(w.triggers_tk.len(), 1);
        w.disable_ticks(t);
        assert!(w.triggers_tk.is_empty());
        w.disable_ticks(t);
    }

    #[test]
    fn test_event_with_no_matching_node_is_dropped() {
        let mut w = WorldObjects::new();
        w.trigger_event(TriggerEvent::new("NO_SUCH_NODE", "", TriggerCmd::Trigger));
        let events = std::mem::take(&mut w.trigger_events);
        for e in events {
            w.exec_trigger_event(e, 0);
        }
        assert_eq!(w.pending_trigger_events(), 0);
    }

    #[test]
    fn test_events_share_a_non_unique_name() {
        let mut w = WorldObjects::new();
        let a = w.add_trigger(Trigger::new(
            "DOOR",
            crate::world::triggers::TriggerKind::Latch {
                activated: false,
                count: 0,
            },
        ));
        let b = w.add_trigger(Trigger::new(
            "DOOR",
            crate::world::triggers::TriggerKind::Latch {
                activated: false,
                count: 0,
            },
        ));
        w.exec_trigger_event(TriggerEvent::new("DOOR", "", TriggerCmd::Trigger), 0);

        for id in [a, b] {
            match w.trigger(id).unwrap().kind {
                crate::world::triggers::TriggerKind::Latch { count, .. } => assert_eq!(count, 1),
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn test_update_animation_advances_every_entity() {
        let mut w = WorldObjects::new();
        let npc = w.add_npc_at(1, Vec3::ZERO);
        let mob = w.add_interactive("BENCH_1", "BENCH", Vec3::ZERO);

        w.update_animation();
        w.update_animation();
        assert_eq!(w.npc(npc).unwrap().anim_time(), 2);
        assert_eq!(w.interactive(mob).unwrap().anim_time(), 2);
    }

    struct TopDown;

    impl crate::world::ScreenProjection for TopDown {
        fn project(&self, world: Vec3) -> Option<(f32, f32)> {
            (world.y >= 0.0).then_some((world.x, world.z))
        }
    }

    #[test]
    fn test_march_interactives_skips_clipped() {
        let mut w = WorldObjects::new();
        w.add_interactive("BENCH_1", "BENCH", Vec3::new(3.0, 0.0, 4.0));
        w.add_interactive("CELLAR_DOOR", "DOOR", Vec3::new(1.0, -50.0, 1.0));

        let mut seen = Vec::new();
        w.march_interactives(&TopDown, &mut |id, x, y| seen.push((id, x, y)));
        assert_eq!(seen.len(), 1);
        assert_eq!((seen[0].1, seen[0].2), (3.0, 4.0));
    }

    #[test]
    fn test_shoot_bullet_normalizes_direction() {
        let mut w = WorldObjects::new();
        let b = w.shoot_bullet(500, Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), 250.0);
        assert!((b.velocity().length() - 250.0).abs() < 1e-3);
        assert_eq!(w.bullet_count(), 1);
    }
}
