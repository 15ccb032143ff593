//! The live world: registry, queries, triggers, persistence
//!
//! `World` bundles the object registry with the collaborators the
//! simulation consumes through narrow interfaces: the clock, the waypoint
//! graph, line-of-sight ray tests and item visual resolution. Rendering,
//! physics and scripting live entirely behind those seams.

pub mod loader;
pub mod objects;
pub mod save;
pub mod search;
pub mod time;
pub mod triggers;
pub mod vob;
pub mod waypoints;

use glam::Vec3;

use crate::core::error::Result;
use crate::core::types::{InstanceId, InteractiveId, ItemId, NpcId};
use crate::entity::{Bullet, Npc};
use crate::world::objects::{TriggerId, WorldObjects};
use crate::world::search::SearchOpt;
use crate::world::time::{WorldClock, WorldTime};
use crate::world::triggers::{Trigger, TriggerEvent};
use crate::world::waypoints::WaypointGraph;

/// Line-of-sight ray test, answered by the physics collaborator
pub trait LineOfSight {
    /// True when the segment from `from` to `to` is unobstructed
    fn can_see(&self, from: Vec3, to: Vec3) -> bool;
}

/// Permissive default: an empty world occludes nothing
pub struct NoOcclusion;

impl LineOfSight for NoOcclusion {
    fn can_see(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

/// Item visual resolution, answered by the asset collaborator
pub trait ItemVisuals {
    fn item_view(&self, instance: InstanceId) -> Option<String>;
}

/// Default for headless runs: items carry no view
pub struct NoVisuals;

impl ItemVisuals for NoVisuals {
    fn item_view(&self, _instance: InstanceId) -> Option<String> {
        None
    }
}

/// World-to-screen projection, used only by the debug overlay
pub trait ScreenProjection {
    /// Screen position of a world point, `None` when clipped
    fn project(&self, world: Vec3) -> Option<(f32, f32)>;
}

/// The live world and its collaborators
pub struct World {
    pub clock: WorldClock,
    pub waypoints: WaypointGraph,
    pub objects: WorldObjects,
    los: Box<dyn LineOfSight>,
    visuals: Box<dyn ItemVisuals>,
}

impl World {
    pub fn new() -> Self {
        Self::with_collaborators(Box::new(NoOcclusion), Box::new(NoVisuals))
    }

    pub fn with_collaborators(los: Box<dyn LineOfSight>, visuals: Box<dyn ItemVisuals>) -> Self {
        Self {
            clock: WorldClock::new(),
            waypoints: WaypointGraph::new(),
            objects: WorldObjects::new(),
            los,
            visuals,
        }
    }

    /// Advance the whole world by `dt` milliseconds
    ///
    /// Runs the simulation phases, then the parallel animation-state
    /// fan-out, so the next render snapshot sees a settled world.
    pub fn tick(&mut self, dt: u64) {
        self.clock.advance(dt);
        self.objects.tick(&self.clock, &*self.los, dt);
        self.objects.update_animation();
    }

    pub fn time(&self) -> WorldTime {
        self.clock.time()
    }

    // === SPAWNING ===

    pub fn spawn_npc(&mut self, instance: InstanceId, at: &str) -> Option<NpcId> {
        self.objects.add_npc(instance, &self.waypoints, at)
    }

    pub fn spawn_npc_at(&mut self, instance: InstanceId, pos: Vec3) -> NpcId {
        self.objects.add_npc_at(instance, pos)
    }

    /// Create the player entity at a named waypoint
    pub fn insert_player(&mut self, instance: InstanceId, at: &str) -> Option<NpcId> {
        let id = self.objects.alloc_npc_id();
        let npc = Npc::new(id, instance, "");
        self.objects.insert_player(npc, &self.waypoints, at)
    }

    pub fn despawn_npc(&mut self, id: NpcId) -> Option<Npc> {
        self.objects.take_npc(id)
    }

    pub fn spawn_item(&mut self, instance: InstanceId, at: Option<&str>) -> Option<ItemId> {
        self.objects
            .add_item(instance, &self.waypoints, at, &*self.visuals)
    }

    pub fn despawn_item(&mut self, id: ItemId) {
        self.objects.remove_item(id);
    }

    pub fn shoot_bullet(
        &mut self,
        item: InstanceId,
        origin: Vec3,
        dir: Vec3,
        speed: f32,
    ) -> &mut Bullet {
        self.objects.shoot_bullet(item, origin, dir, speed)
    }

    // === TRIGGERS & MOB STATES ===

    pub fn register_trigger(&mut self, trigger: Trigger) -> TriggerId {
        self.objects.add_trigger(trigger)
    }

    pub fn trigger_event(&mut self, e: TriggerEvent) {
        self.objects.trigger_event(e);
    }

    /// World-entry broadcast; `first_time` distinguishes the very first
    /// visit from a re-entry
    pub fn trigger_on_start(&mut self, first_time: bool) {
        self.objects.trigger_on_start(first_time);
    }

    pub fn set_mob_routine(&mut self, time: WorldTime, scheme: &str, state: i32) {
        self.objects.set_mob_routine(time, scheme, state);
    }

    pub fn set_mob_state(&mut self, scheme: &str, state: i32) {
        self.objects.set_mob_state(scheme, state);
    }

    // === QUERIES ===

    pub fn find_npc(&self, observer: NpcId, def: Option<NpcId>, opt: &SearchOpt) -> Option<NpcId> {
        self.objects.find_npc(observer, def, opt, &*self.los)
    }

    pub fn find_item(&self, observer: NpcId, def: Option<ItemId>, opt: &SearchOpt) -> Option<ItemId> {
        self.objects.find_item(observer, def, opt, &*self.los)
    }

    pub fn find_interactive(
        &self,
        observer: NpcId,
        def: Option<InteractiveId>,
        opt: &SearchOpt,
    ) -> Option<InteractiveId> {
        self.objects.find_interactive(observer, def, opt, &*self.los)
    }

    pub fn available_mob(&self, observer: NpcId, dest: &str) -> Option<InteractiveId> {
        self.objects.available_mob(observer, dest)
    }

    // === PERSISTENCE ===

    pub fn save(&self) -> Vec<u8> {
        self.objects.save()
    }

    pub fn load(&mut self, bytes: &[u8]) -> Result<()> {
        self.objects.load(bytes)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
