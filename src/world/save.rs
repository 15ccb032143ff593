//! Save-game codec: little-endian, length-prefixed, cursor-based
//!
//! The world state is a sequence of counted sections. Newer sections are
//! gated on the format version found in the header: a file written before a
//! section existed simply does not contain it, which is not corruption.

use glam::Vec3;

use crate::core::error::{Result, WorldError};

pub const MAGIC: &[u8; 4] = b"HMSV";

/// Current save format version
pub const SAVE_VERSION: u16 = 16;
/// Queued trigger events are present from this version on
pub const VERSION_TRIGGER_EVENTS: u16 = 10;
/// Mob schedules are present from this version on
pub const VERSION_MOB_ROUTINES: u16 = 16;

/// Append-only save buffer
#[derive(Debug, Default)]
pub struct SaveWriter {
    buf: Vec<u8>,
}

impl SaveWriter {
    pub fn new(version: u16) -> Self {
        let mut w = Self { buf: Vec::new() };
        w.buf.extend_from_slice(MAGIC);
        w.write_u16(version);
        w
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_vec3(&mut self, v: Vec3) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    pub fn write_string(&mut self, v: &str) {
        let bytes = v.as_bytes();
        debug_assert!(bytes.len() <= u16::MAX as usize);
        self.write_u16(bytes.len() as u16);
        self.buf.extend_from_slice(bytes);
    }
}

/// Cursor over a save buffer
#[derive(Debug)]
pub struct SaveReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
    version: u16,
}

impl<'a> SaveReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        let mut r = Self {
            bytes,
            cursor: 0,
            version: 0,
        };
        let magic = r.read_exact(4)?;
        if magic != MAGIC {
            return Err(WorldError::SaveFormat("invalid magic".into()));
        }
        r.version = r.read_u16()?;
        Ok(r)
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.cursor.saturating_add(len);
        if end > self.bytes.len() {
            return Err(WorldError::SaveFormat("unexpected end of save data".into()));
        }
        let out = &self.bytes[self.cursor..end];
        self.cursor = end;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let raw = self.read_exact(2)?;
        raw.try_into()
            .map(u16::from_le_bytes)
            .map_err(|_| WorldError::SaveFormat("invalid u16 encoding".into()))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let raw = self.read_exact(4)?;
        raw.try_into()
            .map(u32::from_le_bytes)
            .map_err(|_| WorldError::SaveFormat("invalid u32 encoding".into()))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let raw = self.read_exact(8)?;
        raw.try_into()
            .map(u64::from_le_bytes)
            .map_err(|_| WorldError::SaveFormat("invalid u64 encoding".into()))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let raw = self.read_exact(4)?;
        raw.try_into()
            .map(i32::from_le_bytes)
            .map_err(|_| WorldError::SaveFormat("invalid i32 encoding".into()))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let raw = self.read_exact(4)?;
        raw.try_into()
            .map(f32::from_le_bytes)
            .map_err(|_| WorldError::SaveFormat("invalid f32 encoding".into()))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let raw = self.read_exact(len)?;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|_| WorldError::SaveFormat("invalid UTF-8 string".into()))
    }
}

// === WORLD STATE ===

use crate::core::config;
use crate::core::types::{InteractiveId, ItemId, NpcId, NO_INSTANCE};
use crate::entity::{Interactive, Inventory, Item, Npc, ProcessPolicy, SensesBit, WeaponState};
use crate::simulation::routines::{MobRoutine, MobStates};
use crate::spatial::SpatialIndex;
use crate::world::objects::WorldObjects;
use crate::world::time::WorldTime;
use crate::world::triggers::{TriggerCmd, TriggerEvent};

fn write_opt_string(w: &mut SaveWriter, v: Option<&str>) {
    match v {
        Some(s) => {
            w.write_bool(true);
            w.write_string(s);
        }
        None => w.write_bool(false),
    }
}

fn read_opt_string(r: &mut SaveReader<'_>) -> Result<Option<String>> {
    Ok(if r.read_bool()? {
        Some(r.read_string()?)
    } else {
        None
    })
}

fn write_inventory(w: &mut SaveWriter, inv: &Inventory) {
    let slots: Vec<_> = inv.iter().collect();
    w.write_u32(slots.len() as u32);
    for (instance, count) in slots {
        w.write_u32(instance);
        w.write_u32(count);
    }
}

fn read_inventory(r: &mut SaveReader<'_>) -> Result<Inventory> {
    let mut inv = Inventory::new();
    let n = r.read_u32()?;
    for _ in 0..n {
        let instance = r.read_u32()?;
        let count = r.read_u32()?;
        inv.add(instance, count);
    }
    Ok(inv)
}

fn policy_to_u8(p: ProcessPolicy) -> u8 {
    match p {
        ProcessPolicy::Player => 0,
        ProcessPolicy::AiNormal => 1,
        ProcessPolicy::AiFar => 2,
        ProcessPolicy::AiFar2 => 3,
    }
}

fn policy_from_u8(v: u8) -> Result<ProcessPolicy> {
    Ok(match v {
        0 => ProcessPolicy::Player,
        1 => ProcessPolicy::AiNormal,
        2 => ProcessPolicy::AiFar,
        3 => ProcessPolicy::AiFar2,
        _ => return Err(WorldError::SaveFormat(format!("invalid policy {v}"))),
    })
}

fn weapon_to_u8(w: WeaponState) -> u8 {
    match w {
        WeaponState::NoWeapon => 0,
        WeaponState::Melee => 1,
        WeaponState::Range => 2,
    }
}

fn weapon_from_u8(v: u8) -> Result<WeaponState> {
    Ok(match v {
        0 => WeaponState::NoWeapon,
        1 => WeaponState::Melee,
        2 => WeaponState::Range,
        _ => return Err(WorldError::SaveFormat(format!("invalid weapon state {v}"))),
    })
}

const FLAG_DEAD: u8 = 1 << 0;
const FLAG_DOWN: u8 = 1 << 1;
const FLAG_NO_FOCUS: u8 = 1 << 2;
const FLAG_ATTACKING: u8 = 1 << 3;

fn save_npc(w: &mut SaveWriter, npc: &Npc) {
    w.write_u64(npc.id().0);
    w.write_u32(npc.instance());
    w.write_string(&npc.name);
    w.write_vec3(npc.position());
    w.write_vec3(npc.direction());
    w.write_u8(policy_to_u8(npc.process_policy()));
    let mut flags = 0u8;
    if npc.is_dead() {
        flags |= FLAG_DEAD;
    }
    if npc.is_down() {
        flags |= FLAG_DOWN;
    }
    if npc.no_focus {
        flags |= FLAG_NO_FOCUS;
    }
    if npc.attacking {
        flags |= FLAG_ATTACKING;
    }
    w.write_u8(flags);
    w.write_u8(weapon_to_u8(npc.weapon));
    w.write_u8(npc.senses.0);
    w.write_f32(npc.senses_range);
    w.write_u64(npc.perc_next_time());
    w.write_u64(npc.perc_interval);
    w.write_f32(npc.translate_y);
    w.write_u64(npc.target().map_or(u64::MAX, |t| t.0));
    w.write_u64(npc.interactive().map_or(u64::MAX, |i| i.0));
    write_opt_string(w, npc.start_point());
    write_opt_string(w, npc.attached_point());
    write_inventory(w, &npc.inventory);
}

fn load_npc(r: &mut SaveReader<'_>) -> Result<Npc> {
    let id = NpcId(r.read_u64()?);
    let instance = r.read_u32()?;
    let name = r.read_string()?;
    let mut npc = Npc::new(id, instance, name);
    npc.set_position(r.read_vec3()?);
    npc.set_direction(r.read_vec3()?);
    npc.set_process_policy(policy_from_u8(r.read_u8()?)?);
    let flags = r.read_u8()?;
    npc.set_dead(flags & FLAG_DEAD != 0);
    npc.set_down(flags & FLAG_DOWN != 0);
    npc.no_focus = flags & FLAG_NO_FOCUS != 0;
    npc.attacking = flags & FLAG_ATTACKING != 0;
    npc.weapon = weapon_from_u8(r.read_u8()?)?;
    npc.senses = SensesBit(r.read_u8()?);
    npc.senses_range = r.read_f32()?;
    npc.set_perc_time(r.read_u64()?);
    npc.perc_interval = r.read_u64()?;
    npc.translate_y = r.read_f32()?;
    let target = r.read_u64()?;
    npc.set_target((target != u64::MAX).then_some(NpcId(target)));
    let mob = r.read_u64()?;
    npc.set_interactive((mob != u64::MAX).then_some(InteractiveId(mob)));
    let start = read_opt_string(r)?;
    let attached = read_opt_string(r)?;
    npc.restore_points(start, attached);
    npc.inventory = read_inventory(r)?;
    Ok(npc)
}

fn save_item(w: &mut SaveWriter, item: &Item) {
    w.write_u64(item.id().0);
    w.write_u32(item.instance());
    w.write_vec3(item.position());
    w.write_vec3(item.direction());
    w.write_u32(item.owner.unwrap_or(NO_INSTANCE));
    write_opt_string(w, item.view.as_deref());
}

fn load_item(r: &mut SaveReader<'_>) -> Result<Item> {
    let id = ItemId(r.read_u64()?);
    let instance = r.read_u32()?;
    let mut item = Item::new(id, instance);
    item.set_position(r.read_vec3()?);
    item.set_direction(r.read_vec3()?);
    let owner = r.read_u32()?;
    item.owner = (owner != NO_INSTANCE).then_some(owner);
    item.view = read_opt_string(r)?;
    Ok(item)
}

fn save_interactive(w: &mut SaveWriter, mob: &Interactive) {
    w.write_i32(mob.state());
    w.write_bool(mob.override_focus);
    w.write_u64(mob.occupied_by().map_or(u64::MAX, |n| n.0));
    write_inventory(w, &mob.inventory);
}

fn load_interactive(r: &mut SaveReader<'_>, mob: &mut Interactive) -> Result<()> {
    mob.set_state(r.read_i32()?);
    mob.override_focus = r.read_bool()?;
    let occupied = r.read_u64()?;
    mob.set_occupied((occupied != u64::MAX).then_some(NpcId(occupied)));
    mob.inventory = read_inventory(r)?;
    Ok(())
}

fn save_trigger_event(w: &mut SaveWriter, e: &TriggerEvent) {
    w.write_string(&e.target);
    w.write_string(&e.emitter);
    w.write_u8(e.cmd as u8);
    match e.time_barrier {
        Some(b) => {
            w.write_bool(true);
            w.write_u64(b);
        }
        None => w.write_bool(false),
    }
}

fn load_trigger_event(r: &mut SaveReader<'_>) -> Result<TriggerEvent> {
    let target = r.read_string()?;
    let emitter = r.read_string()?;
    let raw = r.read_u8()?;
    let cmd = TriggerCmd::from_u8(raw)
        .ok_or_else(|| WorldError::SaveFormat(format!("invalid trigger cmd {raw}")))?;
    let mut e = TriggerEvent::new(target, emitter, cmd);
    if r.read_bool()? {
        e.time_barrier = Some(r.read_u64()?);
    }
    Ok(e)
}

fn save_routine(w: &mut SaveWriter, states: &MobStates) {
    w.write_string(&states.scheme);
    w.write_i32(states.cur_state);
    w.write_u32(states.routines.len() as u32);
    for r in &states.routines {
        w.write_u32(r.time.seconds());
        w.write_i32(r.state);
    }
}

fn load_routine(r: &mut SaveReader<'_>) -> Result<MobStates> {
    let mut states = MobStates::new(r.read_string()?);
    states.cur_state = r.read_i32()?;
    let n = r.read_u32()?;
    for _ in 0..n {
        let time = WorldTime::new(r.read_u32()?);
        let state = r.read_i32()?;
        states.routines.push(MobRoutine { time, state });
    }
    Ok(states)
}

impl WorldObjects {
    /// Serialize the dynamic world state at the current format version
    pub fn save(&self) -> Vec<u8> {
        self.save_as(SAVE_VERSION)
    }

    /// Serialize at an explicit format version; sections newer than the
    /// version are omitted, exactly as an old build would have written
    pub fn save_as(&self, version: u16) -> Vec<u8> {
        let mut w = SaveWriter::new(version);

        w.write_u32(self.npcs.len() as u32);
        for npc in &self.npcs {
            save_npc(&mut w, npc);
        }

        w.write_u32(self.items.len() as u32);
        for item in &self.items {
            save_item(&mut w, item);
        }

        w.write_u32(self.interactives.len() as u32);
        for mob in &self.interactives {
            save_interactive(&mut w, mob);
        }

        w.write_u32(self.root_vobs.len() as u32);
        for vob in &self.root_vobs {
            vob.save_tree(&mut w);
        }

        if version >= VERSION_TRIGGER_EVENTS {
            w.write_u32(self.trigger_events.len() as u32);
            for e in &self.trigger_events {
                save_trigger_event(&mut w, e);
            }
        }

        if version >= VERSION_MOB_ROUTINES {
            w.write_u32(self.routines.len() as u32);
            for r in &self.routines {
                save_routine(&mut w, r);
            }
        }

        w.into_bytes()
    }

    /// Restore dynamic state into the already-constructed static topology
    ///
    /// NPCs and items are rebuilt from the save; interactives and the vob
    /// tree must already exist and match the saved counts.
    pub fn load(&mut self, bytes: &[u8]) -> Result<()> {
        let mut r = SaveReader::new(bytes)?;

        let n = r.read_u32()? as usize;
        self.npcs.clear();
        self.npc_near.clear();
        let mut next_npc = 0u64;
        for _ in 0..n {
            let npc = load_npc(&mut r)?;
            next_npc = next_npc.max(npc.id().0 + 1);
            self.npcs.push(npc);
        }

        let n = r.read_u32()? as usize;
        self.items.clear();
        self.item_index = SpatialIndex::new(config::config().grid_cell_size);
        let mut next_item = 0u64;
        for _ in 0..n {
            let item = load_item(&mut r)?;
            next_item = next_item.max(item.id().0 + 1);
            self.item_index.add(item.id(), item.position());
            self.items.push(item);
        }
        self.bump_id_floor(next_npc, next_item);

        let n = r.read_u32()? as usize;
        if n != self.interactives.len() {
            return Err(WorldError::SaveConsistency(format!(
                "{n} interactive objects in save, {} in world",
                self.interactives.len()
            )));
        }
        for mob in &mut self.interactives {
            load_interactive(&mut r, mob)?;
        }

        let n = r.read_u32()? as usize;
        if n != self.root_vobs.len() {
            return Err(WorldError::SaveConsistency(format!(
                "{n} root vobs in save, {} in world",
                self.root_vobs.len()
            )));
        }
        for vob in &mut self.root_vobs {
            vob.load_tree(&mut r)?;
        }

        // sections below are gated on the format version: their absence in
        // an older file is expected, not corruption
        if r.version() >= VERSION_TRIGGER_EVENTS {
            let n = r.read_u32()? as usize;
            self.trigger_events.clear();
            for _ in 0..n {
                let e = load_trigger_event(&mut r)?;
                self.trigger_events.push(e);
            }
        }

        if r.version() >= VERSION_MOB_ROUTINES {
            let n = r.read_u32()? as usize;
            self.routines.clear();
            for _ in 0..n {
                let routine = load_routine(&mut r)?;
                self.routines.push(routine);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_roundtrip() {
        let mut w = SaveWriter::new(SAVE_VERSION);
        w.write_u32(1234);
        w.write_string("WP_MARKET");
        w.write_vec3(Vec3::new(1.0, 2.0, 3.0));
        w.write_bool(true);
        let bytes = w.into_bytes();

        let mut r = SaveReader::new(&bytes).unwrap();
        assert_eq!(r.version(), SAVE_VERSION);
        assert_eq!(r.read_u32().unwrap(), 1234);
        assert_eq!(r.read_string().unwrap(), "WP_MARKET");
        assert_eq!(r.read_vec3().unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert!(r.read_bool().unwrap());
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let bytes = b"XXXX\x10\x00".to_vec();
        assert!(SaveReader::new(&bytes).is_err());
    }

    #[test]
    fn test_truncated_read_is_an_error_not_a_panic() {
        let w = SaveWriter::new(SAVE_VERSION);
        let bytes = w.into_bytes();
        let mut r = SaveReader::new(&bytes).unwrap();
        assert!(r.read_u64().is_err());
    }
}
