//! World items and inventories

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{InstanceId, ItemId};

/// A placed item, owned exclusively by the registry
///
/// Inventories and the spatial index refer to items by id only.
#[derive(Debug, Clone)]
pub struct Item {
    id: ItemId,
    instance: InstanceId,
    pos: Vec3,
    dir: Vec3,
    /// Instance symbol of the owning NPC, if any
    pub owner: Option<InstanceId>,
    /// Opaque visual handle resolved through the asset collaborator
    pub view: Option<String>,
}

impl Item {
    pub fn new(id: ItemId, instance: InstanceId) -> Self {
        Self {
            id,
            instance,
            pos: Vec3::ZERO,
            dir: Vec3::Z,
            owner: None,
            view: None,
        }
    }

    pub fn id(&self) -> ItemId {
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
}

/// Item counts keyed by instance symbol
///
/// Entries stay sorted by instance so that iteration and the save format
/// are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<(InstanceId, u32)>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, instance: InstanceId, count: u32) {
        match self.slots.binary_search_by_key(&instance, |s| s.0) {
            Ok(i) => self.slots[i].1 += count,
            Err(i) => self.slots.insert(i, (instance, count)),
        }
    }

    /// Remove up to `count`; returns how many were actually removed
    pub fn del(&mut self, instance: InstanceId, count: u32) -> u32 {
        match self.slots.binary_search_by_key(&instance, |s| s.0) {
            Ok(i) => {
                let taken = self.slots[i].1.min(count);
                self.slots[i].1 -= taken;
                if self.slots[i].1 == 0 {
                    self.slots.remove(i);
                }
                taken
            }
            Err(_) => 0,
        }
    }

    pub fn item_count(&self, instance: InstanceId) -> u32 {
        match self.slots.binary_search_by_key(&instance, |s| s.0) {
            Ok(i) => self.slots[i].1,
            Err(_) => 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, u32)> + '_ {
        self.slots.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
