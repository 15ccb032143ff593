//! Load world topology from JSON placement files
//!
//! Worldgen emits one JSON file per world: waypoints, interactive objects,
//! static decoration and the placed-object tree. Loading constructs the
//! static topology that save games later re-hydrate their dynamic state
//! into.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use glam::Vec3;

use crate::world::objects::StaticObj;
use crate::world::vob::Vob;
use crate::world::waypoints::WaypointDef;
use crate::world::World;

/// Errors that can occur when loading a topology file
#[derive(Debug, Error)]
pub enum LoadError {
    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One inventory slot of a placed container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSlotDef {
    pub instance: u32,
    pub count: u32,
}

/// JSON shape of an interactive placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractiveDef {
    pub name: String,
    pub scheme: String,
    pub position: [f32; 3],
    #[serde(default)]
    pub override_focus: bool,
    #[serde(default)]
    pub items: Vec<ItemSlotDef>,
}

/// JSON shape of a static decoration placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticDef {
    pub name: String,
    pub position: [f32; 3],
}

/// JSON shape of a placed-object tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VobDef {
    pub name: String,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub children: Vec<VobDef>,
}

/// JSON shape of a world topology file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyFile {
    pub version: u32,
    #[serde(default)]
    pub waypoints: Vec<WaypointDef>,
    #[serde(default)]
    pub interactives: Vec<InteractiveDef>,
    #[serde(default)]
    pub statics: Vec<StaticDef>,
    #[serde(default)]
    pub vobs: Vec<VobDef>,
}

fn vob_from_def(def: VobDef) -> Vob {
    let mut vob = Vob::new(def.name);
    vob.mob_scheme = def.scheme;
    vob.children = def.children.into_iter().map(vob_from_def).collect();
    vob
}

/// Build a world from a JSON topology string
pub fn load_world_json(json: &str) -> Result<World, LoadError> {
    let file: TopologyFile = serde_json::from_str(json)?;
    let mut world = World::new();

    for wp in file.waypoints {
        world.waypoints.add(wp);
    }

    for def in file.interactives {
        let id = world
            .objects
            .add_interactive(&def.name, &def.scheme, Vec3::from_array(def.position));
        if let Some(mob) = world.objects.interactive_mut(id) {
            mob.override_focus = def.override_focus;
            for slot in def.items {
                mob.inventory.add(slot.instance, slot.count);
            }
        }
    }

    for def in file.statics {
        world.objects.add_static(StaticObj {
            name: def.name,
            pos: Vec3::from_array(def.position),
        });
    }

    for def in file.vobs {
        world.objects.add_root_vob(vob_from_def(def));
    }

    tracing::debug!(
        waypoints = world.waypoints.len(),
        interactives = world.objects.interactive_count(),
        "world topology loaded"
    );
    Ok(world)
}

/// Build a world from a JSON topology file on disk
pub fn load_world_file(path: &Path) -> Result<World, LoadError> {
    let content = std::fs::read_to_string(path)?;
    load_world_json(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: &str = r#"{
        "version": 1,
        "waypoints": [
            { "name": "WP_GATE", "position": [0.0, 0.0, 0.0], "links": ["WP_MARKET"] },
            { "name": "WP_MARKET", "position": [500.0, 0.0, 0.0] }
        ],
        "interactives": [
            {
                "name": "CHEST_GATE",
                "scheme": "CHEST",
                "position": [10.0, 0.0, 20.0],
                "items": [ { "instance": 42, "count": 3 } ]
            }
        ],
        "statics": [
            { "name": "ROCK_01", "position": [900.0, 0.0, 0.0] }
        ],
        "vobs": [
            {
                "name": "HUT",
                "children": [ { "name": "BED_1", "scheme": "BED" } ]
            }
        ]
    }"#;

    #[test]
    fn test_load_topology() {
        let world = load_world_json(WORLD).unwrap();
        assert_eq!(world.waypoints.len(), 2);
        assert_eq!(world.objects.interactive_count(), 1);
        assert_eq!(world.objects.has_items("CHEST_GATE", 42), 3);
        assert_eq!(world.objects.static_count(), 1);
        assert!(world.waypoints.find_point("WP_GATE").is_some());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            load_world_json("{ not json }"),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let world = load_world_json(r#"{ "version": 1 }"#).unwrap();
        assert_eq!(world.waypoints.len(), 0);
        assert_eq!(world.objects.interactive_count(), 0);
    }
}
