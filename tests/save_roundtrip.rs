//! Save/load integration: round-trips, version gating and topology
//! consistency checks.

use glam::Vec3;

use hollowmere::core::error::WorldError;
use hollowmere::simulation::perception::PercKind;
use hollowmere::world::loader::load_world_json;
use hollowmere::world::save::{SAVE_VERSION, VERSION_MOB_ROUTINES, VERSION_TRIGGER_EVENTS};
use hollowmere::world::time::WorldTime;
use hollowmere::world::triggers::{TriggerCmd, TriggerEvent};
use hollowmere::world::World;

const TOPOLOGY: &str = r#"{
    "version": 1,
    "waypoints": [
        { "name": "WP_GATE",   "position": [0.0, 0.0, 0.0] },
        { "name": "WP_MARKET", "position": [500.0, 0.0, 0.0] }
    ],
    "interactives": [
        { "name": "CHEST_GATE", "scheme": "CHEST", "position": [20.0, 0.0, 10.0] },
        { "name": "BED_TAVERN", "scheme": "BED",   "position": [800.0, 0.0, 0.0] }
    ],
    "vobs": [
        { "name": "TAVERN", "children": [ { "name": "BED_VOB", "scheme": "BED" } ] }
    ]
}"#;

fn populated_world() -> World {
    let mut world = load_world_json(TOPOLOGY).unwrap();

    let player = world.insert_player(1000, "WP_GATE").unwrap();
    let guard = world.spawn_npc(1001, "WP_MARKET").unwrap();
    {
        let npc = world.objects.npc_mut(guard).unwrap();
        npc.set_target(Some(player));
        npc.senses_range = 1234.0;
        npc.inventory.add(42, 2);
    }

    world.spawn_item(7001, Some("WP_MARKET"));
    world.spawn_item(7002, None);

    world.set_mob_routine(WorldTime::hm(6, 0), "BED", 1);
    world.set_mob_routine(WorldTime::hm(18, 0), "BED", 2);
    world.set_mob_state("BED", 2);

    world.trigger_event(TriggerEvent::new("DOOR", "", TriggerCmd::Trigger).with_barrier(640));
    world
}

#[test]
fn test_roundtrip_reproduces_counts_and_state() {
    let world = populated_world();
    let bytes = world.objects.save();

    let mut restored = load_world_json(TOPOLOGY).unwrap();
    restored.load(&bytes).unwrap();

    assert_eq!(restored.objects.npc_count(), world.objects.npc_count());
    assert_eq!(restored.objects.item_count(), world.objects.item_count());

    // npc state
    let guard = restored.objects.find_npc_by_instance(1001).unwrap();
    let npc = restored.objects.npc(guard).unwrap();
    assert_eq!(npc.position(), Vec3::new(500.0, 0.0, 0.0));
    assert_eq!(npc.attached_point(), Some("WP_MARKET"));
    assert_eq!(npc.senses_range, 1234.0);
    assert_eq!(npc.inventory.item_count(42), 2);
    let player = restored.objects.find_hero().unwrap();
    assert_eq!(npc.target(), Some(player));

    // queued trigger event survived with its barrier
    assert_eq!(restored.objects.pending_trigger_events(), 1);

    // a second save of the restored world is byte-identical
    let bytes_again = restored.objects.save();
    assert_eq!(bytes, bytes_again);
}

#[test]
fn test_restored_interactive_and_vob_state() {
    let world = populated_world();
    let bytes = world.objects.save();

    let mut restored = load_world_json(TOPOLOGY).unwrap();
    restored.load(&bytes).unwrap();

    let bed_state = restored
        .objects
        .interactives()
        .find(|m| m.scheme == "BED")
        .map(|m| m.state());
    assert_eq!(bed_state, Some(2));
    assert_eq!(restored.objects.vob_mob_state("BED_VOB"), Some(2));
}

#[test]
fn test_old_version_has_no_gated_sections() {
    let world = populated_world();
    let bytes = world.objects.save_as(VERSION_TRIGGER_EVENTS - 1);

    let mut restored = load_world_json(TOPOLOGY).unwrap();
    restored.load(&bytes).unwrap();

    // entities still round-trip
    assert_eq!(restored.objects.npc_count(), world.objects.npc_count());
    assert_eq!(restored.objects.item_count(), world.objects.item_count());
    // gated sections were never written: absence is not corruption
    assert_eq!(restored.objects.pending_trigger_events(), 0);
    assert_eq!(restored.objects.routine_count(), 0);
}

#[test]
fn test_mid_version_keeps_events_but_not_routines() {
    let world = populated_world();
    let bytes = world.objects.save_as(VERSION_MOB_ROUTINES - 1);

    let mut restored = load_world_json(TOPOLOGY).unwrap();
    restored.load(&bytes).unwrap();

    assert_eq!(restored.objects.pending_trigger_events(), 1);
    assert_eq!(restored.objects.routine_count(), 0);
}

#[test]
fn test_current_version_keeps_routines() {
    let world = populated_world();
    let bytes = world.objects.save_as(SAVE_VERSION);

    let mut restored = load_world_json(TOPOLOGY).unwrap();
    restored.load(&bytes).unwrap();
    assert_eq!(restored.objects.routine_count(), 1);
}

#[test]
fn test_interactive_count_mismatch_is_a_consistency_error() {
    let world = populated_world();
    let bytes = world.objects.save();

    // a world whose static topology lost a chest
    let mut smaller = load_world_json(
        r#"{
        "version": 1,
        "interactives": [
            { "name": "BED_TAVERN", "scheme": "BED", "position": [800.0, 0.0, 0.0] }
        ],
        "vobs": [
            { "name": "TAVERN", "children": [ { "name": "BED_VOB", "scheme": "BED" } ] }
        ]
    }"#,
    )
    .unwrap();

    assert!(matches!(
        smaller.load(&bytes),
        Err(WorldError::SaveConsistency(_))
    ));
}

#[test]
fn test_ids_keep_growing_after_load() {
    let world = populated_world();
    let max_id = world.objects.npcs().map(|n| n.id().0).max().unwrap();
    let bytes = world.objects.save();

    let mut restored = load_world_json(TOPOLOGY).unwrap();
    restored.load(&bytes).unwrap();

    let fresh = restored.spawn_npc_at(2000, Vec3::ZERO);
    assert!(fresh.0 > max_id);
}

#[test]
fn test_truncated_save_fails_cleanly() {
    let world = populated_world();
    let mut bytes = world.objects.save();
    bytes.truncate(bytes.len() / 2);

    let mut restored = load_world_json(TOPOLOGY).unwrap();
    assert!(restored.load(&bytes).is_err());
}

#[test]
fn test_perception_queue_is_not_persisted() {
    let mut world = populated_world();
    let a = world.objects.find_npc_by_instance(1001).unwrap();
    world
        .objects
        .send_passive_perc(a, a, a, PercKind::AssessWarn);

    let bytes = world.objects.save();
    let mut restored = load_world_json(TOPOLOGY).unwrap();
    restored.load(&bytes).unwrap();
    // perception messages live for one tick boundary only
    assert_eq!(restored.objects.npc(a).unwrap().perception_count(), 0);
}
