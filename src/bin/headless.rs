//! Headless world runner
//!
//! Builds a small demonstration world, runs the simulation for a fixed
//! number of ticks and logs what the live-world layer does along the way.
//! Useful for smoke-testing the tick pipeline without any renderer.

use glam::Vec3;

use hollowmere::world::loader::load_world_json;
use hollowmere::world::search::{SearchFlags, SearchOpt, TargetCollect};
use hollowmere::world::time::WorldTime;
use hollowmere::world::triggers::{BoxVolume, Trigger, TriggerCmd, TriggerEvent, TriggerKind};

const DEMO_WORLD: &str = r#"{
    "version": 1,
    "waypoints": [
        { "name": "WP_GATE",   "position": [0.0, 0.0, 0.0],    "links": ["WP_MARKET"] },
        { "name": "WP_MARKET", "position": [400.0, 0.0, 0.0],  "links": ["WP_GATE", "WP_TAVERN"] },
        { "name": "WP_TAVERN", "position": [800.0, 0.0, 200.0] }
    ],
    "interactives": [
        { "name": "BED_TAVERN", "scheme": "BED",   "position": [820.0, 0.0, 220.0] },
        { "name": "CHEST_GATE", "scheme": "CHEST", "position": [20.0, 0.0, 10.0],
          "items": [ { "instance": 7001, "count": 2 } ] }
    ],
    "vobs": [
        { "name": "TAVERN", "children": [ { "name": "BED_TAVERN_VOB", "scheme": "BED" } ] }
    ]
}"#;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hollowmere=debug".into()),
        )
        .init();

    tracing::info!("Hollowmere headless runner starting...");

    let mut world = match load_world_json(DEMO_WORLD) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!("failed to load demo world: {e}");
            return;
        }
    };

    let Some(player) = world.insert_player(1000, "WP_GATE") else {
        tracing::error!("player spawn failed");
        return;
    };
    let guard = world.spawn_npc(1001, "WP_MARKET");
    world.spawn_npc(1002, "WP_TAVERN");
    tracing::info!(?player, ?guard, "population spawned");

    world.spawn_item(7002, Some("WP_MARKET"));

    // bed usage schedule: occupied at night, free during the day
    world.set_mob_routine(WorldTime::hm(22, 0), "BED", 1);
    world.set_mob_routine(WorldTime::hm(7, 0), "BED", 0);

    world.register_trigger(
        Trigger::new(
            "ZONE_GATE",
            TriggerKind::Relay {
                target: "GATE_LOG".into(),
            },
        )
        .with_volume(BoxVolume::new(
            Vec3::new(-100.0, -100.0, -100.0),
            Vec3::new(100.0, 100.0, 100.0),
        )),
    );
    world.register_trigger(Trigger::new(
        "GATE_LOG",
        TriggerKind::Latch {
            activated: false,
            count: 0,
        },
    ));

    world.trigger_on_start(true);
    world.trigger_event(
        TriggerEvent::new("GATE_LOG", "", TriggerCmd::Trigger).with_barrier(5 * 16),
    );

    for frame in 0..600u64 {
        world.tick(16);
        if frame % 100 == 0 {
            tracing::info!(
                frame,
                time = ?world.time(),
                npcs = world.objects.npc_count(),
                pending_events = world.objects.pending_trigger_events(),
                "tick"
            );
        }
    }

    let opt = SearchOpt::new(
        0.0,
        2000.0,
        180.0,
        TargetCollect::All,
        SearchFlags::NONE,
    );
    match world.find_npc(player, None, &opt) {
        Some(npc) => tracing::info!(?npc, "nearest npc to player"),
        None => tracing::info!("no npc in range of player"),
    }

    let save = world.save();
    tracing::info!(bytes = save.len(), "world serialized");
}
