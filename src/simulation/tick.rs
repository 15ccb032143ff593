//! Per-tick orchestration
//!
//! One world tick runs a fixed phase order:
//!
//! 1. swap out the previous tick's passive-perception queue
//! 2. stable-sort NPCs by id (determinism safeguard after swap-removes)
//! 3. per-NPC tick
//! 4. mob-state schedules
//! 5. interactive ticks, then tick-subscribed triggers
//! 6. projectile integration and removal of stopped bullets
//! 7. near-set / AI level-of-detail reassignment around the player
//! 8. zone-intersection triggers, then the deferred trigger queue
//! 9. passive-perception delivery, then timer-elapsed player perception
//!
//! Without a player the tick ends after phase 6: the world is not fully
//! initialized yet and nothing is "near".

use ahash::AHashMap;
use glam::Vec3;

use crate::core::config;
use crate::core::types::{NpcId, Tick};
use crate::entity::{Npc, ProcessPolicy};
use crate::simulation::perception::PerceptionMsg;
use crate::world::objects::WorldObjects;
use crate::world::time::WorldClock;
use crate::world::LineOfSight;

impl WorldObjects {
    /// Advance the world by `dt` milliseconds
    pub fn tick(&mut self, clock: &WorldClock, los: &dyn LineOfSight, dt: u64) {
        // everything queued from here on is next tick's batch
        let passive = self.perc_bus.drain();

        self.npcs.sort_by_key(Npc::id);

        for npc in &mut self.npcs {
            npc.tick(dt);
        }

        self.tick_routines(clock);

        for mob in &mut self.interactives {
            mob.tick(dt);
        }

        let now = clock.tick_count();
        let mut follow_ups = Vec::new();
        for &i in &self.triggers_tk {
            follow_ups.extend(self.triggers[i].tick(now));
        }
        self.trigger_events.extend(follow_ups);

        for b in &mut self.bullets {
            b.tick(dt);
        }
        self.bullets.retain(|b| !b.is_stopped());

        let Some(player) = self.find_hero() else {
            return;
        };
        let player_pos = match self.npc(player) {
            Some(npc) => npc.position(),
            None => return,
        };

        self.reassign_lod(player, player_pos);
        self.tick_near(now);
        self.tick_triggers(now);
        self.deliver_perception(&passive, player, player_pos, now, los);
    }

    /// Phase 4: broadcast schedule states that became due
    fn tick_routines(&mut self, clock: &WorldClock) {
        let time = clock.time();
        let mut changes = Vec::new();
        for r in &mut self.routines {
            let state = r.state_by_time(time);
            if state != r.cur_state {
                changes.push((r.scheme.clone(), state));
                r.cur_state = state;
            }
        }
        for (scheme, state) in changes {
            self.set_mob_state(&scheme, state);
        }
    }

    /// Phase 7: near/far/far2 tiers by squared distance to the player
    ///
    /// The player joins the near set but never has its own policy
    /// reassigned.
    fn reassign_lod(&mut self, player: NpcId, player_pos: Vec3) {
        let cfg = config::config();
        let near_q = cfg.near_distance * cfg.near_distance;
        let far_q = cfg.far_distance * cfg.far_distance;

        let mut near = std::mem::take(&mut self.npc_near);
        near.clear();
        for npc in &mut self.npcs {
            let q = npc.qdist_to(player_pos);
            if q < near_q {
                near.push(npc.id());
                if npc.id() != player {
                    npc.set_process_policy(ProcessPolicy::AiNormal);
                }
            } else if q < far_q {
                npc.set_process_policy(ProcessPolicy::AiFar);
            } else {
                npc.set_process_policy(ProcessPolicy::AiFar2);
            }
        }
        self.npc_near = near;
    }

    /// Phase 8a: zoned triggers against the near set's feet positions
    fn tick_near(&mut self, now: Tick) {
        let mut feet = Vec::with_capacity(self.npc_near.len());
        for id in &self.npc_near {
            if let Some(npc) = self.npcs.iter().find(|n| n.id() == *id) {
                let pos = npc.position();
                feet.push((*id, Vec3::new(pos.x, pos.y + npc.translate_y, pos.z)));
            }
        }

        let mut follow_ups = Vec::new();
        for &zi in &self.triggers_zn {
            let t = &mut self.triggers[zi];
            let inside: Vec<NpcId> = feet
                .iter()
                .filter(|(_, p)| t.check_pos(*p))
                .map(|(id, _)| *id)
                .collect();
            follow_ups.extend(t.update_intersections(&inside, now));
        }
        self.trigger_events.extend(follow_ups);
    }

    /// Phase 8b: drain the event queue once
    ///
    /// Barrier-pending events re-queue themselves; everything an event
    /// causes lands in next tick's queue.
    fn tick_triggers(&mut self, now: Tick) {
        let events = std::mem::take(&mut self.trigger_events);
        for e in events {
            self.exec_trigger_event(e, now);
        }
    }

    /// Phase 9: deliver the passive batch, then active player perception
    fn deliver_perception(
        &mut self,
        passive: &[PerceptionMsg],
        player: NpcId,
        player_pos: Vec3,
        now: Tick,
        los: &dyn LineOfSight,
    ) {
        // participant snapshots: delivery re-validates ids against the live
        // set and reads the instigator's senses range
        let participants: AHashMap<NpcId, (Vec3, f32)> = self
            .npcs
            .iter()
            .map(|n| (n.id(), (n.position(), n.senses_range)))
            .collect();

        for npc in &mut self.npcs {
            if npc.is_player() {
                continue;
            }

            if npc.process_policy() == ProcessPolicy::AiNormal {
                for msg in passive {
                    if msg.self_npc == npc.id() {
                        continue;
                    }
                    let q = npc.qdist_to(msg.pos);
                    let range = npc.senses_range;
                    if q >= range * range {
                        continue;
                    }
                    let Some(&(other_pos, other_range)) = participants.get(&msg.other) else {
                        continue;
                    };
                    let Some(&(victim_pos, _)) = participants.get(&msg.victim) else {
                        continue;
                    };
                    if npc.is_down() {
                        continue;
                    }
                    // mutual sensing: the receiver must sense the instigator,
                    // and the victim within the instigator's own range
                    if npc.can_sense(other_pos, None, los).any()
                        && npc.can_sense(victim_pos, Some(other_range), los).any()
                    {
                        npc.perception_process_event(
                            msg.other,
                            msg.victim,
                            q.sqrt(),
                            msg.what,
                            msg.item,
                            now,
                        );
                    }
                }

                if npc.perc_next_time() <= now {
                    let dist = npc.qdist_to(player_pos).sqrt();
                    npc.perception_process_player(player, dist, now);
                }
            }
        }
    }
}
