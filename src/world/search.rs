//! Target search: unified nearest/best-match queries
//!
//! One generalized predicate drives NPC, item and interactive searches.
//! Kind-specific behavior (visibility flags, line-of-sight strategy) hangs
//! off a capability trait rather than free-standing special cases.
//!
//! Tie-break contract: the running best starts at the maximum range and the
//! comparison is strictly less-than, so a candidate at exactly `range_max`
//! is rejected and equal distances keep the first candidate in storage
//! order. Queries must scan in insertion order for this to be reproducible.

use glam::Vec3;

use crate::core::config;
use crate::core::types::{InteractiveId, ItemId, NpcId};
use crate::entity::{Interactive, Item, Npc};
use crate::world::objects::WorldObjects;
use crate::world::LineOfSight;

/// Flag bits of a search request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFlags {
    /// Skip dead NPCs
    pub no_death: bool,
    /// Skip the view-cone test
    pub no_angle: bool,
    /// Skip the line-of-sight test
    pub no_ray: bool,
    /// Match interactives in focus-override mode instead of normal focus
    pub focus_override: bool,
}

impl SearchFlags {
    pub const NONE: SearchFlags = SearchFlags {
        no_death: false,
        no_angle: false,
        no_ray: false,
        focus_override: false,
    };
}

/// Collection policy of a search request
///
/// `None` and `Caster` keep the spell/effect on its origin: the full scan
/// yields nothing for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCollect {
    None,
    Caster,
    Focus,
    All,
}

/// A target-search request
#[derive(Debug, Clone)]
pub struct SearchOpt {
    pub range_min: f32,
    pub range_max: f32,
    /// Half-angle of the view cone, degrees
    pub azi: f32,
    pub collect: TargetCollect,
    pub flags: SearchFlags,
}

impl SearchOpt {
    pub fn new(
        range_min: f32,
        range_max: f32,
        azi: f32,
        collect: TargetCollect,
        flags: SearchFlags,
    ) -> Self {
        Self {
            range_min,
            range_max,
            azi,
            collect,
            flags,
        }
    }
}

/// Per-kind search capabilities
pub(crate) trait SearchTarget {
    fn position(&self) -> Vec3;

    /// Kind-specific visibility flags
    fn accept_flags(&self, flags: SearchFlags) -> bool;

    /// Candidate is the observer itself
    fn is_observer(&self, observer: &Npc) -> bool;

    /// Kind-specific line-of-sight strategy
    fn can_see_from(&self, observer: &Npc, los: &dyn LineOfSight) -> bool;
}

impl SearchTarget for Npc {
    fn position(&self) -> Vec3 {
        Npc::position(self)
    }

    fn accept_flags(&self, flags: SearchFlags) -> bool {
        if self.no_focus {
            return false;
        }
        if flags.no_death && self.is_dead() {
            return false;
        }
        true
    }

    fn is_observer(&self, observer: &Npc) -> bool {
        self.id() == observer.id()
    }

    fn can_see_from(&self, observer: &Npc, los: &dyn LineOfSight) -> bool {
        los.can_see(observer.eye_position(), self.eye_position())
    }
}

impl SearchTarget for Interactive {
    fn position(&self) -> Vec3 {
        Interactive::position(self)
    }

    fn accept_flags(&self, flags: SearchFlags) -> bool {
        flags.focus_override == self.override_focus
    }

    fn is_observer(&self, _observer: &Npc) -> bool {
        false
    }

    // tested from the interactive's own viewpoint
    fn can_see_from(&self, observer: &Npc, los: &dyn LineOfSight) -> bool {
        los.can_see(self.position(), observer.eye_position())
    }
}

impl SearchTarget for Item {
    fn position(&self) -> Vec3 {
        Item::position(self)
    }

    fn accept_flags(&self, _flags: SearchFlags) -> bool {
        true
    }

    fn is_observer(&self, _observer: &Npc) -> bool {
        false
    }

    // Eye-height heuristic: an item lying within the observer's standing
    // span is ray-tested at eye level, anything else slightly above its own
    // top. The constants are game data, not derived values.
    fn can_see_from(&self, observer: &Npc, los: &dyn LineOfSight) -> bool {
        let cfg = config::config();
        let p0 = observer.position();
        let p1 = self.position();
        let target = if p0.y <= p1.y && p1.y <= p0.y + cfg.eye_height {
            Vec3::new(p1.x, p0.y + cfg.eye_height, p1.z)
        } else {
            Vec3::new(p1.x, p1.y + cfg.item_ray_offset, p1.z)
        };
        los.can_see(observer.eye_position(), target)
    }
}

/// The generalized search predicate
///
/// Accepts the candidate only when it beats `best` strictly; on acceptance
/// `best` becomes the candidate's true distance.
pub(crate) fn test_obj<T: SearchTarget>(
    candidate: &T,
    observer: &Npc,
    opt: &SearchOpt,
    best: &mut f32,
    los: &dyn LineOfSight,
) -> bool {
    let q_max = opt.range_max * opt.range_max;
    let q_min = opt.range_min * opt.range_min;
    let heading = observer.rotation_rad() + std::f32::consts::FRAC_PI_2;
    let cone = opt.azi.to_radians().cos();

    if candidate.is_observer(observer) {
        return false;
    }
    if !candidate.accept_flags(opt.flags) {
        return false;
    }

    let dpos = observer.position() - candidate.position();
    let q = dpos.length_squared();
    if q > q_max || q < q_min {
        return false;
    }

    let bearing = dpos.z.atan2(dpos.x);
    if (heading - bearing).cos() < cone && !opt.flags.no_angle {
        return false;
    }

    let dist = q.sqrt();
    if dist < *best && (opt.flags.no_ray || candidate.can_see_from(observer, los)) {
        *best = dist;
        return true;
    }
    false
}

/// One-shot test against a fresh best of `range_max`
pub(crate) fn test_obj_once<T: SearchTarget>(
    candidate: &T,
    observer: &Npc,
    opt: &SearchOpt,
    los: &dyn LineOfSight,
) -> bool {
    let mut best = opt.range_max;
    test_obj(candidate, observer, opt, &mut best, los)
}

fn find_obj<'a, T: SearchTarget>(
    src: impl Iterator<Item = &'a T>,
    observer: &Npc,
    opt: &SearchOpt,
    los: &dyn LineOfSight,
) -> Option<&'a T> {
    if matches!(opt.collect, TargetCollect::None | TargetCollect::Caster) {
        return None;
    }
    let mut best = opt.range_max;
    let mut ret = None;
    for candidate in src {
        if test_obj(candidate, observer, opt, &mut best, los) {
            ret = Some(candidate);
        }
    }
    ret
}

impl WorldObjects {
    /// Nearest matching NPC
    ///
    /// A still-valid previous target is retried first with the angle and
    /// ray tests relaxed; only when it fails does the full scan run.
    pub fn find_npc(
        &self,
        observer: NpcId,
        def: Option<NpcId>,
        opt: &SearchOpt,
        los: &dyn LineOfSight,
    ) -> Option<NpcId> {
        let pl = self.npc(observer)?;
        if let Some(def) = def.and_then(|d| self.validate_npc(d)) {
            let mut xopt = opt.clone();
            xopt.flags.no_angle = true;
            xopt.flags.no_ray = true;
            if let Some(npc) = self.npc(def) {
                if test_obj_once(npc, pl, &xopt, los) {
                    return Some(def);
                }
            }
        }
        find_obj(self.npcs.iter(), pl, opt, los).map(Npc::id)
    }

    /// Nearest matching item, via the item spatial index
    pub fn find_item(
        &self,
        observer: NpcId,
        def: Option<ItemId>,
        opt: &SearchOpt,
        los: &dyn LineOfSight,
    ) -> Option<ItemId> {
        let pl = self.npc(observer)?;
        if let Some(def) = def.and_then(|d| self.validate_item(d)) {
            if let Some(item) = self.item(def) {
                if test_obj_once(item, pl, opt, los) {
                    return Some(def);
                }
            }
        }

        let mut best = opt.range_max;
        let mut ret = None;
        self.item_index.find(pl.position(), opt.range_max, |id| {
            if let Some(item) = self.item(id) {
                if test_obj(item, pl, opt, &mut best, los) {
                    ret = Some(id);
                }
            }
            false
        });
        ret
    }

    /// Nearest matching interactive, via the interactive spatial index
    pub fn find_interactive(
        &self,
        observer: NpcId,
        def: Option<InteractiveId>,
        opt: &SearchOpt,
        los: &dyn LineOfSight,
    ) -> Option<InteractiveId> {
        let pl = self.npc(observer)?;
        if let Some(def) = def.and_then(|d| self.validate_interactive(d)) {
            if let Some(mob) = self.interactive(def) {
                if test_obj_once(mob, pl, opt, los) {
                    return Some(def);
                }
            }
        }

        let mut best = opt.range_max;
        let mut ret = None;
        self.interactive_index.find(pl.position(), opt.range_max, |id| {
            if let Some(mob) = self.interactive(id) {
                if test_obj(mob, pl, opt, &mut best, los) {
                    ret = Some(id);
                }
            }
            false
        });
        ret
    }

    /// Nearest available interactive with a matching mob name
    ///
    /// The observer's currently attached interactive wins outright when it
    /// already matches.
    pub fn available_mob(&self, observer: NpcId, dest: &str) -> Option<InteractiveId> {
        let pl = self.npc(observer)?;
        if let Some(cur) = pl.interactive().and_then(|i| self.interactive(i)) {
            if cur.check_mob_name(dest) {
                return Some(cur.id());
            }
        }

        let dist = config::config().mob_search_radius;
        let mut cur_dist = dist * dist;
        let mut ret = None;
        self.interactive_index.find(pl.position(), dist, |id| {
            if let Some(mob) = self.interactive(id) {
                if mob.is_available() && mob.check_mob_name(dest) {
                    let d = pl.qdist_to(mob.position());
                    if d < cur_dist {
                        ret = Some(id);
                        cur_dist = d;
                    }
                }
            }
            false
        });
        ret
    }
}
