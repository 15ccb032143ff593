//! Waypoint graph collaborator
//!
//! Named navigable points with lock flags. Spawning resolves points by
//! name; a locked point falls back to the nearest unlocked successor.

use ahash::AHashMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A named navigable point in the world graph
#[derive(Debug, Clone)]
pub struct Waypoint {
    pub name: String,
    pub pos: Vec3,
    pub dir: Vec3,
    pub locked: bool,
    /// Names of directly connected points
    pub links: Vec<String>,
}

/// JSON shape of a waypoint definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointDef {
    pub name: String,
    pub position: [f32; 3],
    #[serde(default = "default_dir")]
    pub direction: [f32; 3],
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub links: Vec<String>,
}

fn default_dir() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}

#[derive(Debug, Clone, Default)]
pub struct WaypointGraph {
    points: Vec<Waypoint>,
    by_name: AHashMap<String, usize>,
}

impl WaypointGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, def: WaypointDef) {
        let idx = self.points.len();
        self.by_name.insert(def.name.clone(), idx);
        self.points.push(Waypoint {
            name: def.name,
            pos: Vec3::from_array(def.position),
            dir: Vec3::from_array(def.direction),
            locked: def.locked,
            links: def.links,
        });
    }

    pub fn find_point(&self, name: &str) -> Option<&Waypoint> {
        self.by_name.get(name).map(|&i| &self.points[i])
    }

    /// Nearest unlocked point reachable from `from`
    ///
    /// Prefers direct successors; falls back to the nearest unlocked point
    /// anywhere in the graph when every successor is locked.
    pub fn find_next_point(&self, from: &Waypoint) -> Option<&Waypoint> {
        let candidates = from
            .links
            .iter()
            .filter_map(|n| self.find_point(n))
            .filter(|p| !p.locked);
        if let Some(best) = Self::nearest(candidates, from.pos) {
            return Some(best);
        }
        let all = self
            .points
            .iter()
            .filter(|p| !p.locked && p.name != from.name);
        Self::nearest(all, from.pos)
    }

    fn nearest<'a>(
        candidates: impl Iterator<Item = &'a Waypoint>,
        origin: Vec3,
    ) -> Option<&'a Waypoint> {
        let mut best: Option<&Waypoint> = None;
        let mut best_q = f32::INFINITY;
        for p in candidates {
            let q = (p.pos - origin).length_squared();
            if q < best_q {
                best_q = q;
                best = Some(p);
            }
        }
        best
    }

    pub fn set_locked(&mut self, name: &str, locked: bool) {
        if let Some(&i) = self.by_name.get(name) {
            self.points[i].locked = locked;
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, pos: [f32; 3], locked: bool, links: &[&str]) -> WaypointDef {
        WaypointDef {
            name: name.into(),
            position: pos,
            direction: [0.0, 0.0, 1.0],
            locked,
            links: links.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_find_point_by_name() {
        let mut g = WaypointGraph::new();
        g.add(def("GATE", [1.0, 0.0, 2.0], false, &[]));
        assert!(g.find_point("GATE").is_some());
        assert!(g.find_point("NOWHERE").is_none());
    }

    #[test]
    fn test_next_point_prefers_nearest_unlocked_successor() {
        let mut g = WaypointGraph::new();
        g.add(def("A", [0.0, 0.0, 0.0], true, &["B", "C"]));
        g.add(def("B", [100.0, 0.0, 0.0], false, &[]));
        g.add(def("C", [10.0, 0.0, 0.0], false, &[]));
        let from = g.find_point("A").unwrap();
        assert_eq!(g.find_next_point(from).unwrap().name, "C");
    }

    #[test]
    fn test_next_point_falls_back_past_locked_successors() {
        let mut g = WaypointGraph::new();
        g.add(def("A", [0.0, 0.0, 0.0], true, &["B"]));
        g.add(def("B", [5.0, 0.0, 0.0], true, &[]));
        g.add(def("D", [50.0, 0.0, 0.0], false, &[]));
        let from = g.find_point("A").unwrap();
        assert_eq!(g.find_next_point(from).unwrap().name, "D");
    }
}
