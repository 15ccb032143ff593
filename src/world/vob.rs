//! Placed-object (vob) tree
//!
//! Static world decoration and mob containers form a tree constructed at
//! world build time. Only the dynamic per-node state travels through saves;
//! the tree shape itself must already exist and match.

use crate::core::error::{Result, WorldError};
use crate::world::save::{SaveReader, SaveWriter};

/// One placed object; children inherit its placement
#[derive(Debug, Clone, Default)]
pub struct Vob {
    pub name: String,
    /// Mob class this node reacts to, if any
    pub mob_scheme: Option<String>,
    mob_state: i32,
    pub children: Vec<Vob>,
}

impl Vob {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.mob_scheme = Some(scheme.into());
        self
    }

    pub fn mob_state(&self) -> i32 {
        self.mob_state
    }

    /// Find a node by name in this subtree
    pub fn find(&self, name: &str) -> Option<&Vob> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Apply a mob-state broadcast to this subtree
    pub fn set_mob_state(&mut self, scheme: &str, state: i32) {
        if self.mob_scheme.as_deref() == Some(scheme) {
            self.mob_state = state;
        }
        for c in &mut self.children {
            c.set_mob_state(scheme, state);
        }
    }

    /// Serialize the dynamic state of this subtree
    pub fn save_tree(&self, w: &mut SaveWriter) {
        w.write_i32(self.mob_state);
        w.write_u32(self.children.len() as u32);
        for c in &self.children {
            c.save_tree(w);
        }
    }

    /// Restore the dynamic state of this subtree
    ///
    /// The child counts must match the constructed topology.
    pub fn load_tree(&mut self, r: &mut SaveReader<'_>) -> Result<()> {
        self.mob_state = r.read_i32()?;
        let n = r.read_u32()? as usize;
        if n != self.children.len() {
            return Err(WorldError::SaveConsistency(format!(
                "vob \"{}\": {} children in save, {} in world",
                self.name,
                n,
                self.children.len()
            )));
        }
        for c in &mut self.children {
            c.load_tree(r)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::save::SAVE_VERSION;

    fn tree() -> Vob {
        let mut root = Vob::new("ROOT");
        root.children.push(Vob::new("BED_1").with_scheme("BED"));
        let mut hut = Vob::new("HUT");
        hut.children.push(Vob::new("BED_2").with_scheme("BED"));
        hut.children.push(Vob::new("FORGE_1").with_scheme("FORGE"));
        root.children.push(hut);
        root
    }

    #[test]
    fn test_broadcast_reaches_nested_nodes() {
        let mut root = tree();
        root.set_mob_state("BED", 2);
        assert_eq!(root.children[0].mob_state(), 2);
        assert_eq!(root.children[1].children[0].mob_state(), 2);
        assert_eq!(root.children[1].children[1].mob_state(), 0);
    }

    #[test]
    fn test_state_roundtrip() {
        let mut root = tree();
        root.set_mob_state("FORGE", 7);

        let mut w = SaveWriter::new(SAVE_VERSION);
        root.save_tree(&mut w);
        let bytes = w.into_bytes();

        let mut fresh = tree();
        let mut r = SaveReader::new(&bytes).unwrap();
        fresh.load_tree(&mut r).unwrap();
        assert_eq!(fresh.children[1].children[1].mob_state(), 7);
    }

    #[test]
    fn test_mismatched_topology_fails() {
        let root = tree();
        let mut w = SaveWriter::new(SAVE_VERSION);
        root.save_tree(&mut w);
        let bytes = w.into_bytes();

        let mut smaller = Vob::new("ROOT");
        smaller.children.push(Vob::new("BED_1"));
        let mut r = SaveReader::new(&bytes).unwrap();
        assert!(matches!(
            smaller.load_tree(&mut r),
            Err(WorldError::SaveConsistency(_))
        ));
    }
}
