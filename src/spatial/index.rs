//! Broad-phase spatial lookup for live entities
//!
//! Entries keep insertion order; range queries scan in that order and use a
//! cached cell coordinate as the rejection test. The query therefore visits
//! an over-approximation of the ball (whole cells) and callers do the exact
//! narrow-phase distance test. Tie-break rules elsewhere depend on the scan
//! order, so no bucket structure may reorder candidates.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell(i32, i32, i32);

#[derive(Debug, Clone)]
struct Entry<K> {
    key: K,
    pos: Vec3,
    cell: Cell,
}

/// Incremental spatial index over entity ids of one kind
#[derive(Debug, Clone)]
pub struct SpatialIndex<K> {
    cell_size: f32,
    entries: Vec<Entry<K>>,
}

impl<K: Copy + PartialEq> SpatialIndex<K> {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            entries: Vec::new(),
        }
    }

    fn cell_of(&self, pos: Vec3) -> Cell {
        Cell(
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
            (pos.z / self.cell_size).floor() as i32,
        )
    }

    pub fn add(&mut self, key: K, pos: Vec3) {
        let cell = self.cell_of(pos);
        self.entries.push(Entry { key, pos, cell });
    }

    /// Remove an entry; later entries keep their relative order
    pub fn del(&mut self, key: K) {
        if let Some(i) = self.entries.iter().position(|e| e.key == key) {
            self.entries.remove(i);
        }
    }

    /// Move an existing entry, or insert it at the back when absent
    pub fn update(&mut self, key: K, pos: Vec3) {
        let cell = self.cell_of(pos);
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(e) => {
                e.pos = pos;
                e.cell = cell;
            }
            None => self.entries.push(Entry { key, pos, cell }),
        }
    }

    /// Rebuild hint after a bulk topology change: re-derive every cached
    /// cell from the stored positions by full rescan
    pub fn invalidate(&mut self) {
        let size = self.cell_size;
        for e in &mut self.entries {
            e.cell = Cell(
                (e.pos.x / size).floor() as i32,
                (e.pos.y / size).floor() as i32,
                (e.pos.z / size).floor() as i32,
            );
        }
    }

    /// Liveness probe backing reference validation
    pub fn has_object(&self, key: K) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Visit candidates near `center` in insertion order
    ///
    /// The visitor receives a superset of the entries within `radius`;
    /// returning `true` stops the scan early.
    pub fn find<F>(&self, center: Vec3, radius: f32, mut visitor: F)
    where
        F: FnMut(K) -> bool,
    {
        let origin = self.cell_of(center);
        let span = (radius / self.cell_size).ceil() as i32;
        for e in &self.entries {
            let dx = (e.cell.0 - origin.0).abs();
            let dy = (e.cell.1 - origin.1).abs();
            let dz = (e.cell.2 - origin.2).abs();
            if dx > span || dy > span || dz > span {
                continue;
            }
            if visitor(e.key) {
                return;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
