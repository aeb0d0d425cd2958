//! Deduplicating tile storage.
//!
//! Tiles are opaque packed-byte payloads (see [`crate::codec`]); the store
//! assigns each structurally unique payload a stable index in insertion
//! order. The grid in [`crate::model::MapModel`] refers to tiles only by
//! these indices. The arena vector is authoritative for ordering; the hash
//! map is nothing but a dedup accelerator.

use hashbrown::HashMap;

use crate::common::TileIdx;

#[derive(Clone, Debug, Default)]
pub struct TileStore {
    tiles: Vec<Vec<u8>>,
    index: HashMap<Vec<u8>, TileIdx>,
}

impl TileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from an existing payload list, keeping every payload
    /// in its original slot. Duplicate payloads keep their slots too; the
    /// dedup index points at the first occurrence.
    pub fn from_tiles(tiles: Vec<Vec<u8>>) -> Self {
        let mut index = HashMap::with_capacity(tiles.len());
        for (i, tile) in tiles.iter().enumerate() {
            index.entry(tile.clone()).or_insert(i);
        }
        TileStore { tiles, index }
    }

    /// Returns the index of a byte-identical existing tile, or appends the
    /// payload and returns the new index (== the pre-insertion count).
    pub fn intern(&mut self, tile: &[u8]) -> TileIdx {
        if let Some(&idx) = self.index.get(tile) {
            return idx;
        }
        let idx = self.tiles.len();
        self.tiles.push(tile.to_vec());
        self.index.insert(tile.to_vec(), idx);
        idx
    }

    /// Exchanges the payloads at two indices. Grid cells referencing either
    /// index must be remapped by the caller.
    pub fn swap(&mut self, i: TileIdx, j: TileIdx) {
        if i == j {
            return;
        }
        self.tiles.swap(i, j);
        if let Some(idx) = self.index.get_mut(self.tiles[i].as_slice()) {
            *idx = i;
        }
        if let Some(idx) = self.index.get_mut(self.tiles[j].as_slice()) {
            *idx = j;
        }
    }

    pub fn get(&self, idx: TileIdx) -> &[u8] {
        &self.tiles[idx]
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.tiles.iter().map(|t| t.as_slice())
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.index.clear();
    }
}

impl PartialEq for TileStore {
    // The arena alone defines a store; the dedup index is derived state.
    fn eq(&self, other: &Self) -> bool {
        self.tiles == other.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_insertion_ordered() {
        let mut store = TileStore::new();
        assert_eq!(store.intern(&[1, 2]), 0);
        assert_eq!(store.intern(&[3, 4]), 1);
        assert_eq!(store.intern(&[5, 6]), 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(1), &[3, 4]);
    }

    #[test]
    fn identical_payloads_share_an_index() {
        let mut store = TileStore::new();
        let a = store.intern(&[0xAA, 0xBB]);
        let b = store.intern(&[0xAA, 0xBB]);
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn single_byte_difference_is_distinct() {
        let mut store = TileStore::new();
        let a = store.intern(&[0, 0, 0]);
        let b = store.intern(&[0, 0, 1]);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn swap_keeps_interning_coherent() {
        let mut store = TileStore::new();
        store.intern(&[1]);
        store.intern(&[2]);
        store.intern(&[3]);
        store.swap(0, 2);
        assert_eq!(store.get(0), &[3]);
        assert_eq!(store.get(2), &[1]);
        assert_eq!(store.intern(&[1]), 2);
        assert_eq!(store.intern(&[3]), 0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn from_tiles_preserves_slots() {
        let store = TileStore::from_tiles(vec![vec![9], vec![8], vec![9]]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(2), &[9]);
        let mut store = store;
        // Dedup finds the first occurrence.
        assert_eq!(store.intern(&[9]), 0);
        assert_eq!(store.len(), 3);
    }
}
