//! The in-memory map document: tile grid, per-cell tags and notes, entities,
//! the free-form data table and the palette.
//!
//! A single `MapModel` is owned by the caller (the editor UI) and passed by
//! reference into every operation; nothing here retains state across calls.
//! All grids are flat vectors addressed through [`cell_index`] and are kept
//! at exactly `width * height` entries by every mutation.

use crate::common::{cell_index, ColorRGB, Mode, Rect, TagValue, TileIdx};
use crate::error::{MapError, Result};
use crate::tiles::TileStore;

/// A point-placed game object, independent of the tile grid. `data` always
/// holds exactly `entity_size` slots.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub x: u16,
    pub y: u16,
    pub description: String,
    pub data: Vec<(u8, String)>,
}

/// One row of the free-form data table. Ids are caller-ordered and need not
/// be unique.
#[derive(Clone, Debug, PartialEq)]
pub struct DataEntry {
    pub id: u8,
    pub value: u8,
    pub description: String,
}

/// A rectangular block of tile indices and tags lifted out of the grid,
/// stored column-major like the grid itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Clipboard {
    pub width: u8,
    pub height: u8,
    pub tiles: Vec<TileIdx>,
    pub tags: Vec<TagValue>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapModel {
    pub tiles: TileStore,
    pub map: Vec<TileIdx>,
    pub tags: Vec<TagValue>,
    pub notes: Vec<String>,
    pub entity_size: usize,
    pub entities: Vec<Entity>,
    pub data: Vec<DataEntry>,
    pub palette: Vec<ColorRGB>,
    pub width: u8,
    pub height: u8,
    pub mode: Mode,
    pub tile_width: usize,
    pub tile_height: usize,
}

impl Default for MapModel {
    fn default() -> Self {
        MapModel {
            tiles: TileStore::new(),
            map: vec![],
            tags: vec![],
            notes: vec![],
            entity_size: 4,
            entities: vec![],
            data: vec![],
            palette: vec![],
            width: 0,
            height: 0,
            mode: Mode::Mode0,
            tile_width: 8,
            tile_height: 8,
        }
    }
}

impl MapModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes per stored tile for the current format.
    pub fn tile_bytes(&self) -> usize {
        (self.tile_width / self.mode.pixels_per_byte()) * self.tile_height
    }

    /// Sets screen mode and tile pixel dimensions. Only allowed while the
    /// tile store is empty; the packed byte layout of every stored tile
    /// depends on these values.
    pub fn set_format(&mut self, mode: Mode, tile_width: usize, tile_height: usize) -> Result<()> {
        if !self.tiles.is_empty() {
            return Err(MapError::FormatLocked);
        }
        if tile_width < 1 || tile_height < 1 || tile_width % mode.pixels_per_byte() != 0 {
            return Err(MapError::InvalidTileSize {
                width: tile_width,
                height: tile_height,
                mode: mode as u8,
            });
        }
        self.mode = mode;
        self.tile_width = tile_width;
        self.tile_height = tile_height;
        Ok(())
    }

    /// Resizes the tile grid, preserving the overlapping region. Cells
    /// outside it start as tile 0 / tag 0 / empty note. A zero dimension
    /// clears the whole model.
    pub fn resize(&mut self, new_width: u8, new_height: u8) {
        if new_width == self.width && new_height == self.height {
            return;
        }
        if new_width == 0 || new_height == 0 {
            self.reset();
            self.width = new_width;
            self.height = new_height;
            return;
        }
        let cells = new_width as usize * new_height as usize;
        let mut map = vec![0; cells];
        let mut tags = vec![0; cells];
        let mut notes = vec![String::new(); cells];
        for y in 0..self.height.min(new_height) {
            for x in 0..self.width.min(new_width) {
                let from = cell_index(x, y, self.height);
                let to = cell_index(x, y, new_height);
                map[to] = self.map[from];
                tags[to] = self.tags[from];
                notes[to] = std::mem::take(&mut self.notes[from]);
            }
        }
        self.map = map;
        self.tags = tags;
        self.notes = notes;
        self.width = new_width;
        self.height = new_height;
    }

    /// Changes the number of data slots per entity, truncating or padding
    /// every entity's data with `(0, "")`.
    pub fn set_entity_size(&mut self, size: usize) -> Result<()> {
        if size < 1 {
            return Err(MapError::InvalidEntitySize);
        }
        for entity in &mut self.entities {
            if size < entity.data.len() {
                entity.data.truncate(size);
            } else {
                entity.data.resize(size, (0, String::new()));
            }
        }
        self.entity_size = size;
        Ok(())
    }

    /// Writes a tag over every cell of the selection; reports whether any
    /// cell actually changed.
    pub fn apply_tag_to_selection(&mut self, tag: TagValue, rect: Rect) -> bool {
        let rect = rect.normalized();
        let mut changed = false;
        for y in rect.y1..=rect.y2 {
            for x in rect.x1..=rect.x2 {
                let i = cell_index(x, y, self.height);
                if self.tags[i] != tag {
                    self.tags[i] = tag;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Writes a note over every cell of the selection.
    pub fn set_note_on_selection(&mut self, note: &str, rect: Rect) {
        let rect = rect.normalized();
        for y in rect.y1..=rect.y2 {
            for x in rect.x1..=rect.x2 {
                self.notes[cell_index(x, y, self.height)] = note.to_string();
            }
        }
    }

    /// Finds every position where the grid repeats the selection's
    /// tile-index pattern exactly and copies the selection's tags there.
    /// Candidate windows whose top-left corner lies inside the selection are
    /// skipped. Returns whether any tag changed.
    pub fn propagate_tag_to_matches(&mut self, rect: Rect) -> bool {
        let rect = rect.normalized();
        let sel_w = rect.width();
        let sel_h = rect.height();
        let width = self.width as usize;
        let height = self.height as usize;
        if sel_w > width || sel_h > height {
            return false;
        }
        let mut changed = false;
        for y in 0..=(height - sel_h) {
            for x in 0..=(width - sel_w) {
                if rect.contains(x as u8, y as u8) {
                    continue;
                }
                let matches = (0..sel_w).all(|dx| {
                    (0..sel_h).all(|dy| {
                        let i = cell_index((x + dx) as u8, (y + dy) as u8, self.height);
                        let si = cell_index(rect.x1 + dx as u8, rect.y1 + dy as u8, self.height);
                        self.map[i] == self.map[si]
                    })
                });
                if !matches {
                    continue;
                }
                for dx in 0..sel_w {
                    for dy in 0..sel_h {
                        let i = cell_index((x + dx) as u8, (y + dy) as u8, self.height);
                        let si = cell_index(rect.x1 + dx as u8, rect.y1 + dy as u8, self.height);
                        if self.tags[i] != self.tags[si] {
                            self.tags[i] = self.tags[si];
                            changed = true;
                        }
                    }
                }
            }
        }
        changed
    }

    /// Paints one tile index over every cell of the selection.
    pub fn fill_selection(&mut self, rect: Rect, tile: TileIdx) {
        assert!(tile < self.tiles.len(), "tile index out of range");
        let rect = rect.normalized();
        for y in rect.y1..=rect.y2 {
            for x in rect.x1..=rect.x2 {
                self.map[cell_index(x, y, self.height)] = tile;
            }
        }
    }

    /// Moves the tile at `idx` to slot 0 (the background slot by
    /// convention), swapping payloads and remapping every grid reference.
    pub fn promote_tile(&mut self, idx: TileIdx) {
        assert!(idx < self.tiles.len(), "tile index out of range");
        if idx == 0 {
            return;
        }
        self.tiles.swap(0, idx);
        for cell in &mut self.map {
            if *cell == 0 {
                *cell = idx;
            } else if *cell == idx {
                *cell = 0;
            }
        }
    }

    pub fn copy_region(&self, rect: Rect) -> Clipboard {
        let rect = rect.normalized();
        let mut clip = Clipboard {
            width: (rect.width()) as u8,
            height: (rect.height()) as u8,
            tiles: vec![],
            tags: vec![],
        };
        for x in rect.x1..=rect.x2 {
            for y in rect.y1..=rect.y2 {
                let i = cell_index(x, y, self.height);
                clip.tiles.push(self.map[i]);
                clip.tags.push(self.tags[i]);
            }
        }
        clip
    }

    /// Copies a region out of the grid, then blanks it (tile 0, tag 0).
    pub fn cut_region(&mut self, rect: Rect) -> Clipboard {
        let clip = self.copy_region(rect);
        let rect = rect.normalized();
        for x in rect.x1..=rect.x2 {
            for y in rect.y1..=rect.y2 {
                let i = cell_index(x, y, self.height);
                self.map[i] = 0;
                self.tags[i] = 0;
            }
        }
        clip
    }

    /// Pastes a clipboard block with its top-left corner at (x, y). Cells
    /// falling outside the grid are dropped.
    pub fn paste(&mut self, x: u8, y: u8, clip: &Clipboard) {
        for cx in 0..clip.width {
            for cy in 0..clip.height {
                let Some(tx) = x.checked_add(cx) else { continue };
                let Some(ty) = y.checked_add(cy) else { continue };
                if tx >= self.width || ty >= self.height {
                    continue;
                }
                let from = cell_index(cx, cy, clip.height);
                let to = cell_index(tx, ty, self.height);
                self.map[to] = clip.tiles[from];
                self.tags[to] = clip.tags[from];
            }
        }
    }

    /// Appends an entity with `entity_size` zeroed data slots. Slot
    /// descriptions are copied from the most recently added entity to save
    /// re-typing; values are not.
    pub fn add_entity(&mut self, x: u16, y: u16, description: String) {
        let mut data = vec![(0u8, String::new()); self.entity_size];
        if let Some(last) = self.entities.last() {
            for (slot, datum) in data.iter_mut().enumerate() {
                if let Some(prev) = last.data.get(slot) {
                    datum.1 = prev.1.clone();
                }
            }
        }
        self.entities.push(Entity { x, y, description, data });
    }

    pub fn edit_entity(&mut self, idx: usize, x: u16, y: u16, description: String) {
        let entity = &mut self.entities[idx];
        entity.x = x;
        entity.y = y;
        entity.description = description;
    }

    pub fn edit_entity_datum(&mut self, idx: usize, slot: usize, value: u8, description: String) {
        self.entities[idx].data[slot] = (value, description);
    }

    pub fn remove_entity(&mut self, idx: usize) {
        self.entities.remove(idx);
    }

    pub fn add_data(&mut self, entry: DataEntry) {
        self.data.push(entry);
    }

    pub fn edit_data(&mut self, idx: usize, entry: DataEntry) {
        self.data[idx] = entry;
    }

    pub fn remove_data(&mut self, idx: usize) {
        self.data.remove(idx);
    }
}
