use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::error::MapError;

pub type TileIdx = usize; // Index into the tile store
pub type TagValue = u8; // Per-cell tag annotation (0 = untagged)
pub type ColorRGB = (u8, u8, u8);

/// CPC screen mode. Fixes pixels-per-byte and the colour depth of every
/// tile in the map, so it cannot change once any tile exists.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Mode {
    #[default]
    Mode0 = 0,
    Mode1 = 1,
    Mode2 = 2,
}

impl Mode {
    pub fn pixels_per_byte(self) -> usize {
        match self {
            Mode::Mode0 => 2,
            Mode::Mode1 => 4,
            Mode::Mode2 => 8,
        }
    }

    pub fn max_colours(self) -> usize {
        match self {
            Mode::Mode0 => 16,
            Mode::Mode1 => 4,
            Mode::Mode2 => 2,
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = MapError;

    fn try_from(value: u8) -> Result<Self, MapError> {
        match value {
            0 => Ok(Mode::Mode0),
            1 => Ok(Mode::Mode1),
            2 => Ok(Mode::Mode2),
            _ => Err(MapError::InvalidMode(value)),
        }
    }
}

/// The one place the grid addressing scheme is defined. Cell (x, y) lives at
/// flat index `x * height + y` (column-major); resize, serialization and
/// binary export all depend on this exact ordering.
pub fn cell_index(x: u8, y: u8, height: u8) -> usize {
    x as usize * height as usize + y as usize
}

/// Inclusive rectangular selection of map cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x1: u8,
    pub y1: u8,
    pub x2: u8,
    pub y2: u8,
}

impl Rect {
    pub fn new(x1: u8, y1: u8, x2: u8, y2: u8) -> Self {
        Rect { x1, y1, x2, y2 }
    }

    pub fn single(x: u8, y: u8) -> Self {
        Rect { x1: x, y1: y, x2: x, y2: y }
    }

    /// Top-left/bottom-right form regardless of how the corners were given.
    pub fn normalized(self) -> Self {
        Rect {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn width(self) -> usize {
        let r = self.normalized();
        r.x2 as usize - r.x1 as usize + 1
    }

    pub fn height(self) -> usize {
        let r = self.normalized();
        r.y2 as usize - r.y1 as usize + 1
    }

    pub fn contains(self, x: u8, y: u8) -> bool {
        let r = self.normalized();
        x >= r.x1 && x <= r.x2 && y >= r.y1 && y <= r.y2
    }
}
