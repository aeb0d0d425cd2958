//! Map/tile data engine for an Amstrad CPC tile map editor.
//!
//! The CPC's three screen modes pack 2, 4 or 8 pixels into each byte with
//! interleaved bit planes; this crate owns that packed representation and
//! everything built on top of it: tile deduplication, the map grid with its
//! per-cell tags and notes, entities and the free-form data table, the
//! zip/JSON save format, indexed PNG import/export and raw binary export.
//!
//! Rendering, selection handling and every other UI concern live in the
//! editor frontend, which owns a [`MapModel`] and passes it into the
//! operations here.

pub mod codec;
pub mod common;
pub mod error;
pub mod export;
pub mod image;
pub mod model;
pub mod persist;
pub mod tiles;

pub use common::{cell_index, ColorRGB, Mode, Rect, TagValue, TileIdx};
pub use error::{MapError, Result};
pub use model::{Clipboard, DataEntry, Entity, MapModel};
pub use tiles::TileStore;
