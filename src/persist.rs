//! Save-file serialization: the JSON map document and its zip container.
//!
//! A saved map is a deflate-compressed zip archive holding a single
//! `map.json` entry. Tile payloads travel as base64 strings, palette colours
//! as `#rrggbb` hex, and the numeric grids are written with a compact
//! formatter that keeps each bracketed run on one line to hold the file size
//! down. `to_document`/`from_document` are the only places the schema is
//! interpreted; loading validates the document before any model is built, so
//! a failed load never disturbs the caller's current model.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use json_pretty_compact::PrettyCompactFormatter;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Serializer;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::common::{ColorRGB, Mode, TagValue, TileIdx};
use crate::error::{MapError, Result};
use crate::model::{DataEntry, Entity, MapModel};
use crate::tiles::TileStore;

const MAP_ENTRY: &str = "map.json";

/// The save-file schema. Field order is the on-disk field order.
#[derive(Serialize, Deserialize)]
struct MapDocument {
    tiles: Vec<String>,
    data: Vec<(u8, u8, String)>,
    map: Vec<TileIdx>,
    tags: Vec<TagValue>,
    notes: Vec<String>,
    entity_size: usize,
    entities: Vec<(u16, u16, String, Vec<(u8, String)>)>,
    palette: Vec<String>,
    width: u8,
    height: u8,
    mode: Mode,
    tile_width: usize,
    tile_height: usize,
}

fn colour_to_hex((r, g, b): ColorRGB) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn colour_from_hex(hex: &str) -> Result<ColorRGB> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(MapError::InvalidColour(hex.to_string()));
    }
    let channel = |range| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| MapError::InvalidColour(hex.to_string()))
    };
    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn to_document(model: &MapModel) -> MapDocument {
    MapDocument {
        tiles: model
            .tiles
            .iter()
            .map(|t| general_purpose::STANDARD.encode(t))
            .collect(),
        data: model
            .data
            .iter()
            .map(|d| (d.id, d.value, d.description.clone()))
            .collect(),
        map: model.map.clone(),
        tags: model.tags.clone(),
        notes: model.notes.clone(),
        entity_size: model.entity_size,
        entities: model
            .entities
            .iter()
            .map(|e| (e.x, e.y, e.description.clone(), e.data.clone()))
            .collect(),
        palette: model.palette.iter().map(|&c| colour_to_hex(c)).collect(),
        width: model.width,
        height: model.height,
        mode: model.mode,
        tile_width: model.tile_width,
        tile_height: model.tile_height,
    }
}

fn from_document(doc: MapDocument) -> Result<MapModel> {
    let tiles = doc
        .tiles
        .iter()
        .map(|t| Ok(general_purpose::STANDARD.decode(t)?))
        .collect::<Result<Vec<_>>>()?;
    let tiles = TileStore::from_tiles(tiles);

    let palette = doc
        .palette
        .iter()
        .map(|c| colour_from_hex(c))
        .collect::<Result<Vec<_>>>()?;
    let max = doc.mode.max_colours();
    if palette.len() > max {
        return Err(MapError::TooManyColours {
            mode: doc.mode as u8,
            count: palette.len(),
            max,
        });
    }

    let cells = doc.width as usize * doc.height as usize;
    // Old files from before the grid invariant kept `map` empty while the
    // tile list was empty; rebuild those as an all-zero grid.
    let map = if doc.map.is_empty() && cells > 0 && tiles.is_empty() {
        vec![0; cells]
    } else {
        doc.map
    };
    for (field, len) in [("map", map.len()), ("tags", doc.tags.len()), ("notes", doc.notes.len())] {
        if len != cells {
            return Err(MapError::GridLengthMismatch {
                field,
                found: len,
                expected: cells,
            });
        }
    }
    for &idx in &map {
        if idx >= tiles.len().max(1) {
            return Err(MapError::TileOutOfRange {
                index: idx,
                count: tiles.len(),
            });
        }
    }

    Ok(MapModel {
        tiles,
        map,
        tags: doc.tags,
        notes: doc.notes,
        entity_size: doc.entity_size,
        entities: doc
            .entities
            .into_iter()
            .map(|(x, y, description, data)| Entity {
                x,
                y,
                description,
                data,
            })
            .collect(),
        data: doc
            .data
            .into_iter()
            .map(|(id, value, description)| DataEntry {
                id,
                value,
                description,
            })
            .collect(),
        palette,
        width: doc.width,
        height: doc.height,
        mode: doc.mode,
        tile_width: doc.tile_width,
        tile_height: doc.tile_height,
    })
}

/// Serializes the model to the document JSON, with numeric arrays kept on
/// single lines.
pub fn to_json(model: &MapModel) -> Result<String> {
    let mut bytes = vec![];
    let mut ser = Serializer::with_formatter(&mut bytes, PrettyCompactFormatter::new());
    to_document(model).serialize(&mut ser)?;
    Ok(String::from_utf8(bytes).expect("JSON serializer emits UTF-8"))
}

pub fn from_json(json: &str) -> Result<MapModel> {
    from_document(serde_json::from_str(json)?)
}

/// Writes the model as a single-entry zip archive at `path`.
pub fn save(model: &MapModel, path: &Path) -> Result<()> {
    info!("Saving {}", path.display());
    save_writer(model, File::create(path)?)
}

pub fn save_writer<W: Write + Seek>(model: &MapModel, writer: W) -> Result<()> {
    let json = to_json(model)?;
    let mut archive = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    archive.start_file(MAP_ENTRY, options)?;
    archive.write_all(json.as_bytes())?;
    archive.finish()?;
    Ok(())
}

/// Reads a model back from a saved archive. Any failure surfaces before a
/// model is returned, so the caller's open document stays as it was.
pub fn load(path: &Path) -> Result<MapModel> {
    info!("Loading {}", path.display());
    load_reader(File::open(path)?)
}

pub fn load_reader<R: Read + Seek>(reader: R) -> Result<MapModel> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entry = archive.by_name(MAP_ENTRY)?;
    let mut json = String::new();
    entry.read_to_string(&mut json)?;
    from_json(&json)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::common::Rect;

    fn sample_model() -> MapModel {
        let mut model = MapModel::new();
        model.set_format(Mode::Mode0, 8, 8).unwrap();
        model.palette = (0..16).map(|i| (i * 16, 255 - i * 16, i)).collect();
        model.tiles.intern(&[0x00; 32]);
        model.tiles.intern(&[0xAB; 32]);
        model.resize(3, 2);
        model.map = vec![0, 1, 1, 0, 1, 0];
        model.apply_tag_to_selection(9, Rect::single(1, 1));
        model.set_note_on_selection("über-Notiz 🗺", Rect::single(2, 0));
        model.add_entity(300, 70, "Tür".to_string());
        model.edit_entity_datum(0, 0, 42, "hit points".to_string());
        model.add_data(DataEntry {
            id: 7,
            value: 99,
            description: "lives".to_string(),
        });
        model
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let model = sample_model();
        let json = to_json(&model).unwrap();
        let restored = from_json(&json).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn empty_model_round_trips() {
        let model = MapModel::new();
        let restored = from_json(&to_json(&model).unwrap()).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn archive_round_trip_is_lossless() {
        let model = sample_model();
        let mut buffer = Cursor::new(Vec::new());
        save_writer(&model, &mut buffer).unwrap();
        buffer.set_position(0);
        let restored = load_reader(buffer).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn numeric_grids_stay_on_one_line() {
        let model = sample_model();
        let json = to_json(&model).unwrap();
        let map_run = json
            .split("\"map\":")
            .nth(1)
            .and_then(|rest| rest.split(']').next())
            .unwrap();
        assert!(!map_run.contains('\n'), "map array was wrapped: {map_run}");
    }

    #[test]
    fn document_field_order_is_stable() {
        let json = to_json(&sample_model()).unwrap();
        let positions = ["\"tiles\"", "\"data\"", "\"map\"", "\"tags\"", "\"notes\"",
            "\"entity_size\"", "\"entities\"", "\"palette\"", "\"width\"", "\"height\"",
            "\"mode\"", "\"tile_width\"", "\"tile_height\""]
            .map(|key| json.find(key).unwrap_or_else(|| panic!("{key} missing")));
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        assert!(matches!(from_json("{}"), Err(MapError::Document(_))));
    }

    #[test]
    fn corrupt_base64_is_rejected() {
        let mut json = to_json(&sample_model()).unwrap();
        json = json.replacen('A', "!", 1);
        assert!(matches!(from_json(&json), Err(MapError::TileData(_))));
    }

    #[test]
    fn bad_colour_is_rejected() {
        let json = to_json(&sample_model()).unwrap().replace('#', "@#");
        assert!(matches!(from_json(&json), Err(MapError::InvalidColour(_))));
    }

    #[test]
    fn dangling_tile_reference_is_rejected() {
        let mut model = sample_model();
        model.map[0] = 99;
        let json = to_json(&model).unwrap();
        assert!(matches!(from_json(&json), Err(MapError::TileOutOfRange { index: 99, .. })));
    }

    #[test]
    fn grid_length_mismatch_is_rejected() {
        let mut model = sample_model();
        model.tags.pop();
        let json = to_json(&model).unwrap();
        assert!(matches!(
            from_json(&json),
            Err(MapError::GridLengthMismatch { field: "tags", .. })
        ));
    }

    #[test]
    fn legacy_empty_grid_is_rebuilt() {
        let mut model = MapModel::new();
        model.resize(2, 2);
        // Pre-invariant files stored no grid at all while no tiles existed.
        let mut doc: serde_json::Value = serde_json::from_str(&to_json(&model).unwrap()).unwrap();
        doc["map"] = serde_json::json!([]);
        let restored = from_json(&doc.to_string()).unwrap();
        assert_eq!(restored.map, vec![0; 4]);
    }
}
