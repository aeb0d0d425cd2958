//! Raw binary exports: headerless byte streams ready to be assembled into a
//! CPC program. Each category is produced independently and the caller
//! decides where each stream goes.

use crate::common::cell_index;
use crate::error::{MapError, Result};
use crate::model::MapModel;

/// Cell emission order for the grid and tag streams. The model's native
/// order is column-major; row-major emits cells in `y * width + x` order
/// instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GridOrder {
    ColumnMajor,
    RowMajor,
}

fn ordered_cells(width: u8, height: u8, order: GridOrder) -> Vec<usize> {
    match order {
        GridOrder::ColumnMajor => (0..width as usize * height as usize).collect(),
        GridOrder::RowMajor => (0..height)
            .flat_map(|y| (0..width).map(move |x| cell_index(x, y, height)))
            .collect(),
    }
}

/// Tile-index grid, 1 byte per cell.
pub fn export_map(model: &MapModel, order: GridOrder) -> Result<Vec<u8>> {
    if model.width == 0 || model.height == 0 {
        return Err(MapError::EmptyMap);
    }
    ordered_cells(model.width, model.height, order)
        .into_iter()
        .map(|i| {
            let tile = model.map[i];
            u8::try_from(tile).map_err(|_| MapError::TileIndexTooLarge(tile))
        })
        .collect()
}

/// Tag grid, 1 byte per cell, same layout options as the map grid.
pub fn export_tags(model: &MapModel, order: GridOrder) -> Result<Vec<u8>> {
    if model.width == 0 || model.height == 0 {
        return Err(MapError::EmptyMap);
    }
    Ok(ordered_cells(model.width, model.height, order)
        .into_iter()
        .map(|i| model.tags[i])
        .collect())
}

/// All tile payloads concatenated in store order.
pub fn export_tiles(model: &MapModel) -> Result<Vec<u8>> {
    if model.tiles.is_empty() {
        return Err(MapError::NoTiles);
    }
    Ok(model.tiles.iter().flatten().copied().collect())
}

/// Entities as little-endian 16-bit x, 16-bit y, then one byte per data
/// slot. Descriptions are editor-only and omitted.
pub fn export_entities(model: &MapModel) -> Result<Vec<u8>> {
    if model.entities.is_empty() {
        return Err(MapError::NoEntities);
    }
    let mut out = Vec::with_capacity(model.entities.len() * (4 + model.entity_size));
    for entity in &model.entities {
        out.extend(entity.x.to_le_bytes());
        out.extend(entity.y.to_le_bytes());
        out.extend(entity.data.iter().map(|&(value, _)| value));
    }
    Ok(out)
}

/// Data table as id/value byte pairs in table order.
pub fn export_data(model: &MapModel) -> Result<Vec<u8>> {
    if model.data.is_empty() {
        return Err(MapError::NoData);
    }
    Ok(model
        .data
        .iter()
        .flat_map(|entry| [entry.id, entry.value])
        .collect())
}

/// Palette as 12-bit CPC Plus colour words (%xxxxGGGGRRRRBBBB), one
/// little-endian 16-bit word per colour.
pub fn export_palette(model: &MapModel) -> Result<Vec<u8>> {
    if model.palette.is_empty() {
        return Err(MapError::NoPalette);
    }
    let mut out = Vec::with_capacity(model.palette.len() * 2);
    for &(r, g, b) in &model.palette {
        let word = ((g as u16 >> 4) << 8) | ((r as u16 >> 4) << 4) | (b as u16 >> 4);
        out.extend(word.to_le_bytes());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataEntry, Entity};

    fn grid_model() -> MapModel {
        let mut model = MapModel::new();
        model.tiles.intern(&[0; 32]);
        for fill in 1..6u8 {
            model.tiles.intern(&[fill; 32]);
        }
        model.resize(3, 2);
        // Column-major: columns are (0,1), (2,3), (4,5).
        model.map = vec![0, 1, 2, 3, 4, 5];
        model.tags = vec![10, 11, 12, 13, 14, 15];
        model
    }

    #[test]
    fn map_export_orders() {
        let model = grid_model();
        assert_eq!(
            export_map(&model, GridOrder::ColumnMajor).unwrap(),
            vec![0, 1, 2, 3, 4, 5]
        );
        assert_eq!(
            export_map(&model, GridOrder::RowMajor).unwrap(),
            vec![0, 2, 4, 1, 3, 5]
        );
    }

    #[test]
    fn tags_share_the_layout_choice() {
        let model = grid_model();
        assert_eq!(
            export_tags(&model, GridOrder::RowMajor).unwrap(),
            vec![10, 12, 14, 11, 13, 15]
        );
    }

    #[test]
    fn empty_map_is_reported() {
        let model = MapModel::new();
        assert!(matches!(export_map(&model, GridOrder::ColumnMajor), Err(MapError::EmptyMap)));
        assert!(matches!(export_tags(&model, GridOrder::RowMajor), Err(MapError::EmptyMap)));
    }

    #[test]
    fn tiles_concatenate_in_store_order() {
        let mut model = MapModel::new();
        model.tiles.intern(&[1, 2]);
        model.tiles.intern(&[3, 4]);
        assert_eq!(export_tiles(&model).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn no_tiles_is_reported() {
        assert!(matches!(export_tiles(&MapModel::new()), Err(MapError::NoTiles)));
    }

    #[test]
    fn entity_stream_layout() {
        let mut model = MapModel::new();
        model.entities.push(Entity {
            x: 0x1234,
            y: 0x0005,
            description: "ignored".to_string(),
            data: vec![(7, "a".to_string()), (8, "b".to_string())],
        });
        assert_eq!(
            export_entities(&model).unwrap(),
            vec![0x34, 0x12, 0x05, 0x00, 7, 8]
        );
    }

    #[test]
    fn data_stream_omits_descriptions() {
        let mut model = MapModel::new();
        model.add_data(DataEntry { id: 1, value: 200, description: "x".to_string() });
        model.add_data(DataEntry { id: 1, value: 3, description: String::new() });
        assert_eq!(export_data(&model).unwrap(), vec![1, 200, 1, 3]);
        assert!(matches!(export_data(&MapModel::new()), Err(MapError::NoData)));
    }

    #[test]
    fn palette_words_are_grb_nibbles() {
        let mut model = MapModel::new();
        model.palette = vec![(0x12, 0x34, 0x56), (0xFF, 0x00, 0x80)];
        assert_eq!(
            export_palette(&model).unwrap(),
            vec![0x15, 0x03, 0xF8, 0x00]
        );
        assert!(matches!(export_palette(&MapModel::new()), Err(MapError::NoPalette)));
    }

    #[test]
    fn wide_tile_indices_are_reported() {
        let mut model = grid_model();
        model.map[0] = 300;
        assert!(matches!(
            export_map(&model, GridOrder::ColumnMajor),
            Err(MapError::TileIndexTooLarge(300))
        ));
    }
}
