//! PNG import and export.
//!
//! Import slices an indexed-colour image into tiles, deduplicates them
//! through the tile store and records the resulting indices in the grid,
//! walking tile columns before tile rows so the grid comes out in its
//! native column-major order. Export is the inverse: every pixel of the
//! canvas is decoded back to its palette index and written as 8-bit indexed
//! scanlines.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use itertools::Itertools;
use log::info;

use crate::codec::{get_pixel, pack_byte};
use crate::common::{cell_index, ColorRGB, Mode};
use crate::error::{MapError, Result};
use crate::model::MapModel;

/// Tile geometry for an import; the image supplies everything else.
#[derive(Copy, Clone, Debug)]
pub struct ImportOptions {
    pub mode: Mode,
    pub tile_width: usize,
    pub tile_height: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            mode: Mode::Mode0,
            tile_width: 8,
            tile_height: 16,
        }
    }
}

struct IndexedImage {
    width: usize,
    height: usize,
    scanlines: Vec<Vec<u8>>,
    palette: Vec<ColorRGB>,
}

/// Decodes an indexed PNG into per-pixel palette indices. Bit depths 1, 2,
/// 4 and 8 are unpacked; anything that is not palettised is rejected.
fn read_indexed_png<R: Read>(reader: R) -> Result<IndexedImage> {
    let decoder = png::Decoder::new(reader);
    let mut reader = decoder.read_info()?;
    let png_info = reader.info();
    if png_info.color_type != png::ColorType::Indexed {
        return Err(MapError::NotPalettised);
    }
    let palette: Vec<ColorRGB> = png_info
        .palette
        .as_ref()
        .ok_or(MapError::NotPalettised)?
        .chunks_exact(3)
        .map(|c| (c[0], c[1], c[2]))
        .collect();

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf)?;
    let width = frame.width as usize;
    let height = frame.height as usize;
    let depth = frame.bit_depth as u8;
    let scanlines = buf[..frame.buffer_size()]
        .chunks(frame.line_size)
        .map(|line| unpack_scanline(line, width, depth))
        .collect::<Result<Vec<_>>>()?;

    Ok(IndexedImage {
        width,
        height,
        scanlines,
        palette,
    })
}

/// Expands one packed scanline to one byte per pixel. Sub-byte indexed PNG
/// samples are packed MSB-first.
fn unpack_scanline(line: &[u8], width: usize, depth: u8) -> Result<Vec<u8>> {
    match depth {
        8 => Ok(line[..width].to_vec()),
        1 | 2 | 4 => {
            let depth = depth as usize;
            let per_byte = 8 / depth;
            let mask = (1u8 << depth) - 1;
            Ok((0..width)
                .map(|x| {
                    let shift = 8 - depth * (x % per_byte + 1);
                    (line[x / per_byte] >> shift) & mask
                })
                .collect())
        }
        other => Err(MapError::UnsupportedBitDepth(other)),
    }
}

fn validate_image(
    image: &IndexedImage,
    mode: Mode,
    tile_width: usize,
    tile_height: usize,
) -> Result<()> {
    let max = mode.max_colours();
    if image.palette.len() > max {
        // Extra palette entries are tolerated as long as no pixel uses them.
        let referenced = image
            .scanlines
            .iter()
            .any(|line| line.iter().any(|&px| px as usize >= max));
        if referenced {
            return Err(MapError::TooManyColours {
                mode: mode as u8,
                count: image.palette.len(),
                max,
            });
        }
    }
    if image.width % tile_width != 0 || image.height % tile_height != 0 {
        return Err(MapError::TileSizeMismatch {
            tile_width,
            tile_height,
            width: image.width,
            height: image.height,
        });
    }
    Ok(())
}

/// Truncates an oversized palette and pads missing entries with black so the
/// model always carries exactly `max_colours` colours.
fn adopt_palette(palette: &[ColorRGB], mode: Mode) -> Vec<ColorRGB> {
    let max = mode.max_colours();
    let mut colours = palette.iter().copied().take(max).collect_vec();
    colours.resize(max, (0, 0, 0));
    colours
}

/// Packs the tile whose top-left pixel corner is (`col`, `row`).
fn extract_tile(image: &IndexedImage, col: usize, row: usize, model: &MapModel) -> Vec<u8> {
    let ppb = model.mode.pixels_per_byte();
    let mut tile = Vec::with_capacity(model.tile_bytes());
    for scanline in &image.scanlines[row..row + model.tile_height] {
        for offset in (col..col + model.tile_width).step_by(ppb) {
            tile.push(pack_byte(scanline, offset, model.mode));
        }
    }
    tile
}

/// Builds a fresh model from an indexed PNG file.
pub fn import_png(path: &Path, options: &ImportOptions) -> Result<MapModel> {
    info!("Importing map image from {}", path.display());
    import_reader(File::open(path)?, options)
}

pub fn import_reader<R: Read>(reader: R, options: &ImportOptions) -> Result<MapModel> {
    let mut model = MapModel::new();
    model.set_format(options.mode, options.tile_width, options.tile_height)?;

    let image = read_indexed_png(reader)?;
    validate_image(&image, options.mode, options.tile_width, options.tile_height)?;
    let grid_width = image.width / options.tile_width;
    let grid_height = image.height / options.tile_height;
    if grid_width > 255 || grid_height > 255 {
        return Err(MapError::MapTooLarge {
            width: grid_width,
            height: grid_height,
        });
    }

    model.palette = adopt_palette(&image.palette, options.mode);
    model.width = grid_width as u8;
    model.height = grid_height as u8;
    for col in (0..image.width).step_by(options.tile_width) {
        for row in (0..image.height).step_by(options.tile_height) {
            let tile = extract_tile(&image, col, row, &model);
            let idx = model.tiles.intern(&tile);
            model.map.push(idx);
        }
    }
    model.tags = vec![0; model.cell_count()];
    model.notes = vec![String::new(); model.cell_count()];
    info!(
        "Imported {}x{} map with {} unique tiles",
        model.width,
        model.height,
        model.tiles.len()
    );
    Ok(model)
}

/// Adds the tiles of another image to an existing model without touching
/// the grid contents, except that a grid whose length no longer matches the
/// map dimensions is reset to all-zero instead of being left stale.
pub fn import_tiles_png(model: &mut MapModel, path: &Path) -> Result<()> {
    info!("Importing tiles from {}", path.display());
    import_tiles_reader(model, File::open(path)?)
}

pub fn import_tiles_reader<R: Read>(model: &mut MapModel, reader: R) -> Result<()> {
    let image = read_indexed_png(reader)?;
    validate_image(&image, model.mode, model.tile_width, model.tile_height)?;

    if model.tiles.is_empty() {
        model.palette = adopt_palette(&image.palette, model.mode);
    }
    for col in (0..image.width).step_by(model.tile_width) {
        for row in (0..image.height).step_by(model.tile_height) {
            let tile = extract_tile(&image, col, row, model);
            model.tiles.intern(&tile);
        }
    }
    if model.map.len() != model.cell_count() {
        model.map = vec![0; model.cell_count()];
    }
    Ok(())
}

/// Writes the full map canvas as an 8-bit indexed PNG.
pub fn export_png(model: &MapModel, path: &Path) -> Result<()> {
    info!("Exporting map image to {}", path.display());
    export_writer(model, File::create(path)?)
}

pub fn export_writer<W: Write>(model: &MapModel, writer: W) -> Result<()> {
    if model.tiles.is_empty() || model.width == 0 || model.height == 0 {
        return Err(MapError::NoImage);
    }
    let canvas_width = model.width as usize * model.tile_width;
    let canvas_height = model.height as usize * model.tile_height;
    let mut pixels = vec![0u8; canvas_width * canvas_height];
    for y in 0..model.height {
        for x in 0..model.width {
            let tile = model.tiles.get(model.map[cell_index(x, y, model.height)]);
            for ty in 0..model.tile_height {
                let row = y as usize * model.tile_height + ty;
                let base = row * canvas_width + x as usize * model.tile_width;
                for tx in 0..model.tile_width {
                    pixels[base + tx] = get_pixel(tile, tx, ty, model.mode, model.tile_width);
                }
            }
        }
    }

    let palette = model
        .palette
        .iter()
        .flat_map(|&(r, g, b)| [r, g, b])
        .collect_vec();
    let mut encoder = png::Encoder::new(writer, canvas_width as u32, canvas_height as u32);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(palette);
    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&pixels)?;
    png_writer.finish()?;
    Ok(())
}
