//! Bit-level conversions between linear pixel values and the CPC's packed
//! screen bytes.
//!
//! The CPC does not store pixels contiguously: each byte interleaves the bit
//! planes of 2 (mode 0), 4 (mode 1) or 8 (mode 2) pixels, and mode 0 spreads
//! one pixel's four bits over positions 7/5/3/1 of the byte. The bit
//! positions below are a hardware contract; any deviation produces visibly
//! wrong colours when the data reaches a real screen.

use crate::common::Mode;

/// Reads the linear pixel value at (x, y) from a packed tile.
///
/// `tile` holds `tile_width / pixels_per_byte` bytes per row; the pixel's
/// byte is located first, then the mode-specific bit pattern is gathered.
pub fn get_pixel(tile: &[u8], x: usize, y: usize, mode: Mode, tile_width: usize) -> u8 {
    let ppb = mode.pixels_per_byte();
    let packed = tile[(tile_width / ppb) * y + x / ppb];
    match mode {
        Mode::Mode2 => (packed >> (7 - (x % 8))) & 1,
        Mode::Mode1 => {
            // Rotate the pixel of interest into position 0, then gather its
            // two bits from positions 7 and 3.
            let b = packed << (x % 4);
            ((b & 0b1000_0000) >> 7) | ((b & 0b0000_1000) >> 2)
        }
        Mode::Mode0 => {
            let b = packed << (x % 2);
            ((b & 0b1000_0000) >> 7)
                | ((b & 0b0000_1000) >> 2)
                | ((b & 0b0010_0000) >> 3)
                | ((b & 0b0000_0010) << 2)
        }
    }
}

/// Packs `pixels_per_byte` consecutive linear pixel values starting at
/// `offset` into one screen byte. Inverse of [`get_pixel`]; pixel values
/// beyond the mode's colour range are masked by the bit selection itself.
pub fn pack_byte(row: &[u8], offset: usize, mode: Mode) -> u8 {
    match mode {
        Mode::Mode2 => {
            let mut packed = 0;
            for bit in 0..8 {
                packed |= (row[offset + bit] & 1) << (7 - bit);
            }
            packed
        }
        Mode::Mode1 => {
            let p0 = row[offset];
            let p1 = row[offset + 1];
            let p2 = row[offset + 2];
            let p3 = row[offset + 3];
            ((p0 & 0b01) << 7)
                | ((p1 & 0b01) << 6)
                | ((p2 & 0b01) << 5)
                | ((p3 & 0b01) << 4)
                | ((p0 & 0b10) << 2)
                | ((p1 & 0b10) << 1)
                | (p2 & 0b10)
                | ((p3 & 0b10) >> 1)
        }
        Mode::Mode0 => {
            let p0 = row[offset];
            let p1 = row[offset + 1];
            ((p0 & 0b0001) << 7)
                | ((p1 & 0b0001) << 6)
                | ((p0 & 0b0100) << 3)
                | ((p1 & 0b0100) << 2)
                | ((p0 & 0b0010) << 2)
                | ((p1 & 0b0010) << 1)
                | ((p0 & 0b1000) >> 2)
                | ((p1 & 0b1000) >> 3)
        }
    }
}

/// Packs one full row of linear pixels into screen bytes.
pub fn pack_row(row: &[u8], mode: Mode) -> Vec<u8> {
    let ppb = mode.pixels_per_byte();
    (0..row.len() / ppb).map(|i| pack_byte(row, i * ppb, mode)).collect()
}
