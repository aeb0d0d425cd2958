use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapError>;

/// Error type for all fallible map operations. Validation failures leave the
/// model untouched; format failures abort a load without replacing the
/// caller's current model; I/O errors pass through unchanged.
#[derive(Debug, Error)]
pub enum MapError {
    // === I/O ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Validation ===
    #[error("Invalid screen mode: {0} (must be 0, 1 or 2)")]
    InvalidMode(u8),

    #[error("Tile size of {width}x{height} invalid for mode {mode}")]
    InvalidTileSize { width: usize, height: usize, mode: u8 },

    #[error("Invalid entity size (must be greater than 0)")]
    InvalidEntitySize,

    #[error("Screen mode and tile size cannot change once tiles exist")]
    FormatLocked,

    #[error("PNG file is not palettised")]
    NotPalettised,

    #[error("PNG contains too many colours for mode {mode} ({count} > {max})")]
    TooManyColours { mode: u8, count: usize, max: usize },

    #[error("Invalid tile size of {tile_width}x{tile_height} for image size of {width}x{height}")]
    TileSizeMismatch {
        tile_width: usize,
        tile_height: usize,
        width: usize,
        height: usize,
    },

    #[error("Image of {width}x{height} tiles exceeds the 255x255 map limit")]
    MapTooLarge { width: usize, height: usize },

    #[error("Map is incomplete")]
    EmptyMap,

    #[error("No valid map image to export")]
    NoImage,

    #[error("No tiles to export")]
    NoTiles,

    #[error("No entities to export")]
    NoEntities,

    #[error("No data to export")]
    NoData,

    #[error("No palette to export")]
    NoPalette,

    #[error("Tile index {0} does not fit in one byte")]
    TileIndexTooLarge(usize),

    // === Format ===
    #[error("Malformed map document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("Corrupt tile data: {0}")]
    TileData(#[from] base64::DecodeError),

    #[error("Invalid palette colour: {0:?}")]
    InvalidColour(String),

    #[error("Map document {field} has {found} entries, expected {expected}")]
    GridLengthMismatch {
        field: &'static str,
        found: usize,
        expected: usize,
    },

    #[error("Map document references tile {index} but only {count} tiles are present")]
    TileOutOfRange { index: usize, count: usize },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    // === PNG codec ===
    #[error("PNG decode error: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("PNG encode error: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("Unsupported PNG bit depth: {0}")]
    UnsupportedBitDepth(u8),
}
