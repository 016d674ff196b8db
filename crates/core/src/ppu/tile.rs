//! Tile/pattern decoding for 2bpp planar graphics.
//!
//! An NES tile is 8x8 pixels stored in 16 bytes: eight bytes of low
//! bitplane followed by eight bytes of high bitplane. Bit 7 of each plane
//! byte is the leftmost pixel.

/// One decoded tile, indexed `[row][column]`, each entry a 2-bit color index.
pub type Tile = [[u8; 8]; 8];

/// Bytes per 2bpp tile.
pub const TILE_BYTES: usize = 16;

/// Tiles in one pattern table (4 KiB of CHR).
pub const TILES_PER_TABLE: usize = 256;

/// Tiles per row when a pattern table is laid out as a grid.
pub const TABLE_COLUMNS: usize = 16;

/// Trait for decoding tile data into pixel indices.
pub trait TileDecoder {
    /// Decode a single pixel from a tile.
    ///
    /// # Arguments
    /// * `tile_data` - The raw tile data
    /// * `x` - X coordinate within the tile (0-7)
    /// * `y` - Y coordinate within the tile (0-7)
    ///
    /// # Returns
    /// The palette index for this pixel (0-3 for 2bpp)
    fn decode_pixel(&self, tile_data: &[u8], x: u8, y: u8) -> u8;

    /// Get the size of a single tile in bytes.
    fn tile_size(&self) -> usize;
}

/// NES/Famicom 2bpp planar tile decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nes2BppDecoder;

impl TileDecoder for Nes2BppDecoder {
    fn decode_pixel(&self, tile_data: &[u8], x: u8, y: u8) -> u8 {
        if tile_data.len() < TILE_BYTES || x > 7 || y > 7 {
            return 0;
        }

        let lo = tile_data[y as usize];
        let hi = tile_data[y as usize + 8];
        let bit = 7 - x;
        let lo_bit = (lo >> bit) & 1;
        let hi_bit = (hi >> bit) & 1;

        (hi_bit << 1) | lo_bit
    }

    fn tile_size(&self) -> usize {
        TILE_BYTES
    }
}

/// Decode a 16-byte tile. Short input decodes as blank pixels.
pub fn decode_tile(data: &[u8]) -> Tile {
    let decoder = Nes2BppDecoder;
    let mut tile = [[0u8; 8]; 8];
    for (y, row) in tile.iter_mut().enumerate() {
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = decoder.decode_pixel(data, x as u8, y as u8);
        }
    }
    tile
}

/// 256 decoded tiles, arranged as a 16x16 grid when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTable {
    tiles: Vec<Tile>,
}

impl PatternTable {
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    /// Color index of pixel (`x`, `y`) in the 128x128 grid layout.
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        let index = (y / 8) * TABLE_COLUMNS + x / 8;
        self.tiles
            .get(index)
            .map(|tile| tile[y % 8][x % 8])
            .unwrap_or(0)
    }
}

/// Decode the pattern table starting at `base` in `chr`. Tiles past the end
/// of the buffer are blank.
pub fn decode_pattern_table(chr: &[u8], base: usize) -> PatternTable {
    let tiles = (0..TILES_PER_TABLE)
        .map(|n| {
            let start = base + n * TILE_BYTES;
            match chr.get(start..start + TILE_BYTES) {
                Some(bytes) => decode_tile(bytes),
                None => [[0u8; 8]; 8],
            }
        })
        .collect();
    PatternTable { tiles }
}
