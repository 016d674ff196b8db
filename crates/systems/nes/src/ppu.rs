//! Pattern-table viewer over the cartridge's CHR data.

use emu_core::ppu::{decode_pattern_table, PatternTable};
use emu_core::types::Frame;

use crate::cartridge::Rom;

const PATTERN_TABLE_BASES: [usize; 2] = [0x0000, 0x1000];

/// Width and height of a rendered pattern table (16 tiles of 8 pixels).
pub const PATTERN_TABLE_PIXELS: u32 = 128;

/// ARGB for each 2-bit shade: transparent, white, grey, black.
pub const SHADES: [u32; 4] = [0x00000000, 0xFFFFFFFF, 0xFF808080, 0xFF000000];

/// Borrows CHR from the cartridge; never copies it.
#[derive(Debug)]
pub struct Ppu<'a> {
    chr: &'a [u8],
}

impl<'a> Ppu<'a> {
    pub fn new(rom: &'a Rom) -> Self {
        Self { chr: &rom.chr }
    }

    /// Pattern table 0 (`$0000`) or 1 (`$1000`). Other indices fold onto 1.
    pub fn pattern_table(&self, index: usize) -> PatternTable {
        decode_pattern_table(self.chr, PATTERN_TABLE_BASES[index.min(1)])
    }

    pub fn pattern_table_0(&self) -> PatternTable {
        self.pattern_table(0)
    }

    pub fn pattern_table_1(&self) -> PatternTable {
        self.pattern_table(1)
    }

    /// Render a pattern table as a 128x128 frame, tile `n` at column
    /// `n % 16`, row `n / 16`.
    pub fn render_pattern_table(&self, index: usize) -> Frame {
        let table = self.pattern_table(index);
        let mut frame = Frame::new(PATTERN_TABLE_PIXELS, PATTERN_TABLE_PIXELS);
        for y in 0..PATTERN_TABLE_PIXELS {
            for x in 0..PATTERN_TABLE_PIXELS {
                let shade = table.pixel(x as usize, y as usize);
                frame.set(x, y, SHADES[(shade & 0x03) as usize]);
            }
        }
        frame
    }
}
