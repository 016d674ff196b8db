//! iNES cartridge images.

use std::fs;
use std::path::Path;

use emu_core::logging::{log, LogCategory, LogLevel, TraceSink};

pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;
/// CHR size every supported cartridge is expected to carry.
pub const CHR_DATA_SIZE: usize = 0x2000;

const MAGIC: &[u8; 4] = b"NES\x1A";

#[derive(Debug, thiserror::Error)]
pub enum CartridgeError {
    #[error("failed to read cartridge: {0}")]
    Io(#[from] std::io::Error),
    #[error("not an iNES image (bad magic)")]
    InvalidMagic,
    #[error("image shorter than the {HEADER_SIZE}-byte header")]
    TooShort,
    #[error("{section} truncated: expected {expected} bytes, found {actual}")]
    Truncated {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Nametable mirroring from header byte 6: bit 0 clear is vertical, set is
/// horizontal. Bit 3 overrides both with four-screen VRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Mirroring {
    Vertical,
    Horizontal,
    FourScreen,
}

/// A parsed cartridge. PRG is mutable so the CPU can patch code in place.
#[derive(Debug, Clone)]
pub struct Rom {
    /// PRG size declared in the header, before any duplication.
    pub prg_rom_size: usize,
    pub chr_rom_size: usize,
    pub prg: Vec<u8>,
    pub chr: Vec<u8>,
    pub trainer: Option<Vec<u8>>,
    pub mapper: u8,
    pub mirroring: Mirroring,
    pub battery: bool,
}

impl Rom {
    pub fn from_file<P: AsRef<Path>>(path: P, sink: &dyn TraceSink) -> Result<Self, CartridgeError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes, sink)
    }

    /// Parse an iNES image. A single 16 KiB PRG bank is duplicated so the
    /// whole `$8000-$FFFF` window is backed.
    pub fn from_bytes(bytes: &[u8], sink: &dyn TraceSink) -> Result<Self, CartridgeError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CartridgeError::TooShort);
        }
        let header = &bytes[..HEADER_SIZE];
        if &header[0..4] != MAGIC {
            return Err(CartridgeError::InvalidMagic);
        }

        let prg_rom_size = header[4] as usize * PRG_BANK_SIZE;
        let chr_rom_size = header[5] as usize * CHR_BANK_SIZE;
        let flags6 = header[6];
        let mapper = (flags6 >> 4) | (header[7] & 0xF0);

        let battery = flags6 & 0x02 != 0;
        let has_trainer = flags6 & 0x04 != 0;
        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 == 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let mut offset = HEADER_SIZE;
        let trainer = if has_trainer {
            Some(take(bytes, &mut offset, TRAINER_SIZE, "trainer")?.to_vec())
        } else {
            None
        };

        let mut prg = take(bytes, &mut offset, prg_rom_size, "PRG ROM")?.to_vec();
        if prg_rom_size == PRG_BANK_SIZE {
            prg.extend_from_within(..);
        }

        let chr = take(bytes, &mut offset, chr_rom_size, "CHR ROM")?.to_vec();
        if chr.len() != CHR_DATA_SIZE {
            log(sink, LogCategory::Cartridge, LogLevel::Warn, || {
                format!(
                    "Cartridge: CHR data is {:#06X} bytes, expected {:#06X}",
                    chr.len(),
                    CHR_DATA_SIZE
                )
            });
        }
        if mapper != 0 {
            log(sink, LogCategory::Cartridge, LogLevel::Warn, || {
                format!("Cartridge: mapper {} has no banking support, using a flat PRG window", mapper)
            });
        }

        log(sink, LogCategory::Cartridge, LogLevel::Info, || {
            format!(
                "Cartridge: PRG {}K, CHR {}K, mapper {}, {:?} mirroring{}{}",
                prg_rom_size / 1024,
                chr_rom_size / 1024,
                mapper,
                mirroring,
                if battery { ", battery" } else { "" },
                if has_trainer { ", trainer" } else { "" },
            )
        });

        Ok(Self {
            prg_rom_size,
            chr_rom_size,
            prg,
            chr,
            trainer,
            mapper,
            mirroring,
            battery,
        })
    }
}

fn take<'a>(
    bytes: &'a [u8],
    offset: &mut usize,
    len: usize,
    section: &'static str,
) -> Result<&'a [u8], CartridgeError> {
    let available = bytes.len().saturating_sub(*offset);
    if available < len {
        return Err(CartridgeError::Truncated {
            section,
            expected: len,
            actual: available,
        });
    }
    let slice = &bytes[*offset..*offset + len];
    *offset += len;
    Ok(slice)
}
