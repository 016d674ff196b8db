use emu_core::cpu_6502::{BusError, Memory6502};
use emu_core::logging::{log, LogCategory, LogLevel, SharedSink};

use crate::cartridge::{Rom, CHR_DATA_SIZE};

/// CPU-visible RAM/register window; everything above maps onto PRG.
pub const RAM_SIZE: usize = 0x8000;
/// PPU-side RAM following the CHR window.
pub const PPU_RAM_SIZE: usize = 0x2000;

pub const ZERO_PAGE_START: usize = 0x0000;
pub const STACK_START: usize = 0x0100;
pub const STACK_END: usize = 0x0200;

/// Flat memory split: `addr < RAM_SIZE` is RAM, anything else is
/// `PRG[addr - RAM_SIZE]`. No banking.
#[derive(Debug)]
pub struct NesBus {
    ram: Box<[u8; RAM_SIZE]>,
    vram: Box<[u8; PPU_RAM_SIZE]>,
    rom: Rom,
    sink: SharedSink,
}

impl NesBus {
    pub fn new(rom: Rom, sink: SharedSink) -> Self {
        Self {
            ram: Box::new([0; RAM_SIZE]),
            vram: Box::new([0; PPU_RAM_SIZE]),
            rom,
            sink,
        }
    }

    pub fn rom(&self) -> &Rom {
        &self.rom
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram[..]
    }

    /// Map a PRG-window address to an offset into the PRG buffer.
    fn prg_offset(&self, addr: u16) -> Result<usize, BusError> {
        let offset = addr as usize - RAM_SIZE;
        let len = self.rom.prg.len();
        if offset >= len {
            log(self.sink.as_ref(), LogCategory::Bus, LogLevel::Warn, || {
                format!(
                    "Bus: access at ${:04X} beyond PRG (offset ${:04X}, length ${:04X})",
                    addr, offset, len
                )
            });
            return Err(BusError::OutOfRange { addr, offset, len });
        }
        Ok(offset)
    }

    /// PPU address space: CHR first, then PPU RAM.
    pub fn ppu_read(&self, addr: u16) -> Result<u8, BusError> {
        let (region, offset) = self.ppu_offset(addr)?;
        Ok(match region {
            PpuRegion::Chr => self.rom.chr[offset],
            PpuRegion::Ram => self.vram[offset],
        })
    }

    pub fn ppu_write(&mut self, addr: u16, val: u8) -> Result<(), BusError> {
        let (region, offset) = self.ppu_offset(addr)?;
        match region {
            PpuRegion::Chr => self.rom.chr[offset] = val,
            PpuRegion::Ram => self.vram[offset] = val,
        }
        Ok(())
    }

    fn ppu_offset(&self, addr: u16) -> Result<(PpuRegion, usize), BusError> {
        let addr_usize = addr as usize;
        if addr_usize < CHR_DATA_SIZE && addr_usize < self.rom.chr.len() {
            return Ok((PpuRegion::Chr, addr_usize));
        }
        let offset = addr_usize.saturating_sub(CHR_DATA_SIZE);
        if addr_usize < CHR_DATA_SIZE || offset >= PPU_RAM_SIZE {
            return Err(BusError::OutOfRange {
                addr,
                offset,
                len: PPU_RAM_SIZE,
            });
        }
        Ok((PpuRegion::Ram, offset))
    }
}

enum PpuRegion {
    Chr,
    Ram,
}

impl Memory6502 for NesBus {
    fn read(&self, addr: u16) -> Result<u8, BusError> {
        if (addr as usize) < RAM_SIZE {
            return Ok(self.ram[addr as usize]);
        }
        let offset = self.prg_offset(addr)?;
        Ok(self.rom.prg[offset])
    }

    fn write(&mut self, addr: u16, val: u8) -> Result<(), BusError> {
        if (addr as usize) < RAM_SIZE {
            self.ram[addr as usize] = val;
            return Ok(());
        }
        let offset = self.prg_offset(addr)?;
        self.rom.prg[offset] = val;
        Ok(())
    }
}
