//! NES-style system: a 6502 wired to an iNES cartridge through a flat bus.

mod bus;
mod cartridge;
mod cpu;
pub mod debugger;
mod memory_dump;
mod ppu;

use std::convert::Infallible;
use std::path::Path;

use emu_core::cpu_6502::{CpuConfig, CpuError, CpuState};
use emu_core::logging::{log, LogCategory, LogLevel, SharedSink};

pub use bus::{NesBus, PPU_RAM_SIZE, RAM_SIZE};
pub use cartridge::{CartridgeError, Mirroring, Rom};
pub use cpu::NesCpu;
pub use debugger::{Debugger, Disassembler, StepReport};
pub use memory_dump::MemoryDump;
pub use ppu::Ppu;

#[derive(Debug, thiserror::Error)]
pub enum NesError {
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
    #[error("CPU halted: {0}")]
    Cpu(#[from] CpuError),
    #[error("no cartridge loaded")]
    NoCartridge,
}

#[derive(Debug)]
pub struct NesSystem {
    cpu: Option<NesCpu>,
    config: CpuConfig,
    sink: SharedSink,
}

impl NesSystem {
    pub fn new(sink: SharedSink, config: CpuConfig) -> Self {
        Self {
            cpu: None,
            config,
            sink,
        }
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    pub fn load_rom_from_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), NesError> {
        let path = path.as_ref();
        log(self.sink.as_ref(), LogCategory::Cartridge, LogLevel::Info, || {
            format!("Cartridge: loading {}", path.display())
        });
        let rom = Rom::from_file(path, self.sink.as_ref())?;
        self.insert_rom(rom)
    }

    pub fn load_rom_bytes(&mut self, bytes: &[u8]) -> Result<(), NesError> {
        let rom = Rom::from_bytes(bytes, self.sink.as_ref())?;
        self.insert_rom(rom)
    }

    /// Replace the cartridge and power the CPU up in its configured state.
    pub fn insert_rom(&mut self, rom: Rom) -> Result<(), NesError> {
        let bus = NesBus::new(rom, self.sink.clone());
        self.cpu = Some(NesCpu::new(bus, self.config, self.sink.clone())?);
        Ok(())
    }

    pub fn cpu(&self) -> Result<&NesCpu, NesError> {
        self.cpu.as_ref().ok_or(NesError::NoCartridge)
    }

    pub fn cpu_mut(&mut self) -> Result<&mut NesCpu, NesError> {
        self.cpu.as_mut().ok_or(NesError::NoCartridge)
    }

    pub fn rom(&self) -> Result<&Rom, NesError> {
        Ok(self.cpu()?.bus().rom())
    }

    pub fn ppu(&self) -> Result<Ppu<'_>, NesError> {
        Ok(Ppu::new(self.rom()?))
    }

    pub fn reset(&mut self) -> Result<(), NesError> {
        Ok(self.cpu_mut()?.reset()?)
    }

    pub fn step(&mut self) -> Result<(), NesError> {
        Ok(self.cpu_mut()?.step()?)
    }

    /// Step until the CPU hits a fatal condition.
    pub fn run(&mut self) -> Result<Infallible, NesError> {
        let cpu = self.cpu_mut()?;
        loop {
            cpu.step()?;
        }
    }

    pub fn state(&self) -> Result<CpuState, NesError> {
        Ok(self.cpu()?.state())
    }

    pub fn memory_dump(&self) -> Result<MemoryDump, NesError> {
        Ok(MemoryDump::new(self.cpu()?.bus()))
    }

    /// Return debug information useful for inspecting execution state.
    pub fn debug_state(&self) -> serde_json::Value {
        let cpu = match &self.cpu {
            Some(cpu) => cpu,
            None => return serde_json::json!({ "loaded": false }),
        };
        let rom = cpu.bus().rom();
        let next = cpu.decode_at(cpu.pc()).map(|i| i.text()).ok();

        serde_json::json!({
            "loaded": true,
            "cpu": cpu.state(),
            "steps": cpu.steps(),
            "next_instruction": next,
            "cartridge": {
                "prg_rom_size": rom.prg_rom_size,
                "chr_rom_size": rom.chr_rom_size,
                "mapper": rom.mapper,
                "mirroring": rom.mirroring,
                "battery": rom.battery,
                "trainer": rom.trainer.is_some(),
            },
            "memory": MemoryDump::new(cpu.bus()),
        })
    }
}
