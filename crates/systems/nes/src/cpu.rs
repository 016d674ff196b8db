//! NES CPU wrapper around the reusable 6502 core

use emu_core::cpu_6502::{Cpu6502, CpuConfig, CpuError, CpuState, Instruction};
use emu_core::logging::SharedSink;

use crate::bus::NesBus;

/// NES CPU - the 6502 core wired to the cartridge bus
#[derive(Debug)]
pub struct NesCpu {
    cpu: Cpu6502<NesBus>,
}

impl NesCpu {
    pub fn new(bus: NesBus, config: CpuConfig, sink: SharedSink) -> Result<Self, CpuError> {
        Ok(Self {
            cpu: Cpu6502::with_config(bus, config, sink)?,
        })
    }

    pub fn reset(&mut self) -> Result<(), CpuError> {
        self.cpu.reset()
    }

    /// Execute one instruction
    pub fn step(&mut self) -> Result<(), CpuError> {
        self.cpu.step()
    }

    pub fn decode_at(&self, pc: u16) -> Result<Instruction, CpuError> {
        self.cpu.decode_at(pc)
    }

    pub fn state(&self) -> CpuState {
        self.cpu.state()
    }

    pub fn steps(&self) -> u64 {
        self.cpu.steps()
    }

    pub fn pc(&self) -> u16 {
        self.cpu.pc
    }

    pub fn bus(&self) -> &NesBus {
        &self.cpu.memory
    }

    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.cpu.memory
    }

    /// The underlying core, for direct register access.
    pub fn core(&self) -> &Cpu6502<NesBus> {
        &self.cpu
    }
}
