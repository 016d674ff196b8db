//! MOS 6502 CPU core implementation
//!
//! A reusable 6502 core that runs against any memory implementing
//! [`Memory6502`]. Each step is split into two stages that share the
//! [`opcodes::OPCODES`] table:
//!
//! - **decode** ([`Cpu6502::decode_at`]) reads the opcode and operand bytes and
//!   resolves the addressing mode into an [`Instruction`] without touching
//!   registers or memory,
//! - **execute** ([`Cpu6502::execute`]) applies the operation.
//!
//! Instructions retire atomically; there is no cycle model and decimal mode
//! only toggles the D flag (ADC/SBC are always binary).

mod addressing;
mod execute;
mod instruction;
pub mod opcodes;

#[cfg(test)]
mod tests;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::logging::{log, LogCategory, LogLevel, NullSink, SharedSink};
use crate::Cpu;

pub use addressing::AddressingMode;
pub use instruction::{Instruction, Operand};
pub use opcodes::{Opcode, Operation};

pub const FLAG_CARRY: u8 = 0x01;
pub const FLAG_ZERO: u8 = 0x02;
pub const FLAG_INTERRUPT: u8 = 0x04;
pub const FLAG_DECIMAL: u8 = 0x08;
pub const FLAG_BREAK: u8 = 0x10;
pub const FLAG_UNUSED: u8 = 0x20;
pub const FLAG_OVERFLOW: u8 = 0x40;
pub const FLAG_NEGATIVE: u8 = 0x80;

/// Base of the hardware stack page.
pub const STACK_BASE: u16 = 0x0100;
const RESET_VECTOR: u16 = 0xFFFC;
pub(crate) const IRQ_BRK_VECTOR: u16 = 0xFFFE;

/// Recoverable memory error reported by a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("address ${addr:04X} out of range (PRG offset ${offset:04X}, PRG length ${len:04X})")]
    OutOfRange { addr: u16, offset: usize, len: usize },
}

/// Conditions that stop the CPU. Any of these aborts `step()`/`run()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CpuError {
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
    #[error("stack overflow: push with SP=$00")]
    StackOverflow,
    #[error("stack underflow: pull with SP=$FF")]
    StackUnderflow,
    #[error("unknown opcode ${opcode:02X} at ${pc:04X}")]
    UnknownOpcode { opcode: u8, pc: u16 },
}

/// Memory interface for the 6502 CPU
///
/// Systems using the 6502 implement this trait to provide memory access.
/// Out-of-range accesses are reported, not panicked on; the CPU decides
/// that they are fatal.
pub trait Memory6502 {
    fn read(&self, addr: u16) -> Result<u8, BusError>;

    fn write(&mut self, addr: u16, val: u8) -> Result<(), BusError>;
}

/// Where execution starts after a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartAddress {
    /// Start at a fixed address (nestest's automated mode starts at `$C000`).
    Fixed(u16),
    /// Load PC from `$FFFC/$FFFD` like real hardware.
    ResetVector,
}

/// What to do when an opcode with no table entry is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecodeMode {
    /// Report it through the sink and carry on as a one-byte no-op.
    #[default]
    Lenient,
    /// Fail the step with [`CpuError::UnknownOpcode`].
    Strict,
}

/// Power-on register state and decoding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuConfig {
    pub start: StartAddress,
    pub sp: u8,
    pub status: u8,
    #[serde(default)]
    pub decode: DecodeMode,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            start: StartAddress::Fixed(0xC000),
            sp: 0xFD,
            status: 0x24,
            decode: DecodeMode::Lenient,
        }
    }
}

/// Register snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub p: u8,
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
            self.a, self.x, self.y, self.p, self.sp
        )
    }
}

/// 8-bit add returning the wrapped sum and whether it carried out of bit 7.
#[inline]
pub fn add_overflow(a: u8, b: u8) -> (u8, bool) {
    a.overflowing_add(b)
}

/// 8-bit subtract returning the wrapped difference and whether it borrowed.
#[inline]
pub fn sub_overflow(a: u8, b: u8) -> (u8, bool) {
    a.overflowing_sub(b)
}

/// MOS 6502 CPU state and execution engine
#[derive(Debug)]
pub struct Cpu6502<M: Memory6502> {
    /// Accumulator register
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Stack pointer (points to 0x0100 + sp)
    pub sp: u8,
    /// Status register (NV-BDIZC)
    pub status: u8,
    /// Program counter
    pub pc: u16,
    /// Memory interface
    pub memory: M,
    config: CpuConfig,
    sink: SharedSink,
    steps: u64,
}

impl<M: Memory6502> Cpu6502<M> {
    /// Create a CPU with the default configuration and no logging.
    pub fn new(memory: M) -> Self {
        let config = CpuConfig::default();
        let pc = match config.start {
            StartAddress::Fixed(pc) => pc,
            StartAddress::ResetVector => 0,
        };
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: config.sp,
            status: config.status,
            pc,
            memory,
            config,
            sink: NullSink::shared(),
            steps: 0,
        }
    }

    /// Create a CPU with an explicit configuration and trace sink, already reset.
    pub fn with_config(memory: M, config: CpuConfig, sink: SharedSink) -> Result<Self, CpuError> {
        let mut cpu = Self::new(memory);
        cpu.config = config;
        cpu.sink = sink;
        cpu.reset()?;
        Ok(cpu)
    }

    /// Re-apply the configured initial state (preserves memory).
    pub fn reset(&mut self) -> Result<(), CpuError> {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = self.config.sp;
        self.status = self.config.status;
        self.steps = 0;
        self.pc = match self.config.start {
            StartAddress::Fixed(pc) => pc,
            StartAddress::ResetVector => self.read_u16(RESET_VECTOR)?,
        };
        Ok(())
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    pub fn set_decode_mode(&mut self, mode: DecodeMode) {
        self.config.decode = mode;
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Number of instructions retired since the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn state(&self) -> CpuState {
        CpuState {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            p: self.status,
        }
    }

    #[inline]
    pub fn get_flag(&self, flag: u8) -> bool {
        self.status & flag != 0
    }

    #[inline]
    pub fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    #[inline]
    pub(crate) fn read(&self, addr: u16) -> Result<u8, CpuError> {
        Ok(self.memory.read(addr)?)
    }

    #[inline]
    pub(crate) fn write(&mut self, addr: u16, val: u8) -> Result<(), CpuError> {
        Ok(self.memory.write(addr, val)?)
    }

    pub(crate) fn read_u16(&self, addr: u16) -> Result<u16, CpuError> {
        let lo = self.read(addr)? as u16;
        let hi = self.read(addr.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }

    pub(crate) fn push_u8(&mut self, v: u8) -> Result<(), CpuError> {
        if self.sp == 0x00 {
            return Err(CpuError::StackOverflow);
        }
        self.write(STACK_BASE + self.sp as u16, v)?;
        self.sp -= 1;
        Ok(())
    }

    pub(crate) fn pop_u8(&mut self) -> Result<u8, CpuError> {
        if self.sp == 0xFF {
            return Err(CpuError::StackUnderflow);
        }
        self.sp += 1;
        self.read(STACK_BASE + self.sp as u16)
    }

    /// Push high byte first so pulls return low then high.
    pub(crate) fn push_u16(&mut self, v: u16) -> Result<(), CpuError> {
        self.push_u8((v >> 8) as u8)?;
        self.push_u8((v & 0xFF) as u8)
    }

    pub(crate) fn pop_u16(&mut self) -> Result<u16, CpuError> {
        let lo = self.pop_u8()? as u16;
        let hi = self.pop_u8()? as u16;
        Ok((hi << 8) | lo)
    }

    /// Decode the instruction at `pc` using the current index registers.
    ///
    /// Nothing is modified; indirect pointers are dereferenced now, memory
    /// operands are read later by `execute`.
    pub fn decode_at(&self, pc: u16) -> Result<Instruction, CpuError> {
        let opcode = self.read(pc)?;
        let entry = opcodes::lookup(opcode);
        let mut cursor = pc.wrapping_add(1);
        let operand = self.resolve(entry.mode, &mut cursor)?;

        Ok(Instruction {
            pc,
            opcode,
            operation: entry.operation,
            mode: entry.mode,
            official: entry.official,
            operand,
            next_pc: cursor,
        })
    }

    /// Decode the instruction at the current PC.
    pub fn next_instruction(&self) -> Result<Instruction, CpuError> {
        self.decode_at(self.pc)
    }

    /// Fetch, decode and execute one instruction.
    pub fn step(&mut self) -> Result<(), CpuError> {
        let pc = self.pc;
        match self.try_step() {
            Ok(()) => Ok(()),
            Err(err) => {
                log(self.sink.as_ref(), LogCategory::CPU, LogLevel::Error, || {
                    format!("CPU: halted at PC={:04X} ({}): {}", pc, self.state(), err)
                });
                Err(err)
            }
        }
    }

    fn try_step(&mut self) -> Result<(), CpuError> {
        let instruction = self.decode_at(self.pc)?;

        log(self.sink.as_ref(), LogCategory::CPU, LogLevel::Trace, || {
            format!(
                "[PC: {:04X}] OPCODE {:02X} | {} | {}",
                instruction.pc,
                instruction.opcode,
                self.state(),
                instruction
            )
        });

        self.pc = instruction.next_pc;
        self.execute(&instruction)?;
        self.steps += 1;
        Ok(())
    }
}

impl<M: Memory6502> Cpu for Cpu6502<M> {
    type Error = CpuError;

    fn reset(&mut self) -> Result<(), CpuError> {
        Cpu6502::reset(self)
    }

    fn step(&mut self) -> Result<(), CpuError> {
        Cpu6502::step(self)
    }
}

/// Flat 64 KiB memory, for tests and benchmarks.
#[derive(Debug)]
pub struct ArrayMemory {
    pub data: Box<[u8; 0x10000]>,
}

impl ArrayMemory {
    pub fn new() -> Self {
        Self {
            data: Box::new([0; 0x10000]),
        }
    }

    /// Copy a program into memory and point the reset vector at it.
    pub fn load_program(&mut self, offset: u16, data: &[u8]) {
        let off = offset as usize;
        self.data[off..off + data.len()].copy_from_slice(data);
        self.data[0xFFFC] = (offset & 0xFF) as u8;
        self.data[0xFFFD] = (offset >> 8) as u8;
    }
}

impl Default for ArrayMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory6502 for ArrayMemory {
    fn read(&self, addr: u16) -> Result<u8, BusError> {
        Ok(self.data[addr as usize])
    }

    fn write(&mut self, addr: u16, val: u8) -> Result<(), BusError> {
        self.data[addr as usize] = val;
        Ok(())
    }
}
