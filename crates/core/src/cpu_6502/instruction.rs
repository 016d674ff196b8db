//! The decoded form of one instruction.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::addressing::AddressingMode;
use super::opcodes::Operation;

/// What an instruction acts on, as resolved at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    None,
    Accumulator,
    Immediate(u8),
    /// Branch displacement and the absolute target it leads to.
    Relative { offset: i8, target: u16 },
    /// `effective` is the address accessed; `display` is the operand as
    /// written in the instruction stream, before indexing or indirection.
    Address { effective: u16, display: u16 },
}

impl Operand {
    pub(super) fn address(effective: u16, display: u16) -> Self {
        Operand::Address { effective, display }
    }
}

/// One decoded instruction. Produced by `Cpu6502::decode_at` and consumed
/// by `Cpu6502::execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Address the opcode byte was fetched from.
    pub pc: u16,
    pub opcode: u8,
    pub operation: Operation,
    pub mode: AddressingMode,
    pub official: bool,
    pub operand: Operand,
    /// Address immediately following the instruction.
    pub next_pc: u16,
}

impl Instruction {
    pub fn effective_address(&self) -> Option<u16> {
        match self.operand {
            Operand::Address { effective, .. } => Some(effective),
            Operand::Relative { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Human-readable text, e.g. `LDA ($80), Y`.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AddressingMode::*;

        if self.operation == Operation::Unknown {
            return f.write_str("UNKNOWN");
        }
        if !self.official {
            f.write_str("*")?;
        }
        f.write_str(self.operation.mnemonic())?;

        match (self.mode, self.operand) {
            (Accumulator, _) => f.write_str(" A"),
            (Immediate, Operand::Immediate(v)) => write!(f, " #${:02X}", v),
            (Relative, Operand::Relative { target, .. }) => write!(f, " ${:04X}", target),
            (mode, Operand::Address { display, .. }) => match mode {
                ZeroPage => write!(f, " ${:02X}", display),
                ZeroPageX => write!(f, " ${:02X}, X", display),
                ZeroPageY => write!(f, " ${:02X}, Y", display),
                Absolute => write!(f, " ${:04X}", display),
                AbsoluteX => write!(f, " ${:04X}, X", display),
                AbsoluteY => write!(f, " ${:04X}, Y", display),
                Indirect => write!(f, " (${:04X})", display),
                IndirectX => write!(f, " (${:02X}, X)", display),
                IndirectY => write!(f, " (${:02X}), Y", display),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}
