//! Addressing-mode resolution.

use serde::{Deserialize, Serialize};

use super::instruction::Operand;
use super::{Cpu6502, CpuError, Memory6502};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressingMode {
    /// No operand bytes.
    Implied,
    /// Operates on A (`ASL A`).
    Accumulator,
    /// The operand byte is the value.
    Immediate,
    /// Signed branch displacement from the following instruction.
    Relative,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// `JMP ($xxxx)` only.
    Indirect,
    /// `($zz, X)`
    IndirectX,
    /// `($zz), Y`
    IndirectY,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    pub const fn operand_len(self) -> u16 {
        use AddressingMode::*;
        match self {
            Implied | Accumulator => 0,
            Immediate | Relative | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }
}

impl<M: Memory6502> Cpu6502<M> {
    #[inline]
    fn fetch_at(&self, cursor: &mut u16) -> Result<u8, CpuError> {
        let v = self.read(*cursor)?;
        *cursor = cursor.wrapping_add(1);
        Ok(v)
    }

    #[inline]
    fn fetch_u16_at(&self, cursor: &mut u16) -> Result<u16, CpuError> {
        let lo = self.fetch_at(cursor)? as u16;
        let hi = self.fetch_at(cursor)? as u16;
        Ok((hi << 8) | lo)
    }

    /// Read a little-endian pointer stored in the zero page. The high byte
    /// wraps to `$00` rather than carrying into page 1.
    #[inline]
    fn read_zero_page_u16(&self, zp: u8) -> Result<u16, CpuError> {
        let lo = self.read(zp as u16)? as u16;
        let hi = self.read(zp.wrapping_add(1) as u16)? as u16;
        Ok((hi << 8) | lo)
    }

    /// Read a 16-bit pointer for JMP (indirect) with the 6502 page-wrapping bug:
    /// a pointer at `$xxFF` takes its high byte from `$xx00`.
    #[inline]
    pub(super) fn read_indirect_u16_bug(&self, addr: u16) -> Result<u16, CpuError> {
        let lo = self.read(addr)? as u16;
        let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let hi = self.read(hi_addr)? as u16;
        Ok((hi << 8) | lo)
    }

    /// Consume the operand bytes for `mode` starting at `cursor` and work out
    /// what the instruction acts on. `cursor` ends up at the next instruction.
    pub(super) fn resolve(
        &self,
        mode: AddressingMode,
        cursor: &mut u16,
    ) -> Result<Operand, CpuError> {
        use AddressingMode::*;

        let operand = match mode {
            Implied => Operand::None,
            Accumulator => Operand::Accumulator,
            Immediate => Operand::Immediate(self.fetch_at(cursor)?),
            Relative => {
                let offset = self.fetch_at(cursor)? as i8;
                Operand::Relative {
                    offset,
                    target: cursor.wrapping_add(offset as i16 as u16),
                }
            }
            ZeroPage => {
                let zp = self.fetch_at(cursor)? as u16;
                Operand::address(zp, zp)
            }
            ZeroPageX => {
                let zp = self.fetch_at(cursor)?;
                Operand::address(zp.wrapping_add(self.x) as u16, zp as u16)
            }
            ZeroPageY => {
                let zp = self.fetch_at(cursor)?;
                Operand::address(zp.wrapping_add(self.y) as u16, zp as u16)
            }
            Absolute => {
                let addr = self.fetch_u16_at(cursor)?;
                Operand::address(addr, addr)
            }
            AbsoluteX => {
                let base = self.fetch_u16_at(cursor)?;
                Operand::address(base.wrapping_add(self.x as u16), base)
            }
            AbsoluteY => {
                let base = self.fetch_u16_at(cursor)?;
                Operand::address(base.wrapping_add(self.y as u16), base)
            }
            Indirect => {
                let ptr = self.fetch_u16_at(cursor)?;
                Operand::address(self.read_indirect_u16_bug(ptr)?, ptr)
            }
            IndirectX => {
                let zp = self.fetch_at(cursor)?;
                let addr = self.read_zero_page_u16(zp.wrapping_add(self.x))?;
                Operand::address(addr, zp as u16)
            }
            IndirectY => {
                let zp = self.fetch_at(cursor)?;
                let base = self.read_zero_page_u16(zp)?;
                Operand::address(base.wrapping_add(self.y as u16), zp as u16)
            }
        };

        Ok(operand)
    }
}
