//! Instruction semantics.

use crate::logging::{log, LogCategory, LogLevel};

use super::instruction::{Instruction, Operand};
use super::opcodes::Operation;
use super::{
    add_overflow, sub_overflow, Cpu6502, CpuError, DecodeMode, Memory6502, FLAG_BREAK,
    FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT, FLAG_NEGATIVE, FLAG_OVERFLOW, FLAG_UNUSED,
    FLAG_ZERO, IRQ_BRK_VECTOR,
};

impl<M: Memory6502> Cpu6502<M> {
    /// Apply a decoded instruction.
    ///
    /// The caller is expected to have moved PC to `instruction.next_pc`
    /// already; control-flow operations overwrite it.
    pub fn execute(&mut self, instruction: &Instruction) -> Result<(), CpuError> {
        use Operation::*;

        match instruction.operation {
            // Load / store
            Lda => {
                self.a = self.operand_value(instruction)?;
                self.update_zn(self.a);
            }
            Ldx => {
                self.x = self.operand_value(instruction)?;
                self.update_zn(self.x);
            }
            Ldy => {
                self.y = self.operand_value(instruction)?;
                self.update_zn(self.y);
            }
            Sta => self.store(instruction, self.a)?,
            Stx => self.store(instruction, self.x)?,
            Sty => self.store(instruction, self.y)?,

            // Transfers
            Tax => {
                self.x = self.a;
                self.update_zn(self.x);
            }
            Tay => {
                self.y = self.a;
                self.update_zn(self.y);
            }
            Tsx => {
                self.x = self.sp;
                self.update_zn(self.x);
            }
            Txa => {
                self.a = self.x;
                self.update_zn(self.a);
            }
            Txs => self.sp = self.x,
            Tya => {
                self.a = self.y;
                self.update_zn(self.a);
            }

            // Stack
            Pha => self.push_u8(self.a)?,
            Php => self.push_u8(self.status | FLAG_BREAK | FLAG_UNUSED)?,
            Pla => {
                self.a = self.pop_u8()?;
                self.update_zn(self.a);
            }
            Plp => self.status = Self::pulled_status(self.pop_u8()?),

            // Logical
            And => {
                self.a &= self.operand_value(instruction)?;
                self.update_zn(self.a);
            }
            Eor => {
                self.a ^= self.operand_value(instruction)?;
                self.update_zn(self.a);
            }
            Ora => {
                self.a |= self.operand_value(instruction)?;
                self.update_zn(self.a);
            }
            Bit => {
                let m = self.operand_value(instruction)?;
                self.set_flag(FLAG_ZERO, self.a & m == 0);
                self.set_flag(FLAG_OVERFLOW, m & 0x40 != 0);
                self.set_flag(FLAG_NEGATIVE, m & 0x80 != 0);
            }

            // Arithmetic
            Adc => {
                let m = self.operand_value(instruction)?;
                self.adc(m);
            }
            Sbc => {
                let m = self.operand_value(instruction)?;
                self.sbc(m);
            }
            Cmp => self.compare(self.a, instruction)?,
            Cpx => self.compare(self.x, instruction)?,
            Cpy => self.compare(self.y, instruction)?,

            // Increment / decrement
            Inc => {
                self.modify(instruction, |_, v| v.wrapping_add(1))?;
            }
            Dec => {
                self.modify(instruction, |_, v| v.wrapping_sub(1))?;
            }
            Inx => {
                self.x = self.x.wrapping_add(1);
                self.update_zn(self.x);
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.update_zn(self.y);
            }
            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.update_zn(self.x);
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.update_zn(self.y);
            }

            // Shifts / rotates
            Asl => {
                self.modify(instruction, |cpu, v| {
                    cpu.set_flag(FLAG_CARRY, v & 0x80 != 0);
                    v << 1
                })?;
            }
            Lsr => {
                self.modify(instruction, |cpu, v| {
                    cpu.set_flag(FLAG_CARRY, v & 0x01 != 0);
                    v >> 1
                })?;
            }
            Rol => {
                self.modify(instruction, |cpu, v| {
                    let carry_in = cpu.get_flag(FLAG_CARRY) as u8;
                    cpu.set_flag(FLAG_CARRY, v & 0x80 != 0);
                    (v << 1) | carry_in
                })?;
            }
            Ror => {
                self.modify(instruction, |cpu, v| {
                    let carry_in = (cpu.get_flag(FLAG_CARRY) as u8) << 7;
                    cpu.set_flag(FLAG_CARRY, v & 0x01 != 0);
                    (v >> 1) | carry_in
                })?;
            }

            // Jumps / calls
            Jmp => self.pc = self.target(instruction),
            Jsr => {
                self.push_u16(instruction.next_pc.wrapping_sub(1))?;
                self.pc = self.target(instruction);
            }
            Rts => self.pc = self.pop_u16()?.wrapping_add(1),

            // Branches
            Bcc => self.branch(instruction, !self.get_flag(FLAG_CARRY)),
            Bcs => self.branch(instruction, self.get_flag(FLAG_CARRY)),
            Bne => self.branch(instruction, !self.get_flag(FLAG_ZERO)),
            Beq => self.branch(instruction, self.get_flag(FLAG_ZERO)),
            Bpl => self.branch(instruction, !self.get_flag(FLAG_NEGATIVE)),
            Bmi => self.branch(instruction, self.get_flag(FLAG_NEGATIVE)),
            Bvc => self.branch(instruction, !self.get_flag(FLAG_OVERFLOW)),
            Bvs => self.branch(instruction, self.get_flag(FLAG_OVERFLOW)),

            // Flags
            Clc => self.set_flag(FLAG_CARRY, false),
            Sec => self.set_flag(FLAG_CARRY, true),
            Cli => self.set_flag(FLAG_INTERRUPT, false),
            Sei => self.set_flag(FLAG_INTERRUPT, true),
            Cld => self.set_flag(FLAG_DECIMAL, false),
            Sed => self.set_flag(FLAG_DECIMAL, true),
            Clv => self.set_flag(FLAG_OVERFLOW, false),

            // System
            Brk => self.brk(instruction)?,
            Rti => {
                self.status = Self::pulled_status(self.pop_u8()?);
                self.pc = self.pop_u16()?;
            }
            // Unofficial NOPs still decode their operand bytes; nothing is read.
            Nop => {}
            Unknown => match self.config().decode {
                DecodeMode::Strict => {
                    return Err(CpuError::UnknownOpcode {
                        opcode: instruction.opcode,
                        pc: instruction.pc,
                    })
                }
                DecodeMode::Lenient => {
                    log(self.sink().as_ref(), LogCategory::CPU, LogLevel::Warn, || {
                        format!(
                            "CPU: unknown opcode ${:02X} at ${:04X}, skipped",
                            instruction.opcode, instruction.pc
                        )
                    });
                }
            },
        }

        Ok(())
    }

    #[inline]
    fn update_zn(&mut self, v: u8) {
        self.set_flag(FLAG_ZERO, v == 0);
        self.set_flag(FLAG_NEGATIVE, v & 0x80 != 0);
    }

    /// PLP/RTI: bit 5 always reads back set, B never survives a pull.
    #[inline]
    fn pulled_status(v: u8) -> u8 {
        (v | FLAG_UNUSED) & !FLAG_BREAK
    }

    fn operand_value(&self, instruction: &Instruction) -> Result<u8, CpuError> {
        match instruction.operand {
            Operand::Immediate(v) => Ok(v),
            Operand::Accumulator => Ok(self.a),
            Operand::Address { effective, .. } => self.read(effective),
            Operand::None | Operand::Relative { .. } => Ok(0),
        }
    }

    fn store(&mut self, instruction: &Instruction, v: u8) -> Result<(), CpuError> {
        if let Operand::Address { effective, .. } = instruction.operand {
            self.write(effective, v)?;
        }
        Ok(())
    }

    /// Read-modify-write against A or memory, setting Z/N from the result.
    fn modify<F>(&mut self, instruction: &Instruction, f: F) -> Result<(), CpuError>
    where
        F: FnOnce(&mut Self, u8) -> u8,
    {
        match instruction.operand {
            Operand::Address { effective, .. } => {
                let v = self.read(effective)?;
                let result = f(self, v);
                self.write(effective, result)?;
                self.update_zn(result);
            }
            _ => {
                let v = self.a;
                self.a = f(self, v);
                self.update_zn(self.a);
            }
        }
        Ok(())
    }

    fn target(&self, instruction: &Instruction) -> u16 {
        instruction.effective_address().unwrap_or(self.pc)
    }

    fn branch(&mut self, instruction: &Instruction, taken: bool) {
        if taken {
            self.pc = self.target(instruction);
        }
    }

    fn adc(&mut self, m: u8) {
        let a = self.a;
        let (partial, c1) = add_overflow(a, m);
        let (result, c2) = add_overflow(partial, self.get_flag(FLAG_CARRY) as u8);

        self.set_flag(FLAG_CARRY, c1 || c2);
        self.set_flag(FLAG_OVERFLOW, (!(a ^ m) & (a ^ result) & 0x80) != 0);
        self.a = result;
        self.update_zn(result);
    }

    fn sbc(&mut self, m: u8) {
        let a = self.a;
        let (partial, b1) = sub_overflow(a, m);
        let (result, b2) = sub_overflow(partial, !self.get_flag(FLAG_CARRY) as u8);

        self.set_flag(FLAG_CARRY, !(b1 || b2));
        self.set_flag(FLAG_OVERFLOW, ((a ^ m) & (a ^ result) & 0x80) != 0);
        self.a = result;
        self.update_zn(result);
    }

    fn compare(&mut self, register: u8, instruction: &Instruction) -> Result<(), CpuError> {
        let m = self.operand_value(instruction)?;
        self.set_flag(FLAG_CARRY, register >= m);
        self.update_zn(register.wrapping_sub(m));
        Ok(())
    }

    /// Software interrupt: push the return address (BRK plus its padding
    /// byte) and status with B set, then vector through `$FFFE`.
    fn brk(&mut self, instruction: &Instruction) -> Result<(), CpuError> {
        let ret = instruction.pc.wrapping_add(2);
        self.push_u16(ret)?;
        self.push_u8(self.status | FLAG_BREAK | FLAG_UNUSED)?;
        self.set_flag(FLAG_INTERRUPT, true);
        self.pc = self.read_u16(IRQ_BRK_VECTOR)?;

        log(self.sink().as_ref(), LogCategory::Interrupts, LogLevel::Debug, || {
            format!(
                "BRK at ${:04X}: pushed ${:04X}, vector -> ${:04X}",
                instruction.pc, ret, self.pc
            )
        });
        Ok(())
    }
}
