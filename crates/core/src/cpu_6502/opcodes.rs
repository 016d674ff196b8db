//! Opcode byte -> (operation, addressing mode) lookup.
//!
//! Decode, execute and disassembly all read this one table.

use serde::{Deserialize, Serialize};

use super::addressing::AddressingMode;

/// Every operation the core knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    // Load / store
    Lda,
    Ldx,
    Ldy,
    Sta,
    Stx,
    Sty,
    // Register transfers
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    // Stack
    Pha,
    Php,
    Pla,
    Plp,
    // Logical
    And,
    Eor,
    Ora,
    Bit,
    // Arithmetic
    Adc,
    Sbc,
    Cmp,
    Cpx,
    Cpy,
    // Increment / decrement
    Inc,
    Inx,
    Iny,
    Dec,
    Dex,
    Dey,
    // Shifts / rotates
    Asl,
    Lsr,
    Rol,
    Ror,
    // Jumps / calls
    Jmp,
    Jsr,
    Rts,
    // Branches
    Bcc,
    Bcs,
    Beq,
    Bmi,
    Bne,
    Bpl,
    Bvc,
    Bvs,
    // Flag changes
    Clc,
    Cld,
    Cli,
    Clv,
    Sec,
    Sed,
    Sei,
    // System
    Brk,
    Nop,
    Rti,
    /// Byte with no mapping in the table.
    Unknown,
}

impl Operation {
    pub fn mnemonic(self) -> &'static str {
        use Operation::*;
        match self {
            Lda => "LDA",
            Ldx => "LDX",
            Ldy => "LDY",
            Sta => "STA",
            Stx => "STX",
            Sty => "STY",
            Tax => "TAX",
            Tay => "TAY",
            Tsx => "TSX",
            Txa => "TXA",
            Txs => "TXS",
            Tya => "TYA",
            Pha => "PHA",
            Php => "PHP",
            Pla => "PLA",
            Plp => "PLP",
            And => "AND",
            Eor => "EOR",
            Ora => "ORA",
            Bit => "BIT",
            Adc => "ADC",
            Sbc => "SBC",
            Cmp => "CMP",
            Cpx => "CPX",
            Cpy => "CPY",
            Inc => "INC",
            Inx => "INX",
            Iny => "INY",
            Dec => "DEC",
            Dex => "DEX",
            Dey => "DEY",
            Asl => "ASL",
            Lsr => "LSR",
            Rol => "ROL",
            Ror => "ROR",
            Jmp => "JMP",
            Jsr => "JSR",
            Rts => "RTS",
            Bcc => "BCC",
            Bcs => "BCS",
            Beq => "BEQ",
            Bmi => "BMI",
            Bne => "BNE",
            Bpl => "BPL",
            Bvc => "BVC",
            Bvs => "BVS",
            Clc => "CLC",
            Cld => "CLD",
            Cli => "CLI",
            Clv => "CLV",
            Sec => "SEC",
            Sed => "SED",
            Sei => "SEI",
            Brk => "BRK",
            Nop => "NOP",
            Rti => "RTI",
            Unknown => "UNKNOWN",
        }
    }
}

/// One row of the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opcode {
    pub operation: Operation,
    pub mode: AddressingMode,
    /// False for the undocumented NOP variants (and for `Unknown`).
    pub official: bool,
}

const UNKNOWN: Opcode = Opcode {
    operation: Operation::Unknown,
    mode: AddressingMode::Implied,
    official: false,
};

const fn op(operation: Operation, mode: AddressingMode) -> Opcode {
    Opcode {
        operation,
        mode,
        official: true,
    }
}

const fn unofficial_nop(mode: AddressingMode) -> Opcode {
    Opcode {
        operation: Operation::Nop,
        mode,
        official: false,
    }
}

/// Look up an opcode byte.
#[inline]
pub fn lookup(opcode: u8) -> Opcode {
    OPCODES[opcode as usize]
}

pub static OPCODES: [Opcode; 256] = build_table();

const fn build_table() -> [Opcode; 256] {
    use AddressingMode::*;
    use Operation::*;

    let mut t = [UNKNOWN; 256];

    t[0x00] = op(Brk, Implied);
    t[0x40] = op(Rti, Implied);
    t[0xEA] = op(Nop, Implied);

    t[0xA9] = op(Lda, Immediate);
    t[0xA5] = op(Lda, ZeroPage);
    t[0xB5] = op(Lda, ZeroPageX);
    t[0xAD] = op(Lda, Absolute);
    t[0xBD] = op(Lda, AbsoluteX);
    t[0xB9] = op(Lda, AbsoluteY);
    t[0xA1] = op(Lda, IndirectX);
    t[0xB1] = op(Lda, IndirectY);

    t[0xA2] = op(Ldx, Immediate);
    t[0xA6] = op(Ldx, ZeroPage);
    t[0xB6] = op(Ldx, ZeroPageY);
    t[0xAE] = op(Ldx, Absolute);
    t[0xBE] = op(Ldx, AbsoluteY);

    t[0xA0] = op(Ldy, Immediate);
    t[0xA4] = op(Ldy, ZeroPage);
    t[0xB4] = op(Ldy, ZeroPageX);
    t[0xAC] = op(Ldy, Absolute);
    t[0xBC] = op(Ldy, AbsoluteX);

    t[0x85] = op(Sta, ZeroPage);
    t[0x95] = op(Sta, ZeroPageX);
    t[0x8D] = op(Sta, Absolute);
    t[0x9D] = op(Sta, AbsoluteX);
    t[0x99] = op(Sta, AbsoluteY);
    t[0x81] = op(Sta, IndirectX);
    t[0x91] = op(Sta, IndirectY);

    t[0x86] = op(Stx, ZeroPage);
    t[0x96] = op(Stx, ZeroPageY);
    t[0x8E] = op(Stx, Absolute);

    t[0x84] = op(Sty, ZeroPage);
    t[0x94] = op(Sty, ZeroPageX);
    t[0x8C] = op(Sty, Absolute);

    t[0xAA] = op(Tax, Implied);
    t[0xA8] = op(Tay, Implied);
    t[0xBA] = op(Tsx, Implied);
    t[0x8A] = op(Txa, Implied);
    t[0x9A] = op(Txs, Implied);
    t[0x98] = op(Tya, Implied);

    t[0x48] = op(Pha, Implied);
    t[0x08] = op(Php, Implied);
    t[0x68] = op(Pla, Implied);
    t[0x28] = op(Plp, Implied);

    t[0x29] = op(And, Immediate);
    t[0x25] = op(And, ZeroPage);
    t[0x35] = op(And, ZeroPageX);
    t[0x2D] = op(And, Absolute);
    t[0x3D] = op(And, AbsoluteX);
    t[0x39] = op(And, AbsoluteY);
    t[0x21] = op(And, IndirectX);
    t[0x31] = op(And, IndirectY);

    t[0x49] = op(Eor, Immediate);
    t[0x45] = op(Eor, ZeroPage);
    t[0x55] = op(Eor, ZeroPageX);
    t[0x4D] = op(Eor, Absolute);
    t[0x5D] = op(Eor, AbsoluteX);
    t[0x59] = op(Eor, AbsoluteY);
    t[0x41] = op(Eor, IndirectX);
    t[0x51] = op(Eor, IndirectY);

    t[0x09] = op(Ora, Immediate);
    t[0x05] = op(Ora, ZeroPage);
    t[0x15] = op(Ora, ZeroPageX);
    t[0x0D] = op(Ora, Absolute);
    t[0x1D] = op(Ora, AbsoluteX);
    t[0x19] = op(Ora, AbsoluteY);
    t[0x01] = op(Ora, IndirectX);
    t[0x11] = op(Ora, IndirectY);

    t[0x24] = op(Bit, ZeroPage);
    t[0x2C] = op(Bit, Absolute);

    t[0x69] = op(Adc, Immediate);
    t[0x65] = op(Adc, ZeroPage);
    t[0x75] = op(Adc, ZeroPageX);
    t[0x6D] = op(Adc, Absolute);
    t[0x7D] = op(Adc, AbsoluteX);
    t[0x79] = op(Adc, AbsoluteY);
    t[0x61] = op(Adc, IndirectX);
    t[0x71] = op(Adc, IndirectY);

    t[0xE9] = op(Sbc, Immediate);
    t[0xE5] = op(Sbc, ZeroPage);
    t[0xF5] = op(Sbc, ZeroPageX);
    t[0xED] = op(Sbc, Absolute);
    t[0xFD] = op(Sbc, AbsoluteX);
    t[0xF9] = op(Sbc, AbsoluteY);
    t[0xE1] = op(Sbc, IndirectX);
    t[0xF1] = op(Sbc, IndirectY);

    t[0xC9] = op(Cmp, Immediate);
    t[0xC5] = op(Cmp, ZeroPage);
    t[0xD5] = op(Cmp, ZeroPageX);
    t[0xCD] = op(Cmp, Absolute);
    t[0xDD] = op(Cmp, AbsoluteX);
    t[0xD9] = op(Cmp, AbsoluteY);
    t[0xC1] = op(Cmp, IndirectX);
    t[0xD1] = op(Cmp, IndirectY);

    t[0xE0] = op(Cpx, Immediate);
    t[0xE4] = op(Cpx, ZeroPage);
    t[0xEC] = op(Cpx, Absolute);

    t[0xC0] = op(Cpy, Immediate);
    t[0xC4] = op(Cpy, ZeroPage);
    t[0xCC] = op(Cpy, Absolute);

    t[0xE6] = op(Inc, ZeroPage);
    t[0xF6] = op(Inc, ZeroPageX);
    t[0xEE] = op(Inc, Absolute);
    t[0xFE] = op(Inc, AbsoluteX);

    t[0xC6] = op(Dec, ZeroPage);
    t[0xD6] = op(Dec, ZeroPageX);
    t[0xCE] = op(Dec, Absolute);
    t[0xDE] = op(Dec, AbsoluteX);

    t[0xE8] = op(Inx, Implied);
    t[0xC8] = op(Iny, Implied);
    t[0xCA] = op(Dex, Implied);
    t[0x88] = op(Dey, Implied);

    t[0x0A] = op(Asl, Accumulator);
    t[0x06] = op(Asl, ZeroPage);
    t[0x16] = op(Asl, ZeroPageX);
    t[0x0E] = op(Asl, Absolute);
    t[0x1E] = op(Asl, AbsoluteX);

    t[0x4A] = op(Lsr, Accumulator);
    t[0x46] = op(Lsr, ZeroPage);
    t[0x56] = op(Lsr, ZeroPageX);
    t[0x4E] = op(Lsr, Absolute);
    t[0x5E] = op(Lsr, AbsoluteX);

    t[0x2A] = op(Rol, Accumulator);
    t[0x26] = op(Rol, ZeroPage);
    t[0x36] = op(Rol, ZeroPageX);
    t[0x2E] = op(Rol, Absolute);
    t[0x3E] = op(Rol, AbsoluteX);

    t[0x6A] = op(Ror, Accumulator);
    t[0x66] = op(Ror, ZeroPage);
    t[0x76] = op(Ror, ZeroPageX);
    t[0x6E] = op(Ror, Absolute);
    t[0x7E] = op(Ror, AbsoluteX);

    t[0x4C] = op(Jmp, Absolute);
    t[0x6C] = op(Jmp, Indirect);
    t[0x20] = op(Jsr, Absolute);
    t[0x60] = op(Rts, Implied);

    t[0x90] = op(Bcc, Relative);
    t[0xB0] = op(Bcs, Relative);
    t[0xF0] = op(Beq, Relative);
    t[0x30] = op(Bmi, Relative);
    t[0xD0] = op(Bne, Relative);
    t[0x10] = op(Bpl, Relative);
    t[0x50] = op(Bvc, Relative);
    t[0x70] = op(Bvs, Relative);

    t[0x18] = op(Clc, Implied);
    t[0xD8] = op(Cld, Implied);
    t[0x58] = op(Cli, Implied);
    t[0xB8] = op(Clv, Implied);
    t[0x38] = op(Sec, Implied);
    t[0xF8] = op(Sed, Implied);
    t[0x78] = op(Sei, Implied);

    // Undocumented NOPs: only the operand width matters
    t[0x1A] = unofficial_nop(Implied);
    t[0x3A] = unofficial_nop(Implied);
    t[0x5A] = unofficial_nop(Implied);
    t[0x7A] = unofficial_nop(Implied);
    t[0xDA] = unofficial_nop(Implied);
    t[0xFA] = unofficial_nop(Implied);

    t[0x04] = unofficial_nop(ZeroPage);
    t[0x44] = unofficial_nop(ZeroPage);
    t[0x64] = unofficial_nop(ZeroPage);
    t[0x14] = unofficial_nop(ZeroPageX);
    t[0x34] = unofficial_nop(ZeroPageX);
    t[0x54] = unofficial_nop(ZeroPageX);
    t[0x74] = unofficial_nop(ZeroPageX);
    t[0xD4] = unofficial_nop(ZeroPageX);
    t[0xF4] = unofficial_nop(ZeroPageX);
    t[0x80] = unofficial_nop(Immediate);

    t[0x0C] = unofficial_nop(Absolute);
    t[0x1C] = unofficial_nop(AbsoluteX);
    t[0x3C] = unofficial_nop(AbsoluteX);
    t[0x5C] = unofficial_nop(AbsoluteX);
    t[0x7C] = unofficial_nop(AbsoluteX);
    t[0xDC] = unofficial_nop(AbsoluteX);
    t[0xFC] = unofficial_nop(AbsoluteX);

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn official_opcode_count() {
        let official = OPCODES.iter().filter(|o| o.official).count();
        assert_eq!(official, 151);
    }

    #[test]
    fn every_official_mnemonic_is_mapped() {
        let mut seen = std::collections::HashSet::new();
        for o in OPCODES.iter().filter(|o| o.official) {
            seen.insert(o.operation);
        }
        assert_eq!(seen.len(), 56);
        assert!(!seen.contains(&Operation::Unknown));
    }

    #[test]
    fn unofficial_nops_have_expected_widths() {
        for byte in [0x1A, 0x3A, 0x5A, 0x7A, 0xDA, 0xFA] {
            assert_eq!(lookup(byte).mode.operand_len(), 0);
        }
        for byte in [0x04, 0x44, 0x64, 0x14, 0x34, 0x54, 0x74, 0xD4, 0xF4, 0x80] {
            assert_eq!(lookup(byte).mode.operand_len(), 1);
        }
        for byte in [0x0C, 0x1C, 0x3C, 0x5C, 0x7C, 0xDC, 0xFC] {
            assert_eq!(lookup(byte).mode.operand_len(), 2);
        }
        assert!(!lookup(0x80).official);
        assert_eq!(lookup(0x80).operation, Operation::Nop);
    }

    #[test]
    fn unmapped_bytes_are_unknown() {
        for byte in [0x02u8, 0x03, 0x12, 0x22, 0xFF, 0x8B, 0xAB] {
            let o = lookup(byte);
            assert_eq!(o.operation, Operation::Unknown);
            assert_eq!(o.mode, AddressingMode::Implied);
        }
    }
}
