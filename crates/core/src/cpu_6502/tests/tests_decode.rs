//! Tests for decoding, instruction text, configuration and tracing

use std::sync::Arc;

use super::cpu_with;
use crate::cpu_6502::{
    ArrayMemory, Cpu6502, CpuConfig, CpuError, DecodeMode, Operation, StartAddress,
};
use crate::logging::{LogCategory, LogLevel, MemorySink};

#[test]
fn test_power_on_state() {
    let cpu = Cpu6502::new(ArrayMemory::new());
    let state = cpu.state();

    assert_eq!(state.pc, 0xC000);
    assert_eq!(state.sp, 0xFD);
    assert_eq!(state.p, 0x24);
    assert_eq!(state.to_string(), "A:00 X:00 Y:00 P:24 SP:FD");
}

#[test]
fn test_reset_vector_start() {
    let mut mem = ArrayMemory::new();
    mem.load_program(0x8000, &[0xEA]);
    let config = CpuConfig {
        start: StartAddress::ResetVector,
        ..CpuConfig::default()
    };

    let cpu = Cpu6502::with_config(mem, config, Arc::new(MemorySink::new(LogLevel::Off)))
        .unwrap();
    assert_eq!(cpu.pc, 0x8000);
}

#[test]
fn test_reset_restores_configured_registers() {
    let mut cpu = cpu_with(&[0xA9, 0x10]);
    cpu.step().unwrap();
    cpu.sp = 0x10;

    cpu.reset().unwrap();
    assert_eq!(cpu.a, 0);
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(cpu.pc, 0xC000);
    assert_eq!(cpu.steps(), 0);
}

#[test]
fn test_decode_does_not_modify_state() {
    let cpu = cpu_with(&[0x8D, 0x00, 0x02]);
    let before = cpu.state();

    let instruction = cpu.decode_at(0xC000).unwrap();
    assert_eq!(instruction.operation, Operation::Sta);
    assert_eq!(instruction.mode.operand_len(), 2);
    assert_eq!(instruction.next_pc, 0xC003);
    assert_eq!(cpu.state(), before);
    assert_eq!(cpu.memory.data[0x0200], 0);
}

#[test]
fn test_instruction_text() {
    let cpu = cpu_with(&[
        0xB1, 0x80, // LDA ($80), Y
        0x0A, // ASL A
        0xA9, 0x0F, // LDA #$0F
        0x04, 0x10, // *NOP $10
        0xF0, 0x03, // BEQ
        0x02, // unmapped
        0x6C, 0x00, 0x03, // JMP ($0300)
        0x81, 0x20, // STA ($20, X)
    ]);

    let texts: Vec<String> = [0xC000, 0xC002, 0xC003, 0xC005, 0xC007, 0xC009, 0xC00A, 0xC00D]
        .iter()
        .map(|&pc| cpu.decode_at(pc).unwrap().text())
        .collect();

    assert_eq!(
        texts,
        [
            "LDA ($80), Y",
            "ASL A",
            "LDA #$0F",
            "*NOP $10",
            "BEQ $C00C",
            "UNKNOWN",
            "JMP ($0300)",
            "STA ($20, X)",
        ]
    );
}

#[test]
fn test_unofficial_nop_skips_operand() {
    // *NOP $1234,X; LDA #$01
    let mut cpu = cpu_with(&[0x1C, 0x34, 0x12, 0xA9, 0x01]);

    cpu.step().unwrap();
    assert_eq!(cpu.pc, 0xC003);
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x01);
}

#[test]
fn test_unknown_opcode_lenient() {
    let sink = Arc::new(MemorySink::new(LogLevel::Warn));
    let mut mem = ArrayMemory::new();
    mem.data[0xC000] = 0x02;
    let mut cpu = Cpu6502::with_config(mem, CpuConfig::default(), sink.clone()).unwrap();

    cpu.step().unwrap();
    assert_eq!(cpu.pc, 0xC001);
    assert_eq!(cpu.steps(), 1);
    assert!(sink.contains("unknown opcode $02 at $C000"));
}

#[test]
fn test_unknown_opcode_strict() {
    let mut cpu = cpu_with(&[0x02]);
    cpu.set_decode_mode(DecodeMode::Strict);

    assert_eq!(
        cpu.step(),
        Err(CpuError::UnknownOpcode {
            opcode: 0x02,
            pc: 0xC000
        })
    );
}

#[test]
fn test_trace_line_format() {
    let sink = Arc::new(MemorySink::new(LogLevel::Trace));
    let mut mem = ArrayMemory::new();
    mem.data[0xC000] = 0xA9;
    mem.data[0xC001] = 0x01;
    let mut cpu = Cpu6502::with_config(mem, CpuConfig::default(), sink.clone()).unwrap();

    cpu.step().unwrap();

    let lines = sink.messages(LogCategory::CPU);
    assert_eq!(
        lines,
        ["[PC: C000] OPCODE A9 | A:00 X:00 Y:00 P:24 SP:FD | LDA #$01"]
    );
    // Fixed columns used by log comparison tools
    let line = &lines[0];
    assert_eq!(&line[5..9], "C000");
    assert_eq!(&line[18..20], "A9");
    assert_eq!(&line[25..27], "00");
}

#[test]
fn test_fatal_errors_are_logged() {
    let sink = Arc::new(MemorySink::new(LogLevel::Error));
    let mut mem = ArrayMemory::new();
    mem.data[0xC000] = 0x68; // PLA
    let mut cpu = Cpu6502::with_config(mem, CpuConfig::default(), sink.clone()).unwrap();
    cpu.sp = 0xFF;

    assert!(cpu.step().is_err());
    assert!(sink.contains("stack underflow"));
}

#[test]
fn test_run_stops_on_first_error() {
    use crate::Cpu;

    // INX; INX; PLA with an empty stack
    let mut cpu = cpu_with(&[0xE8, 0xE8, 0x68]);
    cpu.sp = 0xFF;

    let err = cpu.run().unwrap_err();
    assert_eq!(err, CpuError::StackUnderflow);
    assert_eq!(cpu.x, 2);
    assert_eq!(cpu.steps(), 2);
}
