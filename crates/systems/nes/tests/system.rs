mod common;

use std::sync::Arc;

use emu_core::cpu_6502::{CpuConfig, CpuError, DecodeMode, StartAddress};
use emu_core::logging::{LogCategory, LogLevel, MemorySink, NullSink};
use emu_nes::{NesError, NesSystem};

use common::nrom_image;

fn system_with(program: &[u8]) -> NesSystem {
    let mut system = NesSystem::new(NullSink::shared(), CpuConfig::default());
    system.load_rom_bytes(&nrom_image(program)).unwrap();
    system
}

#[test]
fn starts_at_c000_with_fixed_state() {
    let system = system_with(&[0xEA]);
    let state = system.state().unwrap();

    assert_eq!(state.pc, 0xC000);
    assert_eq!(state.sp, 0xFD);
    assert_eq!(state.p, 0x24);
}

#[test]
fn reset_vector_start_reads_fffc() {
    let mut image = nrom_image(&[0xEA]);
    // Point the reset vector at $C123
    image[16 + 0x3FFC] = 0x23;
    image[16 + 0x3FFD] = 0xC1;

    let config = CpuConfig {
        start: StartAddress::ResetVector,
        ..CpuConfig::default()
    };
    let mut system = NesSystem::new(NullSink::shared(), config);
    system.load_rom_bytes(&image).unwrap();

    assert_eq!(system.state().unwrap().pc, 0xC123);
}

#[test]
fn runs_until_stack_underflow() {
    let program = [
        0xA9, 0x42, // LDA #$42
        0x8D, 0x00, 0x02, // STA $0200
        0xA2, 0x05, // LDX #$05
        0xCA, // DEX
        0xD0, 0xFD, // BNE -3
        0xA2, 0xFF, // LDX #$FF
        0x9A, // TXS
        0x68, // PLA
    ];
    let mut system = system_with(&program);

    let err = match system.run() {
        Err(err) => err,
        Ok(never) => match never {},
    };
    assert!(matches!(err, NesError::Cpu(CpuError::StackUnderflow)));

    let cpu = system.cpu().unwrap();
    assert_eq!(cpu.state().a, 0x42);
    assert_eq!(cpu.state().x, 0xFF);
    assert_eq!(cpu.bus().ram()[0x0200], 0x42);
    // 3 setup + 5 DEX/BNE pairs + LDX + TXS
    assert_eq!(cpu.steps(), 3 + 10 + 2);
}

#[test]
fn code_can_patch_prg() {
    let program = [
        0xA9, 0xE8, // LDA #$E8 (INX)
        0x8D, 0x06, 0xC0, // STA $C006
        0xEA, // NOP, about to be skipped over
        0xEA, // patched to INX
    ];
    let mut system = system_with(&program);

    for _ in 0..4 {
        system.step().unwrap();
    }
    assert_eq!(system.state().unwrap().x, 1);
    // Only the $C000 mirror of the bank was written
    assert_eq!(system.rom().unwrap().prg[0x4006], 0xE8);
    assert_eq!(system.rom().unwrap().prg[0x0006], 0xEA);
}

#[test]
fn trace_lines_use_fixed_columns() {
    let sink = Arc::new(MemorySink::new(LogLevel::Trace));
    let mut system = NesSystem::new(sink.clone(), CpuConfig::default());
    system.load_rom_bytes(&nrom_image(&[0xA2, 0x10, 0xE8])).unwrap();

    system.step().unwrap();
    system.step().unwrap();

    let lines = sink.messages(LogCategory::CPU);
    assert_eq!(
        lines,
        [
            "[PC: C000] OPCODE A2 | A:00 X:00 Y:00 P:24 SP:FD | LDX #$10",
            "[PC: C002] OPCODE E8 | A:00 X:10 Y:00 P:24 SP:FD | INX",
        ]
    );
}

#[test]
fn strict_decoding_rejects_unknown_opcodes() {
    let config = CpuConfig {
        decode: DecodeMode::Strict,
        ..CpuConfig::default()
    };
    let mut system = NesSystem::new(NullSink::shared(), config);
    system.load_rom_bytes(&nrom_image(&[0xEA, 0x02])).unwrap();

    system.step().unwrap();
    assert!(matches!(
        system.step(),
        Err(NesError::Cpu(CpuError::UnknownOpcode {
            opcode: 0x02,
            pc: 0xC001
        }))
    ));
}

#[test]
fn lenient_decoding_reports_unknown_opcodes() {
    let sink = Arc::new(MemorySink::new(LogLevel::Warn));
    let mut system = NesSystem::new(sink.clone(), CpuConfig::default());
    system.load_rom_bytes(&nrom_image(&[0x02, 0xE8])).unwrap();

    system.step().unwrap();
    system.step().unwrap();
    assert_eq!(system.state().unwrap().x, 1);
    assert!(sink.contains("unknown opcode $02"));
}

#[test]
fn halt_is_logged_once_at_error() {
    let sink = Arc::new(MemorySink::new(LogLevel::Error));
    let mut system = NesSystem::new(sink.clone(), CpuConfig::default());
    // LDX #$FF / TXS / PLA
    system.load_rom_bytes(&nrom_image(&[0xA2, 0xFF, 0x9A, 0x68])).unwrap();

    assert!(system.run().is_err());

    let errors: Vec<_> = sink
        .records()
        .into_iter()
        .filter(|r| r.level == LogLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category, LogCategory::CPU);
    assert!(errors[0].message.starts_with("CPU: halted at PC=C003"));
    assert!(errors[0].message.ends_with("stack underflow: pull with SP=$FF"));
}

#[test]
fn no_cartridge() {
    let mut system = NesSystem::new(NullSink::shared(), CpuConfig::default());

    assert!(matches!(system.step(), Err(NesError::NoCartridge)));
    assert_eq!(system.debug_state()["loaded"], false);
}

#[test]
fn bad_image_is_rejected() {
    let mut system = NesSystem::new(NullSink::shared(), CpuConfig::default());
    let mut image = nrom_image(&[]);
    image.truncate(100);

    assert!(matches!(
        system.load_rom_bytes(&image),
        Err(NesError::Cartridge(_))
    ));
}

#[test]
fn debug_state_reports_cpu_and_cartridge() {
    let system = system_with(&[0xA9, 0x01]);
    let state = system.debug_state();

    assert_eq!(state["cpu"]["pc"], 0xC000);
    assert_eq!(state["cpu"]["sp"], 0xFD);
    assert_eq!(state["next_instruction"], "LDA #$01");
    assert_eq!(state["cartridge"]["prg_rom_size"], 0x4000);
    assert_eq!(state["cartridge"]["mirroring"], "Vertical");
}

#[test]
fn pattern_tables_render_from_chr() {
    let mut image = nrom_image(&[]);
    let chr_start = 16 + 0x4000;
    image[chr_start] = 0x80;
    let mut system = NesSystem::new(NullSink::shared(), CpuConfig::default());
    system.load_rom_bytes(&image).unwrap();

    let ppu = system.ppu().unwrap();
    let frame = ppu.render_pattern_table(0);
    assert_eq!(frame.get(0, 0), Some(0xFFFFFFFF));
    assert_eq!(frame.get(1, 0), Some(0x00000000));
}
