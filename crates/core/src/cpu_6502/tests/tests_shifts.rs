//! Tests for shift and rotate instructions

use super::cpu_with;
use crate::cpu_6502::{FLAG_CARRY, FLAG_NEGATIVE, FLAG_ZERO};

#[test]
fn test_ror_nine_times_is_identity() {
    // Nine rotates through carry cycle all nine bits back into place
    let mut cpu = cpu_with(&[0x6A; 9]);
    cpu.a = 0xAA;

    for _ in 0..9 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.a, 0xAA);
    assert!(!cpu.get_flag(FLAG_CARRY));
}

#[test]
fn test_rol_nine_times_is_identity() {
    let mut cpu = cpu_with(&[0x2A; 9]);
    cpu.a = 0xAA;

    for _ in 0..9 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.a, 0xAA);
    assert!(!cpu.get_flag(FLAG_CARRY));
}

#[test]
fn test_asl_accumulator() {
    let mut cpu = cpu_with(&[0x0A, 0x0A]);
    cpu.a = 0xFF;

    cpu.step().unwrap();
    assert_eq!(cpu.a, 0xFE);
    assert!(cpu.get_flag(FLAG_CARRY));
    assert!(cpu.get_flag(FLAG_NEGATIVE));
    assert!(!cpu.get_flag(FLAG_ZERO));

    cpu.a = 0x00;
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x00);
    assert!(!cpu.get_flag(FLAG_CARRY));
    assert!(cpu.get_flag(FLAG_ZERO));
}

#[test]
fn test_lsr_memory() {
    // LSR $40
    let mut cpu = cpu_with(&[0x46, 0x40]);
    cpu.memory.data[0x0040] = 0x01;

    cpu.step().unwrap();
    assert_eq!(cpu.memory.data[0x0040], 0x00);
    assert!(cpu.get_flag(FLAG_CARRY));
    assert!(cpu.get_flag(FLAG_ZERO));
    assert!(!cpu.get_flag(FLAG_NEGATIVE));
}

#[test]
fn test_rol_uses_carry_in() {
    // SEC; ROL A
    let mut cpu = cpu_with(&[0x38, 0x2A]);
    cpu.a = 0x40;

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x81);
    assert!(!cpu.get_flag(FLAG_CARRY));
    assert!(cpu.get_flag(FLAG_NEGATIVE));
}

#[test]
fn test_ror_absolute_x() {
    // SEC; ROR $0300,X
    let mut cpu = cpu_with(&[0x38, 0x7E, 0x00, 0x03]);
    cpu.x = 0x05;
    cpu.memory.data[0x0305] = 0x02;

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.memory.data[0x0305], 0x81);
    assert!(!cpu.get_flag(FLAG_CARRY));
}

#[test]
fn test_ror_rol_zero_page_full_cycle() {
    // ROR $10 x9, then ROL $10 x9
    let mut program = Vec::new();
    for _ in 0..9 {
        program.extend_from_slice(&[0x66, 0x10]);
    }
    for _ in 0..9 {
        program.extend_from_slice(&[0x26, 0x10]);
    }
    let mut cpu = cpu_with(&program);
    cpu.memory.data[0x0010] = 0xAA;

    for _ in 0..9 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.memory.data[0x0010], 0xAA);

    for _ in 0..9 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.memory.data[0x0010], 0xAA);
    assert!(!cpu.get_flag(FLAG_CARRY));
}
