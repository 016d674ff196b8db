use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emu_core::cpu_6502::{ArrayMemory, Cpu6502};

/// Tight loop at $C000 touching the common addressing modes
fn bench_program() -> ArrayMemory {
    let mut mem = ArrayMemory::new();
    mem.load_program(
        0xC000,
        &[
            0xA9, 0x42, // LDA #$42
            0x8D, 0x00, 0x02, // STA $0200
            0xA2, 0x10, // LDX #$10
            0xA0, 0x20, // LDY #$20
            0xB5, 0x10, // LDA $10,X
            0xB1, 0x20, // LDA ($20),Y
            0xE8, // INX
            0xC8, // INY
            0xCA, // DEX
            0x88, // DEY
            0x69, 0x01, // ADC #$01
            0x6A, // ROR A
            0x4C, 0x00, 0xC0, // JMP $C000
        ],
    );
    mem
}

fn bench_cpu_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_6502_step");

    group.bench_function("single_instruction", |b| {
        let mut cpu = Cpu6502::new(bench_program());
        b.iter(|| {
            cpu.step().ok();
            black_box(cpu.a);
        });
    });

    group.finish();
}

fn bench_cpu_multiple_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_6502_multiple_steps");

    for step_count in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(step_count),
            step_count,
            |b, &count| {
                let mut cpu = Cpu6502::new(bench_program());
                b.iter(|| {
                    for _ in 0..count {
                        cpu.step().ok();
                    }
                    black_box(cpu.steps());
                });
            },
        );
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let cpu = Cpu6502::new(bench_program());

    c.bench_function("cpu_6502_decode_loop", |b| {
        b.iter(|| {
            let mut pc = 0xC000u16;
            while pc < 0xC017 {
                match cpu.decode_at(black_box(pc)) {
                    Ok(instruction) => pc = instruction.next_pc,
                    Err(_) => break,
                }
            }
            black_box(pc);
        });
    });
}

fn bench_cpu_reset(c: &mut Criterion) {
    c.bench_function("cpu_6502_reset", |b| {
        let mut cpu = Cpu6502::new(bench_program());
        b.iter(|| {
            cpu.reset().ok();
            black_box(cpu.pc);
        });
    });
}

criterion_group!(
    benches,
    bench_cpu_step,
    bench_cpu_multiple_steps,
    bench_decode,
    bench_cpu_reset
);
criterion_main!(benches);
