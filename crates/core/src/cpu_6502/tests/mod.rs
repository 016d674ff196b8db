//! CPU tests, split by topic.

mod tests_decode;
mod tests_shifts;

use super::{ArrayMemory, Cpu6502};

/// CPU with `program` loaded at the default start address `$C000`.
pub(super) fn cpu_with(program: &[u8]) -> Cpu6502<ArrayMemory> {
    let mut mem = ArrayMemory::new();
    mem.load_program(0xC000, program);
    Cpu6502::new(mem)
}
