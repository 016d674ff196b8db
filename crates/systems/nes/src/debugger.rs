//! Disassembly pre-scan and a step debugger built on top of it.
//!
//! The listing produced by [`Disassembler::prescan`] is for display only.
//! Execution always decodes at the live PC, since indirect targets and
//! self-modifying code can make a cached entry stale.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use emu_core::cpu_6502::{Cpu6502, CpuState, Instruction, Memory6502};
use emu_core::logging::{log, LogCategory, LogLevel};

use crate::memory_dump::MemoryDump;
use crate::{NesError, NesSystem};

/// Entries shown after the current PC in a [`StepReport`].
pub const LOOKAHEAD: usize = 10;

/// One decoded instruction per address, in address order.
#[derive(Debug, Clone, Default)]
pub struct Disassembler {
    start_pc: u16,
    listing: BTreeMap<u16, Instruction>,
}

impl Disassembler {
    /// Decode forward from the CPU's PC without executing anything, until the
    /// address space is exhausted or the bus refuses a read.
    pub fn prescan<M: Memory6502>(cpu: &Cpu6502<M>) -> Self {
        let start_pc = cpu.pc;
        let mut listing = BTreeMap::new();
        let mut pc = start_pc;

        while pc < 0xFFFF {
            let instruction = match cpu.decode_at(pc) {
                Ok(instruction) => instruction,
                Err(err) => {
                    log(cpu.sink().as_ref(), LogCategory::Disassembly, LogLevel::Debug, || {
                        format!("Disassembly: stopped at ${:04X}: {}", pc, err)
                    });
                    break;
                }
            };
            log(cpu.sink().as_ref(), LogCategory::Disassembly, LogLevel::Debug, || {
                format!("[{:04X}] {}", pc, instruction)
            });
            listing.insert(pc, instruction);

            // Instruction ran off the end of the address space
            if instruction.next_pc <= pc {
                break;
            }
            pc = instruction.next_pc;
        }

        Self { start_pc, listing }
    }

    pub fn start_pc(&self) -> u16 {
        self.start_pc
    }

    pub fn listing(&self) -> &BTreeMap<u16, Instruction> {
        &self.listing
    }

    pub fn get(&self, pc: u16) -> Option<&Instruction> {
        self.listing.get(&pc)
    }

    pub fn len(&self) -> usize {
        self.listing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listing.is_empty()
    }
}

impl fmt::Display for Disassembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, instruction) in &self.listing {
            writeln!(f, "[{:04X}] {}", pc, instruction)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingLine {
    pub pc: u16,
    pub text: String,
}

impl From<&Instruction> for ListingLine {
    fn from(instruction: &Instruction) -> Self {
        Self {
            pc: instruction.pc,
            text: instruction.text(),
        }
    }
}

/// What happened in one debugger command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// The last instruction executed.
    pub executed: ListingLine,
    pub state: CpuState,
    /// Up to [`LOOKAHEAD`] instructions starting at the new PC.
    pub upcoming: Vec<ListingLine>,
    pub memory: MemoryDump,
    pub breakpoint_hit: bool,
    /// Instructions executed by this command.
    pub steps: u64,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.state)?;
        writeln!(
            f,
            "\x1b[1;33m[{:04X}] {}\x1b[0m",
            self.executed.pc, self.executed.text
        )?;
        for line in &self.upcoming {
            writeln!(f, "[{:04X}] {}", line.pc, line.text)?;
        }
        if self.breakpoint_hit {
            writeln!(f, "breakpoint at ${:04X}", self.state.pc)?;
        }
        write!(f, "{}", self.memory)
    }
}

/// Step debugger. Owns the listing and breakpoints; the system is borrowed
/// mutably for the duration of each command.
#[derive(Debug, Clone, Default)]
pub struct Debugger {
    disassembler: Disassembler,
    breakpoints: BTreeSet<u16>,
}

impl Debugger {
    pub fn new(disassembler: Disassembler) -> Self {
        Self {
            disassembler,
            breakpoints: BTreeSet::new(),
        }
    }

    pub fn disassembler(&self) -> &Disassembler {
        &self.disassembler
    }

    pub fn add_breakpoint(&mut self, pc: u16) -> bool {
        self.breakpoints.insert(pc)
    }

    pub fn breakpoints(&self) -> &BTreeSet<u16> {
        &self.breakpoints
    }

    /// Execute exactly one instruction.
    pub fn step(&mut self, system: &mut NesSystem) -> Result<StepReport, NesError> {
        let executed = Self::step_once(system)?;
        self.report(system, executed, 1)
    }

    /// Execute at least one instruction, then keep going until PC lands on a
    /// breakpoint or `max_steps` instructions have run.
    pub fn continue_until_breakpoint(
        &mut self,
        system: &mut NesSystem,
        max_steps: u64,
    ) -> Result<StepReport, NesError> {
        let mut executed = Self::step_once(system)?;
        let mut steps = 1;

        while steps < max_steps && !self.breakpoints.contains(&system.cpu()?.pc()) {
            executed = Self::step_once(system)?;
            steps += 1;
        }

        self.report(system, executed, steps)
    }

    fn step_once(system: &mut NesSystem) -> Result<Instruction, NesError> {
        let cpu = system.cpu()?;
        let instruction = cpu.decode_at(cpu.pc())?;
        system.step()?;
        Ok(instruction)
    }

    fn report(
        &self,
        system: &NesSystem,
        executed: Instruction,
        steps: u64,
    ) -> Result<StepReport, NesError> {
        let cpu = system.cpu()?;
        let state = cpu.state();

        let mut upcoming = Vec::with_capacity(LOOKAHEAD);
        let mut pc = state.pc;
        for _ in 0..LOOKAHEAD {
            let instruction = match self.disassembler.get(pc) {
                Some(cached) => *cached,
                None => match cpu.decode_at(pc) {
                    Ok(live) => live,
                    Err(_) => break,
                },
            };
            upcoming.push(ListingLine::from(&instruction));
            if instruction.next_pc <= pc {
                break;
            }
            pc = instruction.next_pc;
        }

        Ok(StepReport {
            executed: ListingLine::from(&executed),
            state,
            upcoming,
            memory: MemoryDump::new(cpu.bus()),
            breakpoint_hit: self.breakpoints.contains(&state.pc),
            steps,
        })
    }
}
