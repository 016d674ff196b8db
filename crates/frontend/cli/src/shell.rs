//! Interactive stepping loop for `--disassemble`.

use std::io::{self, BufRead, Write};

use emu_core::logging::{log, LogCategory, LogLevel};
use emu_nes::{Debugger, Disassembler, NesError, NesSystem};

use crate::settings::parse_hex_u16;

/// Upper bound on instructions per `c` command so the prompt comes back.
pub const CONTINUE_LIMIT: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Step,
    Continue,
    Break(u16),
    Quit,
    Invalid,
}

impl Command {
    /// Enter steps, `c` continues, `b XXXX` sets a breakpoint, `q` quits.
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (None, _) => Command::Step,
            (Some("s"), None) => Command::Step,
            (Some("c"), None) => Command::Continue,
            (Some("q"), None) => Command::Quit,
            (Some("b"), Some(addr)) => parse_hex_u16(addr)
                .map(Command::Break)
                .unwrap_or(Command::Invalid),
            _ => Command::Invalid,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Nes(#[from] NesError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub fn run(system: &mut NesSystem, breakpoints: &[u16]) -> Result<(), ShellError> {
    let disassembler = Disassembler::prescan(system.cpu()?.core());
    log(system.sink().as_ref(), LogCategory::Disassembly, LogLevel::Info, || {
        format!(
            "Disassembly: {} instructions from ${:04X}",
            disassembler.len(),
            disassembler.start_pc()
        )
    });

    let mut debugger = Debugger::new(disassembler);
    for &bp in breakpoints {
        debugger.add_breakpoint(bp);
    }

    let cpu = system.cpu()?;
    println!("{}", cpu.state());
    println!("next: {}", cpu.decode_at(cpu.pc()).map_err(NesError::from)?);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        let report = match Command::parse(&line) {
            Command::Step => debugger.step(system)?,
            Command::Continue => debugger.continue_until_breakpoint(system, CONTINUE_LIMIT)?,
            Command::Break(addr) => {
                debugger.add_breakpoint(addr);
                println!("breakpoint set at ${:04X}", addr);
                continue;
            }
            Command::Quit => return Ok(()),
            Command::Invalid => {
                println!("commands: <enter> step, c continue, b XXXX breakpoint, q quit");
                continue;
            }
        };
        println!("{}", report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("\n"), Command::Step);
        assert_eq!(Command::parse("s"), Command::Step);
        assert_eq!(Command::parse("c\n"), Command::Continue);
        assert_eq!(Command::parse("b C5F5"), Command::Break(0xC5F5));
        assert_eq!(Command::parse("b $c000"), Command::Break(0xC000));
        assert_eq!(Command::parse("b"), Command::Invalid);
        assert_eq!(Command::parse("b zz"), Command::Invalid);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse("run"), Command::Invalid);
    }
}
