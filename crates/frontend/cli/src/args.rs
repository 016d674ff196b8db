//! Command-line flags. Anything given here overrides the settings file.

use std::path::PathBuf;

use clap::Parser;

use emu_core::cpu_6502::{DecodeMode, StartAddress};
use emu_core::logging::LogLevel;

use crate::settings::{parse_hex_u16, Settings};

#[derive(Debug, Parser)]
#[command(name = "hemu", about = "6502 interpreter for NES cartridge images")]
pub struct Args {
    /// iNES image to run (defaults to the settings file, then nestest.nes)
    pub rom: Option<String>,

    /// Settings file (default: hemu.json next to the binary)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pre-scan the ROM and step through it interactively
    #[arg(long, default_value_t = false)]
    pub disassemble: bool,

    /// Treat unknown opcodes as fatal
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Start at the address stored at $FFFC
    #[arg(long, default_value_t = false, conflicts_with = "start")]
    pub reset_vector: bool,

    /// Start at a fixed hex address
    #[arg(long, value_parser = parse_address)]
    pub start: Option<u16>,

    /// Add a breakpoint (repeatable)
    #[arg(long = "break", value_parser = parse_address)]
    pub breakpoints: Vec<u16>,

    /// off, error, warn, info, debug or trace
    #[arg(long, value_parser = parse_level)]
    pub log_level: Option<LogLevel>,

    /// Write log output to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log every executed instruction
    #[arg(long, default_value_t = false)]
    pub trace: bool,

    /// Write pt0.png and pt1.png into this directory
    #[arg(long)]
    pub pattern_tables: Option<PathBuf>,
}

fn parse_address(s: &str) -> Result<u16, String> {
    parse_hex_u16(s).ok_or_else(|| format!("'{}' is not a 16-bit hex address", s))
}

fn parse_level(s: &str) -> Result<LogLevel, String> {
    LogLevel::from_str(s).ok_or_else(|| format!("unknown log level '{}'", s))
}

impl Args {
    /// Fold the flags into `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if self.strict {
            settings.cpu.decode = DecodeMode::Strict;
        }
        if self.reset_vector {
            settings.cpu.start = StartAddress::ResetVector;
        }
        if let Some(start) = self.start {
            settings.cpu.start = StartAddress::Fixed(start);
        }
        if let Some(level) = self.log_level {
            settings.log_level = level;
        }
        if let Some(path) = &self.log_file {
            settings.log_file = Some(path.clone());
        }
        if self.trace {
            settings.categories.insert("cpu".to_string(), LogLevel::Trace);
            settings.rate_limit = 0;
        }
        if self.rom.is_some() {
            settings.rom_path = self.rom.clone();
        }
        settings
            .breakpoints
            .extend(self.breakpoints.iter().map(|bp| format!("{:04X}", bp)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("hemu").chain(args.iter().copied()))
    }

    #[test]
    fn no_arguments() {
        let args = parse(&[]).unwrap();
        assert!(args.rom.is_none());
        assert!(!args.disassemble);
        assert!(args.breakpoints.is_empty());
        assert!(args.log_level.is_none());
    }

    #[test]
    fn flags_and_rom_path() {
        let args = parse(&[
            "--disassemble",
            "--break",
            "C5F5",
            "--break",
            "$C000",
            "--log-level",
            "debug",
            "game.nes",
            "--trace",
        ])
        .unwrap();

        assert!(args.disassemble);
        assert!(args.trace);
        assert_eq!(args.breakpoints, vec![0xC5F5, 0xC000]);
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.rom.as_deref(), Some("game.nes"));
    }

    #[test]
    fn bad_arguments() {
        assert!(parse(&["--start"]).is_err());
        assert!(parse(&["--start", "nope"]).is_err());
        assert!(parse(&["--log-level", "loud"]).is_err());
        assert!(parse(&["--fast"]).is_err());
        assert!(parse(&["--reset-vector", "--start", "8000"]).is_err());
    }

    #[test]
    fn flags_override_settings() {
        let mut settings = Settings {
            breakpoints: vec!["C000".to_string()],
            ..Settings::default()
        };
        let args = parse(&["--strict", "--start", "8000", "--trace", "--break", "c123"]).unwrap();

        args.apply(&mut settings);

        assert_eq!(settings.cpu.decode, DecodeMode::Strict);
        assert_eq!(settings.cpu.start, StartAddress::Fixed(0x8000));
        assert_eq!(settings.categories.get("cpu"), Some(&LogLevel::Trace));
        assert_eq!(settings.rate_limit, 0);
        assert_eq!(settings.breakpoint_addresses(), vec![0xC000, 0xC123]);
    }

    #[test]
    fn reset_vector_flag() {
        let mut settings = Settings::default();
        parse(&["--reset-vector"]).unwrap().apply(&mut settings);
        assert_eq!(settings.cpu.start, StartAddress::ResetVector);
    }
}
