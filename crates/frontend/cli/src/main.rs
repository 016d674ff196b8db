mod args;
mod export;
mod settings;
mod shell;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use emu_core::logging::{log, LogCategory, LogLevel, SharedSink};
use emu_nes::NesSystem;

use args::Args;
use export::save_png;
use settings::Settings;

const DEFAULT_ROM: &str = "nestest.nes";

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    args.apply(&mut settings);

    let logger = settings
        .build_logger()
        .context("cannot open log file")?;
    let sink: SharedSink = Arc::new(logger);

    let rom_path = settings.rom_path.as_deref().unwrap_or(DEFAULT_ROM);
    let mut system = NesSystem::new(sink, settings.cpu);
    system
        .load_rom_from_path(rom_path)
        .with_context(|| format!("cannot load {}", rom_path))?;

    if let Some(dir) = &args.pattern_tables {
        export_pattern_tables(&system, dir)?;
    }

    if args.disassemble {
        shell::run(&mut system, &settings.breakpoint_addresses())?;
        return Ok(());
    }

    // The core has already logged the halt through the sink
    match system.run() {
        Ok(never) => match never {},
        Err(e) => Err(e.into()),
    }
}

fn export_pattern_tables(system: &NesSystem, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

    let ppu = system.ppu()?;
    for (index, name) in ["pt0.png", "pt1.png"].iter().enumerate() {
        let path = dir.join(name);
        save_png(&ppu.render_pattern_table(index), &path)?;
        log(system.sink().as_ref(), LogCategory::PPU, LogLevel::Info, || {
            format!("PPU: pattern table {} written to {}", index, path.display())
        });
    }
    Ok(())
}
