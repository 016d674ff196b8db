use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use emu_core::cpu_6502::CpuConfig;
use emu_core::logging::{LogCategory, LogLevel, Logger};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "hemu.json";

fn default_rate_limit() -> usize {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cpu: CpuConfig,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
    /// Per-category overrides, keyed by category name ("cpu", "bus", ...)
    #[serde(default)]
    pub categories: BTreeMap<String, LogLevel>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_rate_limit")]
    pub rate_limit: usize,
    /// Breakpoints as hex addresses ("C5F5")
    #[serde(default)]
    pub breakpoints: Vec<String>,
    /// ROM loaded when none is given on the command line
    #[serde(default)]
    pub rom_path: Option<String>,
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cpu: CpuConfig::default(),
            log_level: default_log_level(),
            categories: BTreeMap::new(),
            log_file: None,
            rate_limit: default_rate_limit(),
            breakpoints: Vec::new(),
            rom_path: None,
        }
    }
}

impl Settings {
    /// Get the config file path relative to the executable
    pub fn config_path() -> PathBuf {
        let mut path = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        path.push(CONFIG_FILE);
        path
    }

    /// Load settings from `path`, falling back to defaults on error
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            // Missing file: defaults
            Err(_) => Self::default(),
        }
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Breakpoint addresses; entries that are not valid hex are skipped.
    pub fn breakpoint_addresses(&self) -> Vec<u16> {
        self.breakpoints
            .iter()
            .filter_map(|s| parse_hex_u16(s))
            .collect()
    }

    /// Build the logger these settings describe.
    pub fn build_logger(&self) -> std::io::Result<Logger> {
        let logger = Logger::new();
        logger.set_global_level(self.log_level);
        for (name, level) in &self.categories {
            match LogCategory::from_str(name) {
                Some(category) => logger.set_level(category, *level),
                None => eprintln!("Warning: unknown log category '{}'", name),
            }
        }
        logger.set_rate_limit(self.rate_limit);
        if let Some(path) = &self.log_file {
            logger.set_log_file(path.clone())?;
        }
        Ok(logger)
    }
}

/// Parse `C000`, `$C000` or `0xC000`.
pub fn parse_hex_u16(s: &str) -> Option<u16> {
    let s = s.trim();
    let digits = s
        .strip_prefix('$')
        .or_else(|| s.strip_prefix("0x"))
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).ok()
}
