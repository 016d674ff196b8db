//! Trace-sink logging for the emulator.
//!
//! Components never reach for a process-wide logger. Whoever builds a CPU or a
//! bus hands it a [`SharedSink`], and every diagnostic goes through that sink.
//!
//! # Architecture
//!
//! - **TraceSink**: the capability injected into components (`enabled` + `emit`)
//! - **Logger**: standard sink with a global level, per-category overrides,
//!   a sliding-window rate limiter and stderr/file output
//! - **NullSink** / **MemorySink**: discard everything / collect lines for tests
//! - **log()**: lazily formats a message only when the sink wants it
//!
//! File output is written by a background thread fed through a channel so the
//! stepping loop never blocks on disk I/O.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use emu_core::logging::{log, LogCategory, LogLevel, Logger, SharedSink};
//!
//! let logger = Logger::new();
//! logger.set_level(LogCategory::CPU, LogLevel::Debug);
//! let sink: SharedSink = Arc::new(logger);
//!
//! log(sink.as_ref(), LogCategory::CPU, LogLevel::Debug, || {
//!     format!("CPU: BRK at PC={:04X}", 0x1234)
//! });
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn to_u8(self) -> u8 {
        self as u8
    }

    fn from_u8(val: u8) -> Self {
        match val {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

const CATEGORY_COUNT: usize = 6;

/// Log category for different emulator components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    /// Instruction execution and the per-step trace
    CPU,
    /// Bus/memory access
    Bus,
    /// Pattern tables and CHR access
    PPU,
    /// Cartridge header parsing
    Cartridge,
    /// Disassembly pre-scan and the step debugger
    Disassembly,
    /// BRK / RTI
    Interrupts,
}

impl LogCategory {
    pub const ALL: [LogCategory; CATEGORY_COUNT] = [
        LogCategory::CPU,
        LogCategory::Bus,
        LogCategory::PPU,
        LogCategory::Cartridge,
        LogCategory::Disassembly,
        LogCategory::Interrupts,
    ];

    fn index(self) -> usize {
        match self {
            LogCategory::CPU => 0,
            LogCategory::Bus => 1,
            LogCategory::PPU => 2,
            LogCategory::Cartridge => 3,
            LogCategory::Disassembly => 4,
            LogCategory::Interrupts => 5,
        }
    }

    /// Parse a category name (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Some(LogCategory::CPU),
            "bus" => Some(LogCategory::Bus),
            "ppu" => Some(LogCategory::PPU),
            "cartridge" | "cart" => Some(LogCategory::Cartridge),
            "disassembly" | "disasm" => Some(LogCategory::Disassembly),
            "interrupts" | "irq" => Some(LogCategory::Interrupts),
            _ => None,
        }
    }
}

/// Capability handed to components that want to report what they are doing.
pub trait TraceSink: Send + Sync + fmt::Debug {
    /// Whether a message of this category/level would be kept.
    fn enabled(&self, category: LogCategory, level: LogLevel) -> bool;

    /// Record a message. Callers should check `enabled` first (see [`log`]).
    fn emit(&self, category: LogCategory, level: LogLevel, message: &str);
}

pub type SharedSink = Arc<dyn TraceSink>;

/// Log a message through `sink`, formatting it only when the sink wants it.
pub fn log<F>(sink: &dyn TraceSink, category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    if sink.enabled(category, level) {
        let message = message_fn();
        sink.emit(category, level, &message);
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NullSink {
    pub fn shared() -> SharedSink {
        Arc::new(NullSink)
    }
}

impl TraceSink for NullSink {
    fn enabled(&self, _category: LogCategory, _level: LogLevel) -> bool {
        false
    }

    fn emit(&self, _category: LogCategory, _level: LogLevel, _message: &str) {}
}

/// A message captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub category: LogCategory,
    pub level: LogLevel,
    pub message: String,
}

/// Sink that keeps every message at or below `level` in memory.
#[derive(Debug)]
pub struct MemorySink {
    level: LogLevel,
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn messages(&self, category: LogCategory) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.message.contains(needle))
    }
}

impl TraceSink for MemorySink {
    fn enabled(&self, _category: LogCategory, level: LogLevel) -> bool {
        level != LogLevel::Off && level <= self.level
    }

    fn emit(&self, category: LogCategory, level: LogLevel, message: &str) {
        self.records.lock().unwrap().push(Record {
            category,
            level,
            message: message.to_string(),
        });
    }
}

/// Rate limiter for controlling log output frequency per category
///
/// Uses a sliding window algorithm to track log timestamps and enforce
/// a maximum rate of logs per second. A limit of 0 disables limiting.
struct RateLimiter {
    max_logs_per_second: AtomicUsize,
    window_duration: Duration,
    timestamps: Mutex<[VecDeque<Instant>; CATEGORY_COUNT]>,
    dropped_counts: Mutex<[usize; CATEGORY_COUNT]>,
    last_drop_report: Mutex<[Option<Instant>; CATEGORY_COUNT]>,
}

impl RateLimiter {
    fn new(max_logs_per_second: usize) -> Self {
        Self {
            max_logs_per_second: AtomicUsize::new(max_logs_per_second),
            window_duration: Duration::from_secs(1),
            timestamps: Mutex::new(Default::default()),
            dropped_counts: Mutex::new([0; CATEGORY_COUNT]),
            last_drop_report: Mutex::new([None; CATEGORY_COUNT]),
        }
    }

    fn set_max_logs_per_second(&self, max: usize) {
        self.max_logs_per_second.store(max, Ordering::Relaxed);
    }

    fn get_max_logs_per_second(&self) -> usize {
        self.max_logs_per_second.load(Ordering::Relaxed)
    }

    /// Returns (allowed, dropped_count) where dropped_count is Some(n) if we should report drops
    fn should_allow(&self, category: LogCategory) -> (bool, Option<usize>) {
        let max_logs = self.max_logs_per_second.load(Ordering::Relaxed);
        if max_logs == 0 {
            return (true, None);
        }

        let now = Instant::now();
        let idx = category.index();

        let mut timestamps = self.timestamps.lock().unwrap();
        let mut dropped_counts = self.dropped_counts.lock().unwrap();
        let mut last_drop_report = self.last_drop_report.lock().unwrap();

        let window = &mut timestamps[idx];
        while let Some(&front) = window.front() {
            if now.duration_since(front) > self.window_duration {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() < max_logs {
            window.push_back(now);

            let dropped = dropped_counts[idx];
            if dropped > 0 {
                dropped_counts[idx] = 0;
                last_drop_report[idx] = Some(now);
                return (true, Some(dropped));
            }

            (true, None)
        } else {
            dropped_counts[idx] += 1;

            // Report dropped messages once per second
            let should_report = match last_drop_report[idx] {
                None => true,
                Some(last) => now.duration_since(last) >= Duration::from_secs(1),
            };

            if should_report {
                let dropped = dropped_counts[idx];
                dropped_counts[idx] = 0;
                last_drop_report[idx] = Some(now);
                (false, Some(dropped))
            } else {
                (false, None)
            }
        }
    }
}

/// Standard sink: level filtering, rate limiting, stderr or file output.
pub struct Logger {
    global_level: AtomicU8,
    category_levels: [AtomicU8; CATEGORY_COUNT],
    log_sender: Mutex<Option<Sender<String>>>,
    file_logging_enabled: AtomicBool,
    rate_limiter: RateLimiter,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("global_level", &self.get_global_level())
            .field("rate_limit", &self.get_rate_limit())
            .field(
                "file_logging_enabled",
                &self.file_logging_enabled.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a logger with every category off and the default rate limit (60 logs/second)
    pub fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            category_levels: Default::default(),
            log_sender: Mutex::new(None),
            file_logging_enabled: AtomicBool::new(false),
            rate_limiter: RateLimiter::new(60),
        }
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level.to_u8(), Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_levels[category.index()].store(level.to_u8(), Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.category_levels[category.index()].load(Ordering::Relaxed))
    }

    /// Check if a message should be logged for the given category and level
    ///
    /// Returns true if:
    /// 1. The category-specific level is set and >= the message level, OR
    /// 2. The category-specific level is Off AND the global level >= the message level
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Reset all logging to Off
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    /// Set the maximum logs per second per category; 0 means unlimited
    pub fn set_rate_limit(&self, max_logs_per_second: usize) {
        self.rate_limiter
            .set_max_logs_per_second(max_logs_per_second);
    }

    pub fn get_rate_limit(&self) -> usize {
        self.rate_limiter.get_max_logs_per_second()
    }

    /// Send output to `path` instead of stderr.
    ///
    /// The file is truncated, then written by a background thread so the
    /// emulation never blocks on disk I/O. Calling this again replaces the
    /// previous writer.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let (sender, receiver) = channel::<String>();

        thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    // Logging must never bring the emulator down
                    let _ = writeln!(file, "{}", message);
                    let _ = file.flush();
                }
            })?;

        let mut log_sender = self.log_sender.lock().unwrap();
        *log_sender = Some(sender);
        self.file_logging_enabled.store(true, Ordering::Relaxed);

        Ok(())
    }

    /// Stop writing to the log file and fall back to stderr
    pub fn clear_log_file(&self) {
        let mut log_sender = self.log_sender.lock().unwrap();
        *log_sender = None;
        self.file_logging_enabled.store(false, Ordering::Relaxed);
    }

    fn write_message(&self, message: &str) {
        if self.file_logging_enabled.load(Ordering::Relaxed) {
            let log_sender = self.log_sender.lock().unwrap();
            match log_sender.as_ref() {
                Some(sender) if sender.send(message.to_string()).is_ok() => {}
                _ => eprintln!("{}", message),
            }
        } else {
            eprintln!("{}", message);
        }
    }
}

impl TraceSink for Logger {
    fn enabled(&self, category: LogCategory, level: LogLevel) -> bool {
        self.should_log(category, level)
    }

    fn emit(&self, category: LogCategory, _level: LogLevel, message: &str) {
        let (allowed, dropped_count) = self.rate_limiter.should_allow(category);

        if let Some(count) = dropped_count {
            if count > 0 {
                let warning = format!(
                    "[{:?}] WARNING: Rate limit exceeded, {} log message(s) dropped in the last second",
                    category, count
                );
                self.write_message(&warning);
            }
        }

        if allowed {
            self.write_message(message);
        }
    }
}
