//! Core emulator primitives: the 6502 CPU core, trace-sink logging and the
//! tile decoder shared by system crates.

use std::convert::Infallible;

pub mod cpu_6502;
pub mod logging;
pub mod ppu;

pub mod types {
    use serde::{Deserialize, Serialize};

    /// An ARGB8888 framebuffer.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u32>,
    }

    impl Frame {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; (width * height) as usize],
            }
        }

        /// Set a pixel; coordinates outside the frame are ignored.
        pub fn set(&mut self, x: u32, y: u32, color: u32) {
            if x < self.width && y < self.height {
                self.pixels[(y * self.width + x) as usize] = color;
            }
        }

        pub fn get(&self, x: u32, y: u32) -> Option<u32> {
            if x < self.width && y < self.height {
                Some(self.pixels[(y * self.width + x) as usize])
            } else {
                None
            }
        }
    }
}

/// A CPU-like component that retires one instruction per `step`.
pub trait Cpu {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Restore the configured power-on state (memory is preserved).
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Decode and execute exactly one instruction.
    fn step(&mut self) -> Result<(), Self::Error>;

    /// Step forever. The loop has no termination condition of its own and
    /// only returns when a step fails.
    fn run(&mut self) -> Result<Infallible, Self::Error> {
        loop {
            self.step()?;
        }
    }
}
