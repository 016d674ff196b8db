//! Reusable building blocks for tile-based video hardware.
//!
//! System crates map the decoded 2-bit shades to colors when rendering
//! pattern data into a [`crate::types::Frame`].

pub mod tile;

pub use tile::{decode_pattern_table, decode_tile, Nes2BppDecoder, PatternTable, Tile, TileDecoder};
