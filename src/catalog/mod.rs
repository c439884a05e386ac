//! Read-only map-theme data
//!
//! This module contains everything parsed out of a theme definition:
//! - Cell compatibility masks
//! - Tile, tile set and assembly definitions
//! - The UMP text-format parser

/// Cell compatibility bitmask and its combination rules
pub mod mask;
/// Tile, tile set, assembly and theme definitions
pub mod tile;
/// Parser for the UMP theme definition format
pub mod ump;

pub use mask::CellMask;
pub use tile::{Assembly, FixedTile, MapTheme, Tile, TileSet};
