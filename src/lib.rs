//! Random map assembly engine for tile-based tactical maps
//!
//! Hand-authored map pieces ("tiles") declare a solid footprint and per-cell
//! edge connectors. An assembly recipe declares the grid extent, how many
//! copies of each tile may appear, and any fixed placements. The engine
//! searches for a tiling that covers the whole grid while satisfying every
//! connector constraint, using backtracking over required tiles followed by a
//! gap-coverage search with aggressive candidate elimination, optionally
//! raced across worker threads.

#![forbid(unsafe_code)]

/// Search state and the assembly solver: grid, placement engine, required-tile
/// search, gap-coverage search, and the parallel orchestrator
pub mod assembly;
/// Read-only map-theme data: cell masks, tiles, assemblies, and the UMP parser
pub mod catalog;
/// Input/output operations, configuration constants and error handling
pub mod io;

pub use io::error::{AssemblyError, Result};
