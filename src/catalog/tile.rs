//! Tile, tile set, assembly and theme definitions
//!
//! All of these are parsed once per theme load and read-only afterwards.
//! Tile cells are stored bottom row first: the textual definition lists the
//! top row first, so the parser fills rows in reverse.

use crate::catalog::mask::CellMask;
use crate::io::configuration::MAX_TILE_EXTENT;
use crate::io::error::{AssemblyError, Result};

/// One authored map piece with its footprint and connector requirements
#[derive(Clone, Debug)]
pub struct Tile {
    /// The id of the tile as defined in the theme file
    pub id: String,
    /// Width in grid cells
    pub width: usize,
    /// Height in grid cells
    pub height: usize,
    /// Number of solid cells
    pub area: usize,
    /// Per-cell masks, row-major with row 0 at the bottom
    cells: Vec<CellMask>,
}

impl Tile {
    /// Create a tile from its cell masks
    ///
    /// # Errors
    ///
    /// Returns an error if either extent exceeds the supported tile size or
    /// the cell count doesn't match the declared extent.
    pub fn new(id: &str, width: usize, height: usize, cells: Vec<CellMask>) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_TILE_EXTENT || height > MAX_TILE_EXTENT {
            return Err(AssemblyError::TileSize {
                file: String::new(),
                id: id.to_string(),
                width,
                height,
            });
        }
        if cells.len() != width * height {
            return Err(AssemblyError::Syntax {
                file: String::new(),
                reason: format!(
                    "tile '{id}' has {} cells for a {width}x{height} extent",
                    cells.len()
                ),
            });
        }
        let area = cells.iter().filter(|c| c.is_solid()).count();
        Ok(Self {
            id: id.to_string(),
            width,
            height,
            area,
            cells,
        })
    }

    /// Mask of the cell at tile-local coordinates
    pub fn cell(&self, x: usize, y: usize) -> CellMask {
        self.cells[y * self.width + x]
    }
}

/// A named list of tile ids to randomly pick from inside assembly rules
#[derive(Clone, Debug)]
pub struct TileSet {
    /// The id of the tile set
    pub id: String,
    /// Ids of the member tiles; each must resolve to a tile definition
    pub tiles: Vec<String>,
}

/// A fixed placement inside an assembly
#[derive(Clone, Copy, Debug)]
pub struct FixedTile {
    /// Index of the tile in the theme catalogue
    pub tile: usize,
    /// Grid x position
    pub x: usize,
    /// Grid y position
    pub y: usize,
}

/// One named map-layout recipe
#[derive(Clone, Debug)]
pub struct Assembly {
    /// The id of the assembly as defined in the theme file
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Grid extent in x
    pub width: usize,
    /// Grid extent in y
    pub height: usize,
    /// Grid step in x; positions not on the step are never probed
    pub dx: usize,
    /// Grid step in y
    pub dy: usize,
    /// Minimum placement count per catalogue tile index
    pub min: Vec<usize>,
    /// Maximum placement count per catalogue tile index
    pub max: Vec<usize>,
    /// Fixed placements, applied before the search starts
    pub fixed: Vec<FixedTile>,
    /// Seeds known to produce a solution, tried when a random seed fails
    pub seeds: Vec<u64>,
}

impl Assembly {
    /// Create an empty assembly with default extent and grid step
    pub fn new(id: &str, num_tiles: usize) -> Self {
        Self {
            id: id.to_string(),
            title: String::new(),
            width: 8,
            height: 8,
            dx: 1,
            dy: 1,
            min: vec![0; num_tiles],
            max: vec![0; num_tiles],
            fixed: Vec::new(),
            seeds: Vec::new(),
        }
    }

    /// Number of grid positions in the assembly extent
    pub const fn size(&self) -> usize {
        self.width * self.height
    }
}

/// The full read-only catalogue of one map theme
#[derive(Clone, Debug, Default)]
pub struct MapTheme {
    /// Theme name, used in diagnostics
    pub name: String,
    /// Base path prefixed to the emitted tile string
    pub base_path: String,
    /// Combined connector bits of the line-forming tiles (rivers, roads)
    pub line_flags: CellMask,
    /// Parsed tile definitions
    pub tiles: Vec<Tile>,
    /// Parsed tile sets
    pub tile_sets: Vec<TileSet>,
    /// Parsed assembly definitions
    pub assemblies: Vec<Assembly>,
}

impl MapTheme {
    /// Create an empty theme
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            line_flags: CellMask::NONE,
            ..Self::default()
        }
    }

    /// Look up a tile by id
    pub fn tile_index(&self, id: &str) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == id)
    }

    /// Look up a tile set by id
    pub fn tile_set(&self, id: &str) -> Option<&TileSet> {
        self.tile_sets.iter().find(|s| s.id == id)
    }

    /// Look up an assembly by id
    pub fn assembly_index(&self, id: &str) -> Option<usize> {
        self.assemblies.iter().position(|a| a.id == id)
    }
}
