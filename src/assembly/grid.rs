//! Working map grid and the tile fit test
//!
//! The grid holds one compatibility mask per cell, starting at the neutral
//! "anything goes" mask and narrowing as tiles are stamped in. The playable
//! area spans cells `1..=width` by `1..=height`; the surrounding margin
//! exists so tiles placed against the border can hang their non-solid
//! surround over the edge.

use crate::catalog::mask::CellMask;
use crate::catalog::tile::Tile;
use crate::io::configuration::MAX_MAP_EXTENT;
use ndarray::Array2;

/// Extra cells on each grid axis beyond the maximum assembly extent
const GRID_MARGIN: usize = 2;

/// The in-progress assembly grid
#[derive(Clone, Debug, PartialEq)]
pub struct MapGrid {
    /// Cell masks indexed `[y, x]`
    cells: Array2<CellMask>,
    /// Assembly extent in x
    width: usize,
    /// Assembly extent in y
    height: usize,
}

impl MapGrid {
    /// Create an empty grid for the given assembly extent
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: Array2::from_elem(
                (MAX_MAP_EXTENT + GRID_MARGIN, MAX_MAP_EXTENT + GRID_MARGIN),
                CellMask::ALL,
            ),
            width,
            height,
        }
    }

    /// Assembly extent in x
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Assembly extent in y
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Reset every cell to the neutral mask
    pub fn clear(&mut self) {
        self.cells.fill(CellMask::ALL);
    }

    /// Mask of the cell at the given position
    pub fn cell(&self, x: usize, y: usize) -> CellMask {
        self.cells[[y, x]]
    }

    /// Whether the cell at the given position is covered by a solid footprint
    pub fn is_solid(&self, x: usize, y: usize) -> bool {
        self.cells[[y, x]].is_solid()
    }

    /// Whether every cell of the playable area is solid
    ///
    /// This is the termination condition of the whole search.
    pub fn is_filled(&self) -> bool {
        for y in 1..=self.height {
            for x in 1..=self.width {
                if !self.cells[[y, x]].is_solid() {
                    return false;
                }
            }
        }
        true
    }

    /// Whether the tile fits the current grid at the given position
    ///
    /// Every covered cell must keep at least one common connector and no
    /// solid cell may land on an already solid cell. The tile must also stay
    /// within the assembly extent plus the one-cell border margin.
    pub fn fits(&self, tile: &Tile, x: usize, y: usize) -> bool {
        if x + tile.width > self.width + 2 || y + tile.height > self.height + 2 {
            return false;
        }
        for ty in 0..tile.height {
            for tx in 0..tile.width {
                if !self.cells[[y + ty, x + tx]].accepts(tile.cell(tx, ty)) {
                    return false;
                }
            }
        }
        true
    }

    /// Combine the tile's masks into every covered cell
    ///
    /// The caller is responsible for having fit-tested the position first.
    pub fn stamp(&mut self, tile: &Tile, x: usize, y: usize) {
        for ty in 0..tile.height {
            for tx in 0..tile.width {
                self.cells[[y + ty, x + tx]].combine(tile.cell(tx, ty));
            }
        }
    }
}
