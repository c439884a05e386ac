//! Mutable assembly state and the place/remove engine
//!
//! [`AssemblyState`] couples the read-only theme catalogue with the working
//! grid, the list of tile types still to place and the ordered log of every
//! placement. The type is plainly clonable: parallel workers search on deep
//! copies and the winning copy replaces the caller's instance.

use crate::assembly::grid::MapGrid;
use crate::catalog::tile::{Assembly, MapTheme, Tile};
use crate::io::configuration::{MAX_PLACED_TILES, WORLD_UNITS_PER_CELL};
use std::fmt::Write as _;
use std::sync::Arc;

/// One tile type to place with its count bounds
#[derive(Clone, Copy, Debug)]
pub struct ToPlace {
    /// Index of the tile in the theme catalogue
    pub tile: usize,
    /// Minimum number of placements
    pub min: usize,
    /// Maximum number of placements
    pub max: usize,
    /// Current number of placements
    pub cnt: usize,
}

/// One placed tile with the bookkeeping needed to resume the search
#[derive(Clone, Copy, Debug)]
pub struct PlacedTile {
    /// Index of the tile in the theme catalogue
    pub tile: usize,
    /// Grid x position of the placement
    pub x: usize,
    /// Grid y position of the placement
    pub y: usize,
    /// Index into the to-place list, `None` for fixed tiles which are exempt
    /// from count tracking
    pub idx: Option<usize>,
    /// Position-scan index at the time of placement; backtracking resumes
    /// the scan right after it
    pub pos: usize,
}

/// Everything the search knows about the map being assembled
#[derive(Clone, Debug)]
pub struct AssemblyState {
    /// The read-only theme catalogue
    pub theme: Arc<MapTheme>,
    /// Index of the selected assembly
    pub asm_idx: usize,
    /// The working grid
    pub grid: MapGrid,
    /// Tile types relevant to the assembly, sorted by descending footprint
    /// area so the search commits to the hardest tiles first
    pub to_place: Vec<ToPlace>,
    /// Ordered log of every placement
    pub placed: Vec<PlacedTile>,
    /// Failed attempts against this assembly so far
    pub retry_cnt: u32,
}

impl AssemblyState {
    /// Create the working state for one assembly attempt
    ///
    /// Builds the to-place list from the assembly's count bounds and sorts
    /// it largest-area-first; large tiles have few valid positions, so
    /// committing to them early prunes the search tree fastest.
    pub fn new(theme: Arc<MapTheme>, asm_idx: usize) -> Self {
        let assembly = &theme.assemblies[asm_idx];
        let grid = MapGrid::new(assembly.width, assembly.height);

        let mut to_place: Vec<ToPlace> = (0..theme.tiles.len())
            .filter(|&i| assembly.max[i] > 0)
            .map(|i| ToPlace {
                tile: i,
                min: assembly.min[i],
                max: assembly.max[i],
                cnt: 0,
            })
            .collect();
        to_place.sort_by(|a, b| theme.tiles[b.tile].area.cmp(&theme.tiles[a.tile].area));

        Self {
            theme,
            asm_idx,
            grid,
            to_place,
            placed: Vec::new(),
            retry_cnt: 0,
        }
    }

    /// The selected assembly definition
    pub fn assembly(&self) -> &Assembly {
        &self.theme.assemblies[self.asm_idx]
    }

    /// A tile definition by catalogue index
    pub fn tile(&self, index: usize) -> &Tile {
        &self.theme.tiles[index]
    }

    /// Stamp the assembly's fixed tiles onto the grid
    ///
    /// Fixed placements were bounds-checked at parse time and are trusted
    /// to fit; they carry no to-place index and never take part in
    /// backtracking.
    pub fn place_fixed_tiles(&mut self) {
        let fixed = self.assembly().fixed.clone();
        for fix in fixed {
            self.add_tile(fix.tile, fix.x, fix.y, None, 0);
        }
    }

    /// Place a tile: combine its masks into the grid, log the placement and
    /// bump the to-place counter
    ///
    /// The position must have passed the fit test; this is the caller's
    /// responsibility.
    ///
    /// # Panics
    ///
    /// Panics when the placement log exceeds its capacity, which no
    /// legitimate assembly reaches.
    pub fn add_tile(&mut self, tile: usize, x: usize, y: usize, idx: Option<usize>, pos: usize) {
        assert!(self.placed.len() < MAX_PLACED_TILES, "too many map tiles");

        self.grid.stamp(&self.theme.tiles[tile], x, y);
        self.placed.push(PlacedTile {
            tile,
            x,
            y,
            idx,
            pos,
        });
        if let Some(idx) = idx {
            self.to_place[idx].cnt += 1;
        }
    }

    /// Undo the most recent placement and return its record
    ///
    /// Mask combination is lossy, so there is no direct inverse: the grid is
    /// cleared and every remaining placement is replayed in order. The
    /// returned record's `idx`/`pos` fields let the search loop resume
    /// exactly where the undone tile left off.
    pub fn remove_last_tile(&mut self) -> Option<PlacedTile> {
        self.grid.clear();

        let record = self.placed.pop()?;
        if let Some(idx) = record.idx {
            self.to_place[idx].cnt -= 1;
        }

        for i in 0..self.placed.len() {
            let placement = self.placed[i];
            self.grid
                .stamp(&self.theme.tiles[placement.tile], placement.x, placement.y);
        }
        Some(record)
    }

    /// Build the tile and position output strings
    ///
    /// The tile string lists the placed tile ids in placement order,
    /// prefixed with `-<base>` when the theme declares a base path. The
    /// position string carries one `x y z` triple per tile, in world units
    /// centred on the assembly midpoint.
    pub fn map_strings(&self) -> (String, String) {
        let assembly = self.assembly();
        let half_w = assembly.width as i32 / 2;
        let half_h = assembly.height as i32 / 2;

        let mut tiles = String::new();
        if !self.theme.base_path.is_empty() {
            let _ = write!(tiles, "-{}", self.theme.base_path);
        }
        let mut positions = String::new();

        for placement in &self.placed {
            if !tiles.is_empty() {
                tiles.push(' ');
            }
            if !positions.is_empty() {
                positions.push(' ');
            }
            tiles.push_str(&self.theme.tiles[placement.tile].id);
            let _ = write!(
                positions,
                "{} {} 0",
                (placement.x as i32 - half_w) * WORLD_UNITS_PER_CELL,
                (placement.y as i32 - half_h) * WORLD_UNITS_PER_CELL,
            );
        }

        (tiles, positions)
    }

    /// ASCII rendering of the current grid, for diagnosing stuck assemblies
    ///
    /// Solid cells show the short name of the tile that owns them; open
    /// cells show their remaining connector requirements.
    pub fn render_grid(&self) -> String {
        const CELL: usize = 7;
        let assembly = self.assembly();
        let width = assembly.width;
        let height = assembly.height;

        // Owner name per playable cell, painted in placement order
        let mut names = vec![vec![String::new(); width + 2]; height + 2];
        for placement in &self.placed {
            let tile = &self.theme.tiles[placement.tile];
            let short = tile.id.trim_start_matches('+');
            for ty in 0..tile.height {
                for tx in 0..tile.width {
                    if tile.cell(tx, ty).is_solid() {
                        let (cx, cy) = (placement.x + tx, placement.y + ty);
                        if cx <= width + 1 && cy <= height + 1 {
                            names[cy][cx] = short.chars().take(CELL - 1).collect();
                        }
                    }
                }
            }
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", "-".repeat((CELL + 1) * width + 1));
        for y in (1..=height).rev() {
            let mut flag_row = String::from("|");
            let mut name_row = String::from("|");
            for x in 1..=width {
                let mask = self.grid.cell(x, y);
                let flags = if mask.is_solid() {
                    String::new()
                } else {
                    mask.to_string().chars().take(CELL).collect()
                };
                let _ = write!(flag_row, "{flags:w$}|", w = CELL);
                let _ = write!(name_row, "{:w$}|", names[y][x], w = CELL);
            }
            let _ = writeln!(out, "{flag_row}");
            let _ = writeln!(out, "{name_row}");
            let _ = writeln!(out, "{}", "-".repeat((CELL + 1) * width + 1));
        }
        out
    }
}
