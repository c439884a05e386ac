//! Gap-coverage search
//!
//! Once the fixed and required tiles are down, every remaining open cell
//! ("gap") must be covered by the optional tile pool. The search space is
//! huge in theory, so the solver leans on a few pruning strategies before
//! and during the recursion:
//!
//! - candidates are re-fit-tested only where the previous placement could
//!   have disturbed them; narrowing is monotonic, so untouched candidates
//!   stay valid
//! - a branch dies immediately when the remaining tile budget cannot cover
//!   the remaining open area
//! - a per-gap table records which candidates cover each cell; a gap with no
//!   cover kills the branch, and gaps with the fewest alternatives are
//!   committed first (a gap with one candidate is a forced move)
//! - before recursion starts, candidates that would strand one of their
//!   neighbouring gaps are eliminated to a fixed point
//!
//! Line-forming tiles (rivers, roads) are handled first so their chains
//! connect before ordinary tiles fill the rest.

use crate::assembly::state::AssemblyState;
use crate::io::configuration::{
    GAP_ALTERNATIVES, MAX_MAP_EXTENT, MAX_RECURSION, MAX_TILE_POSITIONS, TILE_CODE_BASE,
};
use bitvec::prelude::*;
use ndarray::Array3;
use rand::Rng;
use rand::seq::SliceRandom;

/// Packed tile/position candidate: grid position times the code base plus
/// the to-place index
pub type TileCode = u32;

const fn encode(pos: usize, tile: usize) -> TileCode {
    (pos * TILE_CODE_BASE + tile) as TileCode
}

const fn decode(code: TileCode) -> (usize, usize) {
    ((code as usize) / TILE_CODE_BASE, (code as usize) % TILE_CODE_BASE)
}

/// Scratch space for one gap-coverage search
///
/// The recursion keeps large per-depth candidate lists; allocating them once
/// per search rather than per call keeps the hot path allocation-free. Every
/// worker thread owns its own arena.
pub struct SearchArena {
    /// Candidate list produced at the top level
    root: Vec<TileCode>,
    /// Surviving candidates per recursion depth
    pos_tile: Vec<Vec<TileCode>>,
    /// Per-cell cover table indexed `[x, y, slot]`: slot 0 counts covering
    /// candidates (-1 marks an already solid cell), slots 1.. remember the
    /// first candidates' codes
    gap_list: Array3<i32>,
    /// Distinct tile types among the current depth's candidates, with how
    /// many positions each still has
    available: Vec<(usize, usize)>,
}

impl SearchArena {
    /// Allocate scratch space for one search
    pub fn new() -> Self {
        Self {
            root: Vec::with_capacity(MAX_TILE_POSITIONS),
            pos_tile: (0..MAX_RECURSION)
                .map(|_| Vec::with_capacity(MAX_TILE_POSITIONS))
                .collect(),
            gap_list: Array3::zeros((
                MAX_MAP_EXTENT + 1,
                MAX_MAP_EXTENT + 1,
                GAP_ALTERNATIVES + 1,
            )),
            available: Vec::new(),
        }
    }
}

impl Default for SearchArena {
    fn default() -> Self {
        Self::new()
    }
}

/// The tile placed by the parent recursion level
#[derive(Clone, Copy)]
struct PrevPlacement {
    tile: usize,
    x: usize,
    y: usize,
}

/// Fill every remaining gap of the map, or report that it cannot be done
///
/// Shuffles the position and tile orders once — repeated attempts on the
/// same assembly then produce visually distinct layouts while staying
/// deterministic for a fixed seed — builds the initial candidate list, runs
/// the elimination pre-pass to a fixed point and hands over to the
/// recursive search.
pub fn fill_remaining_gaps<R: Rng>(
    state: &mut AssemblyState,
    arena: &mut SearchArena,
    rng: &mut R,
) -> bool {
    let assembly = state.assembly();
    let map_w = assembly.width;
    let map_size = assembly.size();
    let (dx, dy) = (assembly.dx, assembly.dy);

    let mut positions: Vec<usize> = (0..map_size).collect();
    positions.shuffle(rng);
    let mut tile_order: Vec<usize> = (0..state.to_place.len()).collect();
    tile_order.shuffle(rng);

    if state.grid.is_filled() {
        return true;
    }

    // Build the full list of position/tile candidates that currently fit.
    // The tile scan starts at a random offset per position so repeated runs
    // don't always favour the same tiles.
    arena.root.clear();
    for &pos in &positions {
        let x = pos % map_w;
        let y = pos / map_w;
        if x % dx != 0 || y % dy != 0 {
            continue;
        }
        if state.to_place.is_empty() {
            break;
        }
        let num = state.to_place.len();
        let offs = rng.random_range(0..num);
        for k in offs..num + offs {
            let ti = tile_order[k % num];
            let entry = state.to_place[ti];
            if entry.cnt >= entry.max {
                continue;
            }
            if state.grid.fits(state.tile(entry.tile), x, y) {
                assert!(arena.root.len() < MAX_TILE_POSITIONS, "candidate overflow");
                arena.root.push(encode(pos, ti));
            }
        }
    }

    // Eliminate candidates until nothing more can be discarded
    loop {
        if !build_gap_list(state, arena) {
            log::debug!("gap coverage: uncovered gap before recursion");
            return false;
        }
        let eliminated = reduce_gap_list(state, arena);
        if eliminated.is_empty() {
            break;
        }
        let code_space = map_size * TILE_CODE_BASE;
        let mut discard = bitvec![0; code_space];
        for code in eliminated {
            discard.set(code as usize, true);
        }
        arena.root.retain(|&code| !discard[code as usize]);
    }

    fill_recursive(state, arena, 0, None)
}

/// Build the per-gap cover table from the root candidate list
///
/// Returns `false` when some gap has no covering candidate at all, which
/// dooms the search regardless of any later choice.
fn build_gap_list(state: &AssemblyState, arena: &mut SearchArena) -> bool {
    let assembly = state.assembly();
    let map_w = assembly.width;
    let height = assembly.height;

    for y in 1..=height {
        for x in 1..=map_w {
            arena.gap_list[[x, y, 0]] = if state.grid.is_solid(x, y) { -1 } else { 0 };
        }
    }

    for &code in &arena.root {
        let (pos, ti) = decode(code);
        let x = pos % map_w;
        let y = pos / map_w;
        let tile = state.tile(state.to_place[ti].tile);
        for ty in 0..tile.height {
            for tx in 0..tile.width {
                if tile.cell(tx, ty).is_solid() {
                    arena.gap_list[[x + tx, y + ty, 0]] += 1;
                    let cnt = arena.gap_list[[x + tx, y + ty, 0]];
                    if (cnt as usize) < GAP_ALTERNATIVES + 1 {
                        arena.gap_list[[x + tx, y + ty, cnt as usize]] = code as i32;
                    }
                }
            }
        }
    }

    for y in 1..=height {
        for x in 1..=map_w {
            if arena.gap_list[[x, y, 0]] == 0 {
                return false;
            }
        }
    }
    true
}

/// Mask a candidate's tile would put at an absolute map position
///
/// Positions outside the tile's footprint get the neutral mask: the tile
/// imposes nothing there.
fn flags_at(
    state: &AssemblyState,
    code: TileCode,
    map_x: usize,
    map_y: usize,
) -> crate::catalog::CellMask {
    let (pos, ti) = decode(code);
    let map_w = state.assembly().width;
    let x = pos % map_w;
    let y = pos / map_w;
    let tile = state.tile(state.to_place[ti].tile);
    if map_x < x || map_x >= x + tile.width || map_y < y || map_y >= y + tile.height {
        return crate::catalog::CellMask::ALL;
    }
    tile.cell(map_x - x, map_y - y)
}

/// Eliminate candidates that would strand one of their neighbouring gaps
///
/// A candidate can be discarded outright when, for some orthogonal
/// neighbour gap, none of that gap's covering alternatives shares a
/// connector with the candidate at the boundary cell: placing it would make
/// the neighbour permanently unsolvable. Returns the eliminated codes.
fn reduce_gap_list(state: &AssemblyState, arena: &SearchArena) -> Vec<TileCode> {
    let assembly = state.assembly();
    let map_w = assembly.width;
    let map_h = assembly.height;
    let mut eliminated = Vec::new();

    for y in 1..=map_h {
        for x in 1..=map_w {
            let count = arena.gap_list[[x, y, 0]];
            if count < 1 {
                continue;
            }
            for g in 1..=count as usize {
                if g >= GAP_ALTERNATIVES {
                    // more candidates than the table remembers
                    break;
                }
                let code = arena.gap_list[[x, y, g]] as TileCode;
                let neighbours = [
                    (x as i64 + 1, y as i64),
                    (x as i64 - 1, y as i64),
                    (x as i64, y as i64 + 1),
                    (x as i64, y as i64 - 1),
                ];
                if neighbours
                    .iter()
                    .any(|&(nx, ny)| gap_check_neighbour(state, arena, code, nx, ny))
                {
                    eliminated.push(code);
                }
            }
        }
    }

    eliminated
}

/// Whether the neighbour gap at (nx, ny) rejects every pairing with the
/// candidate
fn gap_check_neighbour(
    state: &AssemblyState,
    arena: &SearchArena,
    code: TileCode,
    nx: i64,
    ny: i64,
) -> bool {
    let assembly = state.assembly();
    if nx < 1 || ny < 1 || nx > assembly.width as i64 || ny > assembly.height as i64 {
        return false;
    }
    let (nx, ny) = (nx as usize, ny as usize);

    let count = arena.gap_list[[nx, ny, 0]];
    if count < 1 {
        // solid, or a border gap nothing covers
        return false;
    }
    if count as usize >= GAP_ALTERNATIVES {
        // more alternatives than the table stores; cannot evaluate
        return false;
    }

    let own = flags_at(state, code, nx, ny);
    if own.is_solid() {
        // (nx, ny) is part of the candidate's own footprint
        return false;
    }

    for slot in 1..=count as usize {
        let other = arena.gap_list[[nx, ny, slot]] as TileCode;
        let theirs = flags_at(state, other, nx, ny);
        if own.bits() & theirs.bits() != 0 {
            // at least one covering tile would still work
            return false;
        }
    }
    true
}

/// Recursively pick and place the next tile
///
/// Filters the parent's candidate list against the current grid, rebuilds
/// the gap cover table, prunes, then commits the scarcest gap first: its
/// alternatives are tried in turn, recursing after each placement and
/// undoing on failure. Once a gap's last alternative fails the whole branch
/// is dead. Gaps with more alternatives than the cover table stores are
/// rare; their candidates are tried in arbitrary order at the end.
fn fill_recursive(
    state: &mut AssemblyState,
    arena: &mut SearchArena,
    rec: usize,
    prev: Option<PrevPlacement>,
) -> bool {
    assert!(rec < MAX_RECURSION, "gap search exceeded recursion limit");

    let assembly = state.assembly();
    let map_w = assembly.width;
    let map_h = assembly.height;

    // Footprint of the placement made by the parent level
    let prev_bounds = prev.map(|p| {
        let tile = state.tile(state.to_place[p.tile].tile);
        (p.x, p.y, p.x + tile.width - 1, p.y + tile.height - 1)
    });

    // Keep the candidates that still have budget and still fit. Only
    // candidates overlapping the previous placement need a fresh fit test.
    let src_len = if rec == 0 {
        arena.root.len()
    } else {
        arena.pos_tile[rec - 1].len()
    };
    arena.pos_tile[rec].clear();
    arena.available.clear();
    for i in 0..src_len {
        let code = if rec == 0 {
            arena.root[i]
        } else {
            arena.pos_tile[rec - 1][i]
        };
        let (pos, ti) = decode(code);
        let x = pos % map_w;
        let y = pos / map_w;
        let entry = state.to_place[ti];
        if entry.cnt >= entry.max {
            continue;
        }

        let tile = state.tile(entry.tile);
        let mut ok = false;
        if let Some((px, py, pmax_x, pmax_y)) = prev_bounds {
            if x > pmax_x || y > pmax_y || px > x + tile.width - 1 || py > y + tile.height - 1 {
                // no overlap with the previous placement, still fits
                ok = true;
            }
        }
        if !ok {
            ok = state.grid.fits(tile, x, y);
        }
        if ok {
            assert!(
                arena.pos_tile[rec].len() < MAX_TILE_POSITIONS,
                "candidate overflow"
            );
            arena.pos_tile[rec].push(code);
            match arena.available.iter_mut().find(|entry| entry.0 == ti) {
                Some(entry) => entry.1 += 1,
                None => arena.available.push((ti, 1)),
            }
        }
    }

    // Count the open cells and reset their cover slots
    let mut gap_count = 0usize;
    for y in 1..=map_h {
        for x in 1..=map_w {
            if state.grid.is_solid(x, y) {
                arena.gap_list[[x, y, 0]] = -1;
            } else {
                gap_count += 1;
                arena.gap_list[[x, y, 0]] = 0;
            }
        }
    }

    // If the remaining tiles cannot possibly cover the open area, bail
    let mut solids = 0usize;
    for &(ti, possible) in &arena.available {
        let entry = state.to_place[ti];
        let allowed = entry.max - entry.cnt;
        solids += allowed.min(possible) * state.tile(entry.tile).area;
    }
    if solids < gap_count {
        log::debug!(
            "gap coverage: out of solids at depth {rec} (missing {})",
            gap_count - solids
        );
        return false;
    }

    // Fill the cover table from the surviving candidates
    for i in 0..arena.pos_tile[rec].len() {
        let code = arena.pos_tile[rec][i];
        let (pos, ti) = decode(code);
        let x = pos % map_w;
        let y = pos / map_w;
        let tile = state.tile(state.to_place[ti].tile);
        for ty in 0..tile.height {
            for tx in 0..tile.width {
                if tile.cell(tx, ty).is_solid() {
                    arena.gap_list[[x + tx, y + ty, 0]] += 1;
                    let cnt = arena.gap_list[[x + tx, y + ty, 0]];
                    if (cnt as usize) < GAP_ALTERNATIVES + 1 {
                        arena.gap_list[[x + tx, y + ty, cnt as usize]] = code as i32;
                    }
                }
            }
        }
    }

    for y in 1..=map_h {
        for x in 1..=map_w {
            if arena.gap_list[[x, y, 0]] == 0 {
                log::debug!("gap coverage: uncovered gap {x}/{y} at depth {rec}");
                return false;
            }
        }
    }

    // Commit the scarcest gap first. When line-forming tiles exist their
    // gaps get a dedicated first pass so chains connect end-to-end.
    let line_flags = state.theme.line_flags.bits();
    let non_line_flags = !line_flags & !1;
    let passes: &[bool] = if line_flags != 0 {
        &[true, false]
    } else {
        &[false]
    };
    for &line_pass in passes {
        for g in 1..=GAP_ALTERNATIVES {
            for y in 1..=map_h {
                for x in 1..=map_w {
                    if arena.gap_list[[x, y, 0]] != g as i32 {
                        continue;
                    }
                    if line_pass && state.grid.cell(x, y).bits() & non_line_flags != 0 {
                        // gap doesn't demand a line tile, leave it for later
                        continue;
                    }
                    for slot in 1..=g {
                        let code = arena.gap_list[[x, y, slot]] as TileCode;
                        let (pos, ti) = decode(code);
                        let px = pos % map_w;
                        let py = pos / map_w;
                        let tile_index = state.to_place[ti].tile;

                        state.add_tile(tile_index, px, py, Some(ti), pos);
                        if state.grid.is_filled() {
                            return true;
                        }
                        if fill_recursive(
                            state,
                            arena,
                            rec + 1,
                            Some(PrevPlacement {
                                tile: ti,
                                x: px,
                                y: py,
                            }),
                        ) {
                            return true;
                        }
                        // dead end, take the tile back out
                        state.remove_last_tile();
                    }
                    // every alternative of a scarcest gap failed
                    return false;
                }
            }
        }
    }

    // Only gaps with more alternatives than the table stores remain
    for i in 0..arena.pos_tile[rec].len() {
        let code = arena.pos_tile[rec][i];
        let (pos, ti) = decode(code);
        let px = pos % map_w;
        let py = pos / map_w;
        let tile_index = state.to_place[ti].tile;

        state.add_tile(tile_index, px, py, Some(ti), pos);
        if state.grid.is_filled() {
            return true;
        }
        if fill_recursive(
            state,
            arena,
            rec + 1,
            Some(PrevPlacement {
                tile: ti,
                x: px,
                y: py,
            }),
        ) {
            return true;
        }
        state.remove_last_tile();
    }
    false
}
