//! Required-tile placement search
//!
//! Tiles fall into three categories: fixed (position given by the
//! assembly), required (a minimum count must appear somewhere) and optional
//! (used to fill whatever remains). The fixed tiles are already on the grid
//! when this search starts. Required tiles are placed at shuffled positions;
//! when one cannot be placed the previously placed tile — whatever its type
//! — is moved to its next candidate position, so every combination is tried
//! before the assembly is declared impossible. Once all minimums are met the
//! gap-coverage search takes over; its failure backtracks here too.

use crate::assembly::solver::{SearchArena, fill_remaining_gaps};
use crate::assembly::state::AssemblyState;
use crate::io::configuration::MAX_SEED_RETRIES;
use crate::io::error::{AssemblyError, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicBool, Ordering};

/// Run the full assembly search on the current state
///
/// Returns `Ok(true)` when the map was completed (or `claimed` signalled
/// that another worker already finished — the abandoned state is then
/// meaningless and must be discarded), `Ok(false)` when this attempt failed
/// but may be retried with a seed from the assembly's seed list.
///
/// # Errors
///
/// Returns [`AssemblyError::Unsolvable`] when the search space is exhausted
/// and no retry is allowed: either the assembly defines no alternate seeds
/// or the retry budget is spent. No valid tiling exists in that case.
pub fn place_required_tiles<R: Rng>(
    state: &mut AssemblyState,
    rng: &mut R,
    claimed: Option<&AtomicBool>,
) -> Result<bool> {
    let assembly = state.assembly();
    let map_w = assembly.width;
    let map_size = assembly.size();
    let (dx, dy) = (assembly.dx, assembly.dy);
    let num_to_place = state.to_place.len();
    let start = state.placed.len();

    let mut arena = SearchArena::new();

    // Shuffled once; the map is built with this order
    let mut positions: Vec<usize> = (0..map_size).collect();
    positions.shuffle(rng);

    let mut pos = 0usize;
    let mut idx = 0usize;
    while idx < num_to_place {
        while state.to_place[idx].cnt < state.to_place[idx].min {
            // scan the remaining candidate positions for this tile type
            while pos < map_size {
                if let Some(flag) = claimed {
                    if flag.load(Ordering::Acquire) {
                        // someone else beat us to it
                        return Ok(true);
                    }
                }
                let x = positions[pos] % map_w;
                let y = positions[pos] / map_w;
                if x % dx == 0 && y % dy == 0 {
                    let tile = state.to_place[idx].tile;
                    if state.grid.fits(state.tile(tile), x, y) {
                        state.add_tile(tile, x, y, Some(idx), pos);
                        break;
                    }
                }
                pos += 1;
            }

            if pos < map_size {
                // placed one; the loop decides whether this type needs more
                continue;
            }
            if state.to_place[idx].cnt == 0 {
                // not a single position works for this type; the previous
                // tile has to move, which the outer exhaustion path handles
                break;
            }
            // a copy of this type was placed earlier; pull it back out and
            // resume its position scan
            match state.remove_last_tile() {
                Some(record) => {
                    if let Some(prev_idx) = record.idx {
                        idx = prev_idx;
                    }
                    pos = record.pos + 1;
                }
                None => break,
            }
        }

        if pos < map_size {
            // minimum satisfied, move on to the next tile type
            pos = 0;
            idx += 1;
        } else {
            // this tile type is out of positions: backtrack chronologically
            if start == state.placed.len() {
                return fail_or_retry(state);
            }
            if let Some(record) = state.remove_last_tile() {
                if let Some(prev_idx) = record.idx {
                    idx = prev_idx;
                }
                pos = record.pos + 1;
            }
        }

        if idx == num_to_place && !fill_remaining_gaps(state, &mut arena, rng) {
            if log::log_enabled!(log::Level::Debug) {
                log::debug!("gap filling failed:\n{}", state.render_grid());
            }
            if start == state.placed.len() {
                // nothing left to rearrange, the optional pool cannot cover
                // the map
                return fail_or_retry(state);
            }
            if let Some(record) = state.remove_last_tile() {
                if let Some(prev_idx) = record.idx {
                    idx = prev_idx;
                }
                pos = record.pos + 1;
            }
        }
    }

    Ok(true)
}

/// Terminal failure policy: retry with a listed seed if allowed, else fatal
fn fail_or_retry(state: &AssemblyState) -> Result<bool> {
    let assembly = state.assembly();
    if assembly.seeds.is_empty() || state.retry_cnt > MAX_SEED_RETRIES {
        Err(AssemblyError::Unsolvable {
            theme: state.theme.name.clone(),
            assembly: assembly.id.clone(),
        })
    } else {
        log::warn!(
            "impossible to assemble '{}' with assembly '{}' - retry with another seed",
            state.theme.name,
            assembly.id
        );
        Ok(false)
    }
}
