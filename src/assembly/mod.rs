//! Assembly search and orchestration
//!
//! This module contains the whole solver stack:
//! - Working grid and fit test
//! - Placement engine with replay-based undo
//! - Required-tile backtracking search
//! - Gap-coverage search
//! - Parallel search orchestration
//! - The top-level assembler with its seed retry policy

/// Working map grid and the tile fit test
pub mod grid;
/// Parallel search orchestration
pub mod parallel;
/// Required-tile placement search
pub mod required;
/// Gap-coverage search
pub mod solver;
/// Mutable assembly state and the place/remove engine
pub mod state;

pub use grid::MapGrid;
pub use state::AssemblyState;

use crate::catalog::tile::MapTheme;
use crate::io::configuration::{MAX_SEED_RETRIES, RANDOM_SEED_RANGE};
use crate::io::error::{AssemblyError, Result};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Options controlling one assembly run
#[derive(Clone, Debug, Default)]
pub struct AssembleOptions {
    /// Assembly id to use; a random assembly is picked when unset or when
    /// the id is unknown
    pub assembly: Option<String>,
    /// Explicit random seed; unseeded runs draw one at random
    pub seed: Option<u64>,
    /// Worker threads racing for a solution; `0` or `1` runs the
    /// seed-deterministic single-threaded search
    pub threads: usize,
    /// Attach an ASCII rendering of the finished grid to the result
    pub dump: bool,
}

/// A successfully assembled map
#[derive(Clone, Debug)]
pub struct AssembledMap {
    /// Space-separated tile ids in placement order
    pub tiles: String,
    /// Space-separated `x y z` world-unit triples, one per tile
    pub positions: String,
    /// Number of placed tiles
    pub placed: usize,
    /// Title of the assembly that was used
    pub title: String,
    /// ASCII rendering of the grid, when requested
    pub dump: Option<String>,
}

/// Pick the assembly index for this run
fn select_assembly(theme: &MapTheme, options: &AssembleOptions) -> Result<usize> {
    if theme.tiles.is_empty() {
        return Err(AssemblyError::NoTiles {
            theme: theme.name.clone(),
        });
    }
    if theme.assemblies.is_empty() {
        return Err(AssemblyError::NoAssemblies {
            theme: theme.name.clone(),
        });
    }

    if let Some(wanted) = &options.assembly {
        if let Some(index) = theme.assembly_index(wanted) {
            return Ok(index);
        }
        log::warn!(
            "map assembly '{wanted}' not found in theme '{}', using a random one",
            theme.name
        );
    }
    Ok(rand::rng().random_range(0..theme.assemblies.len()))
}

/// Assemble a map and return the finished search state
///
/// Runs the fixed/required/gap-coverage search, retrying with seeds from
/// the assembly's seed list when an attempt fails. Each retry starts from a
/// fresh state; only the retry counter carries over.
///
/// # Errors
///
/// Returns an error when the theme is empty or the assembly has no valid
/// tiling within the retry budget.
pub fn assemble_state(theme: &Arc<MapTheme>, options: &AssembleOptions) -> Result<AssemblyState> {
    let asm_idx = select_assembly(theme, options)?;

    let mut retry_cnt = 0u32;
    let mut seed = options
        .seed
        .unwrap_or_else(|| rand::rng().random_range(0..RANDOM_SEED_RANGE));

    loop {
        let mut state = AssemblyState::new(Arc::clone(theme), asm_idx);
        state.retry_cnt = retry_cnt;
        state.place_fixed_tiles();

        let finished = if options.threads > 1 {
            parallel::parallel_search(&mut state, options.threads)?
        } else {
            log::debug!(
                "assembling '{}' with assembly '{}', seed {seed}",
                theme.name,
                state.assembly().id
            );
            let mut rng = StdRng::seed_from_u64(seed);
            let done = required::place_required_tiles(&mut state, &mut rng, None)?;
            if !done {
                state.retry_cnt += 1;
            }
            done
        };

        if finished {
            return Ok(state);
        }

        // Failed but retryable: pull the next seed from the assembly's list
        retry_cnt = state.retry_cnt.max(retry_cnt + 1);
        if retry_cnt > MAX_SEED_RETRIES {
            return Err(AssemblyError::Unsolvable {
                theme: theme.name.clone(),
                assembly: state.assembly().id.clone(),
            });
        }
        let Some(&next) = state.assembly().seeds.choose(&mut rand::rng()) else {
            return Err(AssemblyError::Unsolvable {
                theme: theme.name.clone(),
                assembly: state.assembly().id.clone(),
            });
        };
        seed = next;
    }
}

/// Assemble a map from the theme catalogue
///
/// # Errors
///
/// Returns an error when the theme is empty or the assembly has no valid
/// tiling within the retry budget.
pub fn assemble(theme: &Arc<MapTheme>, options: &AssembleOptions) -> Result<AssembledMap> {
    let state = assemble_state(theme, options)?;
    let (tiles, positions) = state.map_strings();
    Ok(AssembledMap {
        tiles,
        positions,
        placed: state.placed.len(),
        title: state.assembly().title.clone(),
        dump: options.dump.then(|| state.render_grid()),
    })
}
