//! Validates the cell mask rules, the fit test and the replay-based undo

use std::sync::Arc;
use tileweave::assembly::{AssemblyState, MapGrid};
use tileweave::catalog::{Assembly, CellMask, MapTheme, Tile};

fn mask(text: &str) -> CellMask {
    text.chars().fold(CellMask::NONE, |acc, chr| {
        acc | CellMask::from_char(chr).expect("valid mask char")
    })
}

/// 3x3 tile with a neutral surround and a single solid centre cell
fn small_tile(id: &str, centre: &str) -> Tile {
    let mut cells = vec![CellMask::ALL; 9];
    cells[4] = mask(centre);
    Tile::new(id, 3, 3, cells).expect("valid tile")
}

/// 3x3 tile whose surround ring requires the given connector
fn ring_tile(id: &str, connector: &str, centre: &str) -> Tile {
    let mut cells = vec![mask(connector); 9];
    cells[4] = mask(centre);
    Tile::new(id, 3, 3, cells).expect("valid tile")
}

fn theme_with(tiles: Vec<Tile>, mut assembly: Assembly) -> Arc<MapTheme> {
    let mut theme = MapTheme::new("test");
    if assembly.min.len() != tiles.len() {
        assembly.min.resize(tiles.len(), 0);
        assembly.max.resize(tiles.len(), 0);
    }
    theme.tiles = tiles;
    theme.assemblies.push(assembly);
    Arc::new(theme)
}

#[test]
fn test_combine_keeps_solid_cells() {
    let mut cell = mask("+a");
    cell.combine(mask("b"));
    assert_eq!(cell, mask("+a"));
}

#[test]
fn test_combine_ignores_neutral_tiles() {
    let mut cell = mask("ab");
    cell.combine(CellMask::ALL);
    assert_eq!(cell, mask("ab"));
}

#[test]
fn test_combine_solidifies() {
    let mut cell = CellMask::ALL;
    cell.combine(mask("+a"));
    assert_eq!(cell, mask("+a"));
    assert!(cell.is_solid());
}

#[test]
fn test_combine_narrows_connectors() {
    let mut cell = mask("abc");
    cell.combine(mask("bcd"));
    assert_eq!(cell, mask("bc"));
}

#[test]
fn test_accepts_rejects_double_solid() {
    assert!(!mask("+a").accepts(mask("+a")));
}

#[test]
fn test_accepts_rejects_disjoint_connectors() {
    assert!(!mask("a").accepts(mask("+b")));
}

#[test]
fn test_accepts_shared_connector() {
    assert!(mask("ab").accepts(mask("+b")));
    assert!(CellMask::ALL.accepts(mask("+z")));
}

#[test]
fn test_mask_display_round_trip() {
    assert_eq!(CellMask::ALL.to_string(), "0");
    assert_eq!(mask("+a").to_string(), "+a");
    assert_eq!(mask("125").to_string(), "125");
    assert_eq!(mask("+3bz").to_string(), "+3bz");
}

#[test]
fn test_mask_rejects_invalid_char() {
    assert!(CellMask::from_char('$').is_none());
    assert!(CellMask::from_char('6').is_none());
}

#[test]
fn test_fit_rejects_out_of_bounds_positions() {
    let grid = MapGrid::new(8, 8);
    let tile = small_tile("+cell", "+a");

    // the one-cell border margin is part of the playable placement range
    assert!(grid.fits(&tile, 7, 7));
    assert!(!grid.fits(&tile, 8, 7));
    assert!(!grid.fits(&tile, 7, 8));
    assert!(!grid.fits(&tile, 30, 2));
}

#[test]
fn test_fit_rejects_solid_overlap() {
    let mut grid = MapGrid::new(8, 8);
    let tile = small_tile("+cell", "+a");

    grid.stamp(&tile, 2, 2);
    // same position would land solid on solid
    assert!(!grid.fits(&tile, 2, 2));
    // one cell over only overlaps neutral surround
    assert!(grid.fits(&tile, 3, 2));
}

#[test]
fn test_place_then_remove_restores_grid_exactly() {
    let mut assembly = Assembly::new("plain", 1);
    assembly.max[0] = 64;
    let theme = theme_with(vec![ring_tile("+river", "a", "+a")], assembly);
    let mut state = AssemblyState::new(theme, 0);

    state.add_tile(0, 0, 0, Some(0), 3);
    let snapshot = state.grid.clone();
    let placed_before = state.placed.len();

    // the second placement narrows cells the first one constrained
    state.add_tile(0, 2, 0, Some(0), 7);
    assert_ne!(state.grid, snapshot);
    assert_eq!(state.to_place[0].cnt, 2);

    let record = state.remove_last_tile().expect("placement to undo");
    assert_eq!(record.idx, Some(0));
    assert_eq!(record.pos, 7);
    assert_eq!(state.placed.len(), placed_before);
    assert_eq!(state.to_place[0].cnt, 1);
    assert_eq!(state.grid, snapshot);
}

#[test]
fn test_remove_on_empty_state_is_harmless() {
    let mut assembly = Assembly::new("plain", 1);
    assembly.max[0] = 1;
    let theme = theme_with(vec![small_tile("+cell", "+a")], assembly);
    let mut state = AssemblyState::new(theme, 0);

    assert!(state.remove_last_tile().is_none());
    assert!(!state.grid.is_filled());
}

#[test]
fn test_fixed_tiles_skip_count_tracking() {
    let mut assembly = Assembly::new("plain", 1);
    assembly.max[0] = 4;
    let theme = theme_with(vec![small_tile("+cell", "+a")], assembly);
    let mut state = AssemblyState::new(theme, 0);

    state.add_tile(0, 1, 1, None, 0);
    assert_eq!(state.to_place[0].cnt, 0);
    assert_eq!(state.placed.len(), 1);
}

#[test]
fn test_map_strings_are_world_centred() {
    let mut assembly = Assembly::new("plain", 1);
    assembly.max[0] = 1;
    let theme = theme_with(vec![small_tile("+cell", "+a")], assembly);
    let mut state = AssemblyState::new(theme, 0);

    state.add_tile(0, 0, 0, Some(0), 0);
    state.add_tile(0, 4, 4, None, 0);

    let (tiles, positions) = state.map_strings();
    assert_eq!(tiles, "+cell +cell");
    assert_eq!(positions, "-32 -32 0 0 0 0");
}

#[test]
fn test_map_strings_carry_base_path() {
    let mut assembly = Assembly::new("plain", 1);
    assembly.max[0] = 1;
    let mut theme = MapTheme::new("test");
    theme.base_path = "forest/f_".to_string();
    theme.tiles = vec![small_tile("+cell", "+a")];
    theme.assemblies.push(assembly);
    let mut state = AssemblyState::new(Arc::new(theme), 0);

    state.add_tile(0, 2, 2, Some(0), 0);
    let (tiles, _) = state.map_strings();
    assert_eq!(tiles, "-forest/f_ +cell");
}

#[test]
fn test_grid_render_shows_gaps_and_tiles() {
    let mut assembly = Assembly::new("plain", 1);
    assembly.width = 2;
    assembly.height = 2;
    assembly.max[0] = 4;
    let theme = theme_with(vec![ring_tile("+hut", "a", "+a")], assembly);
    let mut state = AssemblyState::new(theme, 0);

    state.add_tile(0, 0, 0, Some(0), 0);
    let render = state.render_grid();
    // the placed tile shows by name, open cells show their requirements
    assert!(render.contains("hut"));
    assert!(render.contains('a'));
}
