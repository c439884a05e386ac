//! Validates the UMP theme parser: accepted syntax and rejected definitions

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::Write;
use tileweave::catalog::{CellMask, ump};
use tileweave::io::error::AssemblyError;

const FOREST: &str = r#"
// forest theme
base forest/f_

line a

tile +clearing
{
3 3

0  0  0
0  +ab 0
0  0  0
}

tile +brook
{
3 3

a  a  a
a  +a a
a  a  a
}

/* grouped for random selection */
tileset greens
{
+clearing
}

assembly small
{
title "Small forest"
size "4 4"
grid "1 1"
seeds
{
13 21 34
}
fix +brook "1 1"
+clearing "0 16"
tileset greens "2 5"
}
"#;

fn mask(text: &str) -> CellMask {
    text.chars().fold(CellMask::NONE, |acc, chr| {
        acc | CellMask::from_char(chr).expect("valid mask char")
    })
}

#[test]
fn test_parse_full_theme() {
    let theme = ump::parse_theme("forest", FOREST).expect("theme parses");

    assert_eq!(theme.name, "forest");
    assert_eq!(theme.base_path, "forest/f_");
    assert_eq!(theme.line_flags, mask("a"));
    assert_eq!(theme.tiles.len(), 2);
    assert_eq!(theme.tile_sets.len(), 1);
    assert_eq!(theme.assemblies.len(), 1);

    let clearing = &theme.tiles[0];
    assert_eq!(clearing.id, "+clearing");
    assert_eq!((clearing.width, clearing.height), (3, 3));
    assert_eq!(clearing.area, 1);
    assert_eq!(clearing.cell(1, 1), mask("+ab"));
    assert_eq!(clearing.cell(0, 0), CellMask::ALL);

    let brook = &theme.tiles[1];
    assert_eq!(brook.area, 1);
    assert_eq!(brook.cell(0, 2), mask("a"));

    let assembly = &theme.assemblies[0];
    assert_eq!(assembly.id, "small");
    assert_eq!(assembly.title, "Small forest");
    assert_eq!((assembly.width, assembly.height), (4, 4));
    assert_eq!((assembly.dx, assembly.dy), (1, 1));
    assert_eq!(assembly.seeds, vec![13, 21, 34]);
    assert_eq!(assembly.fixed.len(), 1);
    assert_eq!(assembly.fixed[0].tile, 1);
    assert_eq!((assembly.fixed[0].x, assembly.fixed[0].y), (1, 1));
}

#[test]
fn test_tile_rows_are_stored_bottom_up() {
    let text = r#"
tile +strip
{
1 2

a
+ab
}
"#;
    let theme = ump::parse_theme("strip", text).expect("theme parses");
    let tile = &theme.tiles[0];

    // the first listed row is the top of the tile
    assert_eq!(tile.cell(0, 1), mask("a"));
    assert_eq!(tile.cell(0, 0), mask("+ab"));
    assert_eq!(tile.area, 1);
}

#[test]
fn test_tileset_counts_expand_member_budgets() {
    // a single-member set makes the randomized draw deterministic
    let theme = ump::parse_theme_with("forest", FOREST, &mut StdRng::seed_from_u64(1))
        .expect("theme parses");
    let assembly = &theme.assemblies[0];
    let clearing = theme.tile_index("+clearing").expect("tile exists");

    // "0 16" from the direct rule plus "2 5" drawn from the tileset
    assert_eq!(assembly.max[clearing], 16 + 5);
    assert_eq!(assembly.min[clearing], 2);
}

#[test]
fn test_unknown_tile_in_assembly_is_rejected() {
    let text = r#"
tile +a
{
1 1

+a
}

assembly bad
{
+missing "1 1"
}
"#;
    let result = ump::parse_theme("bad", text);
    assert!(matches!(result, Err(AssemblyError::UnknownTile { .. })));
}

#[test]
fn test_invalid_tile_char_is_rejected() {
    let text = r#"
tile +a
{
1 1

+$
}
"#;
    let result = ump::parse_theme("bad", text);
    assert!(matches!(result, Err(AssemblyError::Syntax { .. })));
}

#[test]
fn test_oversized_tile_is_rejected() {
    let mut text = String::from("tile +big\n{\n17 1\n\n");
    for _ in 0..17 {
        text.push_str("+a ");
    }
    text.push_str("\n}\n");
    let result = ump::parse_theme("bad", &text);
    assert!(matches!(result, Err(AssemblyError::TileSize { .. })));
}

#[test]
fn test_short_tile_body_is_rejected() {
    let text = r#"
tile +a
{
2 2

+a +a
}
"#;
    let result = ump::parse_theme("bad", text);
    assert!(matches!(result, Err(AssemblyError::Syntax { .. })));
}

#[test]
fn test_min_above_max_is_rejected() {
    let text = r#"
tile +a
{
1 1

+a
}

assembly bad
{
+a "3 1"
}
"#;
    let result = ump::parse_theme("bad", text);
    assert!(matches!(result, Err(AssemblyError::Syntax { .. })));
}

#[test]
fn test_zero_max_is_rejected() {
    let text = r#"
tile +a
{
1 1

+a
}

assembly bad
{
+a "0 0"
}
"#;
    let result = ump::parse_theme("bad", text);
    assert!(matches!(result, Err(AssemblyError::Syntax { .. })));
}

#[test]
fn test_fixed_tile_out_of_bounds_is_rejected() {
    let text = r#"
tile +a
{
1 1

+a
}

assembly bad
{
fix +a "40 0"
}
"#;
    let result = ump::parse_theme("bad", text);
    assert!(matches!(result, Err(AssemblyError::Syntax { .. })));
}

#[test]
fn test_unknown_directive_is_rejected() {
    let result = ump::parse_theme("bad", "worldspawn { }");
    assert!(matches!(result, Err(AssemblyError::Syntax { .. })));
}

#[test]
fn test_empty_theme_is_rejected() {
    let result = ump::parse_theme("empty", "// nothing here\n");
    assert!(matches!(result, Err(AssemblyError::NoTiles { .. })));
}

#[test]
fn test_load_theme_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("forest.ump");
    let mut file = std::fs::File::create(&path).expect("create theme file");
    file.write_all(FOREST.as_bytes()).expect("write theme file");

    let theme = ump::load_theme(&path).expect("theme loads");
    assert_eq!(theme.name, "forest");
    assert_eq!(theme.tiles.len(), 2);
}

#[test]
fn test_load_theme_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = ump::load_theme(&dir.path().join("nowhere.ump"));
    assert!(matches!(result, Err(AssemblyError::ThemeLoad { .. })));
}
