//! Parser for the UMP theme definition format
//!
//! A theme file is a sequence of directives: `base <path>`, `line <chars>`,
//! `tile <id> { w h <cells...> }`, `tileset <id> { <tile ids...> }` and
//! `assembly <id> { ... }`. Tokens are whitespace separated; `{` and `}` are
//! always tokens of their own; double-quoted strings keep embedded spaces
//! (the `size "8 8"` style pairs rely on this); `//` starts a line comment
//! and `/* */` a block comment.

use crate::catalog::mask::CellMask;
use crate::catalog::tile::{Assembly, FixedTile, MapTheme, Tile, TileSet};
use crate::io::configuration::{
    MAX_ASSEMBLIES, MAX_ASSEMBLY_SEEDS, MAX_FIXED_TILES, MAX_MAP_EXTENT, MAX_TILE_EXTENT,
    MAX_TILE_SETS, MAX_TILE_SET_TILES, MAX_TILE_TYPES,
};
use crate::io::error::{AssemblyError, Result, syntax_error};
use rand::Rng;
use std::path::Path;

/// Load and parse a theme definition file
///
/// The theme takes its name from the file stem.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content is not a
/// valid theme definition.
pub fn load_theme(path: &Path) -> Result<MapTheme> {
    let text = std::fs::read_to_string(path).map_err(|source| AssemblyError::ThemeLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_theme(&name, &text)
}

/// Parse a theme definition from text
///
/// Tile-set draws inside assemblies are randomized with the thread-local
/// generator; use [`parse_theme_with`] to control them.
///
/// # Errors
///
/// Returns an error if the text is not a valid theme definition.
pub fn parse_theme(name: &str, text: &str) -> Result<MapTheme> {
    parse_theme_with(name, text, &mut rand::rng())
}

/// Parse a theme definition using the given random generator
///
/// # Errors
///
/// Returns an error if the text is not a valid theme definition.
pub fn parse_theme_with<R: Rng>(name: &str, text: &str, rng: &mut R) -> Result<MapTheme> {
    let mut parser = Parser {
        file: format!("{name}.ump"),
        tokens: tokenize(text),
        pos: 0,
    };
    let mut theme = MapTheme::new(name);

    while let Some(token) = parser.try_next() {
        match token.as_str() {
            "base" => theme.base_path = parser.next("base path")?,
            "line" => {
                let chars = parser.next("line connector characters")?;
                for chr in chars.chars() {
                    theme.line_flags |= parser.mask_char(chr)?;
                }
            }
            "tile" => {
                if theme.tiles.len() >= MAX_TILE_TYPES {
                    return Err(parser.limit("map tile types", MAX_TILE_TYPES));
                }
                let tile = parser.parse_tile()?;
                theme.tiles.push(tile);
            }
            "tileset" => {
                if theme.tile_sets.len() >= MAX_TILE_SETS {
                    return Err(parser.limit("map tile sets", MAX_TILE_SETS));
                }
                let set = parser.parse_tile_set(&theme)?;
                theme.tile_sets.push(set);
            }
            "assembly" => {
                if theme.assemblies.len() >= MAX_ASSEMBLIES {
                    return Err(parser.limit("map assemblies", MAX_ASSEMBLIES));
                }
                let assembly = parser.parse_assembly(&theme, rng)?;
                theme.assemblies.push(assembly);
            }
            other => {
                return Err(parser.syntax(format!("unknown token '{other}'")));
            }
        }
    }

    if theme.tiles.is_empty() {
        return Err(AssemblyError::NoTiles {
            theme: name.to_string(),
        });
    }
    Ok(theme)
}

/// Split theme text into tokens
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&chr) = chars.peek() {
        if chr.is_whitespace() {
            chars.next();
        } else if chr == '/' {
            chars.next();
            match chars.peek() {
                Some('/') => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut prev = ' ';
                    for c in chars.by_ref() {
                        if prev == '*' && c == '/' {
                            break;
                        }
                        prev = c;
                    }
                }
                _ => tokens.push("/".to_string()),
            }
        } else if chr == '"' {
            chars.next();
            let mut token = String::new();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                token.push(c);
            }
            tokens.push(token);
        } else if chr == '{' || chr == '}' {
            chars.next();
            tokens.push(chr.to_string());
        } else {
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '{' || c == '}' || c == '"' {
                    break;
                }
                token.push(c);
                chars.next();
            }
            tokens.push(token);
        }
    }

    tokens
}

struct Parser {
    file: String,
    tokens: Vec<String>,
    pos: usize,
}

impl Parser {
    fn try_next(&mut self) -> Option<String> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn next(&mut self, expected: &str) -> Result<String> {
        self.try_next()
            .ok_or_else(|| self.syntax(format!("unexpected end of file, expected {expected}")))
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        let found = self.next(&format!("'{token}'"))?;
        if found == token {
            Ok(())
        } else {
            Err(self.syntax(format!("expected '{token}', found '{found}'")))
        }
    }

    fn syntax(&self, reason: impl ToString) -> AssemblyError {
        syntax_error(&self.file, reason)
    }

    fn limit(&self, what: &'static str, limit: usize) -> AssemblyError {
        AssemblyError::LimitExceeded {
            file: self.file.clone(),
            what,
            limit,
        }
    }

    fn mask_char(&self, chr: char) -> Result<CellMask> {
        CellMask::from_char(chr).ok_or_else(|| self.syntax(format!("invalid tile char '{chr}'")))
    }

    /// Parse a whitespace-separated pair out of a single (usually quoted)
    /// token, the `size "8 8"` convention
    fn parse_pair(&mut self, what: &str) -> Result<(i64, i64)> {
        let token = self.next(what)?;
        let mut parts = token.split_whitespace();
        let a = parts.next().and_then(|p| p.parse().ok());
        let b = parts.next().and_then(|p| p.parse().ok());
        match (a, b) {
            (Some(a), Some(b)) if parts.next().is_none() => Ok((a, b)),
            _ => Err(self.syntax(format!("invalid {what} '{token}'"))),
        }
    }

    fn parse_tile(&mut self) -> Result<Tile> {
        let id = self.next("tile name")?;
        self.expect("{")?;

        let width: usize = self
            .next("tile width")?
            .parse()
            .map_err(|_| self.syntax(format!("invalid width for tile '{id}'")))?;
        let height: usize = self
            .next("tile height")?
            .parse()
            .map_err(|_| self.syntax(format!("invalid height for tile '{id}'")))?;
        if width == 0 || height == 0 || width > MAX_TILE_EXTENT || height > MAX_TILE_EXTENT {
            return Err(AssemblyError::TileSize {
                file: self.file.clone(),
                id,
                width,
                height,
            });
        }

        // Cells are listed top row first but stored bottom row first
        let mut cells = vec![CellMask::NONE; width * height];
        for y in (0..height).rev() {
            for x in 0..width {
                let token = self.next("tile cell")?;
                if token == "}" {
                    return Err(
                        self.syntax(format!("not enough cell entries for tile '{id}'"))
                    );
                }
                let mut mask = CellMask::NONE;
                for chr in token.chars() {
                    mask |= self.mask_char(chr)?;
                }
                cells[y * width + x] = mask;
            }
        }

        self.expect("}")
            .map_err(|_| self.syntax(format!("too many cell entries for tile '{id}'")))?;

        Tile::new(&id, width, height, cells)
    }

    fn parse_tile_set(&mut self, theme: &MapTheme) -> Result<TileSet> {
        let id = self.next("tileset name")?;
        self.expect("{")?;

        let mut tiles = Vec::new();
        loop {
            let token = self.next("tileset entry")?;
            if token == "}" {
                break;
            }
            if tiles.len() >= MAX_TILE_SET_TILES {
                return Err(self.limit("tiles in a tile set", MAX_TILE_SET_TILES));
            }
            if theme.tile_index(&token).is_none() {
                return Err(AssemblyError::UnknownTile {
                    file: self.file.clone(),
                    id: token,
                    context: format!("tileset '{id}'"),
                });
            }
            tiles.push(token);
        }

        if tiles.is_empty() {
            return Err(self.syntax(format!("tileset '{id}' is empty")));
        }
        Ok(TileSet { id, tiles })
    }

    fn parse_seeds(&mut self, assembly: &mut Assembly) -> Result<()> {
        self.expect("{")?;
        loop {
            let token = self.next("seed value")?;
            if token == "}" {
                return Ok(());
            }
            if assembly.seeds.len() >= MAX_ASSEMBLY_SEEDS {
                return Err(self.limit("assembly seeds", MAX_ASSEMBLY_SEEDS));
            }
            let seed = token
                .parse()
                .map_err(|_| self.syntax(format!("invalid seed '{token}'")))?;
            assembly.seeds.push(seed);
        }
    }

    /// Expand a `tileset <id> "min max"` rule into per-tile count bounds
    ///
    /// Draws `max` random members; every draw raises that tile's maximum,
    /// and the first `min` draws also raise its minimum.
    fn parse_tile_set_counts<R: Rng>(
        &mut self,
        theme: &MapTheme,
        assembly: &mut Assembly,
        rng: &mut R,
    ) -> Result<()> {
        let set_id = self.next("tileset reference")?;
        let Some(set) = theme.tile_set(&set_id) else {
            return Err(self.syntax(format!(
                "could not find tileset '{set_id}' in assembly '{}'",
                assembly.id
            )));
        };

        let (min, max) = self.parse_pair("tileset min/max")?;
        self.check_counts(&set_id, min, max)?;

        let mut remaining_min = min;
        for _ in 0..max {
            let pick = &set.tiles[rng.random_range(0..set.tiles.len())];
            let Some(index) = theme.tile_index(pick) else {
                return Err(AssemblyError::UnknownTile {
                    file: self.file.clone(),
                    id: pick.clone(),
                    context: format!("tileset '{set_id}'"),
                });
            };
            assembly.max[index] += 1;
            if remaining_min > 0 {
                assembly.min[index] += 1;
                remaining_min -= 1;
            }
        }
        Ok(())
    }

    fn check_counts(&self, id: &str, min: i64, max: i64) -> Result<()> {
        if min > max {
            return Err(self.syntax(format!("min is bigger than max for '{id}'")));
        }
        if max <= 0 {
            return Err(self.syntax(format!("max is <= 0 for '{id}'")));
        }
        if min < 0 {
            return Err(self.syntax(format!("min is negative for '{id}'")));
        }
        Ok(())
    }

    fn parse_fix<R: Rng>(
        &mut self,
        theme: &MapTheme,
        assembly: &mut Assembly,
        rng: &mut R,
    ) -> Result<()> {
        if assembly.fixed.len() >= MAX_FIXED_TILES {
            return Err(self.limit("fixed tiles", MAX_FIXED_TILES));
        }

        let mut token = self.next("fixed tile id")?;
        if token == "tileset" {
            // A fixed placement drawn randomly from a tile set
            let set_id = self.next("tileset reference")?;
            let Some(set) = theme.tile_set(&set_id) else {
                return Err(self.syntax(format!(
                    "could not find tileset '{set_id}' in assembly '{}'",
                    assembly.id
                )));
            };
            token = set.tiles[rng.random_range(0..set.tiles.len())].clone();
        }

        let Some(tile) = theme.tile_index(&token) else {
            return Err(AssemblyError::UnknownTile {
                file: self.file.clone(),
                id: token,
                context: format!("assembly '{}'", assembly.id),
            });
        };

        let (x, y) = self.parse_pair("fixed tile coordinates")?;
        if x < 0 || x >= MAX_MAP_EXTENT as i64 || y < 0 || y >= MAX_MAP_EXTENT as i64 {
            return Err(self.syntax(format!(
                "invalid fixed coordinates [{x} {y}], boundaries are [0:{}]",
                MAX_MAP_EXTENT - 1
            )));
        }

        assembly.fixed.push(FixedTile {
            tile,
            x: x as usize,
            y: y as usize,
        });
        Ok(())
    }

    fn parse_assembly<R: Rng>(&mut self, theme: &MapTheme, rng: &mut R) -> Result<Assembly> {
        let id = self.next("assembly name")?;
        let mut assembly = Assembly::new(&id, theme.tiles.len());
        self.expect("{")?;

        loop {
            let token = self.next("assembly entry")?;
            match token.as_str() {
                "}" => break,
                "title" => assembly.title = self.next("assembly title")?,
                "size" => {
                    let (w, h) = self.parse_pair("assembly size")?;
                    if w <= 0 || h <= 0 || w > MAX_MAP_EXTENT as i64 || h > MAX_MAP_EXTENT as i64 {
                        return Err(
                            self.syntax(format!("invalid size [{w} {h}] for assembly '{id}'"))
                        );
                    }
                    assembly.width = w as usize;
                    assembly.height = h as usize;
                }
                "grid" => {
                    let (dx, dy) = self.parse_pair("assembly grid step")?;
                    if dx <= 0 || dy <= 0 {
                        return Err(
                            self.syntax(format!("invalid grid step [{dx} {dy}] for '{id}'"))
                        );
                    }
                    assembly.dx = dx as usize;
                    assembly.dy = dy as usize;
                }
                "seeds" => self.parse_seeds(&mut assembly)?,
                "tileset" => self.parse_tile_set_counts(theme, &mut assembly, rng)?,
                "fix" => self.parse_fix(theme, &mut assembly, rng)?,
                tile_id => {
                    let Some(index) = theme.tile_index(tile_id) else {
                        return Err(AssemblyError::UnknownTile {
                            file: self.file.clone(),
                            id: tile_id.to_string(),
                            context: format!("assembly '{id}'"),
                        });
                    };
                    let (min, max) = self.parse_pair("tile min/max")?;
                    self.check_counts(tile_id, min, max)?;
                    assembly.min[index] = min as usize;
                    assembly.max[index] = max as usize;
                }
            }
        }

        Ok(assembly)
    }
}
