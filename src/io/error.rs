//! Error types for catalogue parsing and assembly

use std::fmt;
use std::path::PathBuf;

/// Main error type for theme loading and map assembly
#[derive(Debug)]
pub enum AssemblyError {
    /// Failed to load a theme definition file from the filesystem
    ThemeLoad {
        /// Path to the theme file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Theme definition text doesn't follow the UMP format
    Syntax {
        /// Name of the file being parsed
        file: String,
        /// Description of what's wrong with the definition
        reason: String,
    },

    /// Tile definition exceeds the supported extent
    TileSize {
        /// Name of the file being parsed
        file: String,
        /// The id of the offending tile
        id: String,
        /// Declared width in grid cells
        width: usize,
        /// Declared height in grid cells
        height: usize,
    },

    /// A tile id was referenced that no tile definition provides
    UnknownTile {
        /// Name of the file being parsed
        file: String,
        /// The unresolved tile id
        id: String,
        /// Where the reference appeared (assembly id, tile set id, ...)
        context: String,
    },

    /// A catalogue section grew beyond its fixed capacity
    LimitExceeded {
        /// Name of the file being parsed
        file: String,
        /// What overflowed
        what: &'static str,
        /// The capacity that was exceeded
        limit: usize,
    },

    /// Theme defines no tiles
    NoTiles {
        /// Theme name
        theme: String,
    },

    /// Theme defines no assemblies
    NoAssemblies {
        /// Theme name
        theme: String,
    },

    /// No tiling satisfies the assembly's constraints
    ///
    /// Raised after the retry budget against the assembly's seed list is
    /// exhausted, or immediately when the assembly has no seed list. No
    /// partial map is ever returned.
    Unsolvable {
        /// Theme name
        theme: String,
        /// Assembly id
        assembly: String,
    },
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThemeLoad { path, source } => {
                write!(f, "Failed to load theme '{}': {source}", path.display())
            }
            Self::Syntax { file, reason } => {
                write!(f, "Syntax error in '{file}': {reason}")
            }
            Self::TileSize {
                file,
                id,
                width,
                height,
            } => {
                write!(
                    f,
                    "Bad tile size [{width} {height}] for tile '{id}' ({file})"
                )
            }
            Self::UnknownTile { file, id, context } => {
                write!(f, "Could not find tile '{id}' referenced by {context} ({file})")
            }
            Self::LimitExceeded { file, what, limit } => {
                write!(f, "Too many {what} (limit {limit}) in '{file}'")
            }
            Self::NoTiles { theme } => {
                write!(f, "No map tiles defined ({theme})")
            }
            Self::NoAssemblies { theme } => {
                write!(f, "No map assemblies defined ({theme})")
            }
            Self::Unsolvable { theme, assembly } => {
                write!(
                    f,
                    "Impossible to assemble map '{theme}' with assembly '{assembly}'"
                )
            }
        }
    }
}

impl std::error::Error for AssemblyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ThemeLoad { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for assembly results
pub type Result<T> = std::result::Result<T, AssemblyError>;

/// Create a syntax error for the given file
pub fn syntax_error(file: &str, reason: impl ToString) -> AssemblyError {
    AssemblyError::Syntax {
        file: file.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_assembly() {
        let err = AssemblyError::Unsolvable {
            theme: "forest".to_string(),
            assembly: "large".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("forest"));
        assert!(text.contains("large"));
    }
}
