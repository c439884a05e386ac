//! Engine constants and runtime configuration defaults

// Catalogue limits, enforced at parse time
/// Maximum number of tile definitions per theme
pub const MAX_TILE_TYPES: usize = 128;
/// Maximum number of tile sets per theme
pub const MAX_TILE_SETS: usize = 16;
/// Maximum number of tiles inside one tile set
pub const MAX_TILE_SET_TILES: usize = 16;
/// Maximum number of assemblies per theme
pub const MAX_ASSEMBLIES: usize = 32;
/// Maximum number of fixed placements per assembly
pub const MAX_FIXED_TILES: usize = 64;
/// Maximum number of alternate seeds per assembly
pub const MAX_ASSEMBLY_SEEDS: usize = 32;
/// Maximum tile extent per axis, in grid cells
pub const MAX_TILE_EXTENT: usize = 16;
/// Maximum assembly extent per axis, in grid cells
pub const MAX_MAP_EXTENT: usize = 32;

// Search limits. These are sized generously above any known legitimate
// assembly's needs; exceeding one is an assertion failure, not a runtime
// condition.
/// Maximum recursion depth of the gap-coverage search
pub const MAX_RECURSION: usize = 64;
/// Maximum number of live tile/position candidates at one search depth
pub const MAX_TILE_POSITIONS: usize = 1700;
/// Maximum number of placements on one map
pub const MAX_PLACED_TILES: usize = 256;
/// How many covering candidates are remembered per gap cell; gaps with more
/// alternatives than this are deferred to the unordered fallback pass
pub const GAP_ALTERNATIVES: usize = 25;
/// Multiplier of the packed position-times-base-plus-tile candidate encoding
pub const TILE_CODE_BASE: usize = MAX_TILE_TYPES;

// Parallel search
/// Hard cap on concurrent assembly workers
pub const ASSEMBLE_THREADS: usize = 2;
/// Initial orchestrator timeout before workers are restarted; doubles on
/// every restart
pub const INITIAL_SEARCH_TIMEOUT_MS: u64 = 5000;

// Seed policy
/// How often a failed assembly may be retried with a seed from the
/// assembly's seed list before the failure becomes fatal
pub const MAX_SEED_RETRIES: u32 = 2;
/// Unseeded runs draw their seed from this range to keep them reproducible
pub const RANDOM_SEED_RANGE: u64 = 50;

/// World units per grid cell in the emitted position string
pub const WORLD_UNITS_PER_CELL: i32 = 8;
