//! Shared constants for the terrain engine.
//! Defaults here back `TerrainConfig::default()` and the tests.

/// Default side length of a chunk in world units (cells per axis).
pub const DEFAULT_CHUNK_SIZE: u32 = 16;

/// Default view box extent in chunks per axis.
pub const DEFAULT_VIEW_DISTANCE: [u32; 3] = [8, 4, 8];

/// Surface threshold. Samples below this value count as inside the surface.
pub const DEFAULT_ISO_LEVEL: f32 = 0.5;

/// Seconds between throttled mesh completions.
pub const DEFAULT_COMPLETE_INTERVAL: f32 = 0.025;

/// Seed for the gradient noise permutation table. The per-world seed in
/// `NoiseConfig` is a positional offset, so this never needs to change.
pub const NOISE_TABLE_SEED: u64 = 0x5EED_A171_7D0E;

/// Number of corners on a marching cube cell.
pub const CUBE_CORNERS: usize = 8;

/// Number of edges on a marching cube cell.
pub const CUBE_EDGES: usize = 12;

/// Max triangles a single cell can emit.
pub const MAX_TRIANGLES_PER_CELL: usize = 5;

/// Corner offsets in the fixed marching-cubes order. Bit k of a cube index
/// refers to the corner at `CORNER_OFFSETS[k]`.
pub const CORNER_OFFSETS: [[u32; 3]; CUBE_CORNERS] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 0, 1],
    [0, 0, 1],
    [0, 1, 0],
    [1, 1, 0],
    [1, 1, 1],
    [0, 1, 1],
];

/// Corner density differences below this are treated as a flat edge.
pub const INTERPOLATION_EPSILON: f32 = 1e-6;
