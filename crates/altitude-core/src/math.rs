use crate::types::{ChunkCoord, WorldPos};
use glam::{IVec3, UVec3, Vec3};

/// Convert a world position to the chunk coordinate nearest to it.
/// Rounds half to even per axis, so a viewer exactly between two chunks
/// resolves the same way every tick.
pub fn world_to_chunk(pos: WorldPos, chunk_size: UVec3) -> ChunkCoord {
    let scaled = pos / chunk_size.as_vec3();
    IVec3::new(
        scaled.x.round_ties_even() as i32,
        scaled.y.round_ties_even() as i32,
        scaled.z.round_ties_even() as i32,
    )
}

/// World-space origin (minimum corner) of a chunk.
pub fn chunk_origin(coord: ChunkCoord, chunk_size: UVec3) -> Vec3 {
    coord.as_vec3() * chunk_size.as_vec3()
}

/// Density grid dimensions for a chunk: N cells need N + 1 samples per axis.
pub fn grid_dims(chunk_size: UVec3) -> UVec3 {
    chunk_size + UVec3::ONE
}

/// Total sample count for grid dimensions.
pub fn grid_len(dims: UVec3) -> usize {
    dims.x as usize * dims.y as usize * dims.z as usize
}

/// Linear index of a local grid position.
///
/// This is the only addressing function: the sampler writes through it and
/// the extractor reads through it. `grid_local` is its inverse.
#[inline]
pub fn grid_index(dims: UVec3, local: UVec3) -> usize {
    debug_assert!(local.cmplt(dims).all(), "{local} outside grid {dims}");
    (local.x as usize * dims.y as usize + local.y as usize) * dims.z as usize + local.z as usize
}

/// Local grid position of a linear index.
#[inline]
pub fn grid_local(dims: UVec3, index: usize) -> UVec3 {
    let dz = dims.z as usize;
    let dy = dims.y as usize;
    UVec3::new(
        (index / (dy * dz)) as u32,
        ((index / dz) % dy) as u32,
        (index % dz) as u32,
    )
}

/// Half-open bounds `[min, max)` of the view box around `center`.
/// Each axis spans exactly `view_distance` chunks, offset so the center
/// chunk sits at `-d/2`. Bounds saturate at the edge of the coordinate
/// range, clipping the box instead of wrapping.
pub fn view_bounds(center: ChunkCoord, view_distance: UVec3) -> (ChunkCoord, ChunkCoord) {
    let extent = view_distance.min(UVec3::splat(i32::MAX as u32)).as_ivec3();
    let min = center.saturating_sub(extent / 2);
    (min, min.saturating_add(extent))
}
