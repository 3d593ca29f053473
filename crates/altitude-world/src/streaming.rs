use altitude_core::math::{view_bounds, world_to_chunk};
use altitude_core::types::{ChunkCoord, WorldPos};
use glam::{IVec3, UVec3};

/// Which chunk coordinates should be resident for a viewer position.
///
/// The resident set is an axis-aligned box of `view_distance` chunks per
/// axis around the viewer's rounded chunk coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingPolicy {
    chunk_size: UVec3,
    view_distance: UVec3,
}

impl StreamingPolicy {
    pub fn new(chunk_size: UVec3, view_distance: UVec3) -> Self {
        Self {
            chunk_size,
            view_distance,
        }
    }

    pub fn chunk_size(&self) -> UVec3 {
        self.chunk_size
    }

    pub fn view_distance(&self) -> UVec3 {
        self.view_distance
    }

    /// Chunk coordinate the view box is centered on.
    pub fn center_for(&self, viewer: WorldPos) -> ChunkCoord {
        world_to_chunk(viewer, self.chunk_size)
    }

    /// Every coordinate in the box around `center`, x-major.
    pub fn desired_coords(&self, center: ChunkCoord) -> impl Iterator<Item = ChunkCoord> {
        let (min, max) = view_bounds(center, self.view_distance);
        (min.x..max.x).flat_map(move |x| {
            (min.y..max.y).flat_map(move |y| (min.z..max.z).map(move |z| IVec3::new(x, y, z)))
        })
    }

    /// Whether `coord` lies in the box around `center`.
    pub fn contains(&self, center: ChunkCoord, coord: ChunkCoord) -> bool {
        let (min, max) = view_bounds(center, self.view_distance);
        coord.cmpge(min).all() && coord.cmplt(max).all()
    }

    /// Number of coordinates in one view box.
    pub fn box_len(&self) -> usize {
        self.view_distance.x as usize * self.view_distance.y as usize * self.view_distance.z as usize
    }
}
