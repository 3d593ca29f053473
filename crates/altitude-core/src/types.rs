use glam::{IVec3, Vec3};

/// Chunk coordinate in chunk-space (each unit = one chunk extent).
/// Derived once by rounding, so map keys never compare floats.
pub type ChunkCoord = IVec3;

/// Position in world units.
pub type WorldPos = Vec3;

/// Serial number handed to each chunk at creation.
///
/// A coordinate can be evicted and re-created while an older entry for it
/// still sits in the completion queue; the id tells the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkId(pub u64);

impl ChunkId {
    /// Return this id and advance the counter.
    pub fn next(counter: &mut ChunkId) -> ChunkId {
        let id = *counter;
        counter.0 += 1;
        id
    }
}
