//! Seam to the render/collision collaborator.

use std::collections::HashMap;

use altitude_core::types::ChunkCoord;
use glam::Vec3;

use crate::mesh::Mesh;

/// Material hint for a chunk, from the sign of its origin height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Origin at or above y = 0.
    Above,
    Below,
}

impl SurfaceKind {
    pub fn from_origin(origin: Vec3) -> Self {
        if origin.y >= 0.0 {
            SurfaceKind::Above
        } else {
            SurfaceKind::Below
        }
    }
}

/// Receives generated meshes. Each chunk is attached exactly once, after its
/// mesh is built, and detached when it is evicted or at shutdown.
pub trait MeshSink {
    fn attach(&mut self, coord: ChunkCoord, origin: Vec3, mesh: &Mesh);
    fn detach(&mut self, coord: ChunkCoord);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MeshSink for NullSink {
    fn attach(&mut self, _coord: ChunkCoord, _origin: Vec3, _mesh: &Mesh) {}
    fn detach(&mut self, _coord: ChunkCoord) {}
}

/// What a `RecordingSink` holds for one attached chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedChunk {
    pub origin: Vec3,
    pub triangle_count: usize,
    pub surface: SurfaceKind,
    /// Mesh extent, sized for a collider. None for an empty mesh.
    pub bounds: Option<(Vec3, Vec3)>,
}

/// Keeps track of attached chunks; used by tests and the stream runner.
#[derive(Debug, Default)]
pub struct RecordingSink {
    attached: HashMap<ChunkCoord, AttachedChunk>,
    pub attach_calls: usize,
    pub detach_calls: usize,
    /// Attaches for a coordinate that was already attached.
    pub double_attaches: usize,
    /// Detaches for a coordinate that was not attached.
    pub stray_detaches: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> &HashMap<ChunkCoord, AttachedChunk> {
        &self.attached
    }

    pub fn is_attached(&self, coord: &ChunkCoord) -> bool {
        self.attached.contains_key(coord)
    }

    pub fn total_triangles(&self) -> usize {
        self.attached.values().map(|c| c.triangle_count).sum()
    }
}

impl MeshSink for RecordingSink {
    fn attach(&mut self, coord: ChunkCoord, origin: Vec3, mesh: &Mesh) {
        self.attach_calls += 1;
        let entry = AttachedChunk {
            origin,
            triangle_count: mesh.triangle_count(),
            surface: SurfaceKind::from_origin(origin),
            bounds: mesh.bounds(),
        };
        if self.attached.insert(coord, entry).is_some() {
            self.double_attaches += 1;
        }
    }

    fn detach(&mut self, coord: ChunkCoord) {
        self.detach_calls += 1;
        if self.attached.remove(&coord).is_none() {
            self.stray_detaches += 1;
        }
    }
}
