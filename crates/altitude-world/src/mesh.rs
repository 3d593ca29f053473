use glam::Vec3;

/// Triangle soup in chunk-local space. Every triangle corner owns its own
/// vertex; nothing is welded across cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    /// Three consecutive indices form one triangle.
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append one whole triangle.
    pub fn push_triangle(&mut self, corners: [Vec3; 3]) {
        for corner in corners {
            self.indices.push(self.vertices.len() as u32);
            self.vertices.push(corner);
        }
    }

    /// Axis-aligned extent of the vertices, or None for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), &v| (min.min(v), max.max(v))),
        )
    }
}
