//! Marching-cubes isosurface extraction.
//!
//! Runs single-threaded on the caller's stack. Cells are visited in linear
//! density-index order, so output is deterministic for a given grid.

use altitude_core::constants::{CORNER_OFFSETS, CUBE_CORNERS, INTERPOLATION_EPSILON};
use altitude_core::math::{grid_index, grid_local};
use glam::{UVec3, Vec3};

use crate::density::{DensityGrid, DensitySample};
use crate::mesh::Mesh;
use crate::tables::{CORNER_INDEX_A_FROM_EDGE, CORNER_INDEX_B_FROM_EDGE, END, TRIANGULATION};

/// Bit k is set iff corner k lies below the surface.
pub fn cube_index(values: &[f32; CUBE_CORNERS], iso: f32) -> u8 {
    let mut index = 0u8;
    for (k, &value) in values.iter().enumerate() {
        if value < iso {
            index |= 1 << k;
        }
    }
    index
}

/// Surface crossing along the edge a→b. Equal densities yield the midpoint;
/// otherwise the parameter is clamped onto the edge.
pub fn interpolate_edge(a: &DensitySample, b: &DensitySample, iso: f32) -> Vec3 {
    let denom = b.value - a.value;
    let t = if denom.abs() < INTERPOLATION_EPSILON {
        0.5
    } else {
        ((iso - a.value) / denom).clamp(0.0, 1.0)
    };
    a.position + t * (b.position - a.position)
}

fn cell_corners(grid: &DensityGrid, cell: UVec3) -> [DensitySample; CUBE_CORNERS] {
    let dims = grid.dims();
    CORNER_OFFSETS.map(|offset| {
        let local = cell + UVec3::from_array(offset);
        *grid.sample_at_index(grid_index(dims, local))
    })
}

/// Extract the triangle mesh where `grid` crosses `iso`. Triangles are
/// emitted whole; every corner gets its own vertex.
pub fn extract_mesh(grid: &DensityGrid, iso: f32) -> Mesh {
    let mut mesh = Mesh::new();
    let dims = grid.dims();
    let cells = grid.cell_dims();
    if cells.cmpeq(UVec3::ZERO).any() {
        return mesh;
    }

    for index in 0..grid.len() {
        let cell = grid_local(dims, index);
        // Samples on the max faces only close cells, they don't start one
        if cell.cmpge(cells).any() {
            continue;
        }

        let corners = cell_corners(grid, cell);
        let values = corners.map(|c| c.value);
        let row = &TRIANGULATION[cube_index(&values, iso) as usize];

        for tri in row.chunks_exact(3) {
            if tri[0] == END {
                break;
            }
            let vertex = |edge: i8| {
                let edge = edge as usize;
                interpolate_edge(
                    &corners[CORNER_INDEX_A_FROM_EDGE[edge]],
                    &corners[CORNER_INDEX_B_FROM_EDGE[edge]],
                    iso,
                )
            };
            mesh.push_triangle([vertex(tri[0]), vertex(tri[1]), vertex(tri[2])]);
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use altitude_core::math::grid_dims;

    const ISO: f32 = 0.5;

    fn sample(position: Vec3, value: f32) -> DensitySample {
        DensitySample { position, value }
    }

    #[test]
    fn test_uniform_cubes_have_extreme_indices() {
        assert_eq!(cube_index(&[1.0; 8], ISO), 0);
        assert_eq!(cube_index(&[ISO; 8], ISO), 0, "iso itself counts as outside");
        assert_eq!(cube_index(&[-1.0; 8], ISO), 255);

        let mut values = [1.0; 8];
        values[6] = 0.0;
        assert_eq!(cube_index(&values, ISO), 1 << 6);
    }

    #[test]
    fn test_all_solid_grid_emits_nothing() {
        let grid = DensityGrid::from_fn(grid_dims(UVec3::splat(8)), |_| ISO - 1.0);
        let mesh = extract_mesh(&grid, ISO);
        assert!(mesh.is_empty());
        assert!(mesh.vertices.is_empty());
    }

    #[test]
    fn test_all_empty_grid_emits_nothing() {
        let grid = DensityGrid::from_fn(grid_dims(UVec3::splat(4)), |_| ISO + 3.0);
        assert!(extract_mesh(&grid, ISO).is_empty());
    }

    #[test]
    fn test_linear_field_surface_at_crossing_height() {
        let h = 2.3f32;
        let grid = DensityGrid::from_fn(grid_dims(UVec3::new(4, 6, 5)), |local| {
            ISO + (h - local.y as f32)
        });
        let mesh = extract_mesh(&grid, ISO);

        assert!(!mesh.is_empty());
        // One horizontal layer of 4x5 cells, two triangles each
        assert_eq!(mesh.triangle_count(), 4 * 5 * 2);
        for v in &mesh.vertices {
            assert!((v.y - h).abs() < 1e-5, "vertex {v} off the plane y = {h}");
        }
        let (min, max) = mesh.bounds().expect("non-empty");
        assert_eq!((min.x, min.z), (0.0, 0.0));
        assert_eq!((max.x, max.z), (4.0, 5.0));
    }

    #[test]
    fn test_extraction_is_deterministic_and_whole() {
        let grid = DensityGrid::from_fn(grid_dims(UVec3::splat(6)), |l| {
            let p = l.as_vec3() - Vec3::splat(3.0);
            p.length() - 2.2
        });
        let a = extract_mesh(&grid, 0.0);
        let b = extract_mesh(&grid, 0.0);
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert_eq!(a.indices.len() % 3, 0);
        assert_eq!(a.indices.len(), a.vertices.len());
        assert!(a.indices.iter().enumerate().all(|(i, &idx)| idx as usize == i));
    }

    #[test]
    fn test_degenerate_edge_falls_back_to_midpoint() {
        let a = sample(Vec3::ZERO, ISO);
        let b = sample(Vec3::X, ISO);
        assert_eq!(interpolate_edge(&a, &b, ISO), Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_interpolation_clamped_to_edge() {
        let a = sample(Vec3::ZERO, 0.0);
        let b = sample(Vec3::Y, 0.2);
        let v = interpolate_edge(&a, &b, ISO);
        assert!(v.is_finite());
        assert_eq!(v, Vec3::Y);
    }

    #[test]
    fn test_exact_interpolation() {
        let a = sample(Vec3::new(1.0, 2.0, 3.0), 0.0);
        let b = sample(Vec3::new(1.0, 2.0, 4.0), 2.0);
        assert_eq!(interpolate_edge(&a, &b, ISO), Vec3::new(1.0, 2.0, 3.25));
    }

    #[test]
    fn test_flat_plateau_produces_no_nan() {
        // Corners sitting exactly on iso must not produce non-finite vertices
        let grid = DensityGrid::from_fn(grid_dims(UVec3::splat(3)), |l| {
            if l.y == 0 {
                ISO - 1.0
            } else {
                ISO
            }
        });
        let mesh = extract_mesh(&grid, ISO);
        assert!(mesh.vertices.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_degenerate_grid_dims() {
        let grid = DensityGrid::from_fn(UVec3::new(1, 5, 5), |_| -1.0);
        assert!(extract_mesh(&grid, ISO).is_empty());
    }
}
