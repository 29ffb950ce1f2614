//! Cube and UV-sphere geometry shared by every primitive of a scene.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::f32::consts::PI;

/// Vertex data (position + normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Cube faces as (normal, u axis, v axis) with u × v = normal
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

impl Mesh {
    /// Axis-aligned cube centered on the origin (4 vertices per face for flat normals)
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in CUBE_FACES {
            let (n, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
            let base = vertices.len() as u32;

            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (n + u * su + v * sv) * half;
                vertices.push(Vertex {
                    position: position.to_array(),
                    normal,
                });
            }

            // Counter-clockwise seen from outside
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self { vertices, indices }
    }

    /// UV sphere; `(width_segments + 1) * (height_segments + 1)` vertices
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let row_len = width_segments + 1;

        let mut vertices = Vec::with_capacity((row_len * (height_segments + 1)) as usize);
        let mut indices = Vec::new();

        // Rows from the north pole (+Y) down to the south pole
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = v * PI;

            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * 2.0 * PI;

                let normal = Vec3::new(
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                );
                vertices.push(Vertex {
                    position: (normal * radius).to_array(),
                    normal: normal.to_array(),
                });
            }
        }

        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row_len + ix + 1;
                let b = iy * row_len + ix;
                let c = (iy + 1) * row_len + ix;
                let d = (iy + 1) * row_len + ix + 1;

                // Pole rows collapse to one triangle per quad
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle_normal(mesh: &Mesh, tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from(mesh.vertices[i as usize].position);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]))
    }

    #[test]
    fn test_cube_counts() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.indices.len(), 36);
    }

    #[test]
    fn test_cube_fits_unit_box_and_winds_outward() {
        let cube = Mesh::cube(1.0);
        for v in &cube.vertices {
            for c in v.position {
                assert_relative_eq!(c.abs(), 0.5);
            }
        }
        for tri in cube.indices.chunks(3) {
            let face_normal = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!(triangle_normal(&cube, tri).dot(face_normal) > 0.0);
        }
    }

    #[test]
    fn test_sphere_vertex_count_matches_segments() {
        let sphere = Mesh::sphere(1.0, 128, 64);
        assert_eq!(sphere.vertex_count(), 129 * 65);
        // Two triangles per quad, minus one per quad in each pole row
        assert_eq!(sphere.indices.len(), (128 * 64 * 2 - 2 * 128) * 3);
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let sphere = Mesh::sphere(2.0, 16, 8);
        for v in &sphere.vertices {
            assert_relative_eq!(Vec3::from(v.position).length(), 2.0, epsilon = 1e-5);
            assert_relative_eq!(Vec3::from(v.normal).length(), 1.0, epsilon = 1e-5);
        }
        assert!(sphere
            .indices
            .iter()
            .all(|&i| (i as usize) < sphere.vertex_count()));
    }
}
