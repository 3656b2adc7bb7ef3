use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Floats per interleaved vertex: `position.xyz` followed by `normal.xyz`.
pub const FLOATS_PER_VERTEX: usize = 6;

/// GPU ready triangle list with interleaved vertices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    fn push_vertex(&mut self, position: Vec3, normal: Vec3) {
        self.vertices.extend_from_slice(&position.to_array());
        self.vertices.extend_from_slice(&normal.to_array());
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let base = index * FLOATS_PER_VERTEX;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        let base = index * FLOATS_PER_VERTEX + 3;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    /// UV sphere centred on the origin with counter-clockwise outward faces.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut mesh = Self::default();
        let mut grid: Vec<Vec<u32>> = Vec::with_capacity(height_segments as usize + 1);
        let mut index = 0u32;

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = v * PI;
            let mut row = Vec::with_capacity(width_segments as usize + 1);
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * TAU;
                let position = Vec3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                );
                let normal = position.try_normalize().unwrap_or(Vec3::Y);
                mesh.push_vertex(position, normal);
                row.push(index);
                index += 1;
            }
            grid.push(row);
        }

        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];
                // Pole rows collapse to a point; skip their degenerate halves.
                if iy != 0 {
                    mesh.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments as usize - 1 {
                    mesh.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        mesh
    }

    /// Flat annulus in the XY plane facing +Z.
    pub fn ring(inner_radius: f32, outer_radius: f32, theta_segments: u32) -> Self {
        let theta_segments = theta_segments.max(3);
        let mut mesh = Self::default();

        for radius in [inner_radius, outer_radius] {
            for i in 0..=theta_segments {
                let segment = i as f32 / theta_segments as f32 * TAU;
                let position = Vec3::new(radius * segment.cos(), radius * segment.sin(), 0.0);
                mesh.push_vertex(position, Vec3::Z);
            }
        }

        for i in 0..theta_segments {
            let a = i;
            let b = i + theta_segments + 1;
            let c = i + theta_segments + 2;
            let d = i + 1;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
        mesh
    }

    /// Subdivided rectangle in the XY plane facing +Z, centred on the origin.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;
        let mut mesh = Self::default();

        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - height / 2.0;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - width / 2.0;
                mesh.push_vertex(Vec3::new(x, -y, 0.0), Vec3::Z);
            }
        }

        let row = grid_x + 1;
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = ix + 1 + row * (iy + 1);
                let d = ix + 1 + row * iy;
                mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(mesh: &Mesh, triangle: usize) -> Vec3 {
        let i = &mesh.indices[triangle * 3..triangle * 3 + 3];
        let a = mesh.position(i[0] as usize);
        let b = mesh.position(i[1] as usize);
        let c = mesh.position(i[2] as usize);
        (b - a).cross(c - a)
    }

    #[test]
    fn sphere_has_expected_counts_and_radius() {
        let mesh = Mesh::sphere(1.5, 64, 64);
        assert_eq!(mesh.vertex_count(), 65 * 65);
        // Two triangles per quad minus one per quad in each pole row.
        assert_eq!(mesh.indices.len() / 3, 64 * 64 * 2 - 2 * 64);
        for index in [0, 100, 2000, 4224] {
            assert!((mesh.position(index).length() - 1.5).abs() < 1e-4);
            assert!((mesh.normal(index).length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_faces_point_outward() {
        let mesh = Mesh::sphere(1.0, 16, 16);
        for triangle in [20, 150, 300] {
            let i = mesh.indices[triangle * 3] as usize;
            assert!(face_normal(&mesh, triangle).dot(mesh.position(i)) > 0.0);
        }
    }

    #[test]
    fn ring_spans_its_radii() {
        let mesh = Mesh::ring(0.4, 1.0, 64);
        assert_eq!(mesh.vertex_count(), 2 * 65);
        assert_eq!(mesh.indices.len() / 3, 128);
        assert!((mesh.position(0).length() - 0.4).abs() < 1e-6);
        assert!((mesh.position(65).length() - 1.0).abs() < 1e-6);
        assert!(face_normal(&mesh, 0).z > 0.0);
    }

    #[test]
    fn plane_is_centred_and_faces_forward() {
        let mesh = Mesh::plane(4.0, 4.0, 64, 64);
        assert_eq!(mesh.vertex_count(), 65 * 65);
        assert_eq!(mesh.indices.len() / 3, 64 * 64 * 2);
        assert_eq!(mesh.position(0), Vec3::new(-2.0, 2.0, 0.0));
        assert_eq!(mesh.position(65 * 65 - 1), Vec3::new(2.0, -2.0, 0.0));
        assert!(face_normal(&mesh, 0).z > 0.0);
    }
}
