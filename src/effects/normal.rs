//! Plain lit sphere, spinning about its vertical axis.

use crate::app::FrameState;
use crate::color::Rgb;
use crate::geometry::Mesh;

use super::materials;
use super::{find_mesh_mut, MeshInstance};

pub const SPHERE: &str = "sphere";

pub const SPHERE_COLOR: Rgb = Rgb::new(0x44 as f32 / 255.0, 0x44 as f32 / 255.0, 1.0);
pub const ROUGHNESS: f32 = 0.1;
pub const METALNESS: f32 = 0.8;
/// Radians per second around Y.
pub const SPIN_RATE: f32 = 0.2;

/// The plain lit sphere shown when no shader effect is selected.
#[derive(Debug, Clone)]
pub struct NormalSphere {
    meshes: Vec<MeshInstance>,
}

impl NormalSphere {
    pub fn mount() -> Self {
        let program = materials::standard(SPHERE, SPHERE_COLOR.linear(), ROUGHNESS, METALNESS);
        Self {
            meshes: vec![MeshInstance::new(SPHERE, Mesh::sphere(1.5, 64, 64), program)],
        }
    }

    /// Spin accumulates from frame deltas, so it starts over on every mount.
    pub fn sync_uniforms(&mut self, frame: &FrameState) {
        if let Some(sphere) = find_mesh_mut(&mut self.meshes, SPHERE) {
            sphere.transform.rotation.y += frame.delta * SPIN_RATE;
        }
    }

    pub fn meshes(&self) -> &[MeshInstance] {
        &self.meshes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spins_by_delta() {
        let mut normal = NormalSphere::mount();
        for _ in 0..10 {
            normal.sync_uniforms(&FrameState {
                elapsed: 0.0,
                delta: 0.5,
            });
        }
        let rotation = normal.meshes()[0].transform.rotation.y;
        assert!((rotation - 1.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_color_matches_panel_hex() {
        assert_eq!(SPHERE_COLOR.to_hex(), "#4444ff");
        assert!(NormalSphere::mount().meshes()[0].program.validate().is_ok());
    }
}
