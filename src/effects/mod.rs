//! The four orb effects and the pieces they are built from.
//!
//! Each effect owns the meshes it mounts. `mount` builds geometry and shader
//! programs from the current panel values, `sync_uniforms` re-applies time and
//! panel values once per frame. Nothing survives a remount.

pub mod black_hole;
pub mod hurricane;
pub mod materials;
pub mod normal;
pub mod slime;

use std::fmt;
use std::str::FromStr;

use glam::{EulerRot, Mat4, Quat, Vec3};
use log::warn;
use thiserror::Error;

use crate::geometry::Mesh;
use crate::shading::ShaderProgram;
use crate::uniforms::UniformValue;

pub use black_hole::{BlackHole, BlackHoleParams};
pub use hurricane::{Hurricane, HurricaneParams};
pub use normal::NormalSphere;
pub use slime::{Slime, SlimeParams};

/// Which effect the orb shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectMode {
    #[default]
    Normal,
    BlackHole,
    Hurricane,
    Slime,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown effect mode `{0}` (expected Normal, Black Hole, Hurricane or Slime)")]
pub struct UnknownEffectMode(pub String);

impl EffectMode {
    pub const ALL: [Self; 4] = [Self::Normal, Self::BlackHole, Self::Hurricane, Self::Slime];

    /// Label shown in the panel dropdown.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::BlackHole => "Black Hole",
            Self::Hurricane => "Hurricane",
            Self::Slime => "Slime",
        }
    }

    /// The following mode in dropdown order, wrapping around.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|mode| *mode == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl FromStr for EffectMode {
    type Err = UnknownEffectMode;

    /// Accepts dropdown labels and their compact forms (`BlackHole`,
    /// `black-hole`), ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "normal" => Ok(Self::Normal),
            "blackhole" => Ok(Self::BlackHole),
            "hurricane" => Ok(Self::Hurricane),
            "slime" => Ok(Self::Slime),
            _ => Err(UnknownEffectMode(s.trim().to_string())),
        }
    }
}

impl fmt::Display for EffectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Translation, XYZ Euler rotation (radians) and scale of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// A mesh bound to a shader program, as mounted by an effect.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    pub name: &'static str,
    pub geometry: Mesh,
    pub program: ShaderProgram,
    pub transform: Transform,
}

impl MeshInstance {
    pub fn new(name: &'static str, geometry: Mesh, program: ShaderProgram) -> Self {
        Self {
            name,
            geometry,
            program,
            transform: Transform::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Writes a uniform value. A rejected write keeps the previous value.
    pub fn apply(&mut self, name: &str, value: UniformValue) {
        if let Err(err) = self.program.uniforms.set(name, value) {
            warn!("{}: {err}", self.name);
        }
    }
}

pub(crate) fn find_mesh_mut<'a>(
    meshes: &'a mut [MeshInstance],
    name: &str,
) -> Option<&'a mut MeshInstance> {
    meshes.iter_mut().find(|mesh| mesh.name == name)
}
