//! Shader programs handed to the renderer, plus the GLSL-style helpers the
//! CPU reference implementations share with the WGSL sources.

use glam::{Vec3, Vec4};

use crate::uniforms::{UniformError, UniformSet};

/// How fragments combine with the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blending {
    Opaque,
    /// `src * src_alpha + dst * (1 - src_alpha)`
    Alpha,
    /// `src * src_alpha + dst`
    Additive,
}

impl Blending {
    pub fn label(self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::Alpha => "alpha",
            Self::Additive => "additive",
        }
    }
}

/// Which faces are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    Double,
}

/// A vertex/fragment pair with its uniform bindings and raster state.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderProgram {
    pub label: &'static str,
    pub vertex_source: String,
    pub fragment_source: String,
    pub uniforms: UniformSet,
    /// Uniform names the sources read, in WGSL struct order.
    pub referenced: &'static [&'static str],
    pub blending: Blending,
    pub side: Side,
    pub depth_write: bool,
}

impl ShaderProgram {
    pub fn is_transparent(&self) -> bool {
        self.blending != Blending::Opaque
    }

    /// Verifies every referenced uniform has a value and that the set's
    /// order matches the declared struct order.
    pub fn validate(&self) -> Result<(), UniformError> {
        self.uniforms.ensure_bound(self.referenced)?;
        for (declared, bound) in self.referenced.iter().zip(self.uniforms.names()) {
            if *declared != bound {
                return Err(UniformError::OutOfOrder {
                    expected: *declared,
                    found: bound,
                });
            }
        }
        Ok(())
    }
}

/// Shared WGSL declarations: camera globals (group 0), per-object matrices
/// (group 1) and the vertex layout.
pub const COMMON_WGSL: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
}

struct ObjectConstants {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

fn world_normal(normal: vec3<f32>) -> vec3<f32> {
    return normalize(mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * normal);
}
"#;

/// Varyings of [`LOCAL_POSITION_VS`]; fragment stages reading the local
/// position include this too.
pub const LOCAL_VARYINGS: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) local_pos: vec3<f32>,
}
"#;

/// Vertex stage shared by the flat effects: passes the local position through.
pub const LOCAL_POSITION_VS: &str = r#"
@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = globals.view_proj * object.model * vec4<f32>(input.position, 1.0);
    out.local_pos = input.position;
    return out;
}
"#;

/// Concatenates WGSL fragments into one module source.
pub fn compose(parts: &[&str]) -> String {
    parts.concat()
}

/// Hermite interpolation between two edges. Reversed edges invert the ramp.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Unclamped linear blend, as GLSL `mix`.
pub fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Reflects an incident vector about a normal, as GLSL `reflect`.
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

pub fn rgba(color: Vec3, alpha: f32) -> Vec4 {
    color.extend(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::UniformSet;

    #[test]
    fn smoothstep_handles_reversed_edges() {
        assert!((smoothstep(0.8, 1.0, 0.9) - 0.5).abs() < 1e-5);
        assert!((smoothstep(1.0, 0.8, 0.9) - 0.5).abs() < 1e-5);
        assert_eq!(smoothstep(1.0, 0.8, 0.7), 1.0);
        assert_eq!(smoothstep(1.0, 0.8, 1.1), 0.0);
    }

    #[test]
    fn mix_is_unclamped() {
        assert_eq!(mix(Vec3::ZERO, Vec3::ONE, 1.5), Vec3::splat(1.5));
    }

    #[test]
    fn reflect_mirrors_about_normal() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn validate_catches_order_and_missing_bindings() {
        let mut program = ShaderProgram {
            label: "test",
            vertex_source: String::new(),
            fragment_source: String::new(),
            uniforms: UniformSet::new().with_float("uTime", 0.0),
            referenced: &["uTime", "uColor"],
            blending: Blending::Alpha,
            side: Side::Double,
            depth_write: false,
        };
        assert!(program.validate().is_err());
        program.uniforms = UniformSet::new()
            .with_vec3("uColor", Vec3::ONE)
            .with_float("uTime", 0.0);
        assert!(program.validate().is_err());
        program.uniforms = UniformSet::new()
            .with_float("uTime", 0.0)
            .with_vec3("uColor", Vec3::ONE);
        assert!(program.validate().is_ok());
        assert!(program.is_transparent());
    }
}
