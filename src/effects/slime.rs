//! Displaced, rim-lit translucent sphere. The only effect with work in the
//! vertex stage.

use glam::{Vec3, Vec4};

use crate::app::FrameState;
use crate::color::Rgb;
use crate::geometry::Mesh;
use crate::noise::{simplex3, NOISE_WGSL};
use crate::shading::{compose, reflect, rgba, Blending, ShaderProgram, Side, COMMON_WGSL};
use crate::uniforms::{UniformSet, UniformValue};

use super::{find_mesh_mut, MeshInstance};

pub const BLOB: &str = "slime";

pub const SLIME_UNIFORMS: &[&str] = &["uTime", "uDistortion", "uColor", "uRimColor"];

pub const ALPHA: f32 = 0.9;
pub const SHININESS: f32 = 32.0;
pub const RIM_POWER: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlimeParams {
    pub color: Rgb,
    pub rim_color: Rgb,
    pub speed: f32,
    pub distortion: f32,
}

impl Default for SlimeParams {
    fn default() -> Self {
        Self {
            color: Rgb::new(0.0, 1.0, 0x44 as f32 / 255.0),
            rim_color: Rgb::new(0xcc as f32 / 255.0, 1.0, 0.0),
            speed: 1.0,
            distortion: 0.3,
        }
    }
}

const SLIME_DECL: &str = r#"
struct SlimeUniforms {
    uTime: f32,
    uDistortion: f32,
    uColor: vec3<f32>,
    uRimColor: vec3<f32>,
}

@group(2) @binding(0)
var<uniform> slime: SlimeUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) displaced: vec3<f32>,
}
"#;

const SLIME_VS: &str = r#"
@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let n = snoise3(input.position * 2.0 + vec3<f32>(slime.uTime * 0.5));
    let displaced = input.position + input.normal * n * slime.uDistortion;

    out.position = globals.view_proj * object.model * vec4<f32>(displaced, 1.0);
    out.normal = input.normal;
    out.displaced = displaced;
    return out;
}
"#;

const SLIME_FS: &str = r#"
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    // View direction approximated from the displaced local position.
    let view_dir = normalize(-input.displaced);
    let light_dir = normalize(vec3<f32>(1.0, 1.0, 1.0));

    let diff = max(dot(normal, light_dir), 0.0);
    let fresnel = pow(1.0 - max(dot(view_dir, normal), 0.0), 3.0);
    let reflect_dir = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), 32.0);

    let color = slime.uColor * (diff * 0.5 + 0.5) + slime.uRimColor * fresnel + vec3<f32>(1.0) * spec * 0.5;
    return vec4<f32>(color, 0.9);
}
"#;

fn slime_program(params: &SlimeParams) -> ShaderProgram {
    ShaderProgram {
        label: BLOB,
        vertex_source: compose(&[COMMON_WGSL, NOISE_WGSL, SLIME_DECL, SLIME_VS]),
        fragment_source: compose(&[COMMON_WGSL, SLIME_DECL, SLIME_FS]),
        uniforms: UniformSet::new()
            .with_float("uTime", 0.0)
            .with_float("uDistortion", params.distortion)
            .with_vec3("uColor", params.color.linear())
            .with_vec3("uRimColor", params.rim_color.linear()),
        referenced: SLIME_UNIFORMS,
        blending: Blending::Alpha,
        side: Side::Front,
        depth_write: true,
    }
}

/// CPU reference of the vertex stage: pushes `position` along `normal` by the
/// noise sample times `distortion`.
pub fn displace(position: Vec3, normal: Vec3, time: f32, distortion: f32) -> Vec3 {
    let n = simplex3(position * 2.0 + Vec3::splat(time * 0.5));
    position + normal * n * distortion
}

/// CPU reference of the fragment stage.
pub fn shade(normal: Vec3, displaced: Vec3, base: Vec3, rim: Vec3) -> Vec4 {
    let normal = normal.normalize_or_zero();
    let view_dir = (-displaced).normalize_or_zero();
    let light_dir = Vec3::ONE.normalize();

    let diff = normal.dot(light_dir).max(0.0);
    let fresnel = (1.0 - view_dir.dot(normal).max(0.0)).powf(RIM_POWER);
    let reflect_dir = reflect(-light_dir, normal);
    let spec = view_dir.dot(reflect_dir).max(0.0).powf(SHININESS);

    let color = base * (diff * 0.5 + 0.5) + rim * fresnel + Vec3::ONE * spec * 0.5;
    rgba(color, ALPHA)
}

#[derive(Debug, Clone)]
pub struct Slime {
    meshes: Vec<MeshInstance>,
}

impl Slime {
    pub fn mount(params: &SlimeParams) -> Self {
        Self {
            meshes: vec![MeshInstance::new(
                BLOB,
                Mesh::sphere(1.5, 128, 128),
                slime_program(params),
            )],
        }
    }

    pub fn sync_uniforms(&mut self, frame: &FrameState, params: &SlimeParams) {
        let Some(blob) = find_mesh_mut(&mut self.meshes, BLOB) else {
            return;
        };
        blob.apply("uTime", UniformValue::Float(frame.elapsed * params.speed));
        blob.apply("uDistortion", UniformValue::Float(params.distortion));
        blob.apply("uColor", UniformValue::Vec3(params.color.linear()));
        blob.apply("uRimColor", UniformValue::Vec3(params.rim_color.linear()));
    }

    pub fn meshes(&self) -> &[MeshInstance] {
        &self.meshes
    }
}
