//! Flat spiral storm disk with a calm eye, turning slowly about its axis.
//!
//! The disk lies in the XY plane. The shader works in polar coordinates of
//! `local_pos.xy` and fades out toward the rim.

use glam::{Vec2, Vec3, Vec4};

use crate::app::FrameState;
use crate::color::Rgb;
use crate::geometry::Mesh;
use crate::noise::{fbm, simplex2, NOISE_WGSL};
use crate::shading::{
    compose, mix, rgba, smoothstep, Blending, ShaderProgram, Side, COMMON_WGSL,
    LOCAL_POSITION_VS, LOCAL_VARYINGS,
};
use crate::uniforms::{UniformSet, UniformValue};

use super::{find_mesh_mut, MeshInstance};

pub const STORM: &str = "hurricane";

pub const STORM_UNIFORMS: &[&str] = &["uTime", "uColorHigh", "uColorLow"];

/// Bulk rotation in radians per second of scaled time.
pub const ROTATION_RATE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HurricaneParams {
    pub high_color: Rgb,
    pub low_color: Rgb,
    pub speed: f32,
}

impl Default for HurricaneParams {
    fn default() -> Self {
        Self {
            high_color: Rgb::WHITE,
            low_color: Rgb::new(0.0, 0x44 as f32 / 255.0, 0xaa as f32 / 255.0),
            speed: 1.0,
        }
    }
}

const STORM_DECL: &str = r#"
struct StormUniforms {
    uTime: f32,
    uColorHigh: vec3<f32>,
    uColorLow: vec3<f32>,
}

@group(2) @binding(0)
var<uniform> storm: StormUniforms;
"#;

const STORM_FS: &str = r#"
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let angle = atan2(input.local_pos.y, input.local_pos.x);
    let dist = length(input.local_pos.xy);
    let t = storm.uTime;

    let swirl = angle + 2.0 * snoise2(vec2<f32>(dist * 2.0 - t * 0.2, t * 0.1));
    let n = fbm(vec2<f32>(swirl * 3.0, dist * 3.0 - t * 0.5));

    // Transparent at the centre, opaque from mid radius outward.
    let eye = smoothstep(0.2, 0.5, dist);
    let color = mix(storm.uColorLow, storm.uColorHigh, n + 0.5);

    var alpha = eye * (0.6 + n * 0.4);
    alpha *= 1.0 - smoothstep(0.8, 1.0, dist);
    return vec4<f32>(color, alpha);
}
"#;

fn storm_program(params: &HurricaneParams) -> ShaderProgram {
    ShaderProgram {
        label: STORM,
        vertex_source: compose(&[COMMON_WGSL, STORM_DECL, LOCAL_VARYINGS, LOCAL_POSITION_VS]),
        fragment_source: compose(&[COMMON_WGSL, NOISE_WGSL, STORM_DECL, LOCAL_VARYINGS, STORM_FS]),
        uniforms: UniformSet::new()
            .with_float("uTime", 0.0)
            .with_vec3("uColorHigh", params.high_color.linear())
            .with_vec3("uColorLow", params.low_color.linear()),
        referenced: STORM_UNIFORMS,
        blending: Blending::Alpha,
        side: Side::Double,
        depth_write: false,
    }
}

pub fn eye_mask(dist: f32) -> f32 {
    smoothstep(0.2, 0.5, dist)
}

/// Full alpha inside 0.8, nothing past 1.0.
pub fn edge_fade(dist: f32) -> f32 {
    smoothstep(1.0, 0.8, dist)
}

/// Angle after the time-varying swirl distortion.
pub fn swirl(angle: f32, dist: f32, time: f32) -> f32 {
    angle + 2.0 * simplex2(Vec2::new(dist * 2.0 - time * 0.2, time * 0.1))
}

/// CPU reference of the storm fragment stage at a local position.
pub fn shade(local: Vec3, time: f32, high: Vec3, low: Vec3) -> Vec4 {
    let angle = local.y.atan2(local.x);
    let dist = local.truncate().length();
    let n = fbm(Vec2::new(swirl(angle, dist, time) * 3.0, dist * 3.0 - time * 0.5));
    let color = mix(low, high, n + 0.5);
    let alpha = eye_mask(dist) * (0.6 + n * 0.4) * edge_fade(dist);
    rgba(color, alpha)
}

/// Z rotation of the whole plane at a point in the session.
pub fn rotation_z(elapsed: f32, speed: f32) -> f32 {
    elapsed * ROTATION_RATE * speed
}

#[derive(Debug, Clone)]
pub struct Hurricane {
    meshes: Vec<MeshInstance>,
}

impl Hurricane {
    pub fn mount(params: &HurricaneParams) -> Self {
        Self {
            meshes: vec![MeshInstance::new(
                STORM,
                Mesh::plane(4.0, 4.0, 64, 64),
                storm_program(params),
            )],
        }
    }

    pub fn sync_uniforms(&mut self, frame: &FrameState, params: &HurricaneParams) {
        let Some(storm) = find_mesh_mut(&mut self.meshes, STORM) else {
            return;
        };
        storm.apply("uTime", UniformValue::Float(frame.elapsed * params.speed));
        storm.apply("uColorHigh", UniformValue::Vec3(params.high_color.linear()));
        storm.apply("uColorLow", UniformValue::Vec3(params.low_color.linear()));
        storm.transform.rotation.z = rotation_z(frame.elapsed, params.speed);
    }

    pub fn meshes(&self) -> &[MeshInstance] {
        &self.meshes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_fade_is_clamped() {
        assert_eq!(edge_fade(0.7), 1.0);
        assert!((edge_fade(0.9) - 0.5).abs() < 1e-4);
        assert_eq!(edge_fade(1.1), 0.0);
    }

    #[test]
    fn eye_reveals_outward() {
        assert_eq!(eye_mask(0.1), 0.0);
        assert_eq!(eye_mask(0.6), 1.0);
        assert!(eye_mask(0.3) < eye_mask(0.4));
    }

    #[test]
    fn centre_and_rim_are_transparent() {
        let high = Vec3::ONE;
        let low = Vec3::new(0.0, 0.05, 0.4);
        assert_eq!(shade(Vec3::new(0.05, 0.05, 0.0), 2.0, high, low).w, 0.0);
        assert_eq!(shade(Vec3::new(1.5, 0.0, 0.0), 2.0, high, low).w, 0.0);
    }

    #[test]
    fn rotation_follows_elapsed_time_and_speed() {
        let params = HurricaneParams {
            speed: 2.0,
            ..HurricaneParams::default()
        };
        let mut hurricane = Hurricane::mount(&params);
        hurricane.sync_uniforms(
            &FrameState {
                elapsed: 5.0,
                delta: 0.016,
            },
            &params,
        );
        let storm = &hurricane.meshes()[0];
        assert!((storm.transform.rotation.z - 1.0).abs() < 1e-6);
        assert_eq!(storm.program.uniforms.float("uTime"), Some(10.0));
        assert!(storm.program.validate().is_ok());
        assert_eq!(storm.program.blending, Blending::Alpha);
    }

    #[test]
    fn default_low_color_matches_panel_hex() {
        assert_eq!(HurricaneParams::default().low_color.to_hex(), "#0044aa");
    }
}
