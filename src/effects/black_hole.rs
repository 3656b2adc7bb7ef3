//! Event horizon, accretion disk and glow halo.
//!
//! Only the disk runs a procedural shader. Its ring geometry is built on unit
//! radii and scaled up by the transform, so `length(local_pos.xy)` spans the
//! 0.4..1.0 band the ring mask is written for.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3, Vec4};

use crate::app::FrameState;
use crate::color::Rgb;
use crate::geometry::Mesh;
use crate::noise::{simplex2, NOISE_WGSL};
use crate::shading::{
    compose, mix, rgba, smoothstep, Blending, ShaderProgram, Side, COMMON_WGSL,
    LOCAL_POSITION_VS, LOCAL_VARYINGS,
};
use crate::uniforms::{UniformSet, UniformValue};

use super::materials;
use super::{find_mesh_mut, MeshInstance, Transform};

pub const EVENT_HORIZON: &str = "eventHorizon";
pub const ACCRETION_DISK: &str = "accretionDisk";
pub const GLOW_HALO: &str = "glowHalo";

pub const DISK_UNIFORMS: &[&str] = &["uTime", "uColorInner", "uColorOuter"];

pub const DISK_INNER_RADIUS: f32 = 0.4;
pub const DISK_OUTER_RADIUS: f32 = 1.0;
pub const DISK_SCALE: f32 = 3.0;
pub const HALO_SCALE: f32 = 1.05;
pub const HALO_OPACITY: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackHoleParams {
    pub inner_color: Rgb,
    pub outer_color: Rgb,
    pub speed: f32,
}

impl Default for BlackHoleParams {
    fn default() -> Self {
        Self {
            inner_color: Rgb::new(1.0, 0x66 as f32 / 255.0, 0.0),
            outer_color: Rgb::BLACK,
            speed: 1.0,
        }
    }
}

const DISK_DECL: &str = r#"
struct DiskUniforms {
    uTime: f32,
    uColorInner: vec3<f32>,
    uColorOuter: vec3<f32>,
}

@group(2) @binding(0)
var<uniform> disk: DiskUniforms;
"#;

const DISK_FS: &str = r#"
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let dist = length(input.local_pos.xy);
    let angle = atan2(input.local_pos.y, input.local_pos.x);

    let noise = snoise2(vec2<f32>(dist * 3.0 - disk.uTime * 0.5, angle * 2.0 + disk.uTime * 0.2));
    let ring = smoothstep(0.4, 0.6, dist) * (1.0 - smoothstep(0.6, 0.9, dist));

    let color = mix(disk.uColorInner, disk.uColorOuter, dist + noise * 0.2);
    let alpha = ring * (0.8 + noise * 0.2);
    return vec4<f32>(color, alpha);
}
"#;

fn disk_program(params: &BlackHoleParams) -> ShaderProgram {
    ShaderProgram {
        label: ACCRETION_DISK,
        vertex_source: compose(&[COMMON_WGSL, DISK_DECL, LOCAL_VARYINGS, LOCAL_POSITION_VS]),
        fragment_source: compose(&[COMMON_WGSL, NOISE_WGSL, DISK_DECL, LOCAL_VARYINGS, DISK_FS]),
        uniforms: UniformSet::new()
            .with_float("uTime", 0.0)
            .with_vec3("uColorInner", params.inner_color.linear())
            .with_vec3("uColorOuter", params.outer_color.linear()),
        referenced: DISK_UNIFORMS,
        blending: Blending::Additive,
        side: Side::Double,
        depth_write: false,
    }
}

/// Ring mask of the disk: fades in over 0.4..0.6 and out over 0.6..0.9.
pub fn ring_mask(dist: f32) -> f32 {
    smoothstep(0.4, 0.6, dist) * smoothstep(0.9, 0.6, dist)
}

pub fn disk_color(dist: f32, noise: f32, inner: Vec3, outer: Vec3) -> Vec3 {
    mix(inner, outer, dist + noise * 0.2)
}

/// CPU reference of the disk fragment stage at a local position.
pub fn shade_disk(local: Vec3, time: f32, inner: Vec3, outer: Vec3) -> Vec4 {
    let dist = local.truncate().length();
    let angle = local.y.atan2(local.x);
    let noise = simplex2(Vec2::new(dist * 3.0 - time * 0.5, angle * 2.0 + time * 0.2));
    let alpha = ring_mask(dist) * (0.8 + noise * 0.2);
    rgba(disk_color(dist, noise, inner, outer), alpha)
}

#[derive(Debug, Clone)]
pub struct BlackHole {
    meshes: Vec<MeshInstance>,
}

impl BlackHole {
    pub fn mount(params: &BlackHoleParams) -> Self {
        let horizon = MeshInstance::new(
            EVENT_HORIZON,
            Mesh::sphere(1.0, 64, 64),
            materials::basic(EVENT_HORIZON, Vec3::ZERO, 1.0, Side::Front),
        );
        let disk = MeshInstance::new(
            ACCRETION_DISK,
            Mesh::ring(DISK_INNER_RADIUS, DISK_OUTER_RADIUS, 64),
            disk_program(params),
        )
        .with_transform(Transform {
            rotation: Vec3::new(-FRAC_PI_2, 0.0, 0.0),
            scale: Vec3::splat(DISK_SCALE),
            ..Transform::default()
        });
        let halo = MeshInstance::new(
            GLOW_HALO,
            Mesh::sphere(1.0, 32, 32),
            materials::basic(GLOW_HALO, params.inner_color.linear(), HALO_OPACITY, Side::Back),
        )
        .with_transform(Transform {
            scale: Vec3::splat(HALO_SCALE),
            ..Transform::default()
        });

        Self {
            meshes: vec![horizon, disk, halo],
        }
    }

    pub fn sync_uniforms(&mut self, frame: &FrameState, params: &BlackHoleParams) {
        let inner = params.inner_color.linear();
        if let Some(disk) = find_mesh_mut(&mut self.meshes, ACCRETION_DISK) {
            disk.apply("uTime", UniformValue::Float(frame.elapsed * params.speed));
            disk.apply("uColorInner", UniformValue::Vec3(inner));
            disk.apply("uColorOuter", UniformValue::Vec3(params.outer_color.linear()));
        }
        if let Some(halo) = find_mesh_mut(&mut self.meshes, GLOW_HALO) {
            halo.apply("uColor", UniformValue::Vec3(inner));
        }
    }

    pub fn meshes(&self) -> &[MeshInstance] {
        &self.meshes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn ring_mask_fades_at_both_edges() {
        assert_eq!(ring_mask(0.3), 0.0);
        assert!(close(ring_mask(0.5), 0.5));
        assert!(close(ring_mask(0.6), 1.0));
        assert!(close(ring_mask(0.75), 0.5));
        assert_eq!(ring_mask(1.0), 0.0);
    }

    #[test]
    fn disk_geometry_covers_the_mask_band() {
        let disk = BlackHole::mount(&BlackHoleParams::default());
        let mesh = &disk.meshes()[1];
        assert_eq!(mesh.name, ACCRETION_DISK);
        let radii: Vec<f32> = (0..mesh.geometry.vertex_count())
            .map(|i| mesh.geometry.position(i).truncate().length())
            .collect();
        let min = radii.iter().cloned().fold(f32::MAX, f32::min);
        let max = radii.iter().cloned().fold(0.0, f32::max);
        assert!(close(min, 0.4) && close(max, 1.0));
        let world = mesh.transform.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!(close(world.length(), 3.0));
    }

    #[test]
    fn mounted_programs_are_fully_bound() {
        let black_hole = BlackHole::mount(&BlackHoleParams::default());
        for mesh in black_hole.meshes() {
            assert!(mesh.program.validate().is_ok(), "{}", mesh.name);
        }
        let disk = &black_hole.meshes()[1].program;
        assert_eq!(disk.blending, Blending::Additive);
        assert!(!disk.depth_write);
        assert_eq!(disk.uniforms.byte_size(), 48);
    }

    #[test]
    fn sync_scales_time_and_tracks_colors() {
        let params = BlackHoleParams {
            inner_color: "#ff0000".parse().unwrap(),
            outer_color: "#0000ff".parse().unwrap(),
            speed: 2.0,
        };
        let mut black_hole = BlackHole::mount(&BlackHoleParams::default());
        black_hole.sync_uniforms(
            &FrameState {
                elapsed: 10.0,
                delta: 0.016,
            },
            &params,
        );

        let disk = &black_hole.meshes()[1].program.uniforms;
        assert_eq!(disk.float("uTime"), Some(20.0));
        let inner = disk.vec3("uColorInner").unwrap();
        let outer = disk.vec3("uColorOuter").unwrap();
        assert!(disk_color(0.5, 0.0, inner, outer).abs_diff_eq(Vec3::new(0.5, 0.0, 0.5), 1e-5));

        let halo = &black_hole.meshes()[2].program.uniforms;
        assert_eq!(halo.vec3("uColor"), Some(inner));
    }

    #[test]
    fn disk_is_dark_outside_the_ring() {
        let inside = shade_disk(Vec3::new(0.2, 0.0, 0.0), 3.0, Vec3::X, Vec3::Z);
        let outside = shade_disk(Vec3::new(0.0, 0.95, 0.0), 3.0, Vec3::X, Vec3::Z);
        assert_eq!(inside.w, 0.0);
        assert_eq!(outside.w, 0.0);
        let on_ring = shade_disk(Vec3::new(0.6, 0.0, 0.0), 3.0, Vec3::X, Vec3::Z);
        assert!(on_ring.w > 0.5);
    }
}
