//! Non-procedural materials: flat "basic" color and the lit "standard"
//! surface of the plain sphere.

use glam::Vec3;

use crate::shading::{
    compose, Blending, ShaderProgram, Side, COMMON_WGSL, LOCAL_POSITION_VS, LOCAL_VARYINGS,
};
use crate::uniforms::UniformSet;

pub const BASIC_UNIFORMS: &[&str] = &["uColor", "uOpacity"];
pub const STANDARD_UNIFORMS: &[&str] = &["uColor", "uRoughness", "uMetalness"];

/// Ambient term of the scene lighting.
pub const AMBIENT_INTENSITY: f32 = 0.5;
/// Point light position shared by lit materials.
pub const LIGHT_POSITION: Vec3 = Vec3::new(10.0, 10.0, 10.0);
/// Point light intensity.
pub const LIGHT_INTENSITY: f32 = 1.0;

const BASIC_DECL: &str = r#"
struct BasicUniforms {
    uColor: vec3<f32>,
    uOpacity: f32,
}

@group(2) @binding(0)
var<uniform> material: BasicUniforms;
"#;

const BASIC_FS: &str = r#"
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(material.uColor, material.uOpacity);
}
"#;

/// Unlit color. Opacity below one switches to alpha blending.
pub fn basic(label: &'static str, color: Vec3, opacity: f32, side: Side) -> ShaderProgram {
    let transparent = opacity < 1.0;
    ShaderProgram {
        label,
        vertex_source: compose(&[COMMON_WGSL, BASIC_DECL, LOCAL_VARYINGS, LOCAL_POSITION_VS]),
        fragment_source: compose(&[COMMON_WGSL, BASIC_DECL, LOCAL_VARYINGS, BASIC_FS]),
        uniforms: UniformSet::new()
            .with_vec3("uColor", color)
            .with_float("uOpacity", opacity),
        referenced: BASIC_UNIFORMS,
        blending: if transparent {
            Blending::Alpha
        } else {
            Blending::Opaque
        },
        side,
        depth_write: true,
    }
}

const STANDARD_DECL: &str = r#"
struct StandardUniforms {
    uColor: vec3<f32>,
    uRoughness: f32,
    uMetalness: f32,
}

@group(2) @binding(0)
var<uniform> material: StandardUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}
"#;

const STANDARD_VS: &str = r#"
@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;
    out.normal = world_normal(input.normal);
    return out;
}
"#;

const STANDARD_FS: &str = r#"
@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    let view_dir = normalize(globals.camera_position.xyz - input.world_pos);
    let light_dir = normalize(LIGHT_POSITION - input.world_pos);
    let half_dir = normalize(light_dir + view_dir);

    let albedo = material.uColor;
    let diffuse = max(dot(normal, light_dir), 0.0);
    let shininess = mix(256.0, 4.0, material.uRoughness);
    let specular = pow(max(dot(normal, half_dir), 0.0), shininess);

    let diffuse_color = albedo * (1.0 - material.uMetalness);
    let specular_color = mix(vec3<f32>(0.04), albedo, material.uMetalness);
    let lit = AMBIENT_INTENSITY * albedo
        + (diffuse_color * diffuse + specular_color * specular) * LIGHT_INTENSITY;
    return vec4<f32>(lit, 1.0);
}
"#;

/// WGSL constants for the scene lighting, written from the Rust values.
fn lighting_wgsl() -> String {
    let Vec3 { x, y, z } = LIGHT_POSITION;
    format!(
        "\nconst AMBIENT_INTENSITY: f32 = {AMBIENT_INTENSITY:?};\n\
         const LIGHT_POSITION: vec3<f32> = vec3<f32>({x:?}, {y:?}, {z:?});\n\
         const LIGHT_INTENSITY: f32 = {LIGHT_INTENSITY:?};\n"
    )
}

/// Opaque surface lit by the ambient term and the point light.
pub fn standard(label: &'static str, color: Vec3, roughness: f32, metalness: f32) -> ShaderProgram {
    let lighting = lighting_wgsl();
    ShaderProgram {
        label,
        vertex_source: compose(&[COMMON_WGSL, STANDARD_DECL, &lighting, STANDARD_VS]),
        fragment_source: compose(&[COMMON_WGSL, STANDARD_DECL, &lighting, STANDARD_FS]),
        uniforms: UniformSet::new()
            .with_vec3("uColor", color)
            .with_float("uRoughness", roughness)
            .with_float("uMetalness", metalness),
        referenced: STANDARD_UNIFORMS,
        blending: Blending::Opaque,
        side: Side::Front,
        depth_write: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_switches_blending_on_opacity() {
        let solid = basic("solid", Vec3::ZERO, 1.0, Side::Front);
        let glow = basic("glow", Vec3::ONE, 0.1, Side::Back);
        assert_eq!(solid.blending, Blending::Opaque);
        assert_eq!(glow.blending, Blending::Alpha);
        assert!(solid.validate().is_ok());
        assert_eq!(glow.uniforms.byte_size(), 16);
    }

    #[test]
    fn standard_packs_scalars_after_color() {
        let program = standard("orb", Vec3::ONE, 0.1, 0.8);
        assert!(program.validate().is_ok());
        assert_eq!(program.uniforms.offsets(), vec![0, 12, 16]);
        assert!(program.fragment_source.contains("fn fs_main"));
    }

    #[test]
    fn lighting_constants_come_from_rust_values() {
        let program = standard("orb", Vec3::ONE, 0.1, 0.8);
        assert!(program
            .fragment_source
            .contains("const AMBIENT_INTENSITY: f32 = 0.5;"));
        assert!(program
            .fragment_source
            .contains("const LIGHT_POSITION: vec3<f32> = vec3<f32>(10.0, 10.0, 10.0);"));
        assert!(program.fragment_source.contains("const LIGHT_INTENSITY: f32 = 1.0;"));
        assert_eq!(program.fragment_source.matches("const AMBIENT_INTENSITY").count(), 1);
    }
}
