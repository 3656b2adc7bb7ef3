use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec3};
use wgpu::util::DeviceExt;

use crate::camera::CameraParams;
use crate::color::Rgb;
use crate::effects::Transform;
use crate::geometry::{Mesh, FLOATS_PER_VERTEX};
use crate::shading::{Blending, Side};

/// Scene background, `#050505`.
pub const BACKGROUND: Rgb = Rgb::new(5.0 / 255.0, 5.0 / 255.0, 5.0 / 255.0);

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
}

impl From<&CameraParams> for GlobalUniform {
    fn from(camera: &CameraParams) -> Self {
        Self {
            view_proj: camera.view_proj.to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).into(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct ObjectConstants {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
}

impl From<&Transform> for ObjectConstants {
    fn from(transform: &Transform) -> Self {
        let model = transform.matrix();
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
        }
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

pub(crate) const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

pub(crate) fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

pub(crate) fn blend_state(blending: Blending) -> Option<wgpu::BlendState> {
    match blending {
        Blending::Opaque => None,
        Blending::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        Blending::Additive => {
            let additive = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            };
            Some(wgpu::BlendState {
                color: additive,
                alpha: additive,
            })
        }
    }
}

/// Faces to discard for a side setting; front faces wind counter-clockwise.
pub(crate) fn cull_mode(side: Side) -> Option<wgpu::Face> {
    match side {
        Side::Front => Some(wgpu::Face::Back),
        Side::Back => Some(wgpu::Face::Front),
        Side::Double => None,
    }
}

/// Opaque draws first, then transparent ones, each in mount order.
pub(crate) fn draw_order(transparent: &[bool]) -> Vec<usize> {
    let (mut opaque, blended): (Vec<usize>, Vec<usize>) =
        (0..transparent.len()).partition(|&index| !transparent[index]);
    opaque.extend(blended);
    opaque
}

pub(crate) fn clear_color() -> wgpu::Color {
    let Vec3 { x, y, z } = BACKGROUND.linear();
    wgpu::Color {
        r: x as f64,
        g: y as f64,
        b: z as f64,
        a: 1.0,
    }
}

pub(crate) struct MeshBuffers {
    pub vertex: wgpu::Buffer,
    pub index: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffers {
    pub fn from_mesh(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
        }
    }
}

pub(crate) struct DepthBuffer {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthBuffer {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    pub fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_draws_come_last() {
        assert_eq!(draw_order(&[true, false, true, false]), vec![1, 3, 0, 2]);
        assert!(draw_order(&[]).is_empty());
    }

    #[test]
    fn sides_map_to_culled_faces() {
        assert_eq!(cull_mode(Side::Front), Some(wgpu::Face::Back));
        assert_eq!(cull_mode(Side::Back), Some(wgpu::Face::Front));
        assert_eq!(cull_mode(Side::Double), None);
    }

    #[test]
    fn additive_blend_keeps_destination() {
        let blend = blend_state(Blending::Additive).unwrap();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::One);
        assert!(blend_state(Blending::Opaque).is_none());
    }

    #[test]
    fn object_constants_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 80);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 112);
        let transform = Transform {
            scale: Vec3::splat(2.0),
            ..Transform::default()
        };
        let constants = ObjectConstants::from(&transform);
        assert_eq!(constants.model[0][0], 2.0);
        assert_eq!(constants.normal[0][0], 0.5);
    }
}
