use anyhow::{Context, Result};
use bytemuck::bytes_of;
use log::{debug, info, warn};
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::camera::CameraParams;
use crate::effects::MeshInstance;
use crate::orb::Orb;
use crate::uniforms::UniformError;

use super::common::{
    blend_state, clear_color, cull_mode, draw_order, vertex_layout, DepthBuffer, GlobalUniform,
    MeshBuffers, ObjectConstants,
};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Surface(#[from] wgpu::SurfaceError),
    #[error("cannot mount `{mesh}`: {source}")]
    Uniform {
        mesh: &'static str,
        #[source]
        source: UniformError,
    },
}

/// wgpu host for the orb: compiles each mounted program, binds it to its
/// mesh and draws the scene once per frame.
///
/// Native builds render through the primary backends into a window; the web
/// build renders through WebGL2 into a canvas.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    mounted: Option<MountedEffect>,
}

/// GPU resources of one orb generation.
struct MountedEffect {
    generation: u64,
    draws: Vec<DrawItem>,
    order: Vec<usize>,
}

struct DrawItem {
    pipeline: wgpu::RenderPipeline,
    mesh: MeshBuffers,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
}

impl Renderer {
    /// Initializes the GPU for a window (`Arc<Window>`) or a canvas
    /// (`SurfaceTarget::Canvas`).
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        (width, height): (u32, u32),
    ) -> Result<Self> {
        let backends = if cfg!(target_arch = "wasm32") {
            wgpu::Backends::GL
        } else {
            wgpu::Backends::PRIMARY
        };
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance
            .create_surface(target)
            .context("failed to create rendering surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        info!("using adapter {:?}", adapter.get_info().name);

        let required_limits = if cfg!(target_arch = "wasm32") {
            wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
        } else {
            wgpu::Limits::default()
        };
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("orb-device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                experimental_features: Default::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let global_layout = uniform_layout(
            &device,
            "global-bind-layout",
            wgpu::BufferSize::new(std::mem::size_of::<GlobalUniform>() as u64),
        );
        let object_layout = uniform_layout(
            &device,
            "object-bind-layout",
            wgpu::BufferSize::new(std::mem::size_of::<ObjectConstants>() as u64),
        );
        // Block size differs per program.
        let material_layout = uniform_layout(&device, "material-bind-layout", None);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("orb-pipeline-layout"),
            bind_group_layouts: &[&global_layout, &object_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global-uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global-bind-group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth,
            global_buffer,
            global_bind_group,
            object_layout,
            material_layout,
            pipeline_layout,
            mounted: None,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, width, height);
    }

    /// Rebuilds GPU resources when the orb mounted a new effect, then uploads
    /// this frame's transforms and uniforms.
    pub fn sync(&mut self, orb: &Orb) -> Result<(), RenderError> {
        let stale = self
            .mounted
            .as_ref()
            .map_or(true, |mounted| mounted.generation != orb.generation());
        if stale {
            // Previous resources are released before the new ones are built.
            self.mounted = None;
            let draws = orb
                .meshes()
                .iter()
                .map(|mesh| self.build_draw(mesh))
                .collect::<Result<Vec<_>, _>>()?;
            let transparent: Vec<bool> = orb
                .meshes()
                .iter()
                .map(|mesh| mesh.program.is_transparent())
                .collect();
            debug!(
                "built {} draw(s) for {} (generation {})",
                draws.len(),
                orb.mode(),
                orb.generation()
            );
            self.mounted = Some(MountedEffect {
                generation: orb.generation(),
                draws,
                order: draw_order(&transparent),
            });
        }

        let Some(mounted) = self.mounted.as_ref() else {
            return Ok(());
        };
        for (draw, mesh) in mounted.draws.iter().zip(orb.meshes()) {
            let constants = ObjectConstants::from(&mesh.transform);
            self.queue
                .write_buffer(&draw.object_buffer, 0, bytes_of(&constants));
            self.queue
                .write_buffer(&draw.material_buffer, 0, &mesh.program.uniforms.to_std140());
        }
        Ok(())
    }

    /// Draws the mounted effect from the camera's point of view.
    pub fn render(&mut self, camera: &CameraParams) -> Result<(), RenderError> {
        self.queue.write_buffer(
            &self.global_buffer,
            0,
            bytes_of(&GlobalUniform::from(camera)),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("orb-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("orb-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.global_bind_group, &[]);
            if let Some(mounted) = self.mounted.as_ref() {
                for draw in mounted.order.iter().filter_map(|&i| mounted.draws.get(i)) {
                    pass.set_pipeline(&draw.pipeline);
                    pass.set_bind_group(1, &draw.object_bind_group, &[]);
                    pass.set_bind_group(2, &draw.material_bind_group, &[]);
                    pass.set_vertex_buffer(0, draw.mesh.vertex.slice(..));
                    pass.set_index_buffer(draw.mesh.index.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..draw.mesh.index_count, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Recovers from a failed frame where possible. Only running out of
    /// memory is fatal.
    pub fn recover(&mut self, err: RenderError) -> Result<(), RenderError> {
        match err {
            RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated; reconfiguring");
                let (width, height) = self.size();
                self.resize(width, height);
                Ok(())
            }
            RenderError::Surface(wgpu::SurfaceError::Timeout) => {
                info!("surface timeout; retrying next frame");
                Ok(())
            }
            RenderError::Surface(wgpu::SurfaceError::OutOfMemory) => Err(err),
            RenderError::Surface(other) => {
                warn!("skipping frame: {other}");
                Ok(())
            }
            RenderError::Uniform { .. } => Err(err),
        }
    }

    fn build_draw(&self, mesh: &MeshInstance) -> Result<DrawItem, RenderError> {
        let program = &mesh.program;
        program.validate().map_err(|source| RenderError::Uniform {
            mesh: mesh.name,
            source,
        })?;

        let vertex_module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{}-vs", program.label)),
                source: wgpu::ShaderSource::Wgsl(program.vertex_source.as_str().into()),
            });
        let fragment_module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{}-fs", program.label)),
                source: wgpu::ShaderSource::Wgsl(program.fragment_source.as_str().into()),
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(program.label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[vertex_layout()],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: cull_mode(program.side),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthBuffer::FORMAT,
                    depth_write_enabled: program.depth_write,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: blend_state(program.blending),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
                cache: None,
            });

        let object_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{}-object", mesh.name)),
                contents: bytes_of(&ObjectConstants::from(&mesh.transform)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let object_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object-bind-group"),
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: object_buffer.as_entire_binding(),
            }],
        });

        let material_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{}-material", mesh.name)),
                contents: &program.uniforms.to_std140(),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let material_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material-bind-group"),
            layout: &self.material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: material_buffer.as_entire_binding(),
            }],
        });

        Ok(DrawItem {
            pipeline,
            mesh: MeshBuffers::from_mesh(&self.device, &mesh.geometry, mesh.name),
            object_buffer,
            object_bind_group,
            material_buffer,
            material_bind_group,
        })
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    min_binding_size: Option<wgpu::BufferSize>,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size,
            },
            count: None,
        }],
    })
}
