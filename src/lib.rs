//! Shader-driven orb effects rendered with wgpu.
//!
//! An [`Orb`] mounts one effect at a time (a plain lit sphere, a black hole,
//! a hurricane or a slime blob) and keeps its shader uniforms in step with
//! the control panel and the session clock. Everything up to the GPU
//! boundary is plain data so it can run headless; [`Renderer`] and
//! [`Viewer`] put it on screen natively or in a browser canvas.

pub mod app;
pub mod camera;
pub mod color;
pub mod effects;
pub mod geometry;
pub mod input;
pub mod noise;
pub mod orb;
pub mod panel;
pub mod preset;
pub mod render;
pub mod shading;
pub mod uniforms;
pub mod viewer;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{print_summary, summary_lines, FrameClock, FrameState};
pub use camera::{CameraParams, OrbitControls};
pub use color::{ColorError, Rgb};
pub use effects::{EffectMode, MeshInstance, Transform, UnknownEffectMode};
pub use input::{command_for_key, KeyCode, MouseButton, NamedKey, PanelCommand};
pub use orb::{ActiveEffect, Orb};
pub use panel::{Folder, PanelValues, ParameterError, ParameterStore};
pub use preset::Preset;
pub use render::{RenderError, Renderer};
pub use shading::{Blending, ShaderProgram, Side};
pub use uniforms::{UniformError, UniformSet, UniformValue};
pub use viewer::Viewer;
