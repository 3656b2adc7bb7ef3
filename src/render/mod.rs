mod common;
mod renderer;

pub use common::BACKGROUND;
pub use renderer::{RenderError, Renderer};
