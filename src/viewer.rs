use std::sync::Arc;

use anyhow::Result;
use glam::Vec2;
use log::debug;
use winit::event::{
    ElementState, Event, KeyEvent, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::EventLoopWindowTarget;
use winit::keyboard::{KeyCode as WinitKey, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::app::FrameClock;
use crate::camera::OrbitControls;
use crate::input::{command_for_key, KeyCode, MouseButton, NamedKey};
use crate::orb::Orb;
use crate::panel::ParameterStore;
use crate::render::Renderer;

/// Pixels of trackpad scroll that count as one wheel step.
const PIXELS_PER_STEP: f32 = 100.0;

/// Window-backed session: owns the renderer and the mounted orb, reads the
/// shared panel store once per frame and feeds it keyboard edits.
pub struct Viewer {
    window: Arc<Window>,
    renderer: Renderer,
    orb: Orb,
    store: ParameterStore,
    controls: OrbitControls,
    clock: FrameClock,
    cursor: Vec2,
}

impl Viewer {
    pub async fn new(window: Arc<Window>, store: ParameterStore) -> Result<Self> {
        let size = window.inner_size();
        let renderer = Renderer::new(Arc::clone(&window), (size.width, size.height)).await?;
        let orb = Orb::new(&store.snapshot());
        Ok(Self {
            window,
            renderer,
            orb,
            store,
            controls: OrbitControls::new(),
            clock: FrameClock::new(),
            cursor: Vec2::ZERO,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn orb(&self) -> &Orb {
        &self.orb
    }

    pub fn handle_event(&mut self, event: &Event<()>, elwt: &EventLoopWindowTarget<()>) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.window_id() => {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => self.renderer.resize(size.width, size.height),
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = self.window.inner_size();
                        self.renderer.resize(size.width, size.height);
                    }
                    WindowEvent::KeyboardInput { event, .. } => self.handle_keyboard(event, elwt),
                    WindowEvent::MouseInput { state, button, .. } => {
                        self.handle_mouse_button(*state, *button)
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        self.cursor = Vec2::new(position.x as f32, position.y as f32);
                        let (_, height) = self.renderer.size();
                        self.controls.drag_to(self.cursor, height as f32);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let steps = match delta {
                            MouseScrollDelta::LineDelta(_, y) => *y,
                            MouseScrollDelta::PixelDelta(offset) => offset.y as f32 / PIXELS_PER_STEP,
                        };
                        self.controls.zoom(steps);
                    }
                    WindowEvent::RedrawRequested => self.redraw()?,
                    _ => {}
                }
            }
            Event::AboutToWait => self.window.request_redraw(),
            _ => {}
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let frame = self.clock.advance_to(timestamp());
        let panel = self.store.snapshot();
        self.orb.on_frame(&frame, &panel);
        self.renderer.sync(&self.orb)?;

        let camera = self.controls.camera(self.renderer.aspect());
        if let Err(err) = self.renderer.render(&camera) {
            self.renderer.recover(err)?;
        }
        Ok(())
    }

    fn handle_keyboard(&self, event: &KeyEvent, elwt: &EventLoopWindowTarget<()>) {
        if event.state != ElementState::Pressed {
            return;
        }
        let Some(key) = map_physical_key(event.physical_key) else {
            return;
        };
        if key == KeyCode::Named(NamedKey::Escape) && cfg!(not(target_arch = "wasm32")) {
            elwt.exit();
            return;
        }
        if let Some(command) = command_for_key(key) {
            debug!("key {key:?} -> {command:?}");
            self.store.update(|values| command.apply(values));
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: WinitMouseButton) {
        if map_mouse_button(button) != MouseButton::LEFT {
            return;
        }
        match state {
            ElementState::Pressed => self.controls.begin_drag(self.cursor),
            ElementState::Released => self.controls.end_drag(),
        }
    }
}

pub fn map_physical_key(key: PhysicalKey) -> Option<KeyCode> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    Some(match code {
        WinitKey::Tab => KeyCode::Named(NamedKey::Tab),
        WinitKey::ArrowLeft => KeyCode::Named(NamedKey::Left),
        WinitKey::ArrowRight => KeyCode::Named(NamedKey::Right),
        WinitKey::ArrowUp => KeyCode::Named(NamedKey::Up),
        WinitKey::ArrowDown => KeyCode::Named(NamedKey::Down),
        WinitKey::Escape => KeyCode::Named(NamedKey::Escape),
        WinitKey::Digit1 | WinitKey::Numpad1 => KeyCode::Digit(1),
        WinitKey::Digit2 | WinitKey::Numpad2 => KeyCode::Digit(2),
        WinitKey::Digit3 | WinitKey::Numpad3 => KeyCode::Digit(3),
        WinitKey::Digit4 | WinitKey::Numpad4 => KeyCode::Digit(4),
        _ => return None,
    })
}

pub fn map_mouse_button(button: WinitMouseButton) -> MouseButton {
    let index = match button {
        WinitMouseButton::Left => 0,
        WinitMouseButton::Right => 1,
        WinitMouseButton::Middle => 2,
        WinitMouseButton::Back => 3,
        WinitMouseButton::Forward => 4,
        WinitMouseButton::Other(value) => value.min(u8::MAX as u16) as u8,
    };
    MouseButton::new(index)
}

/// Seconds from a monotonic source; only differences are meaningful.
#[cfg(not(target_arch = "wasm32"))]
fn timestamp() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64()
}

#[cfg(target_arch = "wasm32")]
fn timestamp() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map_or(0.0, |performance| performance.now() / 1000.0)
}
