#![cfg(target_arch = "wasm32")]

use std::sync::Arc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use winit::dpi::LogicalSize;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::web::{EventLoopExtWebSys, WindowBuilderExtWebSys};
use winit::window::WindowBuilder;

use crate::effects::EffectMode;
use crate::panel::{schema, Folder, PanelValues, ParameterStore};
use crate::viewer::Viewer;

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Orb mounted on a page canvas. `create` sets up the GPU, `start` hands
/// the frame loop to the browser; panel edits made through the handle show
/// up on the next frame.
#[wasm_bindgen]
pub struct OrbApp {
    store: ParameterStore,
    pending: Option<(EventLoop<()>, Viewer)>,
}

#[wasm_bindgen]
impl OrbApp {
    /// Mounts the orb on the canvas with id `canvas_id`.
    pub async fn create(canvas_id: String) -> Result<OrbApp, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("missing document"))?;
        let canvas: web_sys::HtmlCanvasElement = document
            .get_element_by_id(&canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas element not found"))?
            .dyn_into()
            .map_err(|_| JsValue::from_str("element is not a canvas"))?;
        let (width, height) = (canvas.client_width().max(1), canvas.client_height().max(1));

        let event_loop = EventLoop::new()
            .map_err(|err| JsValue::from_str(&format!("failed to create event loop: {err}")))?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_canvas(Some(canvas))
                .with_title("Orb Effects")
                .with_inner_size(LogicalSize::new(width as f64, height as f64))
                .build(&event_loop)
                .map_err(|err| JsValue::from_str(&format!("window error: {err}")))?,
        );

        let store = ParameterStore::new(PanelValues::default());
        let viewer = Viewer::new(window, store.clone())
            .await
            .map_err(|err| JsValue::from_str(&format!("renderer error: {err:#}")))?;
        log::info!("orb mounted on #{canvas_id} ({width}x{height})");

        Ok(OrbApp {
            store,
            pending: Some((event_loop, viewer)),
        })
    }

    /// Starts the frame loop. Calling it again does nothing.
    pub fn start(&mut self) {
        let Some((event_loop, mut viewer)) = self.pending.take() else {
            return;
        };
        event_loop.spawn(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);
            if let Err(err) = viewer.handle_event(&event, elwt) {
                log::error!("frame loop stopped: {err:#}");
                elwt.exit();
            }
        });
    }

    #[wasm_bindgen(js_name = effectMode)]
    pub fn effect_mode(&self) -> String {
        self.store.snapshot().effect_mode.to_string()
    }

    #[wasm_bindgen(js_name = setEffectMode)]
    pub fn set_effect_mode(&self, mode: &str) -> Result<(), JsValue> {
        let mode: EffectMode = mode.parse().map_err(js_error)?;
        self.store.update(|values| values.effect_mode = mode);
        Ok(())
    }

    /// Sets a control by folder id or title, e.g. `("slime", "distortion", "0.5")`.
    #[wasm_bindgen(js_name = setControl)]
    pub fn set_control(&self, folder: &str, key: &str, value: &str) -> Result<(), JsValue> {
        let folder: Folder = folder.parse().map_err(js_error)?;
        self.store.set(folder, key, value).map_err(js_error)
    }

    /// Controls currently on screen as `folder.key=value` strings.
    pub fn controls(&self) -> js_sys::Array {
        self.store
            .snapshot()
            .describe()
            .into_iter()
            .map(|(folder, key, value)| JsValue::from_str(&format!("{folder}.{key}={value}")))
            .collect()
    }

    /// `folder.key` of every control the panel shows for the current mode.
    #[wasm_bindgen(js_name = controlKeys)]
    pub fn control_keys(&self) -> js_sys::Array {
        schema(self.store.snapshot().effect_mode)
            .into_iter()
            .map(|(folder, spec)| JsValue::from_str(&format!("{folder}.{}", spec.key)))
            .collect()
    }
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
