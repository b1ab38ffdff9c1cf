use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::controller::{OpStatus, PluginController};
use crate::error::BridgeError;
use crate::host::{HostBridge, HostEvent, PluginMessage};
use crate::state::PreviewSurface;
use crate::{AppConfig, Rotation};
use fillfx_gpu::{GpuConfig, GpuContext, PreviewRenderer};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Posts messages to the window hosting the plugin iframe.
pub struct ParentWindowBridge;

impl HostBridge for ParentWindowBridge {
    fn post(&self, message: PluginMessage) -> Result<(), BridgeError> {
        let json = message.to_json()?;
        let parent = web_sys::window()
            .and_then(|window| window.parent().ok().flatten())
            .ok_or_else(|| BridgeError::Rejected("No parent window".to_string()))?;
        parent
            .post_message(&JsValue::from_str(&json), "*")
            .map_err(|e| BridgeError::Rejected(format!("{:?}", e)))
    }
}

fn status_name(status: OpStatus) -> JsValue {
    JsValue::from_str(match status {
        OpStatus::Applied => "applied",
        OpStatus::NothingToDo => "nothing-to-do",
        OpStatus::Superseded => "superseded",
        OpStatus::Failed => "failed",
    })
}

/// Handle the plugin UI keeps for its lifetime.
#[wasm_bindgen]
pub struct PluginHandle {
    controller: Rc<PluginController<ParentWindowBridge>>,
}

#[wasm_bindgen]
impl PluginHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> PluginHandle {
        let config = AppConfig::load_or_default();
        let level = config
            .log_level
            .to_level_filter()
            .to_level()
            .unwrap_or(log::Level::Error);
        if console_log::init_with_level(level).is_err() {
            log::debug!("Logger already initialised");
        }
        log::info!("fillfx plugin starting");

        PluginHandle {
            controller: Rc::new(PluginController::new(ParentWindowBridge, config)),
        }
    }

    /// Feed a JSON message received from the host.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, json: &str) -> JsValue {
        match HostEvent::from_json(json) {
            Ok(event) => status_name(self.controller.handle_host_event(event)),
            Err(e) => {
                log::warn!("Ignoring host message: {}", e);
                status_name(OpStatus::NothingToDo)
            }
        }
    }

    /// Call with `true` when asking the host for the selected image.
    #[wasm_bindgen(js_name = setLoading)]
    pub fn set_loading(&self, loading: bool) {
        self.controller.set_loading(loading);
    }

    /// Start drawing the preview into `canvas`.
    #[wasm_bindgen(js_name = attachCanvas)]
    pub fn attach_canvas(&self, canvas: web_sys::HtmlCanvasElement) -> js_sys::Promise {
        let controller = Rc::clone(&self.controller);
        wasm_bindgen_futures::future_to_promise(async move {
            let preview = controller.config().preview;
            let context = GpuContext::from_canvas(canvas, GpuConfig::default())
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            let renderer = PreviewRenderer::new(&context)
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?
                .with_camera(preview.camera())
                .with_clear_color(preview.clear_color());
            controller.set_preview_surface(PreviewSurface::new(context, renderer));
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = detachCanvas)]
    pub fn detach_canvas(&self) {
        self.controller.clear_preview_surface();
    }

    #[wasm_bindgen(js_name = resizeCanvas)]
    pub fn resize_canvas(&self, width: u32, height: u32) {
        self.controller.resize_surface(width, height);
    }

    #[wasm_bindgen(js_name = setRotation)]
    pub fn set_rotation(&self, x: f32, y: f32, z: f32) {
        self.controller.set_rotation(Rotation::new(x, y, z));
    }

    #[wasm_bindgen(js_name = requestPreview)]
    pub fn request_preview(&self) -> js_sys::Promise {
        let controller = Rc::clone(&self.controller);
        wasm_bindgen_futures::future_to_promise(async move {
            let rotation = controller.rotation();
            Ok(status_name(controller.request_preview(rotation).await))
        })
    }

    #[wasm_bindgen(js_name = commitTransform)]
    pub fn commit_transform(&self, add_new_layer: bool) -> js_sys::Promise {
        let controller = Rc::clone(&self.controller);
        wasm_bindgen_futures::future_to_promise(async move {
            let rotation = controller.rotation();
            Ok(status_name(
                controller.commit_transform(rotation, add_new_layer).await,
            ))
        })
    }

    #[wasm_bindgen(js_name = commitPixelation)]
    pub fn commit_pixelation(&self, pixel_size: u32, add_new_layer: bool) -> js_sys::Promise {
        let controller = Rc::clone(&self.controller);
        wasm_bindgen_futures::future_to_promise(async move {
            Ok(status_name(
                controller.commit_pixelation(pixel_size, add_new_layer).await,
            ))
        })
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.controller.store().with(|s| s.is_busy())
    }

    /// User-facing error from the last failed update, if any.
    pub fn error(&self) -> Option<String> {
        self.controller.store().with(|s| s.error.clone())
    }

    #[wasm_bindgen(js_name = saveConfig)]
    pub fn save_config(&self) -> Result<(), JsValue> {
        self.controller
            .config()
            .save_to_local_storage()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Default for PluginHandle {
    fn default() -> Self {
        Self::new()
    }
}
