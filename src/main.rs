//! Native preview window.
//!
//! Opens an image as if the host had selected a shape filled with it, so
//! the preview and the upload path can be exercised without Penpot.
//! Outgoing host messages are logged and answered the way the host would.

#[cfg(not(target_arch = "wasm32"))]
mod viewer {
    use std::sync::Arc;
    use std::sync::mpsc::Receiver;

    use fillfx::codec;
    use fillfx::constants::{PREVIEW_WINDOW_HEIGHT, PREVIEW_WINDOW_WIDTH, ROTATION_STEP_DEGREES};
    use fillfx::model::ImageRef;
    use fillfx::state::PreviewSurface;
    use fillfx::{
        AppConfig, ChannelBridge, Fill, Fills, HostEvent, HostSelection, OpStatus,
        PluginController, PluginMessage, Rotation,
    };
    use fillfx_gpu::{GpuContext, PreviewRenderer};
    use winit::{
        application::ApplicationHandler,
        event::*,
        event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
        keyboard::{KeyCode, PhysicalKey},
        window::{Window, WindowAttributes, WindowId},
    };

    const SELECTION_ID: &str = "native-preview";

    pub struct Viewer {
        window: Option<Arc<Window>>,
        controller: PluginController<ChannelBridge>,
        outbox: Receiver<PluginMessage>,
        image_bytes: Vec<u8>,
        title: String,
    }

    impl Viewer {
        pub fn new(config: AppConfig, image_bytes: Vec<u8>, title: String) -> Self {
            let (bridge, outbox) = ChannelBridge::new();
            Self {
                window: None,
                controller: PluginController::new(bridge, config),
                outbox,
                image_bytes,
                title,
            }
        }

        /// Select a shape with one image fill and deliver its bytes.
        fn load_selection(&self) -> bool {
            let image = match codec::decode_native_size(&self.image_bytes) {
                Ok(image) => image,
                Err(e) => {
                    log::error!("Failed to read {}: {}", self.title, e);
                    return false;
                }
            };
            let (width, height) = (image.width(), image.height());

            let fill = Fill::image(ImageRef {
                id: "native-image".to_string(),
                width,
                height,
                name: Some(self.title.clone()),
                ..Default::default()
            });
            self.controller.handle_host_event(HostEvent::SelectionChanged {
                selection: Some(HostSelection {
                    id: SELECTION_ID.to_string(),
                    name: self.title.clone(),
                    fills: Fills::Uniform(vec![fill]),
                }),
            });
            self.controller.handle_host_event(HostEvent::ImageLoaded {
                image_bytes: self.image_bytes.clone(),
                width,
                height,
            }) == OpStatus::Applied
        }

        async fn attach_surface(&self, window: Arc<Window>) -> Result<(), fillfx_gpu::GpuError> {
            let preview = &self.controller.config().preview;
            let context = GpuContext::new(window).await?;
            let renderer = PreviewRenderer::new(&context)
                .await?
                .with_camera(preview.camera())
                .with_clear_color(preview.clear_color());
            self.controller
                .set_preview_surface(PreviewSurface::new(context, renderer));
            Ok(())
        }

        /// Play the host: log each request and send back the pixels it would render.
        fn answer_host_messages(&self) {
            while let Ok(message) = self.outbox.try_recv() {
                let PluginMessage::UpdateImageFill {
                    image_data,
                    fill_index,
                    should_delete_first,
                    add_new_layer,
                    ..
                } = message;
                log::info!(
                    "update-image-fill: {} bytes, fill {}, delete first {}, new layer {}",
                    image_data.len(),
                    fill_index,
                    should_delete_first,
                    add_new_layer
                );

                match codec::decode_native_size(&image_data) {
                    Ok(image) => {
                        let (width, height) = (image.width(), image.height());
                        self.controller.handle_host_event(HostEvent::ExportedImage {
                            image_bytes: image.into_raw(),
                            width,
                            height,
                            selection_id: SELECTION_ID.to_string(),
                        });
                    }
                    Err(e) => log::warn!("Host could not read uploaded image: {}", e),
                }
            }
        }

        fn handle_key(&self, keycode: KeyCode) -> bool {
            let step = ROTATION_STEP_DEGREES;
            let pixelate = self.controller.config().pixelate;
            match keycode {
                KeyCode::ArrowUp => self.controller.rotate_by(Rotation::new(-step, 0.0, 0.0)),
                KeyCode::ArrowDown => self.controller.rotate_by(Rotation::new(step, 0.0, 0.0)),
                KeyCode::ArrowLeft => self.controller.rotate_by(Rotation::new(0.0, -step, 0.0)),
                KeyCode::ArrowRight => self.controller.rotate_by(Rotation::new(0.0, step, 0.0)),
                KeyCode::KeyQ => self.controller.rotate_by(Rotation::new(0.0, 0.0, step)),
                KeyCode::KeyE => self.controller.rotate_by(Rotation::new(0.0, 0.0, -step)),
                KeyCode::KeyR => self.controller.reset_rotation(),
                KeyCode::Space => {
                    let rotation = self.controller.rotation();
                    let status = pollster::block_on(self.controller.request_preview(rotation));
                    log::info!("Preview at {:?}: {:?}", rotation, status);
                }
                KeyCode::KeyP => {
                    let status = pollster::block_on(
                        self.controller
                            .commit_pixelation(pixelate.pixel_size, pixelate.add_new_layer),
                    );
                    log::info!("Pixelate: {:?}", status);
                    self.answer_host_messages();
                }
                KeyCode::KeyT => {
                    let rotation = self.controller.rotation();
                    let status = pollster::block_on(
                        self.controller
                            .commit_transform(rotation, pixelate.add_new_layer),
                    );
                    log::info!("Transform at {:?}: {:?}", rotation, status);
                    self.answer_host_messages();
                }
                _ => return false,
            }
            true
        }
    }

    impl ApplicationHandler for Viewer {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.window.is_some() {
                return;
            }

            let window_attrs = WindowAttributes::default()
                .with_title(format!(
                    "fillfx - {} (arrows/Q/E rotate, Space preview, P pixelate, T transform, R reset)",
                    self.title
                ))
                .with_inner_size(winit::dpi::LogicalSize::new(
                    PREVIEW_WINDOW_WIDTH,
                    PREVIEW_WINDOW_HEIGHT,
                ));

            let window = match event_loop.create_window(window_attrs) {
                Ok(window) => Arc::new(window),
                Err(e) => {
                    log::error!("Failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            };
            self.window = Some(window.clone());

            if let Err(e) = pollster::block_on(self.attach_surface(window)) {
                log::error!("Failed to initialise preview: {}", e);
                event_loop.exit();
                return;
            }
            if !self.load_selection() {
                log::warn!("Showing placeholder");
            }
        }

        fn window_event(
            &mut self,
            event_loop: &ActiveEventLoop,
            _window_id: WindowId,
            event: WindowEvent,
        ) {
            match event {
                WindowEvent::CloseRequested
                | WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            state: ElementState::Pressed,
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            ..
                        },
                    ..
                } => event_loop.exit(),
                WindowEvent::Resized(size) => {
                    self.controller.resize_surface(size.width, size.height);
                }
                WindowEvent::RedrawRequested => self.controller.redraw(),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(keycode),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => {
                    if self.handle_key(keycode) {
                        let state = self.controller.snapshot();
                        log::debug!(
                            "Rotation {:?}, exported {}",
                            self.controller.rotation(),
                            state.exported_image.is_some()
                        );
                    }
                }
                _ => {}
            }
        }
    }

    pub fn run() -> Result<(), String> {
        let path = std::env::args()
            .nth(1)
            .ok_or_else(|| "usage: fillfx-native <image>".to_string())?;

        let config = AppConfig::load_or_default();
        env_logger::Builder::new()
            .filter_level(config.log_level.to_level_filter())
            .parse_env("RUST_LOG")
            .init();

        let image_bytes =
            std::fs::read(&path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        let title = std::path::Path::new(&path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(path);

        let event_loop = EventLoop::new().map_err(|e| e.to_string())?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut viewer = Viewer::new(config, image_bytes, title);
        event_loop.run_app(&mut viewer).map_err(|e| e.to_string())
    }
}

/// Native preview entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = viewer::run() {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
