use std::sync::Arc;
use winit::window::Window;

use crate::config::GpuConfig;
use crate::error::{GpuError, Result};

/// Format used for the offscreen target when no surface exists.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[cfg(target_arch = "wasm32")]
fn default_backends() -> wgpu::Backends {
    // A failed WebGPU surface can taint the canvas for the WebGL fallback,
    // so the plugin sticks to WebGL.
    wgpu::Backends::GL
}

#[cfg(not(target_arch = "wasm32"))]
fn default_backends() -> wgpu::Backends {
    wgpu::Backends::PRIMARY
}

/// One frame's color target.
pub struct Frame {
    surface_texture: Option<wgpu::SurfaceTexture>,
    pub view: wgpu::TextureView,
}

impl Frame {
    /// Present the frame. Offscreen frames have nothing to present.
    pub fn present(self) {
        if let Some(texture) = self.surface_texture {
            texture.present();
        }
    }
}

/// GPU context: device, queue and the drawing target.
///
/// The target is either a window/canvas surface or an offscreen texture.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: Option<wgpu::Surface<'static>>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub config: GpuConfig,
    offscreen: Option<wgpu::Texture>,
}

impl GpuContext {
    /// Initialize GPU context for a window with default configuration.
    ///
    /// On native, call this through `pollster::block_on()`.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        Self::with_config(window, GpuConfig::default()).await
    }

    /// Initialize GPU context for a window with custom configuration.
    pub async fn with_config(window: Arc<Window>, config: GpuConfig) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: default_backends(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;
        Self::from_surface(&instance, surface, size.width, size.height, config).await
    }

    /// Initialize GPU context for an HTML canvas (the plugin preview).
    #[cfg(target_arch = "wasm32")]
    pub async fn from_canvas(canvas: web_sys::HtmlCanvasElement, config: GpuConfig) -> Result<Self> {
        let (width, height) = (canvas.width(), canvas.height());
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: default_backends(),
            ..Default::default()
        });
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas))?;
        Self::from_surface(&instance, surface, width, height, config).await
    }

    /// Initialize a context that renders into an offscreen texture.
    pub async fn headless(width: u32, height: u32, config: GpuConfig) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = Self::request_device(&adapter).await?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: OFFSCREEN_FORMAT,
            width: width.max(1),
            height: height.max(1),
            present_mode: config.present_mode,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: config.max_frame_latency,
        };

        let offscreen = Self::create_offscreen(&device, surface_config.width, surface_config.height);
        log::debug!(
            "Headless GPU context {}x{} on {:?}",
            surface_config.width,
            surface_config.height,
            adapter.get_info().backend
        );

        Ok(Self {
            device,
            queue,
            surface: None,
            surface_config,
            config,
            offscreen: Some(offscreen),
        })
    }

    async fn from_surface(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
        config: GpuConfig,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("GPU initialized with backend: {:?}", adapter.get_info().backend);

        let (device, queue) = Self::request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::SurfaceConfigError)?;

        // Fifo is always supported
        let present_mode = if surface_caps.present_modes.contains(&config.present_mode) {
            config.present_mode
        } else {
            wgpu::PresentMode::Fifo
        };

        // Prefer a non-opaque alpha mode so the transparent clear shows the host panel.
        let alpha_mode = surface_caps
            .alpha_modes
            .iter()
            .find(|m| **m != wgpu::CompositeAlphaMode::Opaque)
            .or_else(|| surface_caps.alpha_modes.first())
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: config.max_frame_latency,
        };

        surface.configure(&device, &surface_config);

        Ok(Self {
            device,
            queue,
            surface: Some(surface),
            surface_config,
            config,
            offscreen: None,
        })
    }

    async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
        // WebGL has no compute shaders, so Limits::default() is too strict.
        let limits = wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());

        let pair = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Preview Device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        Ok(pair)
    }

    fn create_offscreen(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Preview Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    /// Acquire the color target for the next frame.
    pub fn acquire_frame(&self) -> Result<Frame> {
        if let Some(surface) = &self.surface {
            let surface_texture = surface.get_current_texture()?;
            let view = surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            return Ok(Frame {
                surface_texture: Some(surface_texture),
                view,
            });
        }

        let texture = self.offscreen.as_ref().ok_or(GpuError::SurfaceConfigError)?;
        Ok(Frame {
            surface_texture: None,
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        })
    }

    /// Handle a resize of the drawing surface.
    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        self.surface_config.width = new_width.max(1);
        self.surface_config.height = new_height.max(1);
        match &self.surface {
            Some(surface) => surface.configure(&self.device, &self.surface_config),
            None => {
                self.offscreen = Some(Self::create_offscreen(
                    &self.device,
                    self.surface_config.width,
                    self.surface_config.height,
                ));
            }
        }
    }

    /// Reconfigure the surface after it was lost or outdated.
    pub fn reconfigure(&mut self) {
        self.resize(self.surface_config.width, self.surface_config.height);
    }

    /// Format of the color target.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Get current surface width
    pub fn width(&self) -> u32 {
        self.surface_config.width
    }

    /// Get current surface height
    pub fn height(&self) -> u32 {
        self.surface_config.height
    }

    /// Get aspect ratio
    pub fn aspect_ratio(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height as f32
    }
}
