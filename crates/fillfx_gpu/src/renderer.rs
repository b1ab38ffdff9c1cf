//! Preview renderer: draws an RGBA image as a rotated quad.
//!
//! Nothing is cached between frames. Every draw uploads the pixels it is
//! given, so the caller stays the single owner of the image data.

use crate::camera::{CameraConfig, ModelViewProjection, Rotation};
use crate::config::{ClearColor, TextureConfig};
use crate::context::GpuContext;
use crate::error::{GpuError, Result};
use crate::pipeline::{PreviewPipeline, ShaderDescriptor};
use crate::placeholder::{placeholder_rgba, PLACEHOLDER_SIZE};
use crate::texture::Texture;

pub struct PreviewRenderer {
    pipeline: PreviewPipeline,
    camera: CameraConfig,
    clear_color: ClearColor,
    texture_config: TextureConfig,
    placeholder: Vec<u8>,
}

impl PreviewRenderer {
    /// Compile the fixed preview program for `ctx`.
    pub async fn new(ctx: &GpuContext) -> Result<Self> {
        Self::with_shader(ctx, ShaderDescriptor::preview()).await
    }

    /// Compile `shader` for `ctx`.
    ///
    /// Shader and pipeline validation errors are captured and returned as
    /// [`GpuError::ShaderCompilation`] instead of reaching wgpu's panicking
    /// default handler.
    pub async fn with_shader(ctx: &GpuContext, shader: ShaderDescriptor) -> Result<Self> {
        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = PreviewPipeline::new(ctx, &shader);
        if let Some(error) = ctx.device.pop_error_scope().await {
            log::error!("Failed to build '{}': {}", shader.label, error);
            return Err(GpuError::ShaderCompilation(error.to_string()));
        }

        log::debug!("Preview pipeline ready ({:?})", ctx.format());
        Ok(Self {
            pipeline,
            camera: CameraConfig::default(),
            clear_color: ClearColor::default(),
            texture_config: TextureConfig::default(),
            placeholder: placeholder_rgba(),
        })
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_clear_color(mut self, clear_color: ClearColor) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn camera(&self) -> &CameraConfig {
        &self.camera
    }

    /// Draw `data` (tightly packed RGBA8, `width` x `height`) rotated by `rotation`.
    ///
    /// A lost or outdated surface is reconfigured before the error is
    /// returned, so the next draw can succeed.
    pub fn draw(
        &self,
        ctx: &mut GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        rotation: Rotation,
    ) -> Result<()> {
        let texture =
            Texture::from_rgba8_with_config(ctx, data, width, height, &self.texture_config)?;
        let mvp = ModelViewProjection::new(
            &self.camera,
            rotation,
            ctx.aspect_ratio(),
            texture.aspect_ratio(),
        );
        self.pipeline.update_camera(ctx, mvp.to_uniform());

        let frame = match ctx.acquire_frame() {
            Ok(frame) => frame,
            Err(GpuError::Frame(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated))) => {
                ctx.reconfigure();
                return Err(GpuError::Frame(e));
            }
            Err(e) => return Err(e),
        };

        let bind_group = self.pipeline.create_texture_bind_group(ctx, &texture);
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Preview Encoder"),
            });
        self.pipeline
            .render(&mut encoder, &frame.view, &bind_group, self.clear_color.into());
        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Draw the built-in placeholder image.
    pub fn draw_placeholder(&self, ctx: &mut GpuContext, rotation: Rotation) -> Result<()> {
        self.draw(
            ctx,
            &self.placeholder,
            PLACEHOLDER_SIZE,
            PLACEHOLDER_SIZE,
            rotation,
        )
    }
}
