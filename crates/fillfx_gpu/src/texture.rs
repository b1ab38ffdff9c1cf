use crate::config::TextureConfig;
use crate::context::GpuContext;
use crate::error::{GpuError, Result};

/// GPU texture wrapper for one preview frame.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

/// Check that `data` is a tightly packed RGBA8 grid of `width` x `height`.
pub fn validate_rgba8(data: &[u8], width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(GpuError::Texture(format!(
            "Invalid texture size {}x{}",
            width, height
        )));
    }
    let expected_size = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| {
            GpuError::Texture(format!("Texture size {}x{} overflows", width, height))
        })?;
    if data.len() != expected_size {
        return Err(GpuError::Texture(format!(
            "Invalid data size: expected {} bytes for {}x{} RGBA8, got {}",
            expected_size,
            width,
            height,
            data.len()
        )));
    }
    Ok(())
}

impl Texture {
    /// Create a texture from RGBA8 bytes with custom configuration.
    pub fn from_rgba8_with_config(
        ctx: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        config: &TextureConfig,
    ) -> Result<Self> {
        validate_rgba8(data, width, height)?;

        let max = ctx.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(GpuError::Texture(format!(
                "{}x{} exceeds the device texture limit of {}",
                width, height, max
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Preview Image Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            texture.as_image_copy(),
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Preview Image Sampler"),
            address_mode_u: config.address_mode,
            address_mode_v: config.address_mode,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: config.mag_filter,
            min_filter: config.min_filter,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
            width,
            height,
        })
    }

    /// Get aspect ratio
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
