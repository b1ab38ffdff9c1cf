//! Pixel operations behind "Transform" and "Pixelate".
//!
//! Both are pure functions of their input. [`ImageProcessor`] wraps them in
//! futures so the controller treats them as suspension points and re-checks
//! the selection once they resolve.

use std::future::Future;

use fillfx_gpu::camera::quad_scale;
use fillfx_gpu::{CameraConfig, ModelViewProjection, Rotation};
use glam::{Mat3, Vec3, Vec4};
use web_time::Instant;

use crate::error::ProcessError;
use crate::model::{BYTES_PER_PIXEL, MAX_EDGE, PixelBuffer};

/// Largest edge the rotated output may have.
pub const MAX_OUTPUT_EDGE: u32 = MAX_EDGE;

/// Async image operations used by the controller.
pub trait ImageProcessor {
    /// Rotate the image in 3D and flatten it back to RGBA.
    fn transform(
        &self,
        image: PixelBuffer,
        rotation: Rotation,
    ) -> impl Future<Output = Result<PixelBuffer, ProcessError>>;

    /// Block-average the image; the size is preserved.
    fn pixelate(
        &self,
        image: PixelBuffer,
        pixel_size: u32,
    ) -> impl Future<Output = Result<PixelBuffer, ProcessError>>;
}

/// Runs both operations on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct CpuProcessor {
    camera: CameraConfig,
}

impl CpuProcessor {
    pub fn new(camera: CameraConfig) -> Self {
        Self { camera }
    }
}

impl ImageProcessor for CpuProcessor {
    async fn transform(
        &self,
        image: PixelBuffer,
        rotation: Rotation,
    ) -> Result<PixelBuffer, ProcessError> {
        let start = Instant::now();
        let result = rotate(&image, rotation, &self.camera);
        log::debug!(
            "Transform {}x{} by {:?} took {:?}",
            image.width(),
            image.height(),
            rotation,
            start.elapsed()
        );
        result
    }

    async fn pixelate(&self, image: PixelBuffer, pixel_size: u32) -> Result<PixelBuffer, ProcessError> {
        let start = Instant::now();
        let result = pixelate(&image, pixel_size);
        log::debug!(
            "Pixelate {}x{} at {} took {:?}",
            image.width(),
            image.height(),
            pixel_size,
            start.elapsed()
        );
        result
    }
}

/// Average every `pixel_size` x `pixel_size` block.
///
/// Blocks on the right and bottom edge may be partial and average only the
/// pixels they contain. A size of 0 or 1 returns the image unchanged.
pub fn pixelate(image: &PixelBuffer, pixel_size: u32) -> Result<PixelBuffer, ProcessError> {
    if pixel_size <= 1 {
        return Ok(image.clone());
    }

    let (width, height) = (image.width() as usize, image.height() as usize);
    let block = pixel_size as usize;
    let src = image.data();
    let mut out = vec![0u8; src.len()];

    for block_y in (0..height).step_by(block) {
        let y_end = (block_y + block).min(height);
        for block_x in (0..width).step_by(block) {
            let x_end = (block_x + block).min(width);

            let mut sum = [0u64; BYTES_PER_PIXEL];
            for y in block_y..y_end {
                let row = y * width;
                for x in block_x..x_end {
                    let i = (row + x) * BYTES_PER_PIXEL;
                    for (c, total) in sum.iter_mut().enumerate() {
                        *total += src[i + c] as u64;
                    }
                }
            }

            let count = ((y_end - block_y) * (x_end - block_x)) as u64;
            let average = sum.map(|total| ((total + count / 2) / count) as u8);

            for y in block_y..y_end {
                let row = y * width;
                for x in block_x..x_end {
                    let i = (row + x) * BYTES_PER_PIXEL;
                    out[i..i + BYTES_PER_PIXEL].copy_from_slice(&average);
                }
            }
        }
    }

    Ok(PixelBuffer::new(out, image.width(), image.height())?)
}

/// Re-rasterize the image as the preview camera sees it after `rotation`.
///
/// Zero rotation is an exact pass-through. Otherwise the output covers the
/// projected quad's bounding box at the scale where the unrotated image
/// maps one pixel to one pixel; pixels outside the quad are transparent.
pub fn rotate(
    image: &PixelBuffer,
    rotation: Rotation,
    camera: &CameraConfig,
) -> Result<PixelBuffer, ProcessError> {
    if rotation.is_zero() {
        return Ok(image.clone());
    }

    let degenerate = || ProcessError::Degenerate {
        x: rotation.x,
        y: rotation.y,
        z: rotation.z,
    };

    // Square virtual viewport: the quad itself carries the image aspect.
    let aspect = image.aspect_ratio();
    let mvp = ModelViewProjection::new(camera, rotation, 1.0, aspect).combined();
    let (scale_x, _) = quad_scale(aspect, 1.0);

    // Pixels per NDC unit, chosen so the unrotated quad is exactly width pixels wide.
    let focal = 1.0 / (camera.fov_y_degrees.to_radians() / 2.0).tan();
    let k = image.width() as f32 * camera.distance / (2.0 * focal * scale_x);

    // The MVP maps the unit quad's z = 0 plane through a homography: rows
    // x, y, w of the MVP, columns x, y and translation.
    let homography = Mat3::from_cols(
        Vec3::new(mvp.x_axis.x, mvp.x_axis.y, mvp.x_axis.w),
        Vec3::new(mvp.y_axis.x, mvp.y_axis.y, mvp.y_axis.w),
        Vec3::new(mvp.w_axis.x, mvp.w_axis.y, mvp.w_axis.w),
    );

    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for (cx, cy) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
        let clip = mvp * Vec4::new(cx, cy, 0.0, 1.0);
        if clip.w <= f32::EPSILON {
            return Err(degenerate());
        }
        let (nx, ny) = (clip.x / clip.w, clip.y / clip.w);
        min_x = min_x.min(nx);
        max_x = max_x.max(nx);
        min_y = min_y.min(ny);
        max_y = max_y.max(ny);
    }

    let extent_x = (max_x - min_x) * k;
    let extent_y = (max_y - min_y) * k;
    if !(extent_x >= 0.5 && extent_y >= 0.5) {
        return Err(degenerate());
    }
    // Tolerance keeps float noise from adding a blank column or row.
    let out_width = (extent_x - 1e-3).ceil() as u32;
    let out_height = (extent_y - 1e-3).ceil() as u32;
    if out_width > MAX_OUTPUT_EDGE || out_height > MAX_OUTPUT_EDGE {
        return Err(ProcessError::TooLarge {
            width: out_width,
            height: out_height,
            max: MAX_OUTPUT_EDGE,
        });
    }

    let inverse = homography.inverse();
    if !inverse.is_finite() {
        return Err(degenerate());
    }

    let (src_w, src_h) = (image.width(), image.height());
    let mut data = vec![0u8; PixelBuffer::checked_byte_len(out_width, out_height)?];
    for row in 0..out_height {
        let ndc_y = max_y - (row as f32 + 0.5) / k;
        for col in 0..out_width {
            let ndc_x = min_x + (col as f32 + 0.5) / k;
            let p = inverse * Vec3::new(ndc_x, ndc_y, 1.0);
            if p.z.abs() <= f32::EPSILON {
                continue;
            }
            let (px, py) = (p.x / p.z, p.y / p.z);
            if !(-1.0..=1.0).contains(&px) || !(-1.0..=1.0).contains(&py) {
                continue;
            }

            let u = ((px + 1.0) * 0.5 * src_w as f32) as u32;
            let v = ((1.0 - py) * 0.5 * src_h as f32) as u32;
            let (u, v) = (u.min(src_w - 1), v.min(src_h - 1));

            let src = (v as usize * src_w as usize + u as usize) * BYTES_PER_PIXEL;
            let dst = (row as usize * out_width as usize + col as usize) * BYTES_PER_PIXEL;
            data[dst..dst + BYTES_PER_PIXEL]
                .copy_from_slice(&image.data()[src..src + BYTES_PER_PIXEL]);
        }
    }

    Ok(PixelBuffer::new(data, out_width, out_height)?)
}
