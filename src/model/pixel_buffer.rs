//! Tightly packed RGBA8 pixel grid.

use crate::error::PixelBufferError;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Largest width or height a buffer may have. Matches the usual WebGL
/// texture ceiling and keeps `width * height * 4` inside a 32-bit `usize`.
pub const MAX_EDGE: u32 = 16384;

/// RGBA8 pixels, row-major, top row first.
///
/// The only way to build one is [`PixelBuffer::new`], so
/// `data.len() == width * height * 4` always holds.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, PixelBufferError> {
        let expected = Self::checked_byte_len(width, height)?;
        if data.len() != expected {
            return Err(PixelBufferError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Byte length of a `width` x `height` grid, or `None` if it overflows.
    pub fn byte_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(BYTES_PER_PIXEL)
    }

    /// Validate dimensions a buffer could be built with and return its byte length.
    pub fn checked_byte_len(width: u32, height: u32) -> Result<usize, PixelBufferError> {
        if width == 0 || height == 0 {
            return Err(PixelBufferError::EmptyDimensions { width, height });
        }
        let too_large = PixelBufferError::TooLarge {
            width,
            height,
            max: MAX_EDGE,
        };
        if width > MAX_EDGE || height > MAX_EDGE {
            return Err(too_large);
        }
        Self::byte_len(width, height).ok_or(too_large)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// RGBA of the pixel at (`x`, `y`), or `None` outside the grid.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let mut px = [0; 4];
        px.copy_from_slice(&self.data[i..i + BYTES_PER_PIXEL]);
        Some(px)
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

impl std::fmt::Debug for PixelBuffer {
    // Images can be megabytes; print the shape only.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}
