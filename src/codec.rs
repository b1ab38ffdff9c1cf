//! Image codec: encoded bytes to RGBA pixels and back.
//!
//! Decoding rasterizes onto the size the host declared, which is what
//! drawing the image onto a `width` x `height` canvas does.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};
use web_time::Instant;

use crate::error::CodecError;
use crate::model::PixelBuffer;

/// Decode `bytes` (PNG, JPEG, ...) into a `width` x `height` RGBA buffer.
///
/// The image is resampled when its intrinsic size differs from the
/// declared one.
pub fn decode(bytes: &[u8], width: u32, height: u32) -> Result<PixelBuffer, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }
    // Reject the declared size before resampling allocates for it.
    PixelBuffer::checked_byte_len(width, height)?;

    let start = Instant::now();
    let decoded = image::load_from_memory(bytes)?.to_rgba8();
    let rgba = if decoded.dimensions() == (width, height) {
        decoded
    } else {
        log::debug!(
            "Resampling decoded image {}x{} to {}x{}",
            decoded.width(),
            decoded.height(),
            width,
            height
        );
        image::imageops::resize(&decoded, width, height, FilterType::Triangle)
    };

    let buffer = PixelBuffer::new(rgba.into_raw(), width, height)?;
    log::debug!(
        "Decoded {} bytes to {}x{} in {:?}",
        bytes.len(),
        width,
        height,
        start.elapsed()
    );
    Ok(buffer)
}

/// Decode `bytes` at their intrinsic size.
pub fn decode_native_size(bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(PixelBuffer::new(rgba.into_raw(), width, height)?)
}

/// Encode a buffer as PNG, the format uploaded back to the host.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, CodecError> {
    let image = RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.data().to_vec())
        .ok_or(CodecError::Empty)?;
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PixelBufferError;

    const SOLID_2X2: [u8; 16] = [
        255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 0, 255,
    ];

    fn png_2x2() -> Vec<u8> {
        let buffer = PixelBuffer::new(SOLID_2X2.to_vec(), 2, 2).unwrap();
        encode_png(&buffer).unwrap()
    }

    #[test]
    fn test_png_round_trip_is_lossless() {
        let decoded = decode(&png_2x2(), 2, 2).unwrap();
        assert_eq!(decoded.data(), &SOLID_2X2);
    }

    #[test]
    fn test_encode_produces_png_signature() {
        assert_eq!(&png_2x2()[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_decode_resamples_to_declared_size() {
        let decoded = decode(&png_2x2(), 4, 3).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
        assert_eq!(decoded.data().len(), 4 * 3 * 4);
    }

    #[test]
    fn test_decode_native_size() {
        let decoded = decode_native_size(&png_2x2()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(decode(b"not an image", 2, 2), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_decode_empty_fails() {
        assert!(matches!(decode(&[], 2, 2), Err(CodecError::Empty)));
    }

    #[test]
    fn test_decode_zero_size_fails() {
        assert!(matches!(decode(&png_2x2(), 0, 2), Err(CodecError::Buffer(_))));
    }

    #[test]
    fn test_decode_rejects_oversized_declared_size() {
        assert!(matches!(
            decode(&png_2x2(), u32::MAX, 2),
            Err(CodecError::Buffer(PixelBufferError::TooLarge { .. }))
        ));
    }
}
