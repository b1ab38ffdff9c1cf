//! Error types for the plugin core.
//!
//! Most of these never reach the user: the controller logs them and keeps
//! going, matching how the plugin UI treats failures.

use thiserror::Error;

/// A pixel grid whose byte length does not match its dimensions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PixelBufferError {
    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },

    #[error("Expected {expected} bytes for {width}x{height} RGBA, got {actual}")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Image of {width}x{height} exceeds the {max}px edge limit")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// Errors from decoding or encoding image bytes.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The bytes are not an image the decoder understands
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The decoded or supplied pixels have the wrong shape
    #[error(transparent)]
    Buffer(#[from] PixelBufferError),

    #[error("No image data")]
    Empty,
}

/// Errors from the transform and pixelate operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error(transparent)]
    Buffer(#[from] PixelBufferError),

    /// Rotation that projects the quad onto nothing (e.g. edge-on)
    #[error("Rotation ({x}, {y}, {z}) leaves nothing visible")]
    Degenerate { x: f32, y: f32, z: f32 },

    #[error("Output of {width}x{height} exceeds the {max} pixel limit")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// Errors from posting a message to the host.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to serialize host message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Host channel closed")]
    Closed,

    #[error("Host rejected message: {0}")]
    Rejected(String),
}
