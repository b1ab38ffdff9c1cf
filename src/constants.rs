//! Global constants for the fillfx plugin

/// Default block size for "Pixelate"
pub const DEFAULT_PIXEL_SIZE: u32 = 8;

/// Smallest block size offered; 1 leaves the image unchanged
pub const MIN_PIXEL_SIZE: u32 = 1;

/// Largest block size offered
pub const MAX_PIXEL_SIZE: u32 = 128;

/// Degrees added per rotation key press in the native viewer
pub const ROTATION_STEP_DEGREES: f32 = 5.0;

/// Native viewer window size
pub const PREVIEW_WINDOW_WIDTH: u32 = 512;
pub const PREVIEW_WINDOW_HEIGHT: u32 = 512;
