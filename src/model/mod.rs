//! Data models shared by the stores, the codec and the host bridge.

mod fill;
mod pixel_buffer;

pub use fill::{Fill, Fills, HostSelection, ImageRef};
pub use pixel_buffer::{BYTES_PER_PIXEL, MAX_EDGE, PixelBuffer};
