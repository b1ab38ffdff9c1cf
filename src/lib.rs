//! fillfx - image fill effects for Penpot
//!
//! Plugin core that previews a 3D-rotated or pixelated version of a shape's
//! image fill and sends the result back to the host as a new fill.

pub mod codec;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod host;
pub mod model;
pub mod processing;
pub mod state;

pub use config::AppConfig;
pub use controller::{OpStatus, PluginController};
pub use host::{ChannelBridge, HostBridge, HostEvent, PluginMessage};
pub use model::{Fill, Fills, HostSelection, PixelBuffer};

pub use fillfx_gpu::Rotation;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
