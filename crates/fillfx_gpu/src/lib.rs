//! GPU side of the fill effects plugin: context setup and the rotated
//! image preview.

pub mod bindings;
pub mod camera;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod placeholder;
pub mod renderer;
pub mod texture;
pub mod uniform;

pub use camera::{CameraConfig, ModelViewProjection, Rotation};
pub use config::{ClearColor, GpuConfig, TextureConfig};
pub use context::GpuContext;
pub use error::{GpuError, Result};
pub use renderer::PreviewRenderer;
pub use texture::Texture;
pub use uniform::PreviewUniform;
