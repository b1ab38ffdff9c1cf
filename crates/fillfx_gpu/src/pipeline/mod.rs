//! Render pipeline abstractions.
//!
//! Pipelines are described declaratively (shader source, entry points,
//! vertex layout) and built through [`PipelineBuilder`].

pub mod builder;
pub mod preview;

use std::borrow::Cow;

pub use builder::{BindGroupLayoutBuilder, PipelineBuilder};
pub use preview::{PreviewPipeline, Vertex, QUAD_VERTICES};

/// WGSL program description: source plus entry points.
#[derive(Debug, Clone)]
pub struct ShaderDescriptor {
    pub label: &'static str,
    pub source: Cow<'static, str>,
    pub vs_entry: &'static str,
    pub fs_entry: &'static str,
}

impl ShaderDescriptor {
    /// The fixed textured-quad program.
    pub fn preview() -> Self {
        Self {
            label: "Preview Shader",
            source: Cow::Borrowed(include_str!("../shaders/preview.wgsl")),
            vs_entry: "vs_main",
            fs_entry: "fs_main",
        }
    }

    /// Replace the source, keeping label and entry points.
    pub fn with_source(mut self, source: impl Into<Cow<'static, str>>) -> Self {
        self.source = source.into();
        self
    }

    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label),
            source: wgpu::ShaderSource::Wgsl(self.source.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_source_keeps_label_and_entry_points() {
        let shader = ShaderDescriptor::preview().with_source("@vertex fn vs_main( {");
        assert_eq!(shader.source, "@vertex fn vs_main( {");
        assert_eq!(shader.label, "Preview Shader");
        assert_eq!(shader.vs_entry, "vs_main");
        assert_eq!(shader.fs_entry, "fs_main");
    }

    #[test]
    fn test_preview_source_defines_entry_points() {
        let shader = ShaderDescriptor::preview();
        assert!(shader.source.contains(&format!("fn {}(", shader.vs_entry)));
        assert!(shader.source.contains(&format!("fn {}(", shader.fs_entry)));
    }
}
