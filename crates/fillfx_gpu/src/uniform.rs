//! Uniform types for the preview pipeline.

use bytemuck::{Pod, Zeroable};

/// Model-view and projection matrices, column-major.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PreviewUniform {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl PreviewUniform {
    const IDENTITY: [[f32; 4]; 4] = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];

    pub fn new() -> Self {
        Self {
            model_view: Self::IDENTITY,
            projection: Self::IDENTITY,
        }
    }
}

impl Default for PreviewUniform {
    fn default() -> Self {
        Self::new()
    }
}
