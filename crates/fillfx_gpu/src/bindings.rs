//! Shader binding constants.
//!
//! These must match the `@group`/`@binding` attributes in `shaders/preview.wgsl`.

/// Binding constants for the preview pipeline.
pub mod preview {
    /// Group 0: camera uniforms
    pub const UNIFORM_GROUP: u32 = 0;
    /// Binding 0 in group 0: model-view and projection matrices
    pub const UNIFORM_CAMERA_BINDING: u32 = 0;

    /// Group 1: image texture
    pub const TEXTURE_GROUP: u32 = 1;
    /// Binding 0 in group 1: Texture 2D
    pub const TEXTURE_BINDING: u32 = 0;
    /// Binding 1 in group 1: Sampler
    pub const SAMPLER_BINDING: u32 = 1;

    /// Vertex attribute locations.
    pub const POSITION_LOCATION: u32 = 0;
    pub const TEX_COORD_LOCATION: u32 = 1;
}

#[cfg(test)]
mod tests {
    use super::preview::*;

    #[test]
    fn test_shader_source_uses_declared_bindings() {
        let source = include_str!("shaders/preview.wgsl");
        assert!(source.contains(&format!(
            "@group({}) @binding({})",
            UNIFORM_GROUP, UNIFORM_CAMERA_BINDING
        )));
        assert!(source.contains(&format!("@group({}) @binding({})", TEXTURE_GROUP, TEXTURE_BINDING)));
        assert!(source.contains(&format!("@group({}) @binding({})", TEXTURE_GROUP, SAMPLER_BINDING)));
        assert!(source.contains(&format!("@location({}) position", POSITION_LOCATION)));
        assert!(source.contains(&format!("@location({}) tex_coords", TEX_COORD_LOCATION)));
    }
}
