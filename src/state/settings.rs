//! Rotation settings and the active preview surface.
//!
//! Unlike the selection, settings survive selection changes.

use fillfx_gpu::{GpuContext, GpuError, PreviewRenderer, Rotation};

use crate::model::PixelBuffer;

/// Drawing surface plus the renderer compiled for it.
pub struct PreviewSurface {
    pub context: GpuContext,
    pub renderer: PreviewRenderer,
}

impl PreviewSurface {
    pub fn new(context: GpuContext, renderer: PreviewRenderer) -> Self {
        Self { context, renderer }
    }

    /// Draw `image`, or the placeholder when there is none.
    pub fn draw(&mut self, image: Option<&PixelBuffer>, rotation: Rotation) -> Result<(), GpuError> {
        match image {
            Some(image) => self.renderer.draw(
                &mut self.context,
                image.data(),
                image.width(),
                image.height(),
                rotation,
            ),
            None => self.renderer.draw_placeholder(&mut self.context, rotation),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }
}

#[derive(Default)]
pub struct Settings {
    rotation: Rotation,
    surface: Option<PreviewSurface>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Set all three angles, in degrees.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = Rotation::new(
            normalize_degrees(rotation.x),
            normalize_degrees(rotation.y),
            normalize_degrees(rotation.z),
        );
    }

    /// Add to the current angles.
    pub fn rotate_by(&mut self, delta: Rotation) {
        let r = self.rotation;
        self.set_rotation(Rotation::new(r.x + delta.x, r.y + delta.y, r.z + delta.z));
    }

    pub fn reset_rotation(&mut self) {
        self.rotation = Rotation::ZERO;
    }

    /// Install (or replace) the drawing surface.
    pub fn set_surface(&mut self, surface: PreviewSurface) {
        self.surface = Some(surface);
    }

    /// Drop the drawing surface, e.g. when the canvas is unmounted.
    pub fn clear_surface(&mut self) -> Option<PreviewSurface> {
        self.surface.take()
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface_mut(&mut self) -> Option<&mut PreviewSurface> {
        self.surface.as_mut()
    }
}

/// Wrap an angle into `(-180, 180]`.
fn normalize_degrees(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_settings_have_no_rotation_or_surface() {
        let settings = Settings::new();
        assert!(settings.rotation().is_zero());
        assert!(!settings.has_surface());
    }

    #[test]
    fn test_rotation_wraps_into_half_open_range() {
        let mut settings = Settings::new();
        settings.set_rotation(Rotation::new(190.0, -190.0, 720.0));
        assert_eq!(settings.rotation(), Rotation::new(-170.0, 170.0, 0.0));

        settings.set_rotation(Rotation::new(180.0, -180.0, f32::NAN));
        assert_eq!(settings.rotation(), Rotation::new(180.0, 180.0, 0.0));
    }

    #[test]
    fn test_rotate_by_accumulates() {
        let mut settings = Settings::new();
        settings.rotate_by(Rotation::new(10.0, 0.0, 0.0));
        settings.rotate_by(Rotation::new(15.0, 5.0, -5.0));
        assert_eq!(settings.rotation(), Rotation::new(25.0, 5.0, -5.0));

        settings.reset_rotation();
        assert!(settings.rotation().is_zero());
    }
}
