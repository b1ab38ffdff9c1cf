//! Model-view-projection math for the rotated preview quad.
//!
//! The CPU re-rasterizer in the main crate uses the same matrices, so the
//! exported image matches what the preview shows.

use glam::{Mat4, Vec3};

use crate::uniform::PreviewUniform;

/// Rotation angles in degrees, applied in X, Y, Z order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Rotation {
    pub const ZERO: Rotation = Rotation {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// Fixed camera constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Distance the camera is pulled back along -Z.
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            z_near: 0.1,
            z_far: 100.0,
            distance: 4.0,
        }
    }
}

/// Scale of the unit quad so the image keeps its aspect ratio inside the viewport.
///
/// Returns `(scale_x, scale_y)`; one of the two is always 1.
pub fn quad_scale(image_aspect: f32, viewport_aspect: f32) -> (f32, f32) {
    if image_aspect > viewport_aspect {
        (1.0, viewport_aspect / image_aspect)
    } else {
        (image_aspect / viewport_aspect, 1.0)
    }
}

/// Separate model-view and projection matrices, as uploaded to the shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelViewProjection {
    pub model_view: Mat4,
    pub projection: Mat4,
}

impl ModelViewProjection {
    /// Build the matrices for a viewport and image aspect ratio.
    ///
    /// Model-view is `translate(0, 0, -distance) * Rx * Ry * Rz * scale`.
    /// The projection is OpenGL-style (`[-1, 1]` depth); the quad always sits
    /// deep enough in front of the camera to stay inside wgpu's `[0, 1]` range.
    pub fn new(
        camera: &CameraConfig,
        rotation: Rotation,
        viewport_aspect: f32,
        image_aspect: f32,
    ) -> Self {
        let viewport_aspect = sanitize_aspect(viewport_aspect);
        let image_aspect = sanitize_aspect(image_aspect);

        let projection = Mat4::perspective_rh_gl(
            camera.fov_y_degrees.to_radians(),
            viewport_aspect,
            camera.z_near,
            camera.z_far,
        );

        let (scale_x, scale_y) = quad_scale(image_aspect, viewport_aspect);
        let model_view = Mat4::from_translation(Vec3::new(0.0, 0.0, -camera.distance))
            * Mat4::from_rotation_x(rotation.x.to_radians())
            * Mat4::from_rotation_y(rotation.y.to_radians())
            * Mat4::from_rotation_z(rotation.z.to_radians())
            * Mat4::from_scale(Vec3::new(scale_x, scale_y, 1.0));

        Self {
            model_view,
            projection,
        }
    }

    /// `projection * model_view`.
    pub fn combined(&self) -> Mat4 {
        self.projection * self.model_view
    }

    pub fn to_uniform(&self) -> PreviewUniform {
        PreviewUniform {
            model_view: self.model_view.to_cols_array_2d(),
            projection: self.projection.to_cols_array_2d(),
        }
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}
