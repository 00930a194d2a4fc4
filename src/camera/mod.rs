//! Perspective camera.

use glam::{Mat4, Vec3};

/// A perspective projection camera.
pub struct PerspectiveCamera {
    /// Field of view in degrees.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Camera position.
    pub position: Vec3,
    /// Camera target (look-at point).
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(35.0, 16.0 / 9.0, 0.1, 100.0)
    }
}

impl PerspectiveCamera {
    /// Create a new perspective camera.
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::new(4.5, 4.0, 11.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }

    /// Set the aspect ratio (call on viewport resize).
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Compute the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Compute the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_matrix_moves_target_to_negative_z() {
        let mut camera = PerspectiveCamera::default();
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera.target = Vec3::ZERO;

        let view_target = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!((view_target.z + 5.0).abs() < 1e-5);
        assert!(view_target.x.abs() < 1e-5);
    }

    #[test]
    fn aspect_changes_projection() {
        let mut camera = PerspectiveCamera::default();
        camera.set_aspect(1.0);
        let square = camera.projection_matrix();
        camera.set_aspect(2.0);
        let wide = camera.projection_matrix();
        assert!(square.col(0).x > wide.col(0).x);
    }
}
