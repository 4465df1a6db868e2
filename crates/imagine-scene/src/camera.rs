//! Scene cameras and their projections

use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Current size of the surface the scene renders into, in pixels.
///
/// Stored as a world resource so the camera on-add hook can size new cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionType {
    Perspective,
    #[default]
    Orthographic,
}

/// Projection parameters of a scene camera.
///
/// The projection matrix is derived from these fields on demand, so a camera
/// loaded from disk is immediately usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneCamera {
    pub projection_type: ProjectionType,
    /// Vertical field of view in radians.
    pub perspective_fov: f32,
    pub perspective_near: f32,
    pub perspective_far: f32,
    /// Visible height in world units.
    pub orthographic_size: f32,
    pub orthographic_near: f32,
    pub orthographic_far: f32,
    pub aspect_ratio: f32,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            projection_type: ProjectionType::Orthographic,
            perspective_fov: 45f32.to_radians(),
            perspective_near: 0.01,
            perspective_far: 1000.0,
            orthographic_size: 10.0,
            orthographic_near: -1.0,
            orthographic_far: 1.0,
            aspect_ratio: 1.0,
        }
    }
}

impl SceneCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to an orthographic projection.
    pub fn set_orthographic(&mut self, size: f32, near: f32, far: f32) {
        self.projection_type = ProjectionType::Orthographic;
        self.orthographic_size = size;
        self.orthographic_near = near;
        self.orthographic_far = far;
    }

    /// Switch to a perspective projection. `fov` is in radians.
    pub fn set_perspective(&mut self, fov: f32, near: f32, far: f32) {
        self.projection_type = ProjectionType::Perspective;
        self.perspective_fov = fov;
        self.perspective_near = near;
        self.perspective_far = far;
    }

    /// Adapt the aspect ratio to a viewport. A zero height is ignored.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect_ratio = width as f32 / height as f32;
    }

    pub fn projection(&self) -> Mat4 {
        match self.projection_type {
            ProjectionType::Perspective => Mat4::perspective_rh_gl(
                self.perspective_fov,
                self.aspect_ratio,
                self.perspective_near,
                self.perspective_far,
            ),
            ProjectionType::Orthographic => {
                let half_height = self.orthographic_size * 0.5;
                let half_width = half_height * self.aspect_ratio;
                Mat4::orthographic_rh_gl(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.orthographic_near,
                    self.orthographic_far,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_size_sets_aspect() {
        let mut camera = SceneCamera::new();
        camera.set_viewport_size(800, 600);
        assert!((camera.aspect_ratio - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_height_is_ignored() {
        let mut camera = SceneCamera::new();
        camera.set_viewport_size(800, 0);
        assert_eq!(camera.aspect_ratio, 1.0);
    }

    #[test]
    fn test_orthographic_extent() {
        let mut camera = SceneCamera::new();
        camera.set_viewport_size(200, 100);
        // size 10 at aspect 2 spans x in [-10, 10]
        let corner = camera.projection().project_point3(glam::Vec3::new(10.0, 5.0, 0.0));
        assert!((corner.x - 1.0).abs() < 1e-5);
        assert!((corner.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_switching_projection_changes_matrix() {
        let mut camera = SceneCamera::new();
        let ortho = camera.projection();
        camera.set_perspective(60f32.to_radians(), 0.1, 100.0);
        assert_eq!(camera.projection_type, ProjectionType::Perspective);
        assert_ne!(camera.projection(), ortho);
    }
}
