//! Perspective camera with orbit controls (drag to rotate, wheel to zoom).

use glam::{Mat4, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::params::RenderConfig;

/// Keeps the camera from flipping over the poles (radians)
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Zoom factor per wheel step
const ZOOM_STEP: f32 = 0.95;

/// Closest / farthest orbit distance (world units)
const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 500.0;

/// Camera orbiting a target point
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    target: Vec3,
    distance: f32,
    /// Rotation around Y; 0 looks down -Z from +Z
    yaw: f32,
    /// Elevation above the XZ plane
    pitch: f32,
    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl OrbitCamera {
    /// Camera on +Z at `camera_distance`, looking at the origin
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            target: Vec3::ZERO,
            distance: config.camera_distance,
            yaw: 0.0,
            pitch: 0.0,
            fov_degrees: config.fov_degrees,
            aspect: config.aspect_ratio(),
            near: config.near_plane,
            far: config.far_plane,
        }
    }

    /// Current eye position
    pub fn eye(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + offset * self.distance
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Rotate by a mouse drag of (`dx`, `dy`) pixels.
    ///
    /// Dragging across the full viewport height turns the camera a full circle.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.yaw -= 2.0 * PI * dx / height;
        self.pitch = (self.pitch + 2.0 * PI * dy / height).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Zoom by wheel steps; positive moves closer
    pub fn zoom(&mut self, steps: f32) {
        self.distance = (self.distance * ZOOM_STEP.powf(steps)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// World to camera space
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    /// Create view-projection matrix for rendering
    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initial_camera_on_positive_z() {
        let camera = OrbitCamera::new(&RenderConfig::default());
        let eye = camera.eye();
        assert_relative_eq!(eye.x, 0.0);
        assert_relative_eq!(eye.y, 0.0);
        assert_relative_eq!(eye.z, 40.0);
    }

    #[test]
    fn test_origin_projects_to_screen_center() {
        let camera = OrbitCamera::new(&RenderConfig::default());
        let clip = camera.view_proj() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_rotate_keeps_distance_and_clamps_pitch() {
        let mut camera = OrbitCamera::new(&RenderConfig::default());
        camera.rotate(120.0, 10_000.0, 720.0);

        assert_relative_eq!(camera.eye().length(), 40.0, epsilon = 1e-3);
        assert!(camera.eye().y < 40.0);
        assert!(camera.eye().y > 39.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = OrbitCamera::new(&RenderConfig::default());
        camera.zoom(1.0);
        assert_relative_eq!(camera.distance(), 38.0, epsilon = 1e-4);

        camera.zoom(1_000.0);
        assert_eq!(camera.distance(), MIN_DISTANCE);
        camera.zoom(-1_000.0);
        assert_eq!(camera.distance(), MAX_DISTANCE);
    }

    #[test]
    fn test_view_moves_eye_to_origin() {
        let mut camera = OrbitCamera::new(&RenderConfig::default());
        camera.rotate(90.0, 45.0, 720.0);

        let eye_in_view = camera.view().transform_point3(camera.eye());
        assert_relative_eq!(eye_in_view.length(), 0.0, epsilon = 1e-4);
        // Target sits straight ahead on -Z
        let target_in_view = camera.view().transform_point3(Vec3::ZERO);
        assert_relative_eq!(target_in_view.z, -camera.distance(), epsilon = 1e-4);
        assert_eq!(camera.view_proj(), camera.projection() * camera.view());
    }

    #[test]
    fn test_view_proj_matrix_generation() {
        let camera = OrbitCamera::new(&RenderConfig::default());
        let view_proj = camera.view_proj();

        // Matrix should not be identity or zero
        assert_ne!(view_proj, Mat4::IDENTITY);
        assert_ne!(view_proj, Mat4::ZERO);
        assert!(view_proj.is_finite());
    }
}
