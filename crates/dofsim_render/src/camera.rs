//! Orbit camera
//!
//! The camera sits on a sphere around a target point and always looks at
//! it. World Z is up. Azimuth is measured from +X towards +Y, elevation up
//! from the XY plane.

use dofsim_input::CameraControl;
use nalgebra::{Point3, Vector3};

use crate::pipeline::look_at_matrix;

/// Elevation is kept just short of the poles so the view never flips
const MAX_ELEVATION: f32 = 1.55;

/// Camera orbiting a target point
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub target: Point3<f32>,
    pub distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    // Pose restored by `reset`
    home_target: Point3<f32>,
    home_distance: f32,
    home_azimuth: f32,
    home_elevation: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 0.15), 0.8, 0.6, 0.4)
    }
}

impl OrbitCamera {
    /// Create a camera; the given pose becomes the home pose
    pub fn new(target: Point3<f32>, distance: f32, azimuth: f32, elevation: f32) -> Self {
        let elevation = elevation.clamp(-MAX_ELEVATION, MAX_ELEVATION);
        Self {
            target,
            distance,
            azimuth,
            elevation,
            min_distance: 0.05,
            max_distance: 50.0,
            home_target: target,
            home_distance: distance,
            home_azimuth: azimuth,
            home_elevation: elevation,
        }
    }

    /// Unit vector from the target towards the eye
    fn offset_dir(&self) -> Vector3<f32> {
        let (sa, ca) = self.azimuth.sin_cos();
        let (se, ce) = self.elevation.sin_cos();
        Vector3::new(ce * ca, ce * sa, se)
    }

    /// Camera position in world space
    pub fn eye(&self) -> Point3<f32> {
        self.target + self.offset_dir() * self.distance
    }

    /// Direction the camera looks in
    pub fn forward(&self) -> Vector3<f32> {
        -self.offset_dir()
    }

    /// Screen-right direction
    pub fn right(&self) -> Vector3<f32> {
        Vector3::new(-self.azimuth.sin(), self.azimuth.cos(), 0.0)
    }

    /// Screen-up direction
    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(&self.forward())
    }

    /// World-to-view matrix (column-major)
    pub fn view_matrix(&self) -> [[f32; 4]; 4] {
        let eye = self.eye();
        look_at_matrix(
            [eye.x, eye.y, eye.z],
            [self.target.x, self.target.y, self.target.z],
            [0.0, 0.0, 1.0],
        )
    }

    /// Rotate about the target
    pub fn orbit(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.azimuth = (self.azimuth + delta_azimuth).rem_euclid(std::f32::consts::TAU);
        self.elevation = (self.elevation + delta_elevation).clamp(-MAX_ELEVATION, MAX_ELEVATION);
    }

    /// Slide the target in the view plane; offsets are fractions of distance
    pub fn pan(&mut self, right: f32, up: f32) {
        let shift = (self.right() * right + self.up() * up) * self.distance;
        self.target += shift;
    }

    /// Scale the distance to the target
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
        }
    }

    /// Return to the home pose
    pub fn reset(&mut self) {
        self.target = self.home_target;
        self.distance = self.home_distance;
        self.azimuth = self.home_azimuth;
        self.elevation = self.home_elevation;
    }
}

impl CameraControl for OrbitCamera {
    fn orbit(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        OrbitCamera::orbit(self, delta_azimuth, delta_elevation);
    }

    fn pan(&mut self, right: f32, up: f32) {
        OrbitCamera::pan(self, right, up);
    }

    fn zoom(&mut self, factor: f32) {
        OrbitCamera::zoom(self, factor);
    }

    fn eye(&self) -> Point3<f32> {
        OrbitCamera::eye(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_on_positive_x() {
        let cam = OrbitCamera::new(Point3::origin(), 2.0, 0.0, 0.0);
        let eye = cam.eye();
        assert!((eye - Point3::new(2.0, 0.0, 0.0)).norm() < 1e-6);
        assert!((cam.forward() + Vector3::x()).norm() < 1e-6);
    }

    #[test]
    fn test_up_points_up_at_horizon() {
        let cam = OrbitCamera::new(Point3::origin(), 1.0, 0.7, 0.0);
        assert!((cam.up() - Vector3::z()).norm() < 1e-5);
    }

    #[test]
    fn test_elevation_clamped() {
        let mut cam = OrbitCamera::default();
        cam.orbit(0.0, 10.0);
        assert_eq!(cam.elevation, MAX_ELEVATION);
        cam.orbit(0.0, -20.0);
        assert_eq!(cam.elevation, -MAX_ELEVATION);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut cam = OrbitCamera::default();
        cam.zoom(1e-6);
        assert_eq!(cam.distance, cam.min_distance);
        cam.zoom(-1.0);
        assert_eq!(cam.distance, cam.min_distance);
    }

    #[test]
    fn test_pan_keeps_view_direction() {
        let mut cam = OrbitCamera::new(Point3::origin(), 1.0, 0.0, 0.3);
        let before = cam.forward();
        cam.pan(0.5, 0.0);
        assert!((cam.forward() - before).norm() < 1e-6);
        assert!((cam.target.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_reset() {
        let mut cam = OrbitCamera::default();
        cam.orbit(1.0, 0.2);
        cam.pan(0.1, 0.1);
        cam.zoom(2.0);
        cam.reset();
        let home = OrbitCamera::default();
        assert_eq!(cam.target, home.target);
        assert_eq!(cam.distance, home.distance);
        assert_eq!(cam.azimuth, home.azimuth);
    }

    #[test]
    fn test_view_matrix_maps_target_forward() {
        let cam = OrbitCamera::new(Point3::new(0.0, 0.0, 0.5), 3.0, 1.0, 0.2);
        let m = cam.view_matrix();
        // Target lands on the -Z view axis at the orbit distance
        let t = [0.0f32, 0.0, 0.5, 1.0];
        let z: f32 = (0..4).map(|c| m[c][2] * t[c]).sum();
        let x: f32 = (0..4).map(|c| m[c][0] * t[c]).sum();
        assert!((z + 3.0).abs() < 1e-5);
        assert!(x.abs() < 1e-5);
    }
}
