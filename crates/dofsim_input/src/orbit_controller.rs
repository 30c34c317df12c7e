//! Orbit controller for inspecting a model
//!
//! Controls:
//! - Left-drag: orbit around the target
//! - Right-drag: pan the target
//! - Mouse wheel: zoom
//! - Arrow keys: orbit
//! - `+` / `-`: zoom

use nalgebra::Point3;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

/// Orbit controller for handling input
pub struct OrbitController {
    // Key state
    orbit_left: bool,
    orbit_right: bool,
    orbit_up: bool,
    orbit_down: bool,
    zoom_in: bool,
    zoom_out: bool,

    // Mouse state
    orbiting: bool,
    panning: bool,
    pending_dx: f32,
    pending_dy: f32,
    pending_scroll: f32,

    // Configuration
    pub orbit_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_sensitivity: f32,
    /// Orbit speed for arrow keys in rad/s
    pub key_orbit_speed: f32,
    /// Zoom rate for `+`/`-` as a fraction of distance per second
    pub key_zoom_speed: f32,
    pub invert_y: bool,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitController {
    pub fn new() -> Self {
        Self {
            orbit_left: false,
            orbit_right: false,
            orbit_up: false,
            orbit_down: false,
            zoom_in: false,
            zoom_out: false,

            orbiting: false,
            panning: false,
            pending_dx: 0.0,
            pending_dy: 0.0,
            pending_scroll: 0.0,

            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.001,
            zoom_sensitivity: 0.1,
            key_orbit_speed: 1.5,
            key_zoom_speed: 1.0,
            invert_y: false,
        }
    }

    /// Process keyboard input; returns true if the key was consumed
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;

        match key {
            KeyCode::ArrowLeft => { self.orbit_left = pressed; true }
            KeyCode::ArrowRight => { self.orbit_right = pressed; true }
            KeyCode::ArrowUp => { self.orbit_up = pressed; true }
            KeyCode::ArrowDown => { self.orbit_down = pressed; true }
            KeyCode::Equal | KeyCode::NumpadAdd => { self.zoom_in = pressed; true }
            KeyCode::Minus | KeyCode::NumpadSubtract => { self.zoom_out = pressed; true }
            _ => false,
        }
    }

    /// Process mouse button input
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;

        match button {
            MouseButton::Left => self.orbiting = pressed,
            MouseButton::Right | MouseButton::Middle => self.panning = pressed,
            _ => {}
        }
    }

    /// Process mouse movement in pixels
    pub fn process_mouse_motion(&mut self, delta_x: f64, delta_y: f64) {
        if self.orbiting || self.panning {
            self.pending_dx += delta_x as f32;
            self.pending_dy += delta_y as f32;
        }
    }

    /// Process wheel input in lines (positive = away from the user)
    pub fn process_scroll(&mut self, lines: f32) {
        self.pending_scroll += lines;
    }

    /// Apply accumulated input to the camera
    ///
    /// Returns the camera eye position for debug display.
    pub fn update<C: CameraControl>(&mut self, camera: &mut C, dt: f32) -> Point3<f32> {
        let key_azimuth = (self.orbit_right as i32 - self.orbit_left as i32) as f32;
        let key_elevation = (self.orbit_up as i32 - self.orbit_down as i32) as f32;
        if key_azimuth != 0.0 || key_elevation != 0.0 {
            camera.orbit(
                key_azimuth * self.key_orbit_speed * dt,
                key_elevation * self.key_orbit_speed * dt,
            );
        }

        let dy = if self.invert_y { -self.pending_dy } else { self.pending_dy };
        if self.orbiting {
            // Dragging right spins the scene right, so the camera moves left
            camera.orbit(
                -self.pending_dx * self.orbit_sensitivity,
                dy * self.orbit_sensitivity,
            );
        } else if self.panning {
            camera.pan(
                -self.pending_dx * self.pan_sensitivity,
                dy * self.pan_sensitivity,
            );
        }

        let key_zoom = (self.zoom_in as i32 - self.zoom_out as i32) as f32;
        let mut zoom = (1.0 - self.zoom_sensitivity).powf(self.pending_scroll);
        if key_zoom != 0.0 {
            zoom *= (1.0 - self.key_zoom_speed * dt).max(0.1).powf(key_zoom);
        }
        if zoom != 1.0 {
            camera.zoom(zoom);
        }

        self.pending_dx = 0.0;
        self.pending_dy = 0.0;
        self.pending_scroll = 0.0;

        camera.eye()
    }

    /// Check if the camera is being dragged or driven by keys
    pub fn is_active(&self) -> bool {
        self.orbiting
            || self.panning
            || self.orbit_left
            || self.orbit_right
            || self.orbit_up
            || self.orbit_down
            || self.zoom_in
            || self.zoom_out
    }

    /// Builder: set orbit sensitivity (rad per pixel)
    pub fn with_orbit_sensitivity(mut self, sensitivity: f32) -> Self {
        self.orbit_sensitivity = sensitivity;
        self
    }

    /// Builder: set pan sensitivity (fraction of distance per pixel)
    pub fn with_pan_sensitivity(mut self, sensitivity: f32) -> Self {
        self.pan_sensitivity = sensitivity;
        self
    }

    /// Builder: set zoom per wheel line
    pub fn with_zoom_sensitivity(mut self, sensitivity: f32) -> Self {
        self.zoom_sensitivity = sensitivity.clamp(0.0, 0.9);
        self
    }

    /// Builder: invert vertical drag
    pub fn with_invert_y(mut self, invert: bool) -> Self {
        self.invert_y = invert;
        self
    }
}

/// Trait for camera control
/// Allows the controller to work with different camera implementations
pub trait CameraControl {
    /// Rotate about the target (radians)
    fn orbit(&mut self, delta_azimuth: f32, delta_elevation: f32);
    /// Move the target in the view plane, as a fraction of distance
    fn pan(&mut self, right: f32, up: f32);
    /// Scale the distance to the target
    fn zoom(&mut self, factor: f32);
    fn eye(&self) -> Point3<f32>;
}
