//! Input handling for the dofsim viewer
//!
//! This crate maps mouse and keyboard input onto an orbiting camera.

mod orbit_controller;

pub use orbit_controller::{CameraControl, OrbitController};
