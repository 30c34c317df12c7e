//! Rendering for the dofsim viewer
//!
//! This crate provides the wgpu-based pipeline for drawing a robot model at
//! its simulated pose.
//!
//! ## Key Components
//!
//! - [`context::RenderContext`] - WGPU device, queue, and surface management
//! - [`camera::OrbitCamera`] - Z-up camera orbiting a target point
//! - [`pipeline::MeshPipeline`] - Lit triangle rendering with a depth buffer
//! - [`renderable::RobotVisuals`] - Per-link triangles in link frames
//! - [`renderable::RenderableGeometry`] - World-space triangles for one frame

pub mod context;
pub mod camera;
pub mod pipeline;
pub mod renderable;

pub use camera::OrbitCamera;
pub use context::{ContextError, RenderContext};
pub use renderable::{CheckerboardGeometry, RenderableGeometry, RobotVisuals};
