//! Application systems
//!
//! The pieces the windowed loop is assembled from.

mod render;
mod simulation;
mod window;

pub use render::{RenderError, RenderSystem};
pub use simulation::{SimulationResult, SimulationSystem};
pub use window::{WindowError, WindowSystem};
