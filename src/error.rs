//! Top-level application error

use dofsim_core::ModelError;
use dofsim_physics::PhysicsError;

use crate::config::ConfigError;
use crate::systems::{RenderError, WindowError};

/// Anything that can stop the program
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Model(ModelError),
    Physics(PhysicsError),
    Window(WindowError),
    Render(RenderError),
    EventLoop(winit::error::EventLoopError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Model(e) => write!(f, "Failed to load robot: {}", e),
            AppError::Physics(e) => write!(f, "Simulation error: {}", e),
            AppError::Window(e) => write!(f, "{}", e),
            AppError::Render(e) => write!(f, "{}", e),
            AppError::EventLoop(e) => write!(f, "Event loop error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Model(e) => Some(e),
            AppError::Physics(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Render(e) => Some(e),
            AppError::EventLoop(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<ModelError> for AppError {
    fn from(e: ModelError) -> Self {
        AppError::Model(e)
    }
}

impl From<PhysicsError> for AppError {
    fn from(e: PhysicsError) -> Self {
        AppError::Physics(e)
    }
}

impl From<WindowError> for AppError {
    fn from(e: WindowError) -> Self {
        AppError::Window(e)
    }
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        AppError::Render(e)
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}
