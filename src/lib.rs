//! dofsim - a physics viewer for the dofbot arm
//!
//! Loads a robot description (the embedded dofbot by default), steps it
//! with rapier and draws it with wgpu. The loop runs until the window is
//! closed, or for a bounded number of steps when `TESTING` is set.

pub mod budget;
pub mod config;
pub mod error;
pub mod headless;
pub mod robot;
pub mod systems;

pub use budget::StepBudget;
pub use config::AppConfig;
pub use error::AppError;
pub use headless::{run_headless, HeadlessSummary};
pub use robot::Robot;
