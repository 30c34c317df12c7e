//! Physics simulation for dofsim
//!
//! This crate turns a [`dofsim_core::RobotModel`] into a `rapier3d` world:
//! - One rigid body per link, colliders from the collision geometry
//! - Impulse joints whose zero position is the model's rest pose
//! - A control vector with one velocity target per actuated joint
//! - A fixed-timestep clock for driving the world from wall time

pub mod body;
pub mod clock;
pub mod error;
pub mod joint;
pub mod material;
pub mod world;

// Re-export commonly used types
pub use body::LinkBody;
pub use clock::{SimClock, MAX_STEPS_PER_FRAME};
pub use error::PhysicsError;
pub use joint::{ArmJoint, JointState};
pub use material::PhysicsMaterial;
pub use world::{ArmWorld, PhysicsConfig};
