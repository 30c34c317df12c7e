//! Physics error types

use std::fmt;

/// Errors raised while building or driving an [`ArmWorld`](crate::ArmWorld)
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Control index is past the end of the control vector
    ControlIndex { index: usize, dof: usize },
    /// Control value is NaN or infinite
    NonFiniteControl { index: usize, value: f32 },
    /// Configuration value out of range
    InvalidConfig(String),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::ControlIndex { index, dof } => write!(
                f,
                "Control index {} out of range (model has {} actuated joints)",
                index, dof
            ),
            PhysicsError::NonFiniteControl { index, value } => {
                write!(f, "Control {} is not finite: {}", index, value)
            }
            PhysicsError::InvalidConfig(msg) => write!(f, "Invalid physics config: {}", msg),
        }
    }
}

impl std::error::Error for PhysicsError {}
