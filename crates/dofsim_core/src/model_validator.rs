//! Model validation
//!
//! Structural problems (dangling links, cycles) are rejected when a
//! [`RobotModel`] is built. The [`ModelValidator`] looks for problems that
//! still produce a loadable model but will simulate badly: degenerate axes,
//! inverted limits, zero effort on actuated joints and far-off origins.

use crate::model::{JointKind, RobotModel};

/// Largest joint origin offset considered reasonable, in meters
const MAX_ORIGIN_OFFSET: f32 = 100.0;

/// Non-fatal problem found in a model
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    /// Model has no joints, so nothing can move
    NoJoints,
    /// Joint axis has zero length
    ZeroAxis(String),
    /// Lower limit is above the upper limit
    InvertedLimits { joint: String, lower: f32, upper: f32 },
    /// Actuated joint has non-positive effort or velocity limit
    NoEffort(String),
    /// Joint origin is unreasonably far from its parent
    ExtremeOrigin { joint: String, offset: f32 },
    /// Link has neither collision geometry nor inertial data
    Massless(String),
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationWarning::NoJoints => write!(f, "Model has no joints"),
            ValidationWarning::ZeroAxis(joint) => {
                write!(f, "Joint '{}' has a zero-length axis", joint)
            }
            ValidationWarning::InvertedLimits { joint, lower, upper } => write!(
                f,
                "Joint '{}' has inverted limits: lower {} > upper {}",
                joint, lower, upper
            ),
            ValidationWarning::NoEffort(joint) => {
                write!(f, "Joint '{}' has no effort or velocity limit", joint)
            }
            ValidationWarning::ExtremeOrigin { joint, offset } => write!(
                f,
                "Joint '{}' origin is {} m from its parent (> {})",
                joint, offset, MAX_ORIGIN_OFFSET
            ),
            ValidationWarning::Massless(link) => {
                write!(f, "Link '{}' has no collision geometry or inertial", link)
            }
        }
    }
}

impl std::error::Error for ValidationWarning {}

/// Checks a robot model for problems that make it simulate badly
pub struct ModelValidator;

impl ModelValidator {
    /// Validate a model, returning all warnings found
    pub fn validate(model: &RobotModel) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if model.joint_count() == 0 {
            warnings.push(ValidationWarning::NoJoints);
        }

        for joint in model.joints() {
            let axis_len_sq: f32 = joint.axis.iter().map(|c| c * c).sum();
            if joint.kind.is_actuated() && axis_len_sq <= f32::EPSILON {
                warnings.push(ValidationWarning::ZeroAxis(joint.name.clone()));
            }

            if joint.kind == JointKind::Revolute || joint.kind == JointKind::Prismatic {
                if joint.limits.lower > joint.limits.upper {
                    warnings.push(ValidationWarning::InvertedLimits {
                        joint: joint.name.clone(),
                        lower: joint.limits.lower,
                        upper: joint.limits.upper,
                    });
                }
                if joint.limits.effort <= 0.0 || joint.limits.velocity <= 0.0 {
                    warnings.push(ValidationWarning::NoEffort(joint.name.clone()));
                }
            }

            let offset = joint.origin.max_offset();
            if offset > MAX_ORIGIN_OFFSET {
                warnings.push(ValidationWarning::ExtremeOrigin {
                    joint: joint.name.clone(),
                    offset,
                });
            }
        }

        for (key, link) in model.links() {
            if key == model.root_key() {
                continue;
            }
            if link.collisions.is_empty() && link.inertial.is_none() {
                warnings.push(ValidationWarning::Massless(link.name.clone()));
            }
        }

        warnings
    }

    /// Validate and return Result (Ok if no warnings, Err with all warnings)
    pub fn validate_or_error(model: &RobotModel) -> Result<(), Vec<ValidationWarning>> {
        let warnings = Self::validate(model);
        if warnings.is_empty() {
            Ok(())
        } else {
            Err(warnings)
        }
    }
}
