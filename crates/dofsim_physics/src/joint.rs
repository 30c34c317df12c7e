//! Joints between link bodies
//!
//! Rapier joints constrain a pair of local frames, one on each body. The
//! frames are chosen so their X axes lie along the URDF joint axis and they
//! coincide at the rest pose, which makes the rapier `AngX` / `LinX` free
//! coordinate equal to the URDF joint position.

use std::f32::consts::PI;

use dofsim_core::{Joint, JointKind, JointLimits};
use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use rapier3d::prelude::{
    GenericJoint, GenericJointBuilder, ImpulseJointHandle, JointAxesMask, JointAxis, MotorModel,
    RigidBody, RigidBodyHandle,
};

/// Position and velocity of a single joint
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JointState {
    /// Angle (rad) or displacement (m) from the rest pose
    pub position: f32,
    /// Rate of change of `position`
    pub velocity: f32,
}

/// A model joint and its rapier counterpart
#[derive(Clone, Debug)]
pub struct ArmJoint {
    pub name: String,
    pub kind: JointKind,
    /// `None` for floating joints, which leave the child free
    pub handle: Option<ImpulseJointHandle>,
    pub parent: RigidBodyHandle,
    pub child: RigidBodyHandle,
    /// Joint frame in the parent body frame
    pub frame1: Isometry3<f32>,
    /// Joint frame in the child body frame
    pub frame2: Isometry3<f32>,
    pub limits: JointLimits,
    /// Passive damping applied while the joint is not driven
    pub damping: f32,
}

impl ArmJoint {
    /// Rapier axis carrying the joint's degree of freedom
    pub fn free_axis(&self) -> Option<JointAxis> {
        free_axis(self.kind)
    }

    /// Measure the joint from the current body poses
    ///
    /// Revolute angles are reported in the 2π window centred on the limit
    /// range, so a range reaching past ±π reads without a jump. Continuous
    /// joints read in (-π, π].
    pub fn state(&self, parent: &RigidBody, child: &RigidBody) -> JointState {
        let world1 = parent.position() * self.frame1;
        let world2 = child.position() * self.frame2;
        let axis = world1.rotation * Vector3::x();

        match self.kind {
            JointKind::Revolute | JointKind::Continuous => {
                let relative = world1.rotation.inverse() * world2.rotation;
                let angle = relative.scaled_axis().x;
                let position = match self.kind {
                    JointKind::Revolute => wrap_into_range(angle, &self.limits),
                    _ => angle,
                };
                JointState {
                    position,
                    velocity: (child.angvel() - parent.angvel()).dot(&axis),
                }
            }
            JointKind::Prismatic => {
                let offset = world2.translation.vector - world1.translation.vector;
                JointState {
                    position: offset.dot(&axis),
                    velocity: (child.linvel() - parent.linvel()).dot(&axis),
                }
            }
            _ => JointState::default(),
        }
    }
}

/// Shift `angle` by whole turns into the 2π window centred on the limits
fn wrap_into_range(angle: f32, limits: &JointLimits) -> f32 {
    if !limits.has_range() {
        return angle;
    }
    let center = 0.5 * (limits.lower + limits.upper);
    center + (angle - center + PI).rem_euclid(2.0 * PI) - PI
}

/// Rotation taking +X onto `axis`
pub(crate) fn align_x(axis: [f32; 3]) -> UnitQuaternion<f32> {
    let axis = Vector3::from(axis);
    if axis.norm_squared() <= f32::EPSILON {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::rotation_between(&Vector3::x(), &axis)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI))
}

/// Joint frames on the parent and child bodies
pub(crate) fn joint_frames(joint: &Joint) -> (Isometry3<f32>, Isometry3<f32>) {
    let align = Isometry3::from_parts(Default::default(), align_x(joint.axis));
    (joint.origin.to_isometry() * align, align)
}

/// Rapier joint for a model joint; `None` for floating joints
pub(crate) fn generic_joint(joint: &Joint, damping: f32) -> Option<GenericJoint> {
    let (frame1, frame2) = joint_frames(joint);
    let mask = match joint.kind {
        JointKind::Revolute | JointKind::Continuous => JointAxesMask::LOCKED_REVOLUTE_AXES,
        JointKind::Prismatic => JointAxesMask::LOCKED_PRISMATIC_AXES,
        JointKind::Fixed => JointAxesMask::LOCKED_FIXED_AXES,
        JointKind::Spherical => JointAxesMask::LOCKED_SPHERICAL_AXES,
        // Motion in the plane normal to the axis, rotation about the axis
        JointKind::Planar => JointAxesMask::LIN_X | JointAxesMask::ANG_Y | JointAxesMask::ANG_Z,
        JointKind::Floating => return None,
    };

    let mut builder = GenericJointBuilder::new(mask)
        .local_frame1(frame1)
        .local_frame2(frame2)
        .contacts_enabled(false);

    let ranged = joint.limits.has_range() && joint.limits.lower <= joint.limits.upper;
    match joint.kind {
        JointKind::Revolute if ranged => {
            builder = builder.limits(JointAxis::AngX, [joint.limits.lower, joint.limits.upper]);
        }
        JointKind::Prismatic if ranged => {
            builder = builder.limits(JointAxis::LinX, [joint.limits.lower, joint.limits.upper]);
        }
        _ => {}
    }

    let mut generic = builder.build();
    if let Some(axis) = free_axis(joint.kind) {
        release(&mut generic, axis, damping);
    }
    Some(generic)
}

fn free_axis(kind: JointKind) -> Option<JointAxis> {
    match kind {
        JointKind::Revolute | JointKind::Continuous => Some(JointAxis::AngX),
        JointKind::Prismatic => Some(JointAxis::LinX),
        _ => None,
    }
}

/// Drive the joint towards a target velocity, limited by the joint effort
pub(crate) fn drive(joint: &mut GenericJoint, axis: JointAxis, velocity: f32, gain: f32, effort: f32) {
    joint.set_motor_model(axis, MotorModel::AccelerationBased);
    joint.set_motor(axis, 0.0, velocity, 0.0, gain);
    if effort > 0.0 {
        joint.set_motor_max_force(axis, effort);
    }
}

/// Let the joint move freely apart from viscous damping
pub(crate) fn release(joint: &mut GenericJoint, axis: JointAxis, damping: f32) {
    joint.set_motor_model(axis, MotorModel::ForceBased);
    joint.set_motor(axis, 0.0, 0.0, 0.0, damping.max(0.0));
    joint.set_motor_max_force(axis, f32::MAX);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dofsim_core::Pose;

    #[test]
    fn test_align_x_onto_z() {
        let r = align_x([0.0, 0.0, 1.0]);
        let x = r * Vector3::x();
        assert!((x - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_align_x_antiparallel() {
        let r = align_x([-1.0, 0.0, 0.0]);
        let x = r * Vector3::x();
        assert!((x + Vector3::x()).norm() < 1e-6);
    }

    #[test]
    fn test_align_x_degenerate_axis() {
        assert_eq!(align_x([0.0; 3]), UnitQuaternion::identity());
    }

    #[test]
    fn test_frames_coincide_at_rest() {
        let joint = Joint::revolute("j", "a", "b", Pose::new([0.1, 0.0, 0.2], [0.0, 1.5708, 0.0]))
            .with_axis([0.0, 1.0, 0.0]);
        let (frame1, frame2) = joint_frames(&joint);
        let parent = Isometry3::identity();
        let child = parent * joint.origin.to_isometry();
        let w1 = parent * frame1;
        let w2 = child * frame2;
        assert!((w1.translation.vector - w2.translation.vector).norm() < 1e-6);
        assert!(w1.rotation.angle_to(&w2.rotation) < 1e-6);
        assert!(((w1.rotation * Vector3::x()) - (child.rotation * Vector3::y())).norm() < 1e-5);
    }

    #[test]
    fn test_floating_has_no_rapier_joint() {
        let mut joint = Joint::revolute("j", "a", "b", Pose::IDENTITY);
        joint.kind = JointKind::Floating;
        assert!(generic_joint(&joint, 0.0).is_none());
    }

    #[test]
    fn test_revolute_limits_applied() {
        let joint = Joint::revolute("j", "a", "b", Pose::IDENTITY).with_limits(JointLimits {
            lower: -1.0,
            upper: 2.0,
            effort: 10.0,
            velocity: 1.0,
        });
        let generic = generic_joint(&joint, 0.1).unwrap();
        let limits = generic.limits(JointAxis::AngX).unwrap();
        assert_eq!(limits.min, -1.0);
        assert_eq!(limits.max, 2.0);
        assert!(!generic.contacts_enabled);
    }

    #[test]
    fn test_angle_past_pi_stays_in_range() {
        let limits = JointLimits {
            lower: -1.5708,
            upper: 3.1416,
            effort: 100.0,
            velocity: 1.0,
        };
        // 3.1416 as reported by the rotation vector
        let wrapped = 3.1416 - 2.0 * PI;
        assert!((wrap_into_range(wrapped, &limits) - 3.1416).abs() < 1e-5);
        assert!((wrap_into_range(-1.5, &limits) + 1.5).abs() < 1e-6);
        assert!((wrap_into_range(0.3, &limits) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_angle_without_range_untouched() {
        assert_eq!(wrap_into_range(-3.0, &JointLimits::default()), -3.0);
    }

    #[test]
    fn test_continuous_has_no_limits() {
        let mut joint = Joint::revolute("j", "a", "b", Pose::IDENTITY);
        joint.kind = JointKind::Continuous;
        let generic = generic_joint(&joint, 0.0).unwrap();
        assert!(generic.limits(JointAxis::AngX).is_none());
    }
}
