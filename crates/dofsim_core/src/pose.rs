//! Rigid pose (translation + roll/pitch/yaw)
//!
//! A Pose is the URDF `<origin>` element: a translation followed by a
//! fixed-axis rotation (roll about X, then pitch about Y, then yaw about Z).

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A pose relative to a parent frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Translation in meters
    pub xyz: [f32; 3],
    /// Roll, pitch, yaw in radians
    pub rpy: [f32; 3],
}

impl Pose {
    /// The identity pose
    pub const IDENTITY: Self = Self {
        xyz: [0.0; 3],
        rpy: [0.0; 3],
    };

    /// Create a pose from translation and roll/pitch/yaw
    pub const fn new(xyz: [f32; 3], rpy: [f32; 3]) -> Self {
        Self { xyz, rpy }
    }

    /// Create a pure translation
    pub const fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            xyz: [x, y, z],
            rpy: [0.0; 3],
        }
    }

    /// Whether this pose is the identity (within `f32::EPSILON`)
    pub fn is_identity(&self) -> bool {
        self.xyz
            .iter()
            .chain(self.rpy.iter())
            .all(|c| c.abs() <= f32::EPSILON)
    }

    /// Rotation part as a unit quaternion
    ///
    /// URDF rotations are extrinsic X-Y-Z, i.e. `Rz(yaw) * Ry(pitch) * Rx(roll)`,
    /// which is exactly what nalgebra's `from_euler_angles` builds.
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(self.rpy[0], self.rpy[1], self.rpy[2])
    }

    /// Translation part as a vector
    pub fn translation(&self) -> Vector3<f32> {
        Vector3::new(self.xyz[0], self.xyz[1], self.xyz[2])
    }

    /// Convert to an isometry (parent-from-child transform)
    pub fn to_isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.translation()), self.rotation())
    }

    /// Largest absolute translation component
    pub fn max_offset(&self) -> f32 {
        self.xyz.iter().fold(0.0f32, |acc, c| acc.max(c.abs()))
    }
}
