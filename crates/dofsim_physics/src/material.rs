//! Surface properties applied to link colliders

use serde::{Deserialize, Serialize};

/// Friction and restitution for a collider
///
/// Inside rapier, touching colliders average their friction and keep the
/// larger restitution. [`PhysicsMaterial::combine`] gives the stricter pair
/// value, with a geometric mean for friction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsMaterial {
    /// Friction coefficient (0.0 = frictionless)
    pub friction: f32,
    /// Restitution (0.0 = no bounce, 1.0 = perfect bounce)
    pub restitution: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self::ALUMINIUM
    }
}

impl PhysicsMaterial {
    /// Anodised aluminium, the arm's structural links
    pub const ALUMINIUM: Self = Self {
        friction: 0.5,
        restitution: 0.0,
    };

    /// Injection-moulded plastic covers
    pub const PLASTIC: Self = Self {
        friction: 0.35,
        restitution: 0.1,
    };

    /// Rubber gripper pads
    pub const RUBBER: Self = Self {
        friction: 0.9,
        restitution: 0.3,
    };

    /// Create a material; values are clamped to [0.0, 1.0]
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction: friction.clamp(0.0, 1.0),
            restitution: restitution.clamp(0.0, 1.0),
        }
    }

    /// Geometric mean of friction, maximum of restitution
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            friction: (self.friction * other.friction).sqrt(),
            restitution: self.restitution.max(other.restitution),
        }
    }

    /// Apply this material to a collider builder
    pub fn apply(&self, builder: rapier3d::prelude::ColliderBuilder) -> rapier3d::prelude::ColliderBuilder {
        use rapier3d::prelude::CoefficientCombineRule;

        builder
            .friction(self.friction)
            .restitution(self.restitution)
            .friction_combine_rule(CoefficientCombineRule::Average)
            .restitution_combine_rule(CoefficientCombineRule::Max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_aluminium() {
        assert_eq!(PhysicsMaterial::default(), PhysicsMaterial::ALUMINIUM);
    }

    #[test]
    fn test_new_clamps_values() {
        let material = PhysicsMaterial::new(1.5, -0.5);
        assert_eq!(material.friction, 1.0);
        assert_eq!(material.restitution, 0.0);
    }

    #[test]
    fn test_combine() {
        let combined = PhysicsMaterial::PLASTIC.combine(&PhysicsMaterial::RUBBER);
        let expected = (0.35_f32 * 0.9_f32).sqrt();
        assert!((combined.friction - expected).abs() < 1e-4);
        assert_eq!(combined.restitution, 0.3);

        let reversed = PhysicsMaterial::RUBBER.combine(&PhysicsMaterial::PLASTIC);
        assert!((combined.friction - reversed.friction).abs() < 1e-6);
    }
}
