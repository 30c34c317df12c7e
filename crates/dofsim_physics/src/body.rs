//! Link bodies and their colliders
//!
//! Each link becomes one rapier rigid body. Collision elements become
//! colliders attached to that body: meshes as convex hulls, URDF primitives
//! as native shapes. A mesh that cannot be loaded is replaced by a small
//! ball so the link still has mass and a contact volume.

use std::f32::consts::FRAC_PI_2;

use dofsim_core::{Collision, Geometry, Inertial, Link, MeshSource};
use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, UnitQuaternion, Vector3};
use rapier3d::prelude::{
    Collider, ColliderBuilder, Group, InteractionGroups, MassProperties, RigidBodyBuilder,
    RigidBodyHandle,
};

use crate::world::PhysicsConfig;

/// A link's rigid body inside an [`ArmWorld`](crate::ArmWorld)
#[derive(Clone, Debug)]
pub struct LinkBody {
    /// Link name from the model
    pub name: String,
    /// Rapier body handle
    pub handle: RigidBodyHandle,
    /// World pose with every joint at zero
    pub rest: Isometry3<f32>,
    /// Number of colliders that had to fall back to a ball
    pub fallback_colliders: usize,
}

/// Colliders built for one link
pub(crate) struct LinkColliders {
    pub colliders: Vec<Collider>,
    pub fallbacks: usize,
}

/// Build the colliders for a link
///
/// When the link carries explicit inertial data the colliders get zero
/// density so they contribute shape only.
pub(crate) fn link_colliders(
    link: &Link,
    config: &PhysicsConfig,
    meshes: &mut MeshSource,
) -> LinkColliders {
    let density = if link.inertial.is_some() {
        0.0
    } else {
        config.density
    };
    let groups = if config.self_collision {
        InteractionGroups::all()
    } else {
        // Links only ever touch the world, never each other
        InteractionGroups::new(Group::GROUP_1, Group::ALL.difference(Group::GROUP_1))
    };

    let mut fallbacks = 0;
    let colliders = link
        .collisions
        .iter()
        .map(|collision| {
            let builder = shape(collision, meshes).unwrap_or_else(|| {
                fallbacks += 1;
                log::warn!(
                    "Link '{}': collision geometry unavailable, using a {} m ball",
                    link.name,
                    config.fallback_radius
                );
                ColliderBuilder::ball(config.fallback_radius)
                    .position(collision.origin.to_isometry())
            });
            config
                .material
                .apply(builder)
                .density(density)
                .collision_groups(groups)
                .build()
        })
        .collect();

    LinkColliders {
        colliders,
        fallbacks,
    }
}

/// Native shape for a collision element, or `None` if it cannot be built
fn shape(collision: &Collision, meshes: &mut MeshSource) -> Option<ColliderBuilder> {
    let origin = collision.origin.to_isometry();
    let builder = match &collision.geometry {
        Geometry::Mesh { filename, scale } => {
            let mesh = meshes.get(filename)?;
            let points: Vec<Point3<f32>> = mesh
                .scaled_vertices(*scale)
                .into_iter()
                .map(Point3::from)
                .collect();
            ColliderBuilder::convex_hull(&points)?.position(origin)
        }
        Geometry::Box { size } => {
            ColliderBuilder::cuboid(size[0] / 2.0, size[1] / 2.0, size[2] / 2.0).position(origin)
        }
        Geometry::Cylinder { radius, length } => {
            // Rapier cylinders run along Y, URDF cylinders along Z
            let y_to_z = Isometry3::rotation(Vector3::x() * FRAC_PI_2);
            ColliderBuilder::cylinder(length / 2.0, *radius).position(origin * y_to_z)
        }
        Geometry::Sphere { radius } => ColliderBuilder::ball(*radius).position(origin),
        Geometry::Capsule { radius, length } => {
            ColliderBuilder::capsule_z(length / 2.0, *radius).position(origin)
        }
    };
    Some(builder)
}

/// Rigid body builder for a link at its rest pose
pub(crate) fn link_body(
    link: &Link,
    rest: Isometry3<f32>,
    is_root: bool,
    balance_inertia: bool,
    config: &PhysicsConfig,
) -> RigidBodyBuilder {
    if is_root {
        return RigidBodyBuilder::fixed().position(rest);
    }

    let builder = RigidBodyBuilder::dynamic().position(rest);
    match &link.inertial {
        Some(inertial) => {
            builder.additional_mass_properties(mass_properties(inertial, balance_inertia))
        }
        None if link.collisions.is_empty() => {
            // Solid ball of the fallback radius carrying the minimum mass
            let m = config.min_link_mass;
            let i = 0.4 * m * config.fallback_radius * config.fallback_radius;
            builder.additional_mass_properties(MassProperties::new(
                Point3::origin(),
                m,
                Vector3::repeat(i),
            ))
        }
        None => builder,
    }
}

/// Mass properties from a URDF inertial block, expressed in the link frame
pub(crate) fn mass_properties(inertial: &Inertial, balance: bool) -> MassProperties {
    let [ixx, ixy, ixz, iyy, iyz, izz] = inertial.inertia;
    let tensor = Matrix3::new(ixx, ixy, ixz, ixy, iyy, iyz, ixz, iyz, izz);
    let frame = inertial.origin.rotation();
    let com = Point3::from(inertial.origin.translation());

    let eigen = tensor.symmetric_eigen();
    let mut principal = eigen.eigenvalues.map(|v| v.max(0.0));
    if balance && !satisfies_triangle_inequality(&principal) {
        principal = Vector3::repeat(principal.mean());
    }

    let mut vectors = eigen.eigenvectors;
    if vectors.determinant() < 0.0 {
        vectors.column_mut(2).neg_mut();
    }
    let axes = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(vectors));
    MassProperties::with_principal_inertia_frame(com, inertial.mass, principal, frame * axes)
}

/// Principal moments of a physical body satisfy `a + b >= c` for every pair
fn satisfies_triangle_inequality(m: &Vector3<f32>) -> bool {
    m.x + m.y >= m.z && m.y + m.z >= m.x && m.x + m.z >= m.y
}
