//! The simulated arm
//!
//! [`ArmWorld`] owns a rapier pipeline holding one body per link and one
//! impulse joint per model joint. It exposes the robot in model terms:
//! joint states by name, link poses by name and a control vector indexed
//! like the model's actuated joints.

use std::collections::HashMap;

use dofsim_core::{MeshSource, RobotModel};
use nalgebra::{Isometry3, Vector3};
use rapier3d::prelude::{
    CCDSolver, DefaultBroadPhase, ImpulseJointSet, IntegrationParameters, IslandManager,
    MultibodyJointSet, NarrowPhase, PhysicsPipeline, QueryPipeline, RigidBodySet, ColliderSet,
};
use serde::{Deserialize, Serialize};

use crate::body::{link_body, link_colliders, LinkBody};
use crate::error::PhysicsError;
use crate::joint::{drive, generic_joint, release, ArmJoint, JointState};
use crate::material::PhysicsMaterial;

/// Configuration for the physics simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration in world coordinates (Z up)
    pub gravity: [f32; 3],
    /// Length of one control step in seconds
    pub timestep: f32,
    /// Rapier steps per control step
    pub substeps: u32,
    /// Radius of the ball used when a collision mesh is unavailable
    pub fallback_radius: f32,
    /// Density for collider-derived mass (kg/m^3)
    pub density: f32,
    /// Mass given to links with neither colliders nor inertial data
    pub min_link_mass: f32,
    /// Viscous damping added to every joint's own damping
    pub joint_damping: f32,
    /// Velocity tracking gain of driven joints (1/s)
    pub motor_gain: f32,
    /// Whether non-adjacent links collide with each other
    pub self_collision: bool,
    /// Friction and restitution of every link collider
    pub material: PhysicsMaterial,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, -9.81],
            timestep: 0.002,
            substeps: 1,
            fallback_radius: 0.02,
            density: 1000.0,
            min_link_mass: 0.01,
            joint_damping: 0.0,
            motor_gain: 10.0,
            self_collision: false,
            material: PhysicsMaterial::default(),
        }
    }
}

impl PhysicsConfig {
    /// Check values the solver cannot work with
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let positive = [
            ("timestep", self.timestep),
            ("fallback_radius", self.fallback_radius),
            ("min_link_mass", self.min_link_mass),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PhysicsError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.substeps == 0 {
            return Err(PhysicsError::InvalidConfig("substeps must be at least 1".into()));
        }
        if self.density < 0.0 || self.joint_damping < 0.0 || self.motor_gain < 0.0 {
            return Err(PhysicsError::InvalidConfig(
                "density, joint_damping and motor_gain must not be negative".into(),
            ));
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(PhysicsError::InvalidConfig("gravity must be finite".into()));
        }
        Ok(())
    }
}

/// A robot model instantiated in a rapier world
pub struct ArmWorld {
    config: PhysicsConfig,
    gravity: Vector3<f32>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    query_pipeline: QueryPipeline,

    links: Vec<LinkBody>,
    link_index: HashMap<String, usize>,
    joints: Vec<ArmJoint>,
    /// Indices into `joints` of the actuated joints, in model order
    actuated: Vec<usize>,
    controls: Vec<f32>,
    /// Whether each actuated joint has received a control
    driven: Vec<bool>,

    step_count: u64,
    time: f64,
}

impl ArmWorld {
    /// Instantiate a model with every joint at zero
    pub fn build(
        model: &RobotModel,
        config: &PhysicsConfig,
        meshes: &mut MeshSource,
    ) -> Result<Self, PhysicsError> {
        config.validate()?;

        let mut params = IntegrationParameters::default();
        params.dt = config.timestep / config.substeps as f32;

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut impulse_joints = ImpulseJointSet::new();

        let rest = model.rest_poses();
        let root = model.root_key();
        let mut links = Vec::with_capacity(model.link_count());
        let mut link_index = HashMap::with_capacity(model.link_count());

        for (key, link) in model.links() {
            let pose = rest.get(&link.name).copied().unwrap_or_else(Isometry3::identity);
            let body = link_body(
                link,
                pose,
                key == root,
                model.compiler.balance_inertia,
                config,
            );
            let handle = bodies.insert(body);

            let built = link_colliders(link, config, meshes);
            for collider in built.colliders {
                colliders.insert_with_parent(collider, handle, &mut bodies);
            }

            link_index.insert(link.name.clone(), links.len());
            links.push(LinkBody {
                name: link.name.clone(),
                handle,
                rest: pose,
                fallback_colliders: built.fallbacks,
            });
        }

        let mut joints = Vec::with_capacity(model.joint_count());
        let mut actuated = Vec::new();
        for joint in model.joints() {
            // Links were validated when the model was assembled
            let parent = links[link_index[&joint.parent]].handle;
            let child = links[link_index[&joint.child]].handle;
            let damping = joint.dynamics.damping + config.joint_damping;

            let handle = generic_joint(joint, damping)
                .map(|generic| impulse_joints.insert(parent, child, generic, true));
            let (frame1, frame2) = crate::joint::joint_frames(joint);

            if joint.kind.is_actuated() {
                actuated.push(joints.len());
            }
            joints.push(ArmJoint {
                name: joint.name.clone(),
                kind: joint.kind,
                handle,
                parent,
                child,
                frame1,
                frame2,
                limits: joint.limits,
                damping,
            });
        }

        let fallbacks: usize = links.iter().map(|l| l.fallback_colliders).sum();
        log::info!(
            "Built physics world for '{}': {} bodies, {} colliders ({} fallback), {} joints, {} actuated",
            model.name(),
            bodies.len(),
            colliders.len(),
            fallbacks,
            joints.len(),
            actuated.len()
        );

        let dof = actuated.len();
        Ok(Self {
            config: config.clone(),
            gravity: Vector3::from(config.gravity),
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            impulse_joints,
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            links,
            link_index,
            joints,
            actuated,
            controls: vec![0.0; dof],
            driven: vec![false; dof],
            step_count: 0,
            time: 0.0,
        })
    }

    /// Advance one control step
    pub fn step(&mut self) {
        for _ in 0..self.config.substeps {
            self.pipeline.step(
                &self.gravity,
                &self.params,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd,
                Some(&mut self.query_pipeline),
                &(),
                &(),
            );
        }
        self.step_count += 1;
        self.time += f64::from(self.config.timestep);
    }

    /// Number of control steps taken since build or reset
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Simulated time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Number of actuated joints (length of the control vector)
    pub fn dof(&self) -> usize {
        self.actuated.len()
    }

    pub fn links(&self) -> &[LinkBody] {
        &self.links
    }

    pub fn joints(&self) -> &[ArmJoint] {
        &self.joints
    }

    /// Names of the actuated joints in control order
    pub fn actuated_joint_names(&self) -> impl Iterator<Item = &str> {
        self.actuated.iter().map(|&i| self.joints[i].name.as_str())
    }

    /// Current state of a joint by name
    pub fn joint_state(&self, name: &str) -> Option<JointState> {
        let joint = self.joints.iter().find(|j| j.name == name)?;
        self.measure(joint)
    }

    /// States of all joints in model order
    pub fn joint_states(&self) -> Vec<(&str, JointState)> {
        self.joints
            .iter()
            .filter_map(|j| self.measure(j).map(|s| (j.name.as_str(), s)))
            .collect()
    }

    fn measure(&self, joint: &ArmJoint) -> Option<JointState> {
        let parent = self.bodies.get(joint.parent)?;
        let child = self.bodies.get(joint.child)?;
        Some(joint.state(parent, child))
    }

    /// World pose of a link
    pub fn link_pose(&self, name: &str) -> Option<Isometry3<f32>> {
        let link = &self.links[*self.link_index.get(name)?];
        self.bodies.get(link.handle).map(|b| *b.position())
    }

    /// World poses of all links keyed by name
    pub fn link_poses(&self) -> HashMap<String, Isometry3<f32>> {
        self.links
            .iter()
            .filter_map(|l| {
                self.bodies
                    .get(l.handle)
                    .map(|b| (l.name.clone(), *b.position()))
            })
            .collect()
    }

    /// Total mass of a link's body
    pub fn link_mass(&self, name: &str) -> Option<f32> {
        let link = &self.links[*self.link_index.get(name)?];
        self.bodies.get(link.handle).map(|b| b.mass())
    }

    /// The control vector, one entry per actuated joint
    pub fn control(&self) -> &[f32] {
        &self.controls
    }

    /// Whether an actuated joint is being driven by its control
    pub fn is_driven(&self, index: usize) -> bool {
        self.driven.get(index).copied().unwrap_or(false)
    }

    /// Set the velocity target of an actuated joint
    ///
    /// The joint's effort limit caps the motor force. A joint that has never
    /// been given a control swings freely.
    pub fn set_control(&mut self, index: usize, value: f32) -> Result<(), PhysicsError> {
        let dof = self.dof();
        let joint_index = *self
            .actuated
            .get(index)
            .ok_or(PhysicsError::ControlIndex { index, dof })?;
        if !value.is_finite() {
            return Err(PhysicsError::NonFiniteControl { index, value });
        }

        let joint = &self.joints[joint_index];
        if let (Some(handle), Some(axis)) = (joint.handle, joint.free_axis()) {
            if let Some(rapier_joint) = self.impulse_joints.get_mut(handle) {
                drive(
                    &mut rapier_joint.data,
                    axis,
                    value,
                    self.config.motor_gain,
                    joint.limits.effort,
                );
            }
        }
        self.controls[index] = value;
        self.driven[index] = true;
        Ok(())
    }

    /// Set the whole control vector; extra values are an error
    pub fn set_controls(&mut self, values: &[f32]) -> Result<(), PhysicsError> {
        if values.len() > self.dof() {
            return Err(PhysicsError::ControlIndex {
                index: values.len() - 1,
                dof: self.dof(),
            });
        }
        for (i, &v) in values.iter().enumerate() {
            self.set_control(i, v)?;
        }
        Ok(())
    }

    /// Return every link to its rest pose at rest and clear controls
    pub fn reset(&mut self) {
        for link in &self.links {
            if let Some(body) = self.bodies.get_mut(link.handle) {
                body.set_position(link.rest, true);
                body.set_linvel(Vector3::zeros(), true);
                body.set_angvel(Vector3::zeros(), true);
            }
        }
        for (i, &joint_index) in self.actuated.iter().enumerate() {
            let joint = &self.joints[joint_index];
            if let (Some(handle), Some(axis)) = (joint.handle, joint.free_axis()) {
                if let Some(rapier_joint) = self.impulse_joints.get_mut(handle) {
                    release(&mut rapier_joint.data, axis, joint.damping);
                }
            }
            self.controls[i] = 0.0;
            self.driven[i] = false;
        }
        self.step_count = 0;
        self.time = 0.0;
        log::debug!("Physics world reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dofsim_core::{
        Collision, CompilerOptions, Geometry, Joint, JointLimits, Link, MeshResolver, Pose,
    };

    fn pendulum() -> RobotModel {
        let ball = |name: &str| {
            Link::new(name).with_collision(Collision {
                origin: Pose::IDENTITY,
                geometry: Geometry::Sphere { radius: 0.05 },
            })
        };
        let mut bob = ball("bob");
        bob.collisions[0].origin = Pose::from_xyz(0.3, 0.0, 0.0);
        RobotModel::from_parts(
            "pendulum",
            vec![ball("pivot"), bob],
            vec![Joint::revolute("swing", "pivot", "bob", Pose::from_xyz(0.0, 0.0, 1.0))
                .with_axis([0.0, 1.0, 0.0])
                .with_limits(JointLimits {
                    lower: -3.0,
                    upper: 3.0,
                    effort: 50.0,
                    velocity: 2.0,
                })],
            CompilerOptions::default(),
        )
        .unwrap()
    }

    fn build(model: &RobotModel) -> ArmWorld {
        let mut meshes = MeshSource::new(MeshResolver::default());
        ArmWorld::build(model, &PhysicsConfig::default(), &mut meshes).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = PhysicsConfig::default();
        assert_eq!(config.gravity, [0.0, 0.0, -9.81]);
        assert_eq!(config.timestep, 0.002);
        assert_eq!(config.substeps, 1);
        assert_eq!(config.material, PhysicsMaterial::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PhysicsConfig {
            timestep: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PhysicsError::InvalidConfig(_))));
        let config = PhysicsConfig {
            substeps: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_places_links_at_rest() {
        let world = build(&pendulum());
        assert_eq!(world.dof(), 1);
        let bob = world.link_pose("bob").unwrap();
        assert!((bob.translation.vector.z - 1.0).abs() < 1e-6);
        let state = world.joint_state("swing").unwrap();
        assert!(state.position.abs() < 1e-6);
        assert!(world.link_pose("nothing").is_none());
    }

    #[test]
    fn test_step_advances_time() {
        let mut world = build(&pendulum());
        for _ in 0..10 {
            world.step();
        }
        assert_eq!(world.step_count(), 10);
        assert!((world.time() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_pendulum_swings_under_gravity() {
        let mut world = build(&pendulum());
        for _ in 0..200 {
            world.step();
        }
        let state = world.joint_state("swing").unwrap();
        assert!(state.position.abs() > 0.05, "bob should fall, got {}", state.position);
        let pivot = world.link_pose("pivot").unwrap();
        assert_eq!(pivot, Isometry3::identity());
    }

    #[test]
    fn test_control_index_out_of_range() {
        let mut world = build(&pendulum());
        let err = world.set_control(3, 0.1).unwrap_err();
        assert_eq!(err, PhysicsError::ControlIndex { index: 3, dof: 1 });
        assert!(world.set_control(0, f32::NAN).is_err());
        assert!(world.set_controls(&[0.1, 0.2]).is_err());
    }

    #[test]
    fn test_reset_restores_rest_pose() {
        let mut world = build(&pendulum());
        world.set_control(0, 0.5).unwrap();
        assert!(world.is_driven(0));
        for _ in 0..100 {
            world.step();
        }
        world.reset();
        assert_eq!(world.step_count(), 0);
        assert_eq!(world.time(), 0.0);
        assert_eq!(world.control(), &[0.0]);
        assert!(!world.is_driven(0));
        let state = world.joint_state("swing").unwrap();
        assert!(state.position.abs() < 1e-5);
        assert_eq!(state.velocity, 0.0);
    }
}
