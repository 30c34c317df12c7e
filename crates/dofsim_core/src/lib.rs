//! Core types for dofsim
//!
//! This crate provides the robot description consumed by the simulator:
//!
//! - [`RobotModel`] - Kinematic tree of [`Link`]s connected by [`Joint`]s
//! - [`Pose`] - URDF origin (translation + roll/pitch/yaw)
//! - [`Geometry`], [`Visual`], [`Collision`], [`Material`] - Link contents
//! - [`parse_urdf`] / [`load_urdf`] - URDF input via `urdf-rs`
//! - [`ModelValidator`] - Non-fatal sanity checks
//! - [`MeshAsset`], [`MeshResolver`], [`AssetCache`], [`MeshSource`] - Mesh files on disk
//! - [`builtin`] - Descriptions compiled into the binary

mod pose;
mod model;
mod model_error;
mod model_validator;
mod urdf_loader;
mod asset_error;
mod asset_cache;
mod mesh;
pub mod builtin;

pub use pose::Pose;
pub use model::{
    Collision, CompilerOptions, Geometry, Inertial, Joint, JointDynamics, JointKind, JointLimits,
    Link, LinkKey, Material, RobotModel, Visual,
};
pub use model_error::ModelError;
pub use model_validator::{ModelValidator, ValidationWarning};
pub use urdf_loader::{load_urdf, parse_urdf};
pub use asset_error::AssetError;
pub use asset_cache::{Asset, AssetCache, AssetHandle, AssetId, MeshSource};
pub use mesh::{MeshAsset, MeshResolver};

// Re-export nalgebra so downstream crates agree on the math types
pub use nalgebra;
