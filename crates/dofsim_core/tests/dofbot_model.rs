//! Integration tests for the embedded DOFBOT description
//!
//! These tests pin down the kinematic layout of the arm:
//! 1. Link and joint names and their order
//! 2. Joint origins, axes and limits
//! 3. The MuJoCo compiler extension
//! 4. Mesh resolution against a mesh directory

use std::path::PathBuf;

use dofsim_core::{builtin, AssetCache, Geometry, JointKind, MeshResolver, ModelValidator};

#[test]
fn test_link_and_joint_names() {
    let model = builtin::dofbot().expect("embedded model should parse");

    let joints: Vec<&str> = model.joints().iter().map(|j| j.name.as_str()).collect();
    assert_eq!(joints, vec!["joint1", "joint2", "joint3", "joint4", "joint5"]);

    for name in [
        "base_link",
        "link1",
        "link2_mm_simplified",
        "link3_mm_simplified",
        "link4_mm_simplified",
        "link5",
    ] {
        assert!(model.link_by_name(name).is_some(), "missing link {}", name);
    }
}

#[test]
fn test_serial_chain() {
    let model = builtin::dofbot().unwrap();
    let order: Vec<(&str, &str)> = model
        .traversal_order()
        .iter()
        .map(|j| (j.parent.as_str(), j.child.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("base_link", "link1"),
            ("link1", "link2_mm_simplified"),
            ("link2_mm_simplified", "link3_mm_simplified"),
            ("link3_mm_simplified", "link4_mm_simplified"),
            ("link4_mm_simplified", "link5"),
        ]
    );
}

#[test]
fn test_all_joints_revolute_about_z() {
    let model = builtin::dofbot().unwrap();
    for joint in model.joints() {
        assert_eq!(joint.kind, JointKind::Revolute);
        assert_eq!(joint.axis, [0.0, 0.0, 1.0]);
        assert_eq!(joint.limits.effort, 100.0);
        assert_eq!(joint.limits.velocity, 1.0);
    }
}

#[test]
fn test_joint_origins_and_limits() {
    let model = builtin::dofbot().unwrap();

    let j1 = model.joint_by_name("joint1").unwrap();
    assert!((j1.origin.xyz[2] - 0.064).abs() < 1e-6);

    let j2 = model.joint_by_name("joint2").unwrap();
    assert!((j2.origin.xyz[2] - 0.0435).abs() < 1e-6);
    assert!((j2.origin.rpy[1] - 1.5708).abs() < 1e-6);

    let j5 = model.joint_by_name("joint5").unwrap();
    assert!((j5.origin.xyz[0] + 0.07385).abs() < 1e-6);
    assert!((j5.origin.xyz[1] + 0.00215).abs() < 1e-6);
    assert!((j5.origin.rpy[1] + 1.5708).abs() < 1e-6);
    assert!((j5.limits.lower + 1.5708).abs() < 1e-6);
    assert!((j5.limits.upper - 3.1416).abs() < 1e-6);
}

#[test]
fn test_compiler_extension() {
    let model = builtin::dofbot().unwrap();
    assert!(model.compiler.balance_inertia);
    assert_eq!(
        model.compiler.meshdir,
        Some(PathBuf::from("D:/Research/robots/DofRL/dofbot_moveit/meshes/"))
    );
}

#[test]
fn test_link_geometry_and_colors() {
    let model = builtin::dofbot().unwrap();
    let (_, link1) = model.link_by_name("link1").unwrap();
    assert_eq!(link1.visuals.len(), 1);
    assert_eq!(link1.collisions.len(), 1);
    assert_eq!(link1.visuals[0].material.rgba, [0.0, 0.7, 0.0, 1.0]);
    assert!(link1.inertial.is_none());
    assert_eq!(
        link1.collisions[0].geometry,
        Geometry::Mesh {
            filename: "package://dofbot_moveit/meshes/link1.STL".to_string(),
            scale: [1.0; 3],
        }
    );
    assert_eq!(model.mesh_filenames().len(), 6);
}

#[test]
fn test_rest_pose_of_tip() {
    let model = builtin::dofbot().unwrap();
    let poses = model.rest_poses();
    // joint2 pitches the chain onto its side, so the arm extends along +Z
    let tip = poses["link5"].translation.vector;
    assert!(tip.z > 0.2, "tip should be above the base, got {}", tip.z);
}

#[test]
fn test_validator_accepts_dofbot() {
    let model = builtin::dofbot().unwrap();
    assert!(ModelValidator::validate(&model).is_empty());
}

#[test]
fn test_meshes_missing_from_default_meshdir() {
    let model = builtin::dofbot().unwrap();
    let resolver = MeshResolver::new(Some(PathBuf::from("/nonexistent/meshes")));
    let mut cache = AssetCache::new();
    for filename in model.mesh_filenames() {
        assert!(cache.mesh(&resolver, filename).is_none());
    }
    assert_eq!(cache.failed_count(), 6);
}
