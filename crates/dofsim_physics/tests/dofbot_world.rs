//! Integration tests: the embedded DOFBOT in a physics world

use std::fs;
use std::path::Path;

use dofsim_core::{builtin, MeshResolver, MeshSource};
use dofsim_physics::{ArmWorld, PhysicsConfig};

/// A small closed tetrahedron in ASCII STL
const TETRA_STL: &str = "solid tetra
facet normal 0 0 -1
 outer loop
  vertex 0 0 0
  vertex 0 0.02 0
  vertex 0.02 0 0
 endloop
endfacet
facet normal 0 -1 0
 outer loop
  vertex 0 0 0
  vertex 0.02 0 0
  vertex 0 0 0.02
 endloop
endfacet
facet normal -1 0 0
 outer loop
  vertex 0 0 0
  vertex 0 0 0.02
  vertex 0 0.02 0
 endloop
endfacet
facet normal 1 1 1
 outer loop
  vertex 0.02 0 0
  vertex 0 0.02 0
  vertex 0 0 0.02
 endloop
endfacet
endsolid tetra
";

fn write_meshes(dir: &Path) {
    for name in [
        "base_link",
        "link1",
        "link2_mm_simplified",
        "link3_mm_simplified",
        "link4_mm_simplified",
        "link5",
    ] {
        fs::write(dir.join(format!("{}.STL", name)), TETRA_STL).unwrap();
    }
}

fn dofbot_world(meshes: &mut MeshSource) -> ArmWorld {
    let model = builtin::dofbot().unwrap();
    ArmWorld::build(&model, &PhysicsConfig::default(), meshes).unwrap()
}

#[test]
fn test_builds_without_meshes() {
    let mut meshes = MeshSource::new(MeshResolver::new(Some("/nonexistent".into())));
    let world = dofbot_world(&mut meshes);

    assert_eq!(world.links().len(), 6);
    assert_eq!(world.joints().len(), 5);
    assert_eq!(world.dof(), 5);
    assert!(world.links().iter().all(|l| l.fallback_colliders == 1));
    let names: Vec<&str> = world.actuated_joint_names().collect();
    assert_eq!(names, vec!["joint1", "joint2", "joint3", "joint4", "joint5"]);
}

#[test]
fn test_builds_with_convex_hull_meshes() {
    let dir = tempfile::tempdir().unwrap();
    write_meshes(dir.path());
    let model = builtin::dofbot().unwrap();
    let mut meshes = MeshSource::for_model(&model, Some(dir.path().to_path_buf()));
    let world = dofbot_world(&mut meshes);

    assert!(world.links().iter().all(|l| l.fallback_colliders == 0));
    assert_eq!(meshes.cache().asset_count(), 6);
    let mass = world.link_mass("link1").unwrap();
    // 1000 kg/m^3 tetrahedron with 2 cm legs
    let expected = 1000.0 * 0.02_f32.powi(3) / 6.0;
    assert!((mass - expected).abs() < 1e-4, "mass {}", mass);
}

#[test]
fn test_rest_pose_matches_model() {
    let model = builtin::dofbot().unwrap();
    let mut meshes = MeshSource::default();
    let world = ArmWorld::build(&model, &PhysicsConfig::default(), &mut meshes).unwrap();
    let rest = model.rest_poses();
    for (name, pose) in world.link_poses() {
        let expected = rest[&name];
        assert!(
            (pose.translation.vector - expected.translation.vector).norm() < 1e-6,
            "{} misplaced",
            name
        );
    }
    for (_, state) in world.joint_states() {
        assert!(state.position.abs() < 1e-5);
    }
}

#[test]
fn test_bounded_run_stays_finite() {
    let mut meshes = MeshSource::default();
    let mut world = dofbot_world(&mut meshes);
    for t in 1..=101u32 {
        let t = t as f32;
        world.set_control(0, (t / 10.0).cos() * 0.01).unwrap();
        world.set_control(1, (t / 10.0).sin() * 0.01).unwrap();
        world.step();
    }
    assert_eq!(world.step_count(), 101);
    for (name, pose) in world.link_poses() {
        assert!(pose.translation.vector.iter().all(|c| c.is_finite()), "{} diverged", name);
    }
    let base = world.link_pose("base_link").unwrap();
    assert_eq!(base.translation.vector.norm(), 0.0);
}

#[test]
fn test_joint_limits_hold() {
    let mut meshes = MeshSource::default();
    let mut world = dofbot_world(&mut meshes);
    for _ in 0..1500 {
        world.step();
    }
    for joint in world.joints() {
        let state = world.joint_state(&joint.name).unwrap();
        // Impulse joints allow a little penetration past the stop
        let slack = 0.25;
        assert!(
            state.position > joint.limits.lower - slack && state.position < joint.limits.upper + slack,
            "{} at {}",
            joint.name,
            state.position
        );
    }
}
