//! Headless Sweep
//!
//! Lets the dofbot arm fall under gravity with increasing joint damping and
//! prints where each joint ends up.
//!
//! This example shows:
//! - Building an `ArmWorld` straight from the embedded model
//! - Changing `PhysicsConfig` between runs
//! - Reading joint states by name after a fixed number of steps
//!
//! Run with: `cargo run --example headless_sweep`
//! Point `DOFSIM_MESHDIR` at the dofbot STL files to use real collision hulls.

use dofsim_core::{builtin, MeshSource};
use dofsim_physics::{ArmWorld, PhysicsConfig, PhysicsError};

const STEPS: u32 = 1000;
const DAMPINGS: [f32; 4] = [0.0, 0.01, 0.05, 0.2];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let model = builtin::dofbot()?;
    let meshdir = std::env::var_os("DOFSIM_MESHDIR").map(Into::into);

    println!(
        "{:>8} | {}",
        "damping",
        model
            .actuated_joints()
            .map(|j| format!("{:>8}", j.name))
            .collect::<Vec<_>>()
            .join(" ")
    );

    for damping in DAMPINGS {
        let config = PhysicsConfig {
            joint_damping: damping,
            ..PhysicsConfig::default()
        };
        let mut meshes = MeshSource::for_model(&model, meshdir.clone());
        let world = settle(ArmWorld::build(&model, &config, &mut meshes)?)?;

        let positions: Vec<String> = world
            .joint_states()
            .iter()
            .map(|(_, s)| format!("{:>8.3}", s.position))
            .collect();
        println!("{:>8.2} | {}", damping, positions.join(" "));
    }

    Ok(())
}

/// Step until `STEPS`, giving up if the state blows up
fn settle(mut world: ArmWorld) -> Result<ArmWorld, PhysicsError> {
    for _ in 0..STEPS {
        world.step();
    }
    let unstable = world
        .joint_states()
        .iter()
        .any(|(_, s)| !s.position.is_finite());
    if unstable {
        return Err(PhysicsError::InvalidConfig(
            "simulation diverged; try a smaller timestep".into(),
        ));
    }
    Ok(world)
}
