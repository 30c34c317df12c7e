//! The step loop without a window
//!
//! Runs the same iteration as the viewer: step the arm, then rebuild the
//! world-space triangles a frame would draw. Nothing is presented.

use dofsim_physics::JointState;
use dofsim_render::{RenderableGeometry, RobotVisuals};

use crate::budget::StepBudget;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::robot::Robot;

/// Outcome of a headless run
#[derive(Debug, Clone)]
pub struct HeadlessSummary {
    /// Steps taken
    pub steps: u64,
    /// Frames assembled (one per step)
    pub frames: u64,
    /// Simulated seconds
    pub sim_time: f64,
    /// Final joint states in model order
    pub joint_states: Vec<(String, JointState)>,
    /// Vertices in the last assembled frame
    pub vertex_count: usize,
}

/// Run the loop until the budget stops it
///
/// With an unbounded budget this only returns on error.
pub fn run_headless(config: &AppConfig, budget: StepBudget) -> Result<HeadlessSummary, AppError> {
    let mut robot = Robot::load(config)?;
    let mut sim = robot.simulation(config)?;
    let visuals = RobotVisuals::new(
        &robot.model,
        &mut robot.meshes,
        config.rendering.placeholder_radius,
    );
    let mut geometry = RenderableGeometry::with_capacity(visuals.triangle_count() * 3);

    if !budget.is_bounded() {
        log::warn!("Headless run has no step bound; it stops only on error");
    }
    log::info!("Running headless ({:?} control)", config.control.mode);

    let interval = config.debug.log_interval;
    let mut frames = 0;
    loop {
        sim.step_once()?;

        geometry.clear();
        geometry.add_visuals(&visuals, &sim.world().link_poses());
        frames += 1;

        let t = sim.t();
        if interval > 0 && t % interval == 0 {
            for (name, state) in sim.world().joint_states() {
                log::debug!(
                    "t={} {}: q={:.4} qd={:.4}",
                    t,
                    name,
                    state.position,
                    state.velocity
                );
            }
        }
        if budget.should_stop(t) {
            break;
        }
    }

    let world = sim.world();
    let summary = HeadlessSummary {
        steps: sim.t(),
        frames,
        sim_time: world.time(),
        joint_states: world
            .joint_states()
            .into_iter()
            .map(|(name, state)| (name.to_string(), state))
            .collect(),
        vertex_count: geometry.vertex_count(),
    };
    log::info!(
        "Headless run finished: {} steps, {:.3} s simulated",
        summary.steps,
        summary.sim_time
    );
    Ok(summary)
}
