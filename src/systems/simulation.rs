//! Simulation system
//!
//! Owns the physics world and the step counter `t`. Each step:
//! - Writes the control vector for the configured mode at the current `t`
//! - Increments `t`
//! - Advances the physics world by one control step

use std::time::Duration;

use dofsim_physics::{ArmWorld, PhysicsError, SimClock};

use crate::budget::StepBudget;
use crate::config::{ControlConfig, ControlMode};

/// Result of a simulation update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationResult {
    /// Steps taken during this update
    pub steps: u32,
    /// Whether link poses changed and geometry must be rebuilt
    pub geometry_dirty: bool,
    /// The step budget is spent; the loop should end
    pub finished: bool,
}

/// Steps the arm and applies control
pub struct SimulationSystem {
    world: ArmWorld,
    control: ControlConfig,
    clock: SimClock,
    realtime: bool,
    t: u64,
}

impl SimulationSystem {
    /// Create a simulation over a built world
    ///
    /// With `realtime` set, [`update`](Self::update) takes as many fixed
    /// steps as the elapsed wall time covers; otherwise one step per call.
    pub fn new(world: ArmWorld, control: ControlConfig, realtime: bool) -> Self {
        let clock = SimClock::new(world.config().timestep);
        Self {
            world,
            control,
            clock,
            realtime,
            t: 0,
        }
    }

    /// Number of steps taken since start or the last reset
    pub fn t(&self) -> u64 {
        self.t
    }

    /// The physics world
    pub fn world(&self) -> &ArmWorld {
        &self.world
    }

    /// Whether stepping is paused
    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Toggle pause, returning the new state
    pub fn toggle_pause(&mut self) -> bool {
        self.clock.toggle_pause()
    }

    /// Control values written while the counter reads `t`, starting at actuator 0
    ///
    /// The first step sees `t = 0`. `None` leaves the joints undriven.
    pub fn control_for(&self, t: u64) -> Option<Vec<f32>> {
        match self.control.mode {
            ControlMode::Passive => None,
            ControlMode::Sine => {
                let phase = t as f32 / self.control.period;
                let amp = self.control.amplitude;
                let ctrl = [phase.cos() * amp, phase.sin() * amp];
                Some(ctrl.into_iter().take(self.world.dof()).collect())
            }
        }
    }

    /// Take exactly one step
    pub fn step_once(&mut self) -> Result<(), PhysicsError> {
        if let Some(ctrl) = self.control_for(self.t) {
            self.world.set_controls(&ctrl)?;
        }
        self.t += 1;
        self.world.step();
        Ok(())
    }

    /// Advance for a frame of `dt` wall time, stopping early if the budget runs out
    pub fn update(
        &mut self,
        dt: Duration,
        budget: &StepBudget,
    ) -> Result<SimulationResult, PhysicsError> {
        let wanted = if self.realtime {
            self.clock.advance(dt)
        } else if self.clock.is_paused() {
            0
        } else {
            1
        };

        let mut result = SimulationResult {
            steps: 0,
            geometry_dirty: false,
            finished: false,
        };
        for _ in 0..wanted {
            self.step_once()?;
            result.steps += 1;
            if budget.should_stop(self.t) {
                result.finished = true;
                break;
            }
        }
        result.geometry_dirty = result.steps > 0;
        Ok(result)
    }

    /// Return the arm to its rest pose and restart the counter
    pub fn reset(&mut self) {
        self.world.reset();
        self.clock.reset();
        self.t = 0;
        log::info!("Simulation reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use dofsim_core::{builtin, MeshResolver, MeshSource};
    use dofsim_physics::PhysicsConfig;
    use std::path::PathBuf;

    fn system(mode: ControlMode, realtime: bool) -> SimulationSystem {
        let model = builtin::dofbot().unwrap();
        let mut meshes = MeshSource::new(MeshResolver::new(Some(PathBuf::from("/nonexistent"))));
        let world = ArmWorld::build(&model, &PhysicsConfig::default(), &mut meshes).unwrap();
        let control = ControlConfig {
            mode,
            ..ControlConfig::default()
        };
        SimulationSystem::new(world, control, realtime)
    }

    #[test]
    fn test_passive_leaves_controls_alone() {
        let mut sim = system(ControlMode::Passive, false);
        assert!(sim.control_for(1).is_none());
        sim.step_once().unwrap();
        assert_eq!(sim.t(), 1);
        assert!(sim.world().control().iter().all(|&c| c == 0.0));
        assert!(!sim.world().is_driven(0));
    }

    #[test]
    fn test_sine_writes_first_two_controls() {
        let mut sim = system(ControlMode::Sine, false);
        let ctrl = sim.control_for(10).unwrap();
        assert_eq!(ctrl.len(), 2);
        assert!((ctrl[0] - 1.0f32.cos() * 0.01).abs() < 1e-7);
        assert!((ctrl[1] - 1.0f32.sin() * 0.01).abs() < 1e-7);

        sim.step_once().unwrap();
        assert!(sim.world().is_driven(0));
        assert!(sim.world().is_driven(1));
        assert!(!sim.world().is_driven(2));
    }

    #[test]
    fn test_sine_starts_at_zero_phase() {
        let mut sim = system(ControlMode::Sine, false);
        sim.step_once().unwrap();
        assert_eq!(sim.t(), 1);
        assert_eq!(&sim.world().control()[..2], &[0.01, 0.0]);

        sim.step_once().unwrap();
        let ctrl = sim.world().control();
        assert!((ctrl[0] - 0.1f32.cos() * 0.01).abs() < 1e-7);
        assert!((ctrl[1] - 0.1f32.sin() * 0.01).abs() < 1e-7);
    }

    #[test]
    fn test_update_stops_at_budget() {
        let mut sim = system(ControlMode::Passive, false);
        let budget = StepBudget::new(&RunConfig {
            test_steps: 3,
            ..RunConfig::default()
        })
        .with_testing(true);

        let mut frames = 0;
        loop {
            frames += 1;
            let result = sim.update(Duration::from_millis(16), &budget).unwrap();
            assert_eq!(result.steps, 1);
            if result.finished {
                break;
            }
        }
        assert_eq!(frames, 4);
        assert_eq!(sim.world().step_count(), 4);
    }

    #[test]
    fn test_realtime_follows_wall_clock() {
        let mut sim = system(ControlMode::Passive, true);
        let result = sim
            .update(Duration::from_millis(10), &StepBudget::unbounded())
            .unwrap();
        // 10 ms of 2 ms steps
        assert!((4..=5).contains(&result.steps));
        assert!(result.geometry_dirty);
    }

    #[test]
    fn test_pause_and_reset() {
        let mut sim = system(ControlMode::Passive, false);
        assert!(sim.toggle_pause());
        let result = sim
            .update(Duration::from_millis(16), &StepBudget::unbounded())
            .unwrap();
        assert_eq!(result.steps, 0);
        assert!(!result.geometry_dirty);

        sim.toggle_pause();
        sim.update(Duration::from_millis(16), &StepBudget::unbounded())
            .unwrap();
        assert_eq!(sim.t(), 1);
        sim.reset();
        assert_eq!(sim.t(), 0);
        assert_eq!(sim.world().step_count(), 0);
    }
}
