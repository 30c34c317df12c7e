//! Loading the robot and building its simulation

use dofsim_core::{builtin, MeshSource, ModelValidator, RobotModel};
use dofsim_physics::ArmWorld;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::systems::SimulationSystem;

/// A loaded model and the mesh lookup shared by physics and rendering
pub struct Robot {
    pub model: RobotModel,
    pub meshes: MeshSource,
}

impl Robot {
    /// Load the configured model, or the embedded dofbot
    pub fn load(config: &AppConfig) -> Result<Self, AppError> {
        let model = match &config.model.path {
            Some(path) => {
                log::info!("Loading robot from {}", path.display());
                RobotModel::load(path)?
            }
            None => builtin::dofbot()?,
        };
        for warning in ModelValidator::validate(&model) {
            log::warn!("{}", warning);
        }

        let meshes = MeshSource::for_model(&model, config.model.meshdir.clone());
        log::info!(
            "Robot '{}': {} links, {} joints, {} DOF",
            model.name(),
            model.link_count(),
            model.joint_count(),
            model.dof()
        );
        Ok(Self { model, meshes })
    }

    /// Build the physics world and wrap it in a simulation system
    pub fn simulation(&mut self, config: &AppConfig) -> Result<SimulationSystem, AppError> {
        config.physics.validate()?;
        let world = ArmWorld::build(&self.model, &config.physics, &mut self.meshes)?;
        Ok(SimulationSystem::new(
            world,
            config.control.clone(),
            config.run.realtime,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_dofbot() {
        let mut config = AppConfig::default();
        config.model.meshdir = Some("/nonexistent".into());
        let mut robot = Robot::load(&config).unwrap();
        assert_eq!(robot.model.name(), "dofbot");
        let sim = robot.simulation(&config).unwrap();
        assert_eq!(sim.world().dof(), 5);
        assert_eq!(robot.meshes.cache().failed_count(), 6);
    }

    #[test]
    fn test_missing_model_file() {
        let mut config = AppConfig::default();
        config.model.path = Some("/nonexistent/robot.urdf".into());
        assert!(matches!(Robot::load(&config), Err(AppError::Model(_))));
    }
}
