//! Robot descriptions compiled into the binary

use crate::model::RobotModel;
use crate::model_error::ModelError;
use crate::urdf_loader::parse_urdf;

/// The Yahboom DOFBOT arm: a fixed base and five revolute joints
///
/// Mesh paths point at the `dofbot_moveit` package; the compiler block's
/// `meshdir` is an absolute path from the machine the model was exported on
/// and is normally overridden by configuration.
pub const DOFBOT_URDF: &str = include_str!("../assets/dofbot.urdf");

/// Parse the embedded DOFBOT description
pub fn dofbot() -> Result<RobotModel, ModelError> {
    parse_urdf(DOFBOT_URDF)
}
