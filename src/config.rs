//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`DOFSIM_SECTION__KEY`)

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use dofsim_physics::PhysicsConfig;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Camera configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// Input configuration
    #[serde(default)]
    pub input: InputConfig,
    /// Physics configuration, passed straight to the simulation
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Rendering configuration
    #[serde(default)]
    pub rendering: RenderingConfig,
    /// Robot model selection
    #[serde(default)]
    pub model: ModelConfig,
    /// Loop bounds and mode
    #[serde(default)]
    pub run: RunConfig,
    /// Actuator control
    #[serde(default)]
    pub control: ControlConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`DOFSIM_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // DOFSIM_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed("DOFSIM_").split("__"));

        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics
            .validate()
            .map_err(|e| ConfigError::new(e.to_string()))?;
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            return Err(ConfigError::new(format!(
                "camera clip planes must satisfy 0 < near < far (near {}, far {})",
                self.camera.near, self.camera.far
            )));
        }
        if self.control.period <= 0.0 {
            return Err(ConfigError::new("control.period must be positive"));
        }
        Ok(())
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Start in fullscreen mode
    pub fullscreen: bool,
    /// Enable VSync
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "dofsim - dofbot arm".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Point the camera orbits [x, y, z]
    pub target: [f32; 3],
    /// Distance from the target
    pub distance: f32,
    /// Starting azimuth in degrees, from +X towards +Y
    pub azimuth: f32,
    /// Starting elevation in degrees above the ground plane
    pub elevation: f32,
    /// Field of view in degrees
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            target: [0.0, 0.0, 0.15],
            distance: 0.8,
            azimuth: 35.0,
            elevation: 25.0,
            fov: 45.0,
            near: 0.01,
            far: 50.0,
        }
    }
}

/// Input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Radians of orbit per pixel of drag
    pub orbit_sensitivity: f32,
    /// Pan per pixel of drag, as a fraction of the camera distance
    pub pan_sensitivity: f32,
    /// Zoom per wheel line
    pub zoom_sensitivity: f32,
    /// Invert vertical drag
    pub invert_y: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.001,
            zoom_sensitivity: 0.1,
            invert_y: false,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Background color [r, g, b, a]
    pub background_color: [f32; 4],
    /// Light direction [x, y, z]
    pub light_dir: [f32; 3],
    /// Ambient light strength
    pub ambient_strength: f32,
    /// Diffuse light strength
    pub diffuse_strength: f32,
    /// Draw the checkerboard ground
    pub show_ground: bool,
    /// Half-size of the ground square
    pub ground_extent: f32,
    /// Checker cell size
    pub ground_cell: f32,
    /// Radius of the marker drawn for a visual whose mesh is missing
    pub placeholder_radius: f32,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            background_color: [0.02, 0.02, 0.08, 1.0],
            light_dir: [0.3, 0.5, 1.0],
            ambient_strength: 0.3,
            diffuse_strength: 0.7,
            show_ground: true,
            ground_extent: 1.0,
            ground_cell: 0.1,
            placeholder_radius: 0.02,
        }
    }
}

/// Robot model selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// URDF file to load; the embedded dofbot when unset
    pub path: Option<PathBuf>,
    /// Directory searched for mesh files, overriding the model's own meshdir
    pub meshdir: Option<PathBuf>,
}

/// Loop bounds and mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Run without a window
    pub headless: bool,
    /// Stop after this many steps
    pub max_steps: Option<u64>,
    /// Step count after which a `TESTING` run stops
    pub test_steps: u64,
    /// Pace the windowed loop to wall time instead of one step per frame
    pub realtime: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            headless: false,
            max_steps: None,
            test_steps: 100,
            realtime: false,
        }
    }
}

/// How the actuated joints are driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// No control; the arm hangs under gravity
    #[default]
    Passive,
    /// Sinusoidal targets on the first two actuators
    Sine,
}

/// Actuator control
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub mode: ControlMode,
    /// Peak control value
    pub amplitude: f32,
    /// Steps per radian of the sine phase
    pub period: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::Passive,
            amplitude: 0.01,
            period: 10.0,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level used when `RUST_LOG` is unset (error, warn, info, debug, trace)
    pub log_level: String,
    /// Steps between joint state logs in headless runs; 0 disables them
    pub log_interval: u64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_interval: 50,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::new(e.to_string())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.physics.gravity, [0.0, 0.0, -9.81]);
        assert_eq!(config.run.test_steps, 100);
        assert_eq!(config.control.mode, ControlMode::Passive);
        assert!(config.model.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("title"));
        assert!(toml.contains("gravity"));
        assert!(toml.contains("mode = \"passive\""));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = Figment::new()
            .merge(Toml::string("[control]\nmode = \"sine\"\n[physics]\ntimestep = 0.004\n"))
            .extract()
            .unwrap();
        assert_eq!(config.control.mode, ControlMode::Sine);
        assert_eq!(config.control.amplitude, 0.01);
        assert_eq!(config.physics.timestep, 0.004);
        assert_eq!(config.physics.substeps, 1);
    }

    #[test]
    fn test_invalid_camera_planes() {
        let mut config = AppConfig::default();
        config.camera.near = 1.0;
        config.camera.far = 0.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("near"));
    }

    #[test]
    fn test_missing_dir_uses_defaults() {
        let dir = std::path::Path::new("/nonexistent/config");
        let config = AppConfig::load_from(dir).unwrap();
        assert_eq!(config.window.height, 720);
    }
}
