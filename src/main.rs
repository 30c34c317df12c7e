//! dofsim - physics viewer for the dofbot arm
//!
//! Steps the arm and draws it once per frame until the window closes, or
//! for a fixed number of steps when `TESTING` is set.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowId,
};

use dofsim::{
    config::AppConfig,
    run_headless,
    systems::{RenderError, RenderSystem, SimulationSystem, WindowSystem},
    AppError, Robot, StepBudget,
};
use dofsim_core::nalgebra::Point3;
use dofsim_input::OrbitController;
use dofsim_render::{OrbitCamera, RobotVisuals};

/// Longest frame fed to the simulation clock
const MAX_FRAME_TIME: Duration = Duration::from_millis(250);

/// Main application state
struct App {
    config: AppConfig,
    budget: StepBudget,
    robot: Robot,
    simulation: SimulationSystem,
    window: Option<WindowSystem>,
    renderer: Option<RenderSystem>,
    camera: OrbitCamera,
    controller: OrbitController,
    last_frame: Instant,
    /// Error that ended the event loop
    error: Option<AppError>,
}

impl App {
    fn new(config: AppConfig, budget: StepBudget) -> Result<Self, AppError> {
        let mut robot = Robot::load(&config)?;
        let simulation = robot.simulation(&config)?;

        let cam = &config.camera;
        let camera = OrbitCamera::new(
            Point3::from(cam.target),
            cam.distance,
            cam.azimuth.to_radians(),
            cam.elevation.to_radians(),
        );

        let controller = OrbitController::new()
            .with_orbit_sensitivity(config.input.orbit_sensitivity)
            .with_pan_sensitivity(config.input.pan_sensitivity)
            .with_zoom_sensitivity(config.input.zoom_sensitivity)
            .with_invert_y(config.input.invert_y);

        Ok(Self {
            config,
            budget,
            robot,
            simulation,
            window: None,
            renderer: None,
            camera,
            controller,
            last_frame: Instant::now(),
            error: None,
        })
    }

    /// Record a fatal error and stop the loop
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        self.error = Some(error);
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window = WindowSystem::create(event_loop, &self.config.window)?;

        let visuals = RobotVisuals::new(
            &self.robot.model,
            &mut self.robot.meshes,
            self.config.rendering.placeholder_radius,
        );
        let mut renderer = RenderSystem::new(
            window.window().clone(),
            visuals,
            self.config.rendering.clone(),
            self.config.camera.clone(),
            self.config.window.vsync,
        )?;
        renderer.update_geometry(&self.simulation.world().link_poses());

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.last_frame = Instant::now();
        Ok(())
    }

    /// One iteration: step, draw, check the budget
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = (now - self.last_frame).min(MAX_FRAME_TIME);
        self.last_frame = now;

        let result = match self.simulation.update(dt, &self.budget) {
            Ok(result) => result,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        self.controller.update(&mut self.camera, dt.as_secs_f32());

        if let Some(renderer) = &mut self.renderer {
            if result.geometry_dirty {
                renderer.update_geometry(&self.simulation.world().link_poses());
            }
            match renderer.render_frame(&self.camera) {
                Ok(()) => {}
                Err(RenderError::SurfaceLost) => renderer.recover_surface(),
                Err(e @ RenderError::OutOfMemory) => return self.fail(event_loop, e.into()),
                Err(e) => log::warn!("{}", e),
            }
        }

        if let Some(window) = &self.window {
            window.update_title(
                self.simulation.t(),
                self.simulation.world().time(),
                self.simulation.is_paused(),
            );
        }

        if result.finished {
            log::info!(
                "Step budget reached after {} steps ({} frames)",
                self.simulation.t(),
                self.renderer.as_ref().map_or(0, |r| r.frame_count())
            );
            event_loop.exit();
            return;
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyR => {
                self.camera.reset();
                log::info!("Camera reset");
            }
            KeyCode::Backspace => {
                self.simulation.reset();
                if let Some(renderer) = &mut self.renderer {
                    renderer.update_geometry(&self.simulation.world().link_poses());
                }
            }
            KeyCode::Space => {
                let paused = self.simulation.toggle_pause();
                log::info!("Simulation {}", if paused { "paused" } else { "running" });
            }
            KeyCode::KeyF => {
                if let Some(window) = &self.window {
                    window.toggle_fullscreen();
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size.width, physical_size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state == ElementState::Pressed && !event.repeat {
                        self.handle_key(event_loop, key);
                    }
                    self.controller.process_keyboard(key, event.state);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.controller.process_mouse_button(button, state);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.controller.process_scroll(lines);
            }

            WindowEvent::RedrawRequested => self.frame(event_loop),

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.controller.process_mouse_motion(delta.0, delta.1);
        }
    }
}

fn run(config: AppConfig) -> Result<(), AppError> {
    let budget = StepBudget::from_env(&config.run);

    if config.run.headless {
        let summary = run_headless(&config, budget)?;
        for (name, state) in &summary.joint_states {
            log::info!("{}: q={:.4} qd={:.4}", name, state.position, state.velocity);
        }
        return Ok(());
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, budget)?;
    event_loop.run_app(&mut app)?;
    app.error.take().map_or(Ok(()), Err)
}

fn main() -> ExitCode {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    if let Some(e) = config_error {
        log::warn!("{}. Using defaults.", e);
    }
    log::info!("Starting dofsim");

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
