//! GPU rendering system
//!
//! Manages GPU rendering including:
//! - Render context and surface
//! - The mesh pipeline and its vertex buffer
//! - Rebuilding the arm's triangles from link poses

use std::collections::HashMap;
use std::sync::Arc;

use dofsim_core::nalgebra::Isometry3;
use dofsim_render::{
    pipeline::{perspective_matrix, MeshPipeline, MeshUniforms},
    CheckerboardGeometry, ContextError, OrbitCamera, RenderContext, RenderableGeometry,
    RobotVisuals,
};
use winit::window::Window;

use crate::config::{CameraConfig, RenderingConfig};

/// Render error types
#[derive(Debug)]
pub enum RenderError {
    /// The GPU could not be initialised
    Context(ContextError),
    /// Surface was lost (window resized, minimized, etc.)
    SurfaceLost,
    /// GPU out of memory
    OutOfMemory,
    /// Other surface error
    Other(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Context(e) => write!(f, "GPU setup failed: {}", e),
            RenderError::SurfaceLost => write!(f, "Surface lost"),
            RenderError::OutOfMemory => write!(f, "Out of memory"),
            RenderError::Other(msg) => write!(f, "Render error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Context(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ContextError> for RenderError {
    fn from(e: ContextError) -> Self {
        RenderError::Context(e)
    }
}

/// Manages GPU rendering
pub struct RenderSystem {
    context: RenderContext,
    pipeline: MeshPipeline,
    visuals: RobotVisuals,
    geometry: RenderableGeometry,
    checkerboard: CheckerboardGeometry,
    render_config: RenderingConfig,
    camera_config: CameraConfig,
    frames: u64,
}

impl RenderSystem {
    /// Create render system from window and config
    pub fn new(
        window: Arc<Window>,
        visuals: RobotVisuals,
        render_config: RenderingConfig,
        camera_config: CameraConfig,
        vsync: bool,
    ) -> Result<Self, RenderError> {
        let context = pollster::block_on(RenderContext::with_vsync(window, vsync))?;

        let mut pipeline = MeshPipeline::new(&context.device, context.config.format);
        pipeline.ensure_depth_texture(&context.device, context.size.width, context.size.height);

        let checkerboard = CheckerboardGeometry::new(
            [0.3, 0.3, 0.35, 1.0], // Dark gray
            [0.7, 0.7, 0.75, 1.0], // Light gray
            render_config.ground_cell,
        );

        Ok(Self {
            context,
            pipeline,
            visuals,
            geometry: RenderableGeometry::new(),
            checkerboard,
            render_config,
            camera_config,
            frames: 0,
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context
            .resize(winit::dpi::PhysicalSize::new(width, height));
        self.pipeline
            .ensure_depth_texture(&self.context.device, width, height);
    }

    /// Reconfigure the surface after it was lost
    pub fn recover_surface(&mut self) {
        self.context.reconfigure();
    }

    /// Rebuild the arm's triangles at the given link poses and upload them
    pub fn update_geometry(&mut self, poses: &HashMap<String, Isometry3<f32>>) {
        self.geometry.clear();
        if self.render_config.show_ground {
            self.geometry
                .add_ground(&self.checkerboard, self.render_config.ground_extent, 0.0);
        }
        self.geometry.add_visuals(&self.visuals, poses);
        self.pipeline.upload(
            &self.context.device,
            &self.context.queue,
            &self.geometry.vertices,
        );
        log::trace!("Uploaded {} vertices", self.geometry.vertex_count());
    }

    /// Render a single frame
    pub fn render_frame(&mut self, camera: &OrbitCamera) -> Result<(), RenderError> {
        let proj_matrix = perspective_matrix(
            self.camera_config.fov.to_radians(),
            self.context.aspect_ratio(),
            self.camera_config.near,
            self.camera_config.far,
        );

        let uniforms = MeshUniforms {
            view_matrix: camera.view_matrix(),
            projection_matrix: proj_matrix,
            light_dir: self.render_config.light_dir,
            ambient_strength: self.render_config.ambient_strength,
            diffuse_strength: self.render_config.diffuse_strength,
            ..MeshUniforms::default()
        };
        self.pipeline
            .update_uniforms(&self.context.queue, &uniforms);

        // Get surface texture
        let output = match self.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                return Err(RenderError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Other(format!("{:?}", e))),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let bg = &self.render_config.background_color;
        self.pipeline.render(
            &mut encoder,
            &view,
            wgpu::Color {
                r: bg[0] as f64,
                g: bg[1] as f64,
                b: bg[2] as f64,
                a: bg[3] as f64,
            },
        );

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.frames += 1;

        Ok(())
    }

    /// Frames presented so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Get current surface size
    pub fn size(&self) -> (u32, u32) {
        (self.context.size.width, self.context.size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_display() {
        assert_eq!(format!("{}", RenderError::SurfaceLost), "Surface lost");
        assert_eq!(format!("{}", RenderError::OutOfMemory), "Out of memory");
        assert_eq!(
            format!("{}", RenderError::Other("test".to_string())),
            "Render error: test"
        );
        let err: RenderError = ContextError::NoAdapter.into();
        assert!(err.to_string().starts_with("GPU setup failed"));
    }
}
