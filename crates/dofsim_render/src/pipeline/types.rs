//! GPU-compatible data types for the mesh pipeline
//!
//! These types match the layouts in `mesh.wgsl` exactly.

use bytemuck::{Pod, Zeroable};

/// A lit vertex
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// World-space position
    pub position: [f32; 3],
    /// World-space unit normal
    pub normal: [f32; 3],
    /// RGBA color
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }
}

/// Uniforms for the mesh pass
/// Layout: 160 bytes total (must match mesh.wgsl MeshUniforms)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MeshUniforms {
    /// View matrix (64 bytes)
    pub view_matrix: [[f32; 4]; 4],
    /// Projection matrix (64 bytes)
    pub projection_matrix: [[f32; 4]; 4],
    /// Direction towards the light + padding (16 bytes)
    pub light_dir: [f32; 3],
    pub _padding: f32,
    /// Lighting parameters + padding (16 bytes)
    pub ambient_strength: f32,
    pub diffuse_strength: f32,
    pub _padding2: [f32; 2],
}

impl Default for MeshUniforms {
    fn default() -> Self {
        Self {
            view_matrix: IDENTITY,
            projection_matrix: IDENTITY,
            light_dir: [0.3, 0.5, 1.0],
            _padding: 0.0,
            ambient_strength: 0.3,
            diffuse_strength: 0.7,
            _padding2: [0.0; 2],
        }
    }
}

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];
