//! Rendering pipeline components

pub mod types;
pub mod mesh_pipeline;

pub use types::{MeshUniforms, Vertex};
pub use mesh_pipeline::{look_at_matrix, mat4_mul, perspective_matrix, MeshPipeline};
