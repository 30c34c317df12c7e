//! Triangle mesh assets
//!
//! Mesh files referenced by URDF visuals and collisions are loaded into a
//! [`MeshAsset`]. STL (ASCII or binary) is read with `stl_io`. The
//! [`MeshResolver`] turns a URDF filename such as
//! `package://dofbot_moveit/meshes/link1.STL` into a path on disk.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::asset_cache::Asset;
use crate::asset_error::AssetError;

/// An indexed triangle mesh
#[derive(Clone, Debug, PartialEq)]
pub struct MeshAsset {
    /// Vertex positions in the mesh frame
    pub vertices: Vec<[f32; 3]>,
    /// Triangles as indices into `vertices`, counter-clockwise
    pub triangles: Vec<[u32; 3]>,
    /// One unit normal per triangle
    pub normals: Vec<[f32; 3]>,
}

impl MeshAsset {
    /// Build a mesh from vertices and triangles, computing face normals
    pub fn from_triangles(vertices: Vec<[f32; 3]>, triangles: Vec<[u32; 3]>) -> Self {
        let normals = triangles
            .iter()
            .map(|t| {
                face_normal(
                    vertices[t[0] as usize],
                    vertices[t[1] as usize],
                    vertices[t[2] as usize],
                )
            })
            .collect();
        Self {
            vertices,
            triangles,
            normals,
        }
    }

    /// Load an STL file
    pub fn load_stl(path: &Path) -> Result<Self, AssetError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(path.display().to_string()),
            _ => AssetError::Io(e),
        })?;
        let mut reader = BufReader::new(file);
        let stl = stl_io::read_stl(&mut reader)
            .map_err(|e| AssetError::Parse(format!("{}: {}", path.display(), e)))?;

        let vertices: Vec<[f32; 3]> = stl.vertices.iter().map(|v| [v[0], v[1], v[2]]).collect();
        let mut triangles = Vec::with_capacity(stl.faces.len());
        let mut normals = Vec::with_capacity(stl.faces.len());
        for face in &stl.faces {
            let [a, b, c] = face.vertices;
            if a >= vertices.len() || b >= vertices.len() || c >= vertices.len() {
                return Err(AssetError::Parse(format!(
                    "{}: face index out of range",
                    path.display()
                )));
            }
            triangles.push([a as u32, b as u32, c as u32]);

            // Exporters often leave the stored normal zeroed
            let stored = [face.normal[0], face.normal[1], face.normal[2]];
            let len_sq: f32 = stored.iter().map(|c| c * c).sum();
            normals.push(if len_sq > 1e-12 {
                normalize(stored)
            } else {
                face_normal(vertices[a], vertices[b], vertices[c])
            });
        }

        log::debug!(
            "Loaded mesh {} ({} vertices, {} triangles)",
            path.display(),
            vertices.len(),
            triangles.len()
        );

        Ok(Self {
            vertices,
            triangles,
            normals,
        })
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounds as (min, max); `None` for an empty mesh
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(mut lo, mut hi), v| {
            for i in 0..3 {
                lo[i] = lo[i].min(v[i]);
                hi[i] = hi[i].max(v[i]);
            }
            (lo, hi)
        }))
    }

    /// Vertex positions multiplied component-wise by `scale`
    pub fn scaled_vertices(&self, scale: [f32; 3]) -> Vec<[f32; 3]> {
        self.vertices
            .iter()
            .map(|v| [v[0] * scale[0], v[1] * scale[1], v[2] * scale[2]])
            .collect()
    }
}

impl Asset for MeshAsset {
    fn load_from_file(path: &Path) -> Result<Self, AssetError> {
        let is_stl = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("stl"))
            .unwrap_or(false);
        if !is_stl {
            return Err(AssetError::Unsupported(path.display().to_string()));
        }
        Self::load_stl(path)
    }
}

fn face_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    normalize([
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ])
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Maps URDF mesh filenames to paths on disk
///
/// Resolution order:
/// 1. Strip a `package://` or `file://` scheme.
/// 2. If the remaining path names an existing file, use it.
/// 3. If a mesh directory is set, look for the bare file name inside it.
/// 4. Otherwise use the remaining path as given.
#[derive(Clone, Debug, Default)]
pub struct MeshResolver {
    meshdir: Option<PathBuf>,
}

impl MeshResolver {
    /// Create a resolver with an optional mesh directory
    pub fn new(meshdir: Option<PathBuf>) -> Self {
        Self { meshdir }
    }

    /// The configured mesh directory
    pub fn meshdir(&self) -> Option<&Path> {
        self.meshdir.as_deref()
    }

    /// Resolve a URDF filename to a candidate path
    ///
    /// The path is not checked for existence; loading reports `NotFound`.
    pub fn resolve(&self, filename: &str) -> PathBuf {
        let stripped = filename
            .strip_prefix("package://")
            .or_else(|| filename.strip_prefix("file://"))
            .unwrap_or(filename);
        let path = Path::new(stripped);
        if path.is_file() {
            return path.to_path_buf();
        }

        match (&self.meshdir, path.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => path.to_path_buf(),
        }
    }
}
