//! Renderable geometry - bridges the robot model to GPU vertices
//!
//! [`RobotVisuals`] is built once per model: every visual element is turned
//! into triangles in its link's frame (meshes loaded through the shared
//! [`MeshSource`], URDF primitives tessellated). Each frame,
//! [`RenderableGeometry`] places those triangles at the current link poses.

use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use dofsim_core::{Geometry, MeshSource, RobotModel, Visual};
use nalgebra::{Isometry3, Point3, Vector3};

use crate::pipeline::Vertex;

/// Segments around the circumference of tessellated round shapes
const ROUND_SEGMENTS: usize = 24;
/// Latitude bands of tessellated spheres
const SPHERE_RINGS: usize = 12;

/// Triangles with per-vertex normals, three entries per triangle
#[derive(Clone, Debug, Default)]
pub struct TriangleSoup {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
}

impl TriangleSoup {
    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Add a triangle with a flat normal from its winding
    pub fn push_flat(&mut self, a: [f32; 3], b: [f32; 3], c: [f32; 3]) {
        let (va, vb, vc) = (Vector3::from(a), Vector3::from(b), Vector3::from(c));
        let n = (vb - va).cross(&(vc - va));
        let n: [f32; 3] = n.try_normalize(1e-12).unwrap_or_else(Vector3::z).into();
        self.push([a, b, c], [n, n, n]);
    }

    /// Add a triangle with explicit normals
    pub fn push(&mut self, positions: [[f32; 3]; 3], normals: [[f32; 3]; 3]) {
        self.positions.extend_from_slice(&positions);
        self.normals.extend_from_slice(&normals);
    }

    /// Apply a rigid transform in place
    pub fn transform(&mut self, iso: &Isometry3<f32>) {
        for p in &mut self.positions {
            *p = (iso * Point3::from(*p)).coords.into();
        }
        for n in &mut self.normals {
            *n = (iso.rotation * Vector3::from(*n)).into();
        }
    }
}

/// One colored visual element of a link
#[derive(Clone, Debug)]
pub struct VisualPart {
    /// Triangles in the link frame
    pub soup: TriangleSoup,
    pub color: [f32; 4],
    /// True when the mesh was missing and a marker sphere stands in
    pub placeholder: bool,
}

/// Link-frame triangles for every visual of a model
#[derive(Clone, Debug, Default)]
pub struct RobotVisuals {
    links: Vec<(String, Vec<VisualPart>)>,
}

impl RobotVisuals {
    /// Tessellate a model's visuals
    ///
    /// A visual whose mesh is unavailable is drawn as a sphere of
    /// `placeholder_radius` at the visual origin.
    pub fn new(model: &RobotModel, meshes: &mut MeshSource, placeholder_radius: f32) -> Self {
        let mut links = Vec::with_capacity(model.link_count());
        let mut placeholders = 0;
        for (_, link) in model.links() {
            let parts: Vec<VisualPart> = link
                .visuals
                .iter()
                .map(|visual| visual_part(visual, meshes, placeholder_radius))
                .collect();
            placeholders += parts.iter().filter(|p| p.placeholder).count();
            links.push((link.name.clone(), parts));
        }

        let visuals = Self { links };
        log::info!(
            "Tessellated {} visual triangles ({} placeholders)",
            visuals.triangle_count(),
            placeholders
        );
        visuals
    }

    /// Parts of a link by name
    pub fn link(&self, name: &str) -> Option<&[VisualPart]> {
        self.links
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, parts)| parts.as_slice())
    }

    /// Total triangles across all links
    pub fn triangle_count(&self) -> usize {
        self.links
            .iter()
            .flat_map(|(_, parts)| parts)
            .map(|p| p.soup.triangle_count())
            .sum()
    }

    /// Number of placeholder spheres
    pub fn placeholder_count(&self) -> usize {
        self.links
            .iter()
            .flat_map(|(_, parts)| parts)
            .filter(|p| p.placeholder)
            .count()
    }
}

fn visual_part(visual: &Visual, meshes: &mut MeshSource, placeholder_radius: f32) -> VisualPart {
    let mut placeholder = false;
    let mut soup = match &visual.geometry {
        Geometry::Mesh { filename, scale } => match meshes.get(filename) {
            Some(mesh) => {
                let vertices = mesh.scaled_vertices(*scale);
                let mut soup = TriangleSoup::default();
                for tri in &mesh.triangles {
                    soup.push_flat(
                        vertices[tri[0] as usize],
                        vertices[tri[1] as usize],
                        vertices[tri[2] as usize],
                    );
                }
                soup
            }
            None => {
                placeholder = true;
                sphere(placeholder_radius)
            }
        },
        Geometry::Box { size } => cuboid(*size),
        Geometry::Cylinder { radius, length } => cylinder(*radius, *length),
        Geometry::Sphere { radius } => sphere(*radius),
        Geometry::Capsule { radius, length } => capsule(*radius, *length),
    };
    soup.transform(&visual.origin.to_isometry());

    VisualPart {
        soup,
        color: visual.material.rgba,
        placeholder,
    }
}

/// Axis-aligned box centered at the origin
pub fn cuboid(size: [f32; 3]) -> TriangleSoup {
    let [hx, hy, hz] = [size[0] / 2.0, size[1] / 2.0, size[2] / 2.0];
    let corner = |i: usize| {
        [
            if i & 1 == 0 { -hx } else { hx },
            if i & 2 == 0 { -hy } else { hy },
            if i & 4 == 0 { -hz } else { hz },
        ]
    };
    // Faces as corner indices, counter-clockwise seen from outside
    const FACES: [[usize; 4]; 6] = [
        [0, 2, 3, 1], // -Z
        [4, 5, 7, 6], // +Z
        [0, 1, 5, 4], // -Y
        [2, 6, 7, 3], // +Y
        [0, 4, 6, 2], // -X
        [1, 3, 7, 5], // +X
    ];
    let mut soup = TriangleSoup::default();
    for face in FACES {
        let [a, b, c, d] = face.map(corner);
        soup.push_flat(a, b, c);
        soup.push_flat(a, c, d);
    }
    soup
}

/// Cylinder along Z centered at the origin
pub fn cylinder(radius: f32, length: f32) -> TriangleSoup {
    let h = length / 2.0;
    let mut soup = TriangleSoup::default();
    append_tube(&mut soup, radius, h);
    for i in 0..ROUND_SEGMENTS {
        let (p0, p1) = (rim(radius, i), rim(radius, i + 1));
        soup.push_flat([0.0, 0.0, h], [p0[0], p0[1], h], [p1[0], p1[1], h]);
        soup.push_flat([0.0, 0.0, -h], [p1[0], p1[1], -h], [p0[0], p0[1], -h]);
    }
    soup
}

/// UV sphere centered at the origin
pub fn sphere(radius: f32) -> TriangleSoup {
    let mut soup = TriangleSoup::default();
    append_sphere_band(&mut soup, radius, 0.0, 0, SPHERE_RINGS);
    soup
}

/// Capsule along Z; `length` excludes the end caps
pub fn capsule(radius: f32, length: f32) -> TriangleSoup {
    let h = length / 2.0;
    let mut soup = TriangleSoup::default();
    append_tube(&mut soup, radius, h);
    append_sphere_band(&mut soup, radius, h, 0, SPHERE_RINGS / 2);
    append_sphere_band(&mut soup, radius, -h, SPHERE_RINGS / 2, SPHERE_RINGS);
    soup
}

/// Point `i` on a circle of `radius` in the XY plane
fn rim(radius: f32, i: usize) -> [f32; 2] {
    let (s, c) = (TAU * i as f32 / ROUND_SEGMENTS as f32).sin_cos();
    [radius * c, radius * s]
}

/// Open tube along Z from `-h` to `h` with smooth normals
fn append_tube(soup: &mut TriangleSoup, radius: f32, h: f32) {
    for i in 0..ROUND_SEGMENTS {
        let (p0, p1) = (rim(radius, i), rim(radius, i + 1));
        let (c0, c1) = (rim(1.0, i), rim(1.0, i + 1));
        let n0 = [c0[0], c0[1], 0.0];
        let n1 = [c1[0], c1[1], 0.0];
        let b0 = [p0[0], p0[1], -h];
        let b1 = [p1[0], p1[1], -h];
        let t0 = [p0[0], p0[1], h];
        let t1 = [p1[0], p1[1], h];
        soup.push([b0, b1, t1], [n0, n1, n1]);
        soup.push([b0, t1, t0], [n0, n1, n0]);
    }
}

/// Latitude rings `first..last` of a sphere whose center is at `z_offset`
fn append_sphere_band(soup: &mut TriangleSoup, radius: f32, z_offset: f32, first: usize, last: usize) {
    let point = |ring: usize, seg: usize| {
        let theta = PI * ring as f32 / SPHERE_RINGS as f32;
        let phi = TAU * seg as f32 / ROUND_SEGMENTS as f32;
        let n = [theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()];
        ([n[0] * radius, n[1] * radius, n[2] * radius + z_offset], n)
    };
    for ring in first..last {
        for seg in 0..ROUND_SEGMENTS {
            let (a, na) = point(ring, seg);
            let (b, nb) = point(ring + 1, seg);
            let (c, nc) = point(ring + 1, seg + 1);
            let (d, nd) = point(ring, seg + 1);
            if ring != 0 {
                soup.push([a, b, d], [na, nb, nd]);
            }
            if ring + 1 != SPHERE_RINGS {
                soup.push([d, b, c], [nd, nb, nc]);
            }
        }
    }
}

/// World-space vertices for one frame
pub struct RenderableGeometry {
    pub vertices: Vec<Vertex>,
}

impl RenderableGeometry {
    /// Create an empty renderable geometry
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
        }
    }

    /// Create renderable geometry with pre-allocated capacity
    pub fn with_capacity(vertex_capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_capacity),
        }
    }

    /// Place every link's visuals at the given world poses
    ///
    /// Links without a pose are skipped.
    pub fn from_visuals(visuals: &RobotVisuals, poses: &HashMap<String, Isometry3<f32>>) -> Self {
        let mut result = Self::with_capacity(visuals.triangle_count() * 3);
        result.add_visuals(visuals, poses);
        result
    }

    /// Add every link's visuals at the given world poses
    pub fn add_visuals(&mut self, visuals: &RobotVisuals, poses: &HashMap<String, Isometry3<f32>>) {
        for (name, parts) in &visuals.links {
            let Some(pose) = poses.get(name) else {
                continue;
            };
            for part in parts {
                self.add_soup(&part.soup, pose, part.color);
            }
        }
    }

    /// Add triangles transformed by `pose`
    pub fn add_soup(&mut self, soup: &TriangleSoup, pose: &Isometry3<f32>, color: [f32; 4]) {
        for (p, n) in soup.positions.iter().zip(&soup.normals) {
            let world = pose * Point3::from(*p);
            let normal = pose.rotation * Vector3::from(*n);
            self.vertices.push(Vertex::new(world.coords.into(), normal.into(), color));
        }
    }

    /// Add a checkerboard ground square of half-size `half_extent` at height `z`
    pub fn add_ground(&mut self, checker: &CheckerboardGeometry, half_extent: f32, z: f32) {
        let cells = (half_extent / checker.cell_size).ceil().max(1.0) as i32;
        let up = [0.0, 0.0, 1.0];
        for ix in -cells..cells {
            for iy in -cells..cells {
                let x0 = ix as f32 * checker.cell_size;
                let y0 = iy as f32 * checker.cell_size;
                let x1 = x0 + checker.cell_size;
                let y1 = y0 + checker.cell_size;
                let color = checker
                    .color_for_position(x0 + 0.5 * checker.cell_size, y0 + 0.5 * checker.cell_size);
                let quad = [[x0, y0, z], [x1, y0, z], [x1, y1, z], [x0, y1, z]];
                for i in [0, 1, 2, 0, 2, 3] {
                    self.vertices.push(Vertex::new(quad[i], up, color));
                }
            }
        }
    }

    /// Clear all geometry
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Get the number of vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

impl Default for RenderableGeometry {
    fn default() -> Self {
        Self::new()
    }
}

/// Checkerboard pattern for the ground plane
pub struct CheckerboardGeometry {
    /// Colors for the checkerboard pattern
    pub color_a: [f32; 4],
    pub color_b: [f32; 4],
    /// Size of each checker cell
    pub cell_size: f32,
}

impl CheckerboardGeometry {
    /// Create a new checkerboard with the given colors and cell size
    pub fn new(color_a: [f32; 4], color_b: [f32; 4], cell_size: f32) -> Self {
        Self {
            color_a,
            color_b,
            cell_size: cell_size.max(1e-3),
        }
    }

    /// Get the color at a point of the XY plane
    pub fn color_for_position(&self, x: f32, y: f32) -> [f32; 4] {
        let cell_x = (x / self.cell_size).floor() as i32;
        let cell_y = (y / self.cell_size).floor() as i32;

        if (cell_x + cell_y).rem_euclid(2) == 0 {
            self.color_a
        } else {
            self.color_b
        }
    }
}
