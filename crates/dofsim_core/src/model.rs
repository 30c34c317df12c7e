//! Robot model: links, joints and geometry
//!
//! A [`RobotModel`] is a kinematic tree. Links are stored in a slotmap and
//! addressed by [`LinkKey`]; joints connect a parent link to a child link and
//! are kept in document order, which is also the order of the control vector.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::model_error::ModelError;
use crate::pose::Pose;

new_key_type! {
    /// Key to a link in a robot model
    pub struct LinkKey;
}

/// Shape of a visual or collision element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Triangle mesh stored in an external file
    Mesh {
        filename: String,
        scale: [f32; 3],
    },
    /// Axis-aligned box with full side lengths
    Box { size: [f32; 3] },
    /// Cylinder along the local Z axis
    Cylinder { radius: f32, length: f32 },
    /// Sphere centered at the origin
    Sphere { radius: f32 },
    /// Capsule along the local Z axis (length excludes the caps)
    Capsule { radius: f32, length: f32 },
}

impl Geometry {
    /// Mesh filename, if this is a mesh
    pub fn mesh_filename(&self) -> Option<&str> {
        match self {
            Geometry::Mesh { filename, .. } => Some(filename),
            _ => None,
        }
    }
}

/// Visual material
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name (may be empty for inline materials)
    pub name: String,
    /// Color as RGBA
    pub rgba: [f32; 4],
}

impl Material {
    /// Neutral grey used when a visual has no color
    pub const DEFAULT: Self = Self {
        name: String::new(),
        rgba: [0.5, 0.5, 0.5, 1.0],
    };

    /// Create an anonymous material
    pub fn from_rgba(rgba: [f32; 4]) -> Self {
        Self {
            name: String::new(),
            rgba,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Visual element of a link
#[derive(Clone, Debug, PartialEq)]
pub struct Visual {
    /// Pose relative to the link frame
    pub origin: Pose,
    pub geometry: Geometry,
    pub material: Material,
}

/// Collision element of a link
#[derive(Clone, Debug, PartialEq)]
pub struct Collision {
    /// Pose relative to the link frame
    pub origin: Pose,
    pub geometry: Geometry,
}

/// Mass properties of a link
#[derive(Clone, Debug, PartialEq)]
pub struct Inertial {
    /// Center of mass pose relative to the link frame
    pub origin: Pose,
    /// Mass in kilograms
    pub mass: f32,
    /// Inertia tensor `[ixx, ixy, ixz, iyy, iyz, izz]`
    pub inertia: [f32; 6],
}

/// A rigid link
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub name: String,
    pub visuals: Vec<Visual>,
    pub collisions: Vec<Collision>,
    /// Explicit mass properties; `None` means derive them from collisions
    pub inertial: Option<Inertial>,
}

impl Link {
    /// Create a link with no geometry
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visuals: Vec::new(),
            collisions: Vec::new(),
            inertial: None,
        }
    }

    /// Builder: add a visual
    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visuals.push(visual);
        self
    }

    /// Builder: add a collision
    pub fn with_collision(mut self, collision: Collision) -> Self {
        self.collisions.push(collision);
        self
    }
}

/// Joint type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointKind {
    /// Rotation about the axis, bounded by limits
    Revolute,
    /// Unbounded rotation about the axis
    Continuous,
    /// Translation along the axis, bounded by limits
    Prismatic,
    /// No relative motion
    Fixed,
    Floating,
    Planar,
    Spherical,
}

impl JointKind {
    /// Whether the joint has a single controllable degree of freedom
    pub const fn is_actuated(self) -> bool {
        matches!(self, Self::Revolute | Self::Continuous | Self::Prismatic)
    }

    /// Whether the joint rotates (as opposed to translating)
    pub const fn is_angular(self) -> bool {
        matches!(self, Self::Revolute | Self::Continuous)
    }
}

/// Joint limits
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    /// Lower position limit (rad or m)
    pub lower: f32,
    /// Upper position limit (rad or m)
    pub upper: f32,
    /// Maximum effort (Nm or N)
    pub effort: f32,
    /// Maximum velocity (rad/s or m/s)
    pub velocity: f32,
}

impl JointLimits {
    /// Whether a position range is set
    pub fn has_range(&self) -> bool {
        self.lower != 0.0 || self.upper != 0.0
    }

    /// Clamp a position into the limit range
    pub fn clamp(&self, position: f32) -> f32 {
        if self.has_range() && self.lower <= self.upper {
            position.clamp(self.lower, self.upper)
        } else {
            position
        }
    }
}

/// Joint damping and friction
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JointDynamics {
    pub damping: f32,
    pub friction: f32,
}

/// A joint connecting two links
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    pub name: String,
    pub kind: JointKind,
    /// Child frame relative to the parent link frame at zero position
    pub origin: Pose,
    /// Parent link name
    pub parent: String,
    /// Child link name
    pub child: String,
    /// Axis in the joint frame
    pub axis: [f32; 3],
    pub limits: JointLimits,
    pub dynamics: JointDynamics,
}

impl Joint {
    /// Create a revolute joint about Z with no limits
    pub fn revolute(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
        origin: Pose,
    ) -> Self {
        Self {
            name: name.into(),
            kind: JointKind::Revolute,
            origin,
            parent: parent.into(),
            child: child.into(),
            axis: [0.0, 0.0, 1.0],
            limits: JointLimits::default(),
            dynamics: JointDynamics::default(),
        }
    }

    /// Create a fixed joint
    pub fn fixed(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
        origin: Pose,
    ) -> Self {
        Self {
            kind: JointKind::Fixed,
            ..Self::revolute(name, parent, child, origin)
        }
    }

    /// Builder: set the axis
    pub fn with_axis(mut self, axis: [f32; 3]) -> Self {
        self.axis = axis;
        self
    }

    /// Builder: set limits
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Options from the `<mujoco><compiler .../></mujoco>` extension element
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Directory mesh files are resolved against
    pub meshdir: Option<PathBuf>,
    /// Derive mass properties from geometry when a link has none
    pub balance_inertia: bool,
}

/// A robot as a kinematic tree of links and joints
#[derive(Clone, Debug)]
pub struct RobotModel {
    name: String,
    links: SlotMap<LinkKey, Link>,
    link_index: HashMap<String, LinkKey>,
    joints: Vec<Joint>,
    root: LinkKey,
    /// Compiler extension options
    pub compiler: CompilerOptions,
}

impl RobotModel {
    /// Assemble a model, checking that links and joints form a single tree
    pub fn from_parts(
        name: impl Into<String>,
        links: Vec<Link>,
        joints: Vec<Joint>,
        compiler: CompilerOptions,
    ) -> Result<Self, ModelError> {
        let mut slots: SlotMap<LinkKey, Link> = SlotMap::with_key();
        let mut link_index = HashMap::new();
        for link in links {
            if link_index.contains_key(&link.name) {
                return Err(ModelError::DuplicateLink(link.name));
            }
            let name = link.name.clone();
            let key = slots.insert(link);
            link_index.insert(name, key);
        }

        let mut joint_names = HashSet::new();
        let mut children = HashSet::new();
        for joint in &joints {
            if !joint_names.insert(joint.name.as_str()) {
                return Err(ModelError::DuplicateJoint(joint.name.clone()));
            }
            for link in [&joint.parent, &joint.child] {
                if !link_index.contains_key(link) {
                    return Err(ModelError::UnknownLink {
                        joint: joint.name.clone(),
                        link: link.clone(),
                    });
                }
            }
            if !children.insert(joint.child.as_str()) {
                return Err(ModelError::MultipleParents(joint.child.clone()));
            }
        }

        let roots: Vec<&str> = slots
            .values()
            .map(|l| l.name.as_str())
            .filter(|n| !children.contains(n))
            .collect();
        let root = match roots.as_slice() {
            [] => {
                return Err(if slots.is_empty() {
                    ModelError::MissingRoot
                } else {
                    ModelError::Cycle
                })
            }
            [single] => link_index[*single],
            many => {
                return Err(ModelError::MultipleRoots(
                    many.iter().map(|s| s.to_string()).collect(),
                ))
            }
        };

        let model = Self {
            name: name.into(),
            links: slots,
            link_index,
            joints,
            root,
            compiler,
        };

        // Every non-root link must be reachable from the root; anything left over sits on a cycle
        if model.traversal_order().len() + 1 != model.links.len() {
            return Err(ModelError::Cycle);
        }

        Ok(model)
    }

    /// Robot name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Number of joints (of any kind)
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Get a link by key
    pub fn link(&self, key: LinkKey) -> Option<&Link> {
        self.links.get(key)
    }

    /// Get a link and its key by name
    pub fn link_by_name(&self, name: &str) -> Option<(LinkKey, &Link)> {
        let key = *self.link_index.get(name)?;
        self.links.get(key).map(|link| (key, link))
    }

    /// Key of the root link
    pub fn root_key(&self) -> LinkKey {
        self.root
    }

    /// The root link
    pub fn root(&self) -> &Link {
        &self.links[self.root]
    }

    /// All links, in insertion order
    pub fn links(&self) -> impl Iterator<Item = (LinkKey, &Link)> {
        self.links.iter()
    }

    /// All joints, in document order
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Get a joint by name
    pub fn joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// Joints whose parent is the given link
    pub fn children_of<'a>(&'a self, link: &'a str) -> impl Iterator<Item = &'a Joint> + 'a {
        self.joints.iter().filter(move |j| j.parent == link)
    }

    /// The joint whose child is the given link (`None` for the root)
    pub fn parent_joint_of(&self, link: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.child == link)
    }

    /// Joints in breadth-first order from the root
    ///
    /// A parent link always precedes its children, so walking this list can
    /// accumulate world poses link by link.
    pub fn traversal_order(&self) -> Vec<&Joint> {
        let mut order = Vec::with_capacity(self.joints.len());
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(self.links[self.root].name.as_str());
        visited.insert(self.links[self.root].name.as_str());

        while let Some(parent) = queue.pop_front() {
            for joint in self.children_of(parent) {
                if visited.insert(joint.child.as_str()) {
                    order.push(joint);
                    queue.push_back(joint.child.as_str());
                }
            }
        }

        order
    }

    /// Joints with a controllable degree of freedom, in document order
    pub fn actuated_joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.iter().filter(|j| j.kind.is_actuated())
    }

    /// Number of controllable degrees of freedom
    pub fn dof(&self) -> usize {
        self.actuated_joints().count()
    }

    /// Rest pose of every link (all joints at zero) in the model frame
    pub fn rest_poses(&self) -> HashMap<String, nalgebra::Isometry3<f32>> {
        let mut poses = HashMap::with_capacity(self.links.len());
        poses.insert(
            self.links[self.root].name.clone(),
            nalgebra::Isometry3::identity(),
        );
        for joint in self.traversal_order() {
            let parent = poses[&joint.parent];
            poses.insert(joint.child.clone(), parent * joint.origin.to_isometry());
        }
        poses
    }

    /// All mesh filenames referenced by visuals and collisions (deduplicated)
    pub fn mesh_filenames(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for link in self.links.values() {
            let geoms = link
                .visuals
                .iter()
                .map(|v| &v.geometry)
                .chain(link.collisions.iter().map(|c| &c.geometry));
            for geometry in geoms {
                if let Some(name) = geometry.mesh_filename() {
                    if seen.insert(name) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }
}
