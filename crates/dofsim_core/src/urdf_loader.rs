//! URDF loading
//!
//! Parsing is done by `urdf-rs`; this module converts its types into the
//! crate's own [`RobotModel`]. The MuJoCo `<mujoco><compiler/></mujoco>`
//! extension block is read with `roxmltree` and removed before the document
//! is handed to `urdf-rs`.
//!
//! Visual materials are also read with `roxmltree`: `urdf-rs` drops a
//! `<material name="..."/>` reference inside `<visual>`, so the name would
//! never reach the robot-level material table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::{
    Collision, CompilerOptions, Geometry, Inertial, Joint, JointDynamics, JointKind, JointLimits,
    Link, Material, RobotModel, Visual,
};
use crate::model_error::ModelError;
use crate::pose::Pose;

/// Parse a URDF document into a robot model
pub fn parse_urdf(xml: &str) -> Result<RobotModel, ModelError> {
    // The XML declaration must be the first thing in the document
    let xml = xml.trim_start();
    let pre = preparse(xml)?;
    let robot = urdf_rs::read_from_string(&pre.stripped)?;
    convert_robot(robot, pre.compiler, &pre.visual_materials)
}

/// Load a URDF file into a robot model
///
/// A relative `meshdir` from the compiler block is resolved against the
/// directory containing the file.
pub fn load_urdf(path: impl AsRef<Path>) -> Result<RobotModel, ModelError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path)?;
    let mut model = parse_urdf(&xml)?;
    if let (Some(meshdir), Some(parent)) = (model.compiler.meshdir.as_ref(), path.parent()) {
        if meshdir.is_relative() {
            model.compiler.meshdir = Some(parent.join(meshdir));
        }
    }
    Ok(model)
}

impl RobotModel {
    /// Parse a URDF document
    pub fn from_urdf_str(xml: &str) -> Result<Self, ModelError> {
        parse_urdf(xml)
    }

    /// Load a URDF file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        load_urdf(path)
    }
}

/// Material reference written inside a `<visual>`
#[derive(Clone, Debug, Default, PartialEq)]
struct MaterialRef {
    name: String,
    /// Inline `<color rgba>`, if any
    rgba: Option<[f32; 4]>,
}

/// Per link, the material of each `<visual>` in document order
type VisualMaterials = HashMap<String, Vec<Option<MaterialRef>>>;

/// What is read from the raw document before `urdf-rs` sees it
struct Preparsed {
    /// The document without `<mujoco>` elements
    stripped: String,
    compiler: CompilerOptions,
    visual_materials: VisualMaterials,
}

fn preparse(xml: &str) -> Result<Preparsed, ModelError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    let mut compiler = CompilerOptions::default();
    let mut ranges = Vec::new();

    for ext in root.children().filter(|n| n.has_tag_name("mujoco")) {
        ranges.push(ext.range());
        for node in ext.children().filter(|n| n.has_tag_name("compiler")) {
            if let Some(dir) = node.attribute("meshdir") {
                compiler.meshdir = Some(PathBuf::from(dir));
            }
            if let Some(flag) = node.attribute("balanceinertia") {
                compiler.balance_inertia = flag == "true";
            }
        }
    }

    let mut visual_materials = VisualMaterials::new();
    for link in root.children().filter(|n| n.has_tag_name("link")) {
        let Some(name) = link.attribute("name") else {
            continue;
        };
        let refs = link
            .children()
            .filter(|n| n.has_tag_name("visual"))
            .map(|visual| {
                let material = visual.children().find(|n| n.has_tag_name("material"))?;
                let rgba = material
                    .children()
                    .find(|n| n.has_tag_name("color"))
                    .and_then(|c| c.attribute("rgba"))
                    .and_then(parse_rgba);
                Some(MaterialRef {
                    name: material.attribute("name").unwrap_or_default().to_string(),
                    rgba,
                })
            })
            .collect();
        visual_materials.insert(name.to_string(), refs);
    }

    let mut stripped = xml.to_string();
    for range in ranges.into_iter().rev() {
        stripped.replace_range(range, "");
    }
    Ok(Preparsed {
        stripped,
        compiler,
        visual_materials,
    })
}

fn parse_rgba(text: &str) -> Option<[f32; 4]> {
    let values: Vec<f32> = text
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    values.try_into().ok()
}

fn convert_robot(
    robot: urdf_rs::Robot,
    compiler: CompilerOptions,
    visual_materials: &VisualMaterials,
) -> Result<RobotModel, ModelError> {
    // Named materials declared at robot level can be referenced from visuals
    let named: HashMap<&str, [f32; 4]> = robot
        .materials
        .iter()
        .filter_map(|m| m.color.as_ref().map(|c| (m.name.as_str(), rgba(&c.rgba))))
        .collect();

    let links = robot
        .links
        .iter()
        .map(|link| {
            let refs = visual_materials
                .get(&link.name)
                .map(Vec::as_slice)
                .unwrap_or_default();
            convert_link(link, refs, &named)
        })
        .collect();
    let joints = robot.joints.iter().map(convert_joint).collect();

    log::debug!(
        "Parsed URDF '{}': {} links, {} joints",
        robot.name,
        robot.links.len(),
        robot.joints.len()
    );

    RobotModel::from_parts(robot.name.clone(), links, joints, compiler)
}

fn convert_link(
    link: &urdf_rs::Link,
    refs: &[Option<MaterialRef>],
    named: &HashMap<&str, [f32; 4]>,
) -> Link {
    let visuals = link
        .visual
        .iter()
        .enumerate()
        .map(|(i, v)| Visual {
            origin: pose(&v.origin),
            geometry: geometry(&v.geometry),
            material: refs
                .get(i)
                .and_then(Option::as_ref)
                .map(|m| material(m, named))
                .unwrap_or_default(),
        })
        .collect();

    let collisions = link
        .collision
        .iter()
        .map(|c| Collision {
            origin: pose(&c.origin),
            geometry: geometry(&c.geometry),
        })
        .collect();

    // urdf-rs fills a zero mass when <inertial> is absent
    let mass = link.inertial.mass.value as f32;
    let inertial = (mass.is_finite() && mass > 0.0).then(|| {
        let i = &link.inertial.inertia;
        Inertial {
            origin: pose(&link.inertial.origin),
            mass,
            inertia: [
                i.ixx as f32,
                i.ixy as f32,
                i.ixz as f32,
                i.iyy as f32,
                i.iyz as f32,
                i.izz as f32,
            ],
        }
    });

    Link {
        name: link.name.clone(),
        visuals,
        collisions,
        inertial,
    }
}

fn convert_joint(joint: &urdf_rs::Joint) -> Joint {
    let kind = match joint.joint_type {
        urdf_rs::JointType::Revolute => JointKind::Revolute,
        urdf_rs::JointType::Continuous => JointKind::Continuous,
        urdf_rs::JointType::Prismatic => JointKind::Prismatic,
        urdf_rs::JointType::Fixed => JointKind::Fixed,
        urdf_rs::JointType::Floating => JointKind::Floating,
        urdf_rs::JointType::Planar => JointKind::Planar,
        urdf_rs::JointType::Spherical => JointKind::Spherical,
    };

    Joint {
        name: joint.name.clone(),
        kind,
        origin: pose(&joint.origin),
        parent: joint.parent.link.clone(),
        child: joint.child.link.clone(),
        axis: vec3(&joint.axis.xyz),
        limits: JointLimits {
            lower: joint.limit.lower as f32,
            upper: joint.limit.upper as f32,
            effort: joint.limit.effort as f32,
            velocity: joint.limit.velocity as f32,
        },
        dynamics: joint
            .dynamics
            .as_ref()
            .map(|d| JointDynamics {
                damping: d.damping as f32,
                friction: d.friction as f32,
            })
            .unwrap_or_default(),
    }
}

fn geometry(geometry: &urdf_rs::Geometry) -> Geometry {
    match geometry {
        urdf_rs::Geometry::Mesh { filename, scale } => Geometry::Mesh {
            filename: filename.clone(),
            scale: scale.as_ref().map(vec3).unwrap_or([1.0; 3]),
        },
        urdf_rs::Geometry::Box { size } => Geometry::Box { size: vec3(size) },
        urdf_rs::Geometry::Cylinder { radius, length } => Geometry::Cylinder {
            radius: *radius as f32,
            length: *length as f32,
        },
        urdf_rs::Geometry::Capsule { radius, length } => Geometry::Capsule {
            radius: *radius as f32,
            length: *length as f32,
        },
        urdf_rs::Geometry::Sphere { radius } => Geometry::Sphere {
            radius: *radius as f32,
        },
    }
}

/// Inline color first, then the robot-level material of the same name
fn material(material: &MaterialRef, named: &HashMap<&str, [f32; 4]>) -> Material {
    let color = material
        .rgba
        .or_else(|| named.get(material.name.as_str()).copied());
    Material {
        name: material.name.clone(),
        rgba: color.unwrap_or(Material::DEFAULT.rgba),
    }
}

fn pose(pose: &urdf_rs::Pose) -> Pose {
    Pose::new(vec3(&pose.xyz), vec3(&pose.rpy))
}

fn vec3(v: &urdf_rs::Vec3) -> [f32; 3] {
    [v[0] as f32, v[1] as f32, v[2] as f32]
}

fn rgba(v: &urdf_rs::Vec4) -> [f32; 4] {
    [v[0] as f32, v[1] as f32, v[2] as f32, v[3] as f32]
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_LINK: &str = r#"
<?xml version="1.0"?>
<robot name="two_link">
    <material name="blue">
        <color rgba="0 0 1 1"/>
    </material>
    <link name="base">
        <collision>
            <geometry><box size="0.1 0.2 0.3"/></geometry>
        </collision>
    </link>
    <link name="arm">
        <inertial>
            <origin xyz="0 0 0.05" rpy="0 0 0"/>
            <mass value="0.5"/>
            <inertia ixx="0.01" ixy="0" ixz="0" iyy="0.02" iyz="0" izz="0.03"/>
        </inertial>
        <visual>
            <geometry><cylinder radius="0.02" length="0.1"/></geometry>
            <material name="blue"/>
        </visual>
    </link>
    <joint name="hinge" type="continuous">
        <origin xyz="0 0 0.15" rpy="0 0 0"/>
        <parent link="base"/>
        <child link="arm"/>
        <axis xyz="0 1 0"/>
        <dynamics damping="0.1" friction="0.0"/>
    </joint>
</robot>
"#;

    #[test]
    fn test_parse_with_leading_whitespace() {
        let model = parse_urdf(TWO_LINK).unwrap();
        assert_eq!(model.name(), "two_link");
        assert_eq!(model.link_count(), 2);
        assert_eq!(model.root().name, "base");
        assert_eq!(model.compiler, CompilerOptions::default());
    }

    #[test]
    fn test_joint_conversion() {
        let model = parse_urdf(TWO_LINK).unwrap();
        let hinge = model.joint_by_name("hinge").unwrap();
        assert_eq!(hinge.kind, JointKind::Continuous);
        assert_eq!(hinge.axis, [0.0, 1.0, 0.0]);
        assert!((hinge.origin.xyz[2] - 0.15).abs() < 1e-6);
        assert!((hinge.dynamics.damping - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_named_material_lookup() {
        let model = parse_urdf(TWO_LINK).unwrap();
        let (_, arm) = model.link_by_name("arm").unwrap();
        assert_eq!(arm.visuals[0].material.rgba, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_inertial_presence() {
        let model = parse_urdf(TWO_LINK).unwrap();
        let (_, base) = model.link_by_name("base").unwrap();
        let (_, arm) = model.link_by_name("arm").unwrap();
        assert!(base.inertial.is_none());
        let inertial = arm.inertial.as_ref().unwrap();
        assert!((inertial.mass - 0.5).abs() < 1e-6);
        assert!((inertial.inertia[5] - 0.03).abs() < 1e-6);
    }

    #[test]
    fn test_compiler_extension_extracted() {
        let xml = r#"<?xml version="1.0"?>
<robot name="ext">
    <mujoco>
        <compiler meshdir="meshes/" balanceinertia="true"/>
    </mujoco>
    <link name="only"/>
</robot>"#;
        let model = parse_urdf(xml).unwrap();
        assert_eq!(model.compiler.meshdir, Some(PathBuf::from("meshes/")));
        assert!(model.compiler.balance_inertia);
    }

    #[test]
    fn test_compiler_stripped_document() {
        let xml = r#"<robot name="x"><mujoco><compiler meshdir="m"/></mujoco><link name="a"/></robot>"#;
        let pre = preparse(xml).unwrap();
        assert!(!pre.stripped.contains("mujoco"));
        assert!(pre.stripped.contains(r#"<link name="a"/>"#));
        assert_eq!(pre.compiler.meshdir, Some(PathBuf::from("m")));
    }

    #[test]
    fn test_inline_visual_color_wins() {
        let xml = r#"<robot name="c">
    <material name="blue"><color rgba="0 0 1 1"/></material>
    <link name="a">
        <visual>
            <geometry><sphere radius="0.1"/></geometry>
            <material name="blue"><color rgba="1 0 0 0.5"/></material>
        </visual>
        <visual>
            <geometry><sphere radius="0.1"/></geometry>
        </visual>
        <visual>
            <geometry><sphere radius="0.1"/></geometry>
            <material name="unknown"/>
        </visual>
    </link>
</robot>"#;
        let model = parse_urdf(xml).unwrap();
        let (_, link) = model.link_by_name("a").unwrap();
        assert_eq!(link.visuals[0].material.rgba, [1.0, 0.0, 0.0, 0.5]);
        assert_eq!(link.visuals[0].material.name, "blue");
        assert_eq!(link.visuals[1].material, Material::default());
        assert_eq!(link.visuals[2].material.name, "unknown");
        assert_eq!(link.visuals[2].material.rgba, Material::DEFAULT.rgba);
    }

    #[test]
    fn test_rgba_needs_four_values() {
        assert_eq!(parse_rgba("0.1 0.2 0.3 1"), Some([0.1, 0.2, 0.3, 1.0]));
        assert_eq!(parse_rgba("0.1 0.2 0.3"), None);
        assert_eq!(parse_rgba("red"), None);
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = parse_urdf("<robot name=\"broken\"><link></robot>").unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = RobotModel::load("/nonexistent/robot.urdf").unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn test_relative_meshdir_resolved_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("robot.urdf");
        std::fs::write(
            &path,
            r#"<robot name="r"><mujoco><compiler meshdir="meshes"/></mujoco><link name="a"/></robot>"#,
        )
        .unwrap();
        let model = RobotModel::load(&path).unwrap();
        assert_eq!(model.compiler.meshdir, Some(dir.path().join("meshes")));
    }
}
