//! Model loading error types

use std::fmt;
use std::io;

/// Error type for loading and assembling a robot model
#[derive(Debug)]
pub enum ModelError {
    /// IO error reading a description file
    Io(io::Error),
    /// The description could not be parsed
    Parse(String),
    /// The model has no links
    MissingRoot,
    /// More than one link has no parent joint
    MultipleRoots(Vec<String>),
    /// A joint references a link that does not exist
    UnknownLink { joint: String, link: String },
    /// Two links share a name
    DuplicateLink(String),
    /// Two joints share a name
    DuplicateJoint(String),
    /// A link is the child of more than one joint
    MultipleParents(String),
    /// The joints do not form a tree
    Cycle,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Io(err) => write!(f, "Model IO error: {}", err),
            ModelError::Parse(msg) => write!(f, "Model parse error: {}", msg),
            ModelError::MissingRoot => write!(f, "Model has no root link"),
            ModelError::MultipleRoots(roots) => {
                write!(f, "Model has multiple root links: {}", roots.join(", "))
            }
            ModelError::UnknownLink { joint, link } => {
                write!(f, "Joint '{}' references unknown link '{}'", joint, link)
            }
            ModelError::DuplicateLink(name) => write!(f, "Duplicate link name: '{}'", name),
            ModelError::DuplicateJoint(name) => write!(f, "Duplicate joint name: '{}'", name),
            ModelError::MultipleParents(name) => {
                write!(f, "Link '{}' is the child of more than one joint", name)
            }
            ModelError::Cycle => write!(f, "Joints form a cycle"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ModelError {
    fn from(err: io::Error) -> Self {
        ModelError::Io(err)
    }
}

impl From<urdf_rs::UrdfError> for ModelError {
    fn from(err: urdf_rs::UrdfError) -> Self {
        ModelError::Parse(err.to_string())
    }
}

impl From<roxmltree::Error> for ModelError {
    fn from(err: roxmltree::Error) -> Self {
        ModelError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(format!("{}", ModelError::Cycle), "Joints form a cycle");
        let err = ModelError::UnknownLink {
            joint: "joint1".to_string(),
            link: "link9".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("joint1"));
        assert!(msg.contains("link9"));
        let roots = ModelError::MultipleRoots(vec!["a".into(), "b".into()]);
        assert!(format!("{}", roots).contains("a, b"));
    }

    #[test]
    fn test_io_source() {
        use std::error::Error;

        let err: ModelError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(err.source().is_some());
        assert!(ModelError::MissingRoot.source().is_none());
    }
}
