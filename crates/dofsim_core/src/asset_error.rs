//! Asset error types
//!
//! Provides error handling for mesh loading and caching.

use std::fmt;
use std::io;

/// Error type for asset operations
#[derive(Debug)]
pub enum AssetError {
    /// IO error (permission denied, truncated file, etc.)
    Io(io::Error),
    /// Parse error (invalid file contents)
    Parse(String),
    /// Asset file does not exist
    NotFound(String),
    /// File extension is not a supported mesh format
    Unsupported(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io(err) => write!(f, "Asset IO error: {}", err),
            AssetError::Parse(msg) => write!(f, "Asset parse error: {}", msg),
            AssetError::NotFound(path) => write!(f, "Asset not found: {}", path),
            AssetError::Unsupported(path) => write!(f, "Unsupported asset format: {}", path),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AssetError {
    fn from(err: io::Error) -> Self {
        AssetError::Io(err)
    }
}

impl From<String> for AssetError {
    fn from(msg: String) -> Self {
        AssetError::Parse(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "locked");
        let msg = format!("{}", AssetError::Io(io_err));
        assert!(msg.contains("IO error"));
        assert!(msg.contains("locked"));
    }

    #[test]
    fn test_not_found_display() {
        let err = AssetError::NotFound("meshes/link1.STL".to_string());
        assert_eq!(format!("{}", err), "Asset not found: meshes/link1.STL");
    }

    #[test]
    fn test_unsupported_display() {
        let err = AssetError::Unsupported("arm.dae".to_string());
        assert!(format!("{}", err).contains("arm.dae"));
    }

    #[test]
    fn test_from_string() {
        let err: AssetError = "bad header".to_string().into();
        assert!(matches!(err, AssetError::Parse(ref m) if m == "bad header"));
    }

    #[test]
    fn test_error_source() {
        use std::error::Error;

        let err = AssetError::Io(io::Error::new(io::ErrorKind::Other, "x"));
        assert!(err.source().is_some());
        assert!(AssetError::NotFound("p".into()).source().is_none());
    }
}
