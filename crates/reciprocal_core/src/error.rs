use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Unified error type for reciprocal operations
#[derive(Debug, Error)]
pub enum ReciprocalError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // Frontmatter errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // Patch errors
    #[error("Could not update '{property}' for [[{note}]]: {reason}")]
    PatchFailed {
        note: String,
        property: String,
        reason: String,
    },

    // Store errors
    #[error("Vault not found at '{0}'")]
    VaultNotFound(PathBuf),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias for reciprocal operations
pub type Result<T> = std::result::Result<T, ReciprocalError>;

/// A serializable representation of [`ReciprocalError`] for host notifications
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Associated path (if applicable)
    pub path: Option<PathBuf>,
}

impl From<&ReciprocalError> for SerializableError {
    fn from(err: &ReciprocalError) -> Self {
        let kind = match err {
            ReciprocalError::Io(_) => "Io",
            ReciprocalError::FileRead { .. } => "FileRead",
            ReciprocalError::FileWrite { .. } => "FileWrite",
            ReciprocalError::Yaml(_) => "Yaml",
            ReciprocalError::PatchFailed { .. } => "PatchFailed",
            ReciprocalError::VaultNotFound(_) => "VaultNotFound",
            ReciprocalError::ConfigParse(_) => "ConfigParse",
            ReciprocalError::ConfigSerialize(_) => "ConfigSerialize",
            ReciprocalError::NoConfigDir => "NoConfigDir",
        }
        .to_string();

        let path = match err {
            ReciprocalError::FileRead { path, .. } => Some(path.clone()),
            ReciprocalError::FileWrite { path, .. } => Some(path.clone()),
            ReciprocalError::VaultNotFound(path) => Some(path.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            path,
        }
    }
}

impl ReciprocalError {
    /// Convert to a serializable representation for host notifications
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializable_keeps_path() {
        let err = ReciprocalError::FileWrite {
            path: PathBuf::from("notes/B.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let ser = err.to_serializable();
        assert_eq!(ser.kind, "FileWrite");
        assert_eq!(ser.path, Some(PathBuf::from("notes/B.md")));
        assert!(ser.message.contains("notes/B.md"));
    }

    #[test]
    fn test_patch_failed_message_names_note() {
        let err = ReciprocalError::PatchFailed {
            note: "Summer".to_string(),
            property: "outfits".to_string(),
            reason: "body changed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Could not update 'outfits' for [[Summer]]: body changed"
        );
    }
}
