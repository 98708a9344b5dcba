//! Configuration types for reciprocal.
//!
//! This module provides the [`Config`] struct which stores the property pairs
//! to keep in sync and how removals behave. Configuration is persisted as TOML
//! (typically at `~/.config/reciprocal/config.toml` on Unix systems).
//!
//! # Example
//!
//! ```
//! use reciprocal_core::config::{Config, PropertyPair};
//!
//! let mut config = Config::default();
//! assert!(config.add_pair(PropertyPair::new("mentors", "mentees")));
//! // The same relation written the other way round is not added twice.
//! assert!(!config.add_pair(PropertyPair::new("mentees", "mentors")));
//!
//! let toml = toml::to_string_pretty(&config).unwrap();
//! assert!(toml.contains("mentees"));
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use ts_rs::TS;

use crate::error::{ReciprocalError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::patch::RemovalPolicy;

/// Two properties that mirror each other across notes.
///
/// When note A lists `[[B]]` under `property_a`, note B gets `[[A]]` under
/// `property_b`, and the other way round. Equal names make a self-reciprocal
/// property such as `related`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PropertyPair {
    /// Property on the source note.
    pub property_a: String,
    /// Property on the linked note.
    pub property_b: String,
}

impl PropertyPair {
    /// Create a pair.
    pub fn new(property_a: impl Into<String>, property_b: impl Into<String>) -> Self {
        Self {
            property_a: property_a.into(),
            property_b: property_b.into(),
        }
    }

    /// Whether both sides use the same property.
    pub fn is_symmetric(&self) -> bool {
        self.property_a == self.property_b
    }

    /// Same relation regardless of which side is written first.
    pub fn same_relation(&self, other: &PropertyPair) -> bool {
        (self.property_a == other.property_a && self.property_b == other.property_b)
            || (self.property_a == other.property_b && self.property_b == other.property_a)
    }

    /// `(own property, reciprocal property)` for each side, once per
    /// distinct side.
    pub fn sides(&self) -> Vec<(&str, &str)> {
        let mut sides = vec![(self.property_a.as_str(), self.property_b.as_str())];
        if !self.is_symmetric() {
            sides.push((self.property_b.as_str(), self.property_a.as_str()));
        }
        sides
    }
}

impl std::fmt::Display for PropertyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <-> {}", self.property_a, self.property_b)
    }
}

fn default_pairs() -> Vec<PropertyPair> {
    vec![
        PropertyPair::new("related", "related"),
        PropertyPair::new("wardrobe", "outfits"),
    ]
}

/// `Config` is the part of reciprocal the user can configure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Vault directory used when no `--vault` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<PathBuf>,

    /// What happens when the last reference leaves a property.
    #[serde(default)]
    pub removal_policy: RemovalPolicy,

    /// Properties kept in sync, in order.
    #[serde(default = "default_pairs")]
    pub property_pairs: Vec<PropertyPair>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault: None,
            removal_policy: RemovalPolicy::default(),
            property_pairs: default_pairs(),
        }
    }
}

impl Config {
    /// Add a pair unless the same relation is already configured.
    /// Returns `true` if it was added.
    pub fn add_pair(&mut self, pair: PropertyPair) -> bool {
        if self.property_pairs.iter().any(|p| p.same_relation(&pair)) {
            return false;
        }
        self.property_pairs.push(pair);
        true
    }

    /// Remove a pair in either orientation. Returns `true` if one was removed.
    pub fn remove_pair(&mut self, pair: &PropertyPair) -> bool {
        let before = self.property_pairs.len();
        self.property_pairs.retain(|p| !p.same_relation(pair));
        self.property_pairs.len() != before
    }

    /// Resolve the vault directory: explicit override, then the configured
    /// vault, then the current directory.
    pub fn vault_dir(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit.or(self.vault.as_deref()) {
            return Ok(path.to_path_buf());
        }
        Ok(std::env::current_dir()?)
    }

    /// Load config from a specific path.
    pub fn load_from<FS: FileSystem>(fs: &FS, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .map_err(|e| ReciprocalError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config from a specific path, returning the default if the file
    /// does not exist. A file that exists but does not parse is an error.
    pub fn load_from_or_default<FS: FileSystem>(fs: &FS, path: &Path) -> Result<Self> {
        if !fs.exists(path) {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Self::load_from(fs, path)
    }

    /// Save config to a specific path.
    pub fn save_to<FS: FileSystem>(&self, fs: &FS, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs.create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs.write_file(path, &contents)
            .map_err(|e| ReciprocalError::FileWrite {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// Get the config file path (~/.config/reciprocal/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("reciprocal").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from_or_default(&RealFileSystem, &path),
            None => Ok(Config::default()),
        }
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(ReciprocalError::NoConfigDir)?;
        self.save_to(&RealFileSystem, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.removal_policy, RemovalPolicy::RemoveProperty);
        assert_eq!(config.property_pairs.len(), 2);
        assert!(config.property_pairs[0].is_symmetric());
        assert!(!config.property_pairs[1].is_symmetric());
    }

    #[test]
    fn test_sides() {
        let symmetric = PropertyPair::new("related", "related");
        assert_eq!(symmetric.sides(), vec![("related", "related")]);

        let pair = PropertyPair::new("wardrobe", "outfits");
        assert_eq!(
            pair.sides(),
            vec![("wardrobe", "outfits"), ("outfits", "wardrobe")]
        );
    }

    #[test]
    fn test_remove_pair_either_orientation() {
        let mut config = Config::default();
        assert!(config.remove_pair(&PropertyPair::new("outfits", "wardrobe")));
        assert!(!config.remove_pair(&PropertyPair::new("outfits", "wardrobe")));
        assert_eq!(config.property_pairs, vec![PropertyPair::new("related", "related")]);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let fs = InMemoryFileSystem::new();
        let config = Config::load_from_or_default(&fs, Path::new("cfg/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let fs = InMemoryFileSystem::new();
        let path = Path::new("cfg/reciprocal/config.toml");

        let mut config = Config::default();
        config.vault = Some(PathBuf::from("/notes"));
        config.removal_policy = RemovalPolicy::KeepEmptyArray;
        config.add_pair(PropertyPair::new("parent", "children"));
        config.save_to(&fs, path).unwrap();

        let saved = fs.get_content(path).unwrap();
        assert!(saved.contains("removal_policy = \"keep_empty_array\""));

        let loaded = Config::load_from(&fs, path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let fs = InMemoryFileSystem::new().with_file("config.toml", "vault = \"/v\"\n");
        let config = Config::load_from(&fs, Path::new("config.toml")).unwrap();
        assert_eq!(config.vault, Some(PathBuf::from("/v")));
        assert_eq!(config.property_pairs, default_pairs());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let fs = InMemoryFileSystem::new().with_file("config.toml", "property_pairs = 3");
        assert!(matches!(
            Config::load_from_or_default(&fs, Path::new("config.toml")),
            Err(ReciprocalError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_native_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::default();
        config.save_to(&RealFileSystem, &path).unwrap();
        assert_eq!(Config::load_from(&RealFileSystem, &path).unwrap(), config);
    }

    #[test]
    fn test_vault_dir_precedence() {
        let mut config = Config::default();
        config.vault = Some(PathBuf::from("/configured"));
        assert_eq!(
            config.vault_dir(Some(Path::new("/explicit"))).unwrap(),
            PathBuf::from("/explicit")
        );
        assert_eq!(config.vault_dir(None).unwrap(), PathBuf::from("/configured"));
    }
}
