//! Demo configuration module.
//!
//! This module loads settings for the `disktree` demo binary from environment
//! variables.
//!
//! # Environment Variables
//!
//! - `DISKTREE_FILE`: Path of the record file (default: `binaryTree.dat`)
//! - `DISKTREE_FRESH`: Delete the file before running (default: `true`)

use std::path::PathBuf;

/// Demo configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Path of the record file.
    pub file: PathBuf,
    /// Whether to start from an empty file.
    pub fresh: bool,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl DemoConfig {
    /// Default record file path.
    pub const DEFAULT_FILE: &'static str = "binaryTree.dat";

    const FILE_VAR: &'static str = "DISKTREE_FILE";
    const FRESH_VAR: &'static str = "DISKTREE_FRESH";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `DISKTREE_FRESH` is set but is not a boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let file = lookup(Self::FILE_VAR)
            .filter(|value| !value.is_empty())
            .map_or_else(|| PathBuf::from(Self::DEFAULT_FILE), PathBuf::from);

        let fresh = match lookup(Self::FRESH_VAR) {
            Some(value) => parse_bool(Self::FRESH_VAR, &value)?,
            None => true,
        };

        Ok(Self { file, fresh })
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a boolean (expected true/false/1/0)"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<DemoConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DemoConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]).expect("load");
        assert_eq!(config.file, PathBuf::from("binaryTree.dat"));
        assert!(config.fresh);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[("DISKTREE_FILE", "/tmp/t.dat"), ("DISKTREE_FRESH", "0")])
            .expect("load");
        assert_eq!(config.file, PathBuf::from("/tmp/t.dat"));
        assert!(!config.fresh);

        let config = load(&[("DISKTREE_FRESH", " TRUE ")]).expect("load");
        assert!(config.fresh);
    }

    #[test]
    fn test_empty_file_falls_back_to_default() {
        let config = load(&[("DISKTREE_FILE", "")]).expect("load");
        assert_eq!(config.file, PathBuf::from(DemoConfig::DEFAULT_FILE));
    }

    #[test]
    fn test_invalid_fresh() {
        let error = load(&[("DISKTREE_FRESH", "maybe")]).expect_err("should fail");
        assert_eq!(
            error.to_string(),
            "invalid value for DISKTREE_FRESH: 'maybe' is not a boolean (expected true/false/1/0)"
        );
    }
}
