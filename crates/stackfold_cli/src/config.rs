//! CLI configuration file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use stackfold_core::{RetentionMarker, RETAIN_POLICY};
use stackfold_yaml::TemplateLoader;

/// Looked up in the working directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = ".stackfold.yaml";

/// Settings read from the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackfoldConfig {
    /// Evaluate macros unless `--no-macros` is given.
    pub macros: bool,
    pub retain: RetainConfig,
}

/// Settings for the `retain` command.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetainConfig {
    /// Deletion policy to apply (e.g. "Retain", "Snapshot")
    pub deletion_policy: String,
    /// Resource types treated as stateful in addition to the built-in set
    pub extra_stateful_types: Vec<String>,
}

impl Default for RetainConfig {
    fn default() -> Self {
        Self {
            deletion_policy: RETAIN_POLICY.to_string(),
            extra_stateful_types: Vec::new(),
        }
    }
}

impl StackfoldConfig {
    /// Load configuration from an explicit path, the default file, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", path);
        let content = fs::read_to_string(path)
            .with_context(|| format!("Configuration file not found: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Template loader honoring the command-line macro flag over the config.
    pub fn loader(&self, macros_override: Option<bool>) -> TemplateLoader {
        TemplateLoader::new().evaluate_macros(macros_override.unwrap_or(self.macros))
    }

    pub fn retention_marker(&self) -> RetentionMarker {
        RetentionMarker::standard()
            .with_types(self.retain.extra_stateful_types.iter().cloned())
            .with_deletion_policy(self.retain.deletion_policy.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = StackfoldConfig::default();
        assert!(!config.macros);
        assert_eq!(config.retain.deletion_policy, "Retain");
        assert!(!config.loader(None).evaluates_macros());
        assert!(config.loader(Some(true)).evaluates_macros());
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stackfold.yaml");
        fs::write(
            &path,
            "macros: true\nretain:\n  extra_stateful_types: [AWS::RDS::DBInstance]\n",
        )
        .unwrap();

        let config = StackfoldConfig::from_file(&path).unwrap();
        assert!(config.macros);
        assert_eq!(config.retain.deletion_policy, "Retain");
        assert!(config.retention_marker().is_stateful("AWS::RDS::DBInstance"));
        assert!(config.retention_marker().is_stateful("AWS::S3::Bucket"));
        assert!(!config.loader(Some(false)).evaluates_macros());
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stackfold.yaml");
        fs::write(&path, "\n").unwrap();

        assert!(!StackfoldConfig::from_file(&path).unwrap().macros);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stackfold.yaml");
        fs::write(&path, "macro: true\n").unwrap();

        assert!(StackfoldConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(StackfoldConfig::load(Some(&dir.path().join("absent.yaml"))).is_err());
    }
}
