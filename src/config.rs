//! Inference configuration (`template-infer.yaml`)
//!
//! ```yaml
//! templates_dir: src/main/resources/templates
//! suffix: .html
//! follow_references: true
//! max_depth: 16
//! reserved_roots: [messages, helpers]
//! ```
//!
//! Every field is optional; missing fields take the defaults below.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::InferError;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "template-infer.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferConfig {
    pub templates_dir: PathBuf,
    pub suffix: String,
    pub follow_references: bool,
    pub max_depth: usize,
    pub reserved_roots: Vec<String>,
}

impl Default for InferConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            suffix: ".html".to_string(),
            follow_references: true,
            max_depth: 16,
            reserved_roots: Vec::new(),
        }
    }
}

impl InferConfig {
    /// Parse and validate YAML text (an empty document yields defaults)
    pub fn from_yaml(yaml: &str) -> Result<Self, InferError> {
        let config: InferConfig = if yaml.trim().is_empty() {
            InferConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, InferError> {
        let yaml = fs::read_to_string(path).map_err(|e| InferError::ConfigLoad {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_yaml(&yaml)
    }

    /// Explicit file, else `template-infer.yaml` in the working directory, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, InferError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    tracing::debug!(path = DEFAULT_CONFIG_FILE, "using local config");
                    Self::from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), InferError> {
        if self.max_depth == 0 {
            return Err(InferError::InvalidConfig {
                field: "max_depth".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.templates_dir.as_os_str().is_empty() {
            return Err(InferError::InvalidConfig {
                field: "templates_dir".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.suffix.contains('/') || self.suffix.contains('\\') {
            return Err(InferError::InvalidConfig {
                field: "suffix".into(),
                reason: format!("'{}' must not contain path separators", self.suffix),
            });
        }
        if let Some(bad) = self
            .reserved_roots
            .iter()
            .find(|name| !crate::scan::is_valid_identifier(name))
        {
            return Err(InferError::InvalidConfig {
                field: "reserved_roots".into(),
                reason: format!("'{bad}' is not an identifier"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = InferConfig::default();
        assert_eq!(config.templates_dir, PathBuf::from("templates"));
        assert_eq!(config.suffix, ".html");
        assert!(config.follow_references);
        assert_eq!(config.max_depth, 16);
        assert!(config.reserved_roots.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(InferConfig::from_yaml("").unwrap(), InferConfig::default());
        assert_eq!(InferConfig::from_yaml("  \n").unwrap(), InferConfig::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = InferConfig::from_yaml(
            r#"
templates_dir: site/templates
reserved_roots: [messages, helpers]
"#,
        )
        .unwrap();
        assert_eq!(config.templates_dir, PathBuf::from("site/templates"));
        assert_eq!(config.reserved_roots, vec!["messages", "helpers"]);
        assert_eq!(config.suffix, ".html");
        assert_eq!(config.max_depth, 16);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = InferConfig::from_yaml("template_dir: x").unwrap_err();
        assert!(matches!(err, InferError::YamlParse(_)));
    }

    #[test]
    fn zero_depth_is_invalid() {
        let err = InferConfig::from_yaml("max_depth: 0").unwrap_err();
        assert!(err.to_string().contains("TPL-020"));
        assert!(err.to_string().contains("max_depth"));
    }

    #[test]
    fn invalid_reserved_root() {
        let err = InferConfig::from_yaml("reserved_roots: ['1abc']").unwrap_err();
        assert!(matches!(err, InferError::InvalidConfig { ref field, .. } if field == "reserved_roots"));
    }

    #[test]
    fn missing_file_is_config_load_error() {
        let err = InferConfig::from_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, InferError::ConfigLoad { .. }));
    }
}
