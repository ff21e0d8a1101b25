//! Registry configuration from the `[registry]` table.
//!
//! # Example TOML
//!
//! ```toml
//! [registry]
//! strict_ordering = true
//! disabled_types = ["jboss>JBossAS Server>Web Application"]
//!
//! [[registry.ignored_types]]
//! plugin = "legacy"
//! name = "Legacy Server"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::TypeKey;

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Settings applied when a [`MetadataRegistry`](crate::MetadataRegistry) is
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Reject loads whose required dependencies are not loaded yet.
    pub strict_ordering: bool,
    /// Disabled type paths of the form `plugin>typeA>typeB`.
    pub disabled_types: Vec<String>,
    /// Types ignored outright, by identity.
    pub ignored_types: Vec<TypeKey>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_ordering: true,
            disabled_types: Vec::new(),
            ignored_types: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// Parse the `[registry]` table of a configuration document. A missing
    /// table yields the defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.registry)
    }
}

/// Read registry configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RegistryConfig> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let config = RegistryConfig::from_toml(&content)?;
    tracing::debug!(
        path = %path.display(),
        disabled = config.disabled_types.len(),
        ignored = config.ignored_types.len(),
        "Loaded registry configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_table_missing() {
        let config = RegistryConfig::from_toml("").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert!(config.strict_ordering);
    }

    #[test]
    fn test_parse_full_table() {
        let toml_str = r#"
[registry]
strict_ordering = false
disabled_types = ["jmx>JMX Server>Threading"]

[[registry.ignored_types]]
plugin = "legacy"
name = "Legacy Server"
"#;
        let config = RegistryConfig::from_toml(toml_str).unwrap();
        assert!(!config.strict_ordering);
        assert_eq!(config.disabled_types, vec!["jmx>JMX Server>Threading"]);
        assert_eq!(
            config.ignored_types,
            vec![TypeKey::new("Legacy Server", "legacy")]
        );
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let config = RegistryConfig::from_toml("[registry]\ndisabled_types = []\n").unwrap();
        assert!(config.strict_ordering);
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = RegistryConfig::from_toml("[registry\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}
