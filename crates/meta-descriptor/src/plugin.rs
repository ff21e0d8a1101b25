//! Plugin-level descriptor: identity, dependencies, declared types and callbacks.
//!
//! # Example TOML
//!
//! ```toml
//! name = "jmx"
//! version = "4.2.0"
//! package = "org.example.plugins.jmx"
//!
//! [[depends]]
//! plugin = "platform"
//! use_classes = true
//!
//! [[servers]]
//! name = "JMX Server"
//! discovery = "JmxServerDiscovery"
//! class = "JmxServerComponent"
//!
//! [[servers.services]]
//! name = "VM Memory System"
//! class = "MemoryComponent"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::resource::ResourceDescriptor;

/// Separator used in disabled-type paths (`plugin>typeA>typeB`). Plugin
/// names must not contain it.
pub const TYPE_PATH_SEPARATOR: char = '>';

/// Complete descriptor for one plugin.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PluginDescriptor {
    /// Unique plugin name.
    pub name: String,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Semver version string.
    #[serde(default)]
    pub version: Option<String>,
    /// Package used to qualify bare class names.
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Class notified when the plugin is started or stopped.
    #[serde(default)]
    pub plugin_lifecycle_listener: Option<String>,
    /// Other plugins this plugin depends on.
    #[serde(default)]
    pub depends: Vec<DependsDescriptor>,
    /// Root platform declarations.
    #[serde(default)]
    pub platforms: Vec<ResourceDescriptor>,
    /// Root server declarations.
    #[serde(default)]
    pub servers: Vec<ResourceDescriptor>,
    /// Root service declarations.
    #[serde(default)]
    pub services: Vec<ResourceDescriptor>,
    /// Callbacks invoked with discovery details of (possibly foreign) types.
    #[serde(default)]
    pub discovery_callbacks: Vec<TypeCallbackDescriptor>,
    /// Callbacks invoked when resources of (possibly foreign) types are upgraded.
    #[serde(default)]
    pub resource_upgrade_callbacks: Vec<TypeCallbackDescriptor>,
}

/// A dependency on another plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DependsDescriptor {
    /// Name of the plugin depended on.
    pub plugin: String,
    /// Whether the dependency must be present for this plugin to deploy.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Whether this plugin's classloader should be parented by the dependency.
    #[serde(default)]
    pub use_classes: bool,
}

fn default_required() -> bool {
    true
}

impl DependsDescriptor {
    /// A required dependency without class sharing.
    pub fn required(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            required: true,
            use_classes: false,
        }
    }

    /// An optional dependency.
    pub fn optional(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            required: false,
            use_classes: false,
        }
    }
}

/// A callback registered against a resource type, which may belong to
/// another plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TypeCallbackDescriptor {
    /// Plugin owning the target type.
    pub plugin: String,
    /// Name of the target type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Callback class, bare or fully qualified.
    pub callback_class: String,
}

impl PluginDescriptor {
    /// Create an empty descriptor with the given plugin name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a plugin descriptor from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let descriptor: Self = toml::from_str(content)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Parse a plugin descriptor from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        let descriptor: Self = serde_json::from_str(content)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Read and parse a descriptor file. Files ending in `.json` are read as
    /// JSON, everything else as TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let descriptor = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&content)?
        } else {
            Self::from_toml(&content)?
        };
        tracing::debug!(
            path = %path.display(),
            plugin = %descriptor.name,
            "Read plugin descriptor"
        );
        Ok(descriptor)
    }

    /// Parsed semver version, if the descriptor declares one.
    pub fn semver(&self) -> Result<Option<semver::Version>> {
        self.version
            .as_deref()
            .map(|v| {
                semver::Version::parse(v).map_err(|e| Error::InvalidVersion {
                    version: v.to_string(),
                    source: e,
                })
            })
            .transpose()
    }

    /// Validate plugin-level fields.
    pub fn validate(&self) -> Result<()> {
        let name = &self.name;
        if name.trim().is_empty() {
            return Err(Error::InvalidName {
                name: name.clone(),
                reason: "plugin name must not be empty".to_string(),
            });
        }
        if name.trim() != name {
            return Err(Error::InvalidName {
                name: name.clone(),
                reason: "plugin name must not have leading or trailing whitespace".to_string(),
            });
        }
        if name.contains(TYPE_PATH_SEPARATOR) {
            return Err(Error::InvalidName {
                name: name.clone(),
                reason: format!("plugin name must not contain '{}'", TYPE_PATH_SEPARATOR),
            });
        }

        self.semver()?;

        if let Some(dep) = self.depends.iter().find(|d| d.plugin.trim().is_empty()) {
            return Err(Error::InvalidName {
                name: dep.plugin.clone(),
                reason: format!("plugin '{}' declares a dependency with an empty name", name),
            });
        }

        Ok(())
    }

    /// Iterate over every root declaration: platforms, then servers, then
    /// services.
    pub fn root_declarations(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.platforms
            .iter()
            .chain(self.servers.iter())
            .chain(self.services.iter())
    }
}
