use std::path::PathBuf;

use crate::types::TypeKey;

/// Errors raised while assembling resource types or querying the registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A descriptor is structurally valid but cannot be assembled.
    #[error("invalid descriptor for plugin '{plugin}': {reason}")]
    InvalidDescriptor { plugin: String, reason: String },

    /// Two non-sibling declarations of one plugin share a name. Type identity
    /// includes the owning plugin, so this is the only way a load can collide
    /// with the global index. Siblings sharing a name are `InvalidDescriptor`.
    #[error("duplicate resource type '{type_name}' in plugin '{plugin}'")]
    DuplicateGlobalType { plugin: String, type_name: String },

    /// The type is disabled or ignored and must be skipped.
    #[error("resource type {type_key} is disabled or ignored")]
    ResourceTypeNotEnabled { type_key: TypeKey },

    #[error("unknown resource type {type_key}")]
    UnknownResourceType { type_key: TypeKey },

    /// A plugin was loaded before one of its required dependencies.
    #[error("plugin '{plugin}' requires '{dependency}', which is not loaded")]
    DependencyNotLoaded { plugin: String, dependency: String },

    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error(transparent)]
    Descriptor(#[from] meta_descriptor::Error),

    #[error(transparent)]
    Graph(#[from] meta_graph::Error),

    /// Failed to parse registry configuration TOML.
    #[error("failed to parse registry config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("registry config not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(plugin: &str, reason: impl Into<String>) -> Self {
        Error::InvalidDescriptor {
            plugin: plugin.to_string(),
            reason: reason.into(),
        }
    }
}
