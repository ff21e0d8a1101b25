use std::path::PathBuf;

/// Errors that can occur while reading or validating plugin descriptors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to parse descriptor TOML.
    #[error("failed to parse plugin descriptor: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to parse descriptor JSON.
    #[error("failed to parse plugin descriptor JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Descriptor file not found at the expected path.
    #[error("plugin descriptor not found: {0}")]
    NotFound(PathBuf),

    /// Invalid plugin name.
    #[error("invalid plugin name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Invalid semver version string.
    #[error("invalid version '{version}': {source}")]
    InvalidVersion {
        version: String,
        source: semver::Error,
    },

    /// I/O error reading descriptor files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
