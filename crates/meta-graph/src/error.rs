/// Errors raised while ordering plugins.
///
/// Both are deterministic functions of the graph contents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A plugin requires another plugin that is not in the graph.
    #[error("plugin '{plugin}' requires plugin '{dependency}', which is not deployed")]
    MissingDependency { plugin: String, dependency: String },

    /// A chain of required dependencies leads back to a plugin being expanded.
    #[error("circular plugin dependency: {path}")]
    CircularDependency {
        /// The cycle, rendered as `a -> b -> a`.
        path: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
