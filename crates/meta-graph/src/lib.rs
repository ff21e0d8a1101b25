//! Plugin dependency graph for the resource metadata subsystem.
//!
//! The graph decides the order in which plugins are deployed, so that every
//! plugin is assembled after the plugins it depends on, and reports missing
//! or circular dependencies.

pub mod dependency;
pub mod error;

pub use dependency::{DependencyGraph, PluginDependency};
pub use error::{Error, Result};
