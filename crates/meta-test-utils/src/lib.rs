//! Shared test utilities for the plugin metadata workspace.
//!
//! Test suites across the workspace build descriptors the same way; this
//! crate keeps that in one place. It is a dev-dependency only and never
//! published.
//!
//! # Modules
//!
//! - [`builders`]: fluent [`PluginBuilder`] and [`ResourceBuilder`]
//! - [`fixtures`]: [`DescriptorDir`], a temporary directory of descriptor files
//! - [`logging`]: opt-in tracing output for test runs

pub mod builders;
pub mod fixtures;
pub mod logging;

pub use builders::{PluginBuilder, ResourceBuilder};
pub use fixtures::DescriptorDir;
