//! Plugin descriptor model for the resource metadata subsystem.
//!
//! Descriptors are the declarative input of the metadata registry: a plugin
//! names its dependencies and the platform, server and service types it can
//! manage. This crate only models and validates them; assembling types is
//! done by `meta-registry`.

pub mod error;
pub mod plugin;
pub mod resource;

pub use error::{Error, Result};
pub use plugin::{DependsDescriptor, PluginDescriptor, TYPE_PATH_SEPARATOR, TypeCallbackDescriptor};
pub use resource::{
    BundleDescriptor, ClassLoaderType, ConfigurationDescriptor, ContentDescriptor,
    CreateDeletePolicy, CreationDataType, DriftDescriptor, EventDescriptor, MetricDataType,
    MetricDescriptor, OperationDescriptor, ParentTypeDescriptor, ProcessScanDescriptor,
    PropertyDescriptor, ResourceDescriptor, SubCategoryDescriptor,
};
