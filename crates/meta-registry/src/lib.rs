//! Resource type assembly and the cross-plugin metadata registry.
//!
//! Plugins declare the platform, server and service types they manage. This
//! crate turns each plugin's descriptor into a set of [`ResourceType`]s
//! (see [`assembler`]) and keeps the loaded plugins in a
//! [`MetadataRegistry`] that answers type, class and callback queries.
//!
//! # Example
//!
//! ```
//! use meta_descriptor::{DependsDescriptor, PluginDescriptor, ResourceDescriptor};
//! use meta_registry::MetadataRegistry;
//!
//! let mut jmx = PluginDescriptor::new("jmx");
//! jmx.servers.push(ResourceDescriptor::new("JMX Server"));
//!
//! let mut tomcat = PluginDescriptor::new("tomcat");
//! tomcat.depends.push(DependsDescriptor::required("jmx"));
//! tomcat.servers.push(ResourceDescriptor::new("Tomcat Server"));
//!
//! let mut registry = MetadataRegistry::new();
//! let order = registry.load_plugins([tomcat, jmx]).unwrap();
//! assert_eq!(order, vec!["jmx", "tomcat"]);
//! assert!(registry.get_type("Tomcat Server", "tomcat").is_some());
//! assert_eq!(registry.root_types().len(), 2);
//! ```

pub mod assembler;
pub mod config;
pub mod definitions;
pub mod error;
pub mod registry;
pub mod shared;
pub mod types;

pub use assembler::{Injection, PluginCatalog, TypeAssembler, qualify_class_name};
pub use config::{RegistryConfig, load_config};
pub use definitions::{
    ConfigurationDefinition, DefinitionParser, DriftDefinition, EventDefinition,
    MetricDefinition, OperationDefinition, PackageTypeDefinition, PropertyDefinition,
    StandardDefinitionParser,
};
pub use error::{Error, Result};
pub use registry::{CallbackIndex, MetadataRegistry};
pub use shared::SharedMetadataRegistry;
pub use types::{ProcessScan, ResourceCategory, ResourceType, SubCategory, TypeKey};
