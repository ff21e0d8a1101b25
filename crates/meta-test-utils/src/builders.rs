//! Fluent builders for [`PluginDescriptor`] and [`ResourceDescriptor`].
//!
//! # Example
//!
//! ```rust
//! use meta_test_utils::{PluginBuilder, ResourceBuilder};
//!
//! let descriptor = PluginBuilder::new("tomcat")
//!     .package("org.example.tomcat")
//!     .depends("jmx")
//!     .server(
//!         ResourceBuilder::new("Tomcat Server")
//!             .discovery("TomcatDiscovery")
//!             .service(ResourceBuilder::new("Connector")),
//!     )
//!     .build();
//!
//! assert_eq!(descriptor.servers[0].services[0].name, "Connector");
//! ```

use meta_descriptor::{
    BundleDescriptor, ConfigurationDescriptor, ContentDescriptor, CreateDeletePolicy,
    CreationDataType, DependsDescriptor, DriftDescriptor, EventDescriptor, MetricDescriptor,
    OperationDescriptor, ParentTypeDescriptor, PluginDescriptor, ProcessScanDescriptor,
    PropertyDescriptor, ResourceDescriptor, SubCategoryDescriptor, TypeCallbackDescriptor,
};

/// Builds a [`PluginDescriptor`].
#[derive(Debug, Clone)]
pub struct PluginBuilder {
    descriptor: PluginDescriptor,
}

impl PluginBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            descriptor: PluginDescriptor::new(name),
        }
    }

    pub fn package(mut self, package: &str) -> Self {
        self.descriptor.package = Some(package.to_string());
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.descriptor.version = Some(version.to_string());
        self
    }

    pub fn lifecycle_listener(mut self, class: &str) -> Self {
        self.descriptor.plugin_lifecycle_listener = Some(class.to_string());
        self
    }

    /// Add a required dependency.
    pub fn depends(mut self, plugin: &str) -> Self {
        self.descriptor.depends.push(DependsDescriptor::required(plugin));
        self
    }

    /// Add a required dependency whose classes are shared.
    pub fn depends_with_classes(mut self, plugin: &str) -> Self {
        let mut dep = DependsDescriptor::required(plugin);
        dep.use_classes = true;
        self.descriptor.depends.push(dep);
        self
    }

    pub fn optional_depends(mut self, plugin: &str) -> Self {
        self.descriptor.depends.push(DependsDescriptor::optional(plugin));
        self
    }

    pub fn platform(mut self, resource: ResourceBuilder) -> Self {
        self.descriptor.platforms.push(resource.build());
        self
    }

    pub fn server(mut self, resource: ResourceBuilder) -> Self {
        self.descriptor.servers.push(resource.build());
        self
    }

    pub fn service(mut self, resource: ResourceBuilder) -> Self {
        self.descriptor.services.push(resource.build());
        self
    }

    pub fn discovery_callback(mut self, plugin: &str, type_name: &str, class: &str) -> Self {
        self.descriptor
            .discovery_callbacks
            .push(callback(plugin, type_name, class));
        self
    }

    pub fn upgrade_callback(mut self, plugin: &str, type_name: &str, class: &str) -> Self {
        self.descriptor
            .resource_upgrade_callbacks
            .push(callback(plugin, type_name, class));
        self
    }

    pub fn build(self) -> PluginDescriptor {
        self.descriptor
    }
}

fn callback(plugin: &str, type_name: &str, class: &str) -> TypeCallbackDescriptor {
    TypeCallbackDescriptor {
        plugin: plugin.to_string(),
        type_name: type_name.to_string(),
        callback_class: class.to_string(),
    }
}

/// Builds a [`ResourceDescriptor`] for any of the three node kinds.
#[derive(Debug, Clone)]
pub struct ResourceBuilder {
    resource: ResourceDescriptor,
}

impl ResourceBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            resource: ResourceDescriptor::new(name),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.resource.description = Some(description.to_string());
        self
    }

    pub fn discovery(mut self, class: &str) -> Self {
        self.resource.discovery = Some(class.to_string());
        self
    }

    pub fn component(mut self, class: &str) -> Self {
        self.resource.component_class = Some(class.to_string());
        self
    }

    pub fn singleton(mut self) -> Self {
        self.resource.singleton = true;
        self
    }

    pub fn policy(mut self, policy: CreateDeletePolicy) -> Self {
        self.resource.create_delete_policy = policy;
        self
    }

    pub fn creation_data_type(mut self, data_type: CreationDataType) -> Self {
        self.resource.creation_data_type = data_type;
        self
    }

    /// Embed `type_name` from `plugin` at this position.
    pub fn embeds(mut self, plugin: &str, type_name: &str) -> Self {
        self.resource.source_plugin = Some(plugin.to_string());
        self.resource.source_type = Some(type_name.to_string());
        self
    }

    /// Inject this type below `type_name` of `plugin`.
    pub fn runs_inside(mut self, type_name: &str, plugin: &str) -> Self {
        self.resource.runs_inside.push(ParentTypeDescriptor {
            name: type_name.to_string(),
            plugin: plugin.to_string(),
        });
        self
    }

    pub fn sub_category(mut self, name: &str) -> Self {
        self.resource.sub_category = Some(name.to_string());
        self
    }

    /// Declare a sub-category for descendants, with optional nested ones.
    pub fn declares_sub_category(mut self, name: &str, nested: &[&str]) -> Self {
        self.resource.sub_categories.push(SubCategoryDescriptor {
            name: name.to_string(),
            sub_categories: nested
                .iter()
                .map(|child| SubCategoryDescriptor {
                    name: child.to_string(),
                    ..SubCategoryDescriptor::default()
                })
                .collect(),
            ..SubCategoryDescriptor::default()
        });
        self
    }

    pub fn plugin_property(mut self, name: &str) -> Self {
        self.resource
            .plugin_configuration
            .get_or_insert_with(ConfigurationDescriptor::default)
            .properties
            .push(property(name));
        self
    }

    pub fn resource_property(mut self, name: &str) -> Self {
        self.resource
            .resource_configuration
            .get_or_insert_with(ConfigurationDescriptor::default)
            .properties
            .push(property(name));
        self
    }

    pub fn metric(mut self, property: &str) -> Self {
        self.resource.metrics.push(MetricDescriptor {
            property: property.to_string(),
            ..MetricDescriptor::default()
        });
        self
    }

    pub fn operation(mut self, name: &str) -> Self {
        self.resource.operations.push(OperationDescriptor {
            name: name.to_string(),
            ..OperationDescriptor::default()
        });
        self
    }

    pub fn event(mut self, name: &str) -> Self {
        self.resource.events.push(EventDescriptor {
            name: name.to_string(),
            ..EventDescriptor::default()
        });
        self
    }

    pub fn content(mut self, name: &str) -> Self {
        self.resource.content.push(ContentDescriptor {
            name: name.to_string(),
            ..ContentDescriptor::default()
        });
        self
    }

    pub fn process_scan(mut self, query: &str) -> Self {
        self.resource.process_scans.push(ProcessScanDescriptor {
            name: None,
            query: query.to_string(),
        });
        self
    }

    pub fn drift(mut self, name: &str) -> Self {
        self.resource.drift_definitions.push(DriftDescriptor {
            name: name.to_string(),
            ..DriftDescriptor::default()
        });
        self
    }

    pub fn bundle(mut self, bundle_type: &str) -> Self {
        self.resource.bundle = Some(BundleDescriptor {
            bundle_type: bundle_type.to_string(),
        });
        self
    }

    pub fn server(mut self, child: ResourceBuilder) -> Self {
        self.resource.servers.push(child.build());
        self
    }

    pub fn service(mut self, child: ResourceBuilder) -> Self {
        self.resource.services.push(child.build());
        self
    }

    pub fn build(self) -> ResourceDescriptor {
        self.resource
    }
}

fn property(name: &str) -> PropertyDescriptor {
    PropertyDescriptor {
        name: name.to_string(),
        property_type: "string".to_string(),
        ..PropertyDescriptor::default()
    }
}
