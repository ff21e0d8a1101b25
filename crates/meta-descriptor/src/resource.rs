//! Resource type declarations (platform, server and service nodes) and the
//! metadata sections nested in them.

use serde::{Deserialize, Serialize};

/// One platform, server or service declaration.
///
/// The same shape is used for all three node kinds; which nested children
/// are honoured depends on where the node appears (services do not host
/// servers).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResourceDescriptor {
    /// Type name, unique among its siblings.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Name of the sub-category this type is filed under.
    #[serde(default)]
    pub sub_category: Option<String>,
    /// Sub-categories declared by this type for its descendants.
    #[serde(default)]
    pub sub_categories: Vec<SubCategoryDescriptor>,
    #[serde(default)]
    pub singleton: bool,
    #[serde(default)]
    pub supports_manual_add: bool,
    #[serde(default)]
    pub create_delete_policy: CreateDeletePolicy,
    #[serde(default)]
    pub creation_data_type: CreationDataType,
    #[serde(default)]
    pub class_loader: ClassLoaderType,
    /// Discovery component class, bare or fully qualified.
    #[serde(default)]
    pub discovery: Option<String>,
    /// Resource component class, bare or fully qualified.
    #[serde(default, rename = "class")]
    pub component_class: Option<String>,
    /// Plugin owning the type this declaration embeds.
    #[serde(default)]
    pub source_plugin: Option<String>,
    /// Name of the type this declaration embeds.
    #[serde(default)]
    pub source_type: Option<String>,
    /// Foreign or local parent types this type is injected into.
    #[serde(default)]
    pub runs_inside: Vec<ParentTypeDescriptor>,
    #[serde(default)]
    pub plugin_configuration: Option<ConfigurationDescriptor>,
    #[serde(default)]
    pub resource_configuration: Option<ConfigurationDescriptor>,
    #[serde(default)]
    pub metrics: Vec<MetricDescriptor>,
    #[serde(default)]
    pub operations: Vec<OperationDescriptor>,
    #[serde(default)]
    pub events: Vec<EventDescriptor>,
    #[serde(default)]
    pub content: Vec<ContentDescriptor>,
    #[serde(default)]
    pub process_scans: Vec<ProcessScanDescriptor>,
    #[serde(default)]
    pub drift_definitions: Vec<DriftDescriptor>,
    #[serde(default)]
    pub bundle: Option<BundleDescriptor>,
    /// Nested server declarations.
    #[serde(default)]
    pub servers: Vec<ResourceDescriptor>,
    /// Nested service declarations.
    #[serde(default)]
    pub services: Vec<ResourceDescriptor>,
}

impl ResourceDescriptor {
    /// Create a declaration with only a name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Trimmed `source_plugin`, empty when absent.
    pub fn source_plugin(&self) -> &str {
        self.source_plugin.as_deref().map(str::trim).unwrap_or("")
    }

    /// Trimmed `source_type`, empty when absent.
    pub fn source_type(&self) -> &str {
        self.source_type.as_deref().map(str::trim).unwrap_or("")
    }

    /// Find a service by name anywhere below this node, pre-order.
    pub fn find_nested_service(&self, name: &str) -> Option<&ResourceDescriptor> {
        for service in &self.services {
            if service.name == name {
                return Some(service);
            }
            if let Some(found) = service.find_nested_service(name) {
                return Some(found);
            }
        }
        self.servers
            .iter()
            .find_map(|server| server.find_nested_service(name))
    }
}

/// A `(type, plugin)` pair naming an injection target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParentTypeDescriptor {
    /// Parent type name.
    pub name: String,
    /// Plugin owning the parent type.
    pub plugin: String,
}

/// A sub-category node; sub-categories nest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubCategoryDescriptor {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sub_categories: Vec<SubCategoryDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreateDeletePolicy {
    #[default]
    Both,
    CreateOnly,
    DeleteOnly,
    Neither,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationDataType {
    #[default]
    Configuration,
    Content,
}

/// How the plugin container isolates component classes of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassLoaderType {
    /// Share the plugin's classloader.
    #[default]
    Shared,
    /// One classloader per resource instance.
    Instance,
}

/// A configuration schema section.
///
/// The registry never inspects it; a definition parser turns it into an
/// opaque configuration definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConfigurationDescriptor {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default = "default_property_type", rename = "type")]
    pub property_type: String,
}

fn default_property_type() -> String {
    "string".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MetricDescriptor {
    /// Property name the metric is collected under.
    pub property: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub data_type: MetricDataType,
    #[serde(default)]
    pub default_on: bool,
    /// Collection interval in milliseconds.
    #[serde(default)]
    pub default_interval: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricDataType {
    #[default]
    Measurement,
    Trait,
    Calltime,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OperationDescriptor {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub parameters: Option<ConfigurationDescriptor>,
    #[serde(default)]
    pub results: Option<ConfigurationDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventDescriptor {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContentDescriptor {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_creation_type: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProcessScanDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    /// Process query, e.g. `process|basename|match=^java.*`.
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DriftDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_dir: Option<String>,
    /// Detection interval in seconds.
    #[serde(default)]
    pub interval: Option<u64>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BundleDescriptor {
    #[serde(rename = "type")]
    pub bundle_type: String,
}
