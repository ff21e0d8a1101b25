//! The resource type model.
//!
//! Types form a DAG rather than a tree: a type keeps its natural parent
//! from the descriptor tree and may gain further parents through
//! `runs_inside` injection. Edges are held as [`TypeKey`] sets on both ends,
//! and a type is a root exactly when its parent set is empty.

use std::fmt;

use indexmap::IndexSet;
use meta_descriptor::{
    ClassLoaderType, CreateDeletePolicy, CreationDataType, ProcessScanDescriptor,
    SubCategoryDescriptor,
};
use serde::{Deserialize, Serialize};

use crate::definitions::{
    ConfigurationDefinition, DriftDefinition, EventDefinition, MetricDefinition,
    OperationDefinition, PackageTypeDefinition,
};

/// Identity of a resource type: its name and the plugin that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct TypeKey {
    pub name: String,
    pub plugin: String,
}

impl TypeKey {
    pub fn new(name: impl Into<String>, plugin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugin: plugin.into(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.plugin, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceCategory {
    Platform,
    Server,
    Service,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 3] = [Self::Platform, Self::Server, Self::Service];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Server => "server",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in a sub-category tree declared by a type for its descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCategory {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub children: Vec<SubCategory>,
}

impl SubCategory {
    /// Find a sub-category by name in this node or any descendant.
    pub fn find(&self, name: &str) -> Option<&SubCategory> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}

impl From<&SubCategoryDescriptor> for SubCategory {
    fn from(descriptor: &SubCategoryDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            display_name: descriptor
                .display_name
                .clone()
                .unwrap_or_else(|| descriptor.name.clone()),
            description: descriptor.description.clone(),
            children: descriptor.sub_categories.iter().map(SubCategory::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessScan {
    pub name: Option<String>,
    pub query: String,
}

impl From<&ProcessScanDescriptor> for ProcessScan {
    fn from(descriptor: &ProcessScanDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            query: descriptor.query.clone(),
        }
    }
}

/// A platform, server or service type owned by one plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceType {
    pub(crate) key: TypeKey,
    pub(crate) category: ResourceCategory,
    pub(crate) parents: IndexSet<TypeKey>,
    pub(crate) children: IndexSet<TypeKey>,
    pub description: Option<String>,
    /// Sub-category name as declared, resolved into `sub_category`.
    pub sub_category_name: Option<String>,
    pub sub_category: Option<SubCategory>,
    /// Sub-categories this type declares for its descendants.
    pub child_sub_categories: Vec<SubCategory>,
    pub singleton: bool,
    pub supports_manual_add: bool,
    pub create_delete_policy: CreateDeletePolicy,
    pub creation_data_type: CreationDataType,
    pub class_loader: ClassLoaderType,
    pub plugin_configuration: Option<ConfigurationDefinition>,
    pub resource_configuration: Option<ConfigurationDefinition>,
    pub metric_definitions: Vec<MetricDefinition>,
    pub operation_definitions: Vec<OperationDefinition>,
    pub event_definitions: Vec<EventDefinition>,
    pub package_types: Vec<PackageTypeDefinition>,
    pub process_scans: Vec<ProcessScan>,
    pub drift_definitions: Vec<DriftDefinition>,
    pub bundle_type: Option<String>,
}

impl ResourceType {
    pub fn new(key: TypeKey, category: ResourceCategory) -> Self {
        Self {
            key,
            category,
            parents: IndexSet::new(),
            children: IndexSet::new(),
            description: None,
            sub_category_name: None,
            sub_category: None,
            child_sub_categories: Vec::new(),
            singleton: false,
            supports_manual_add: false,
            create_delete_policy: CreateDeletePolicy::default(),
            creation_data_type: CreationDataType::default(),
            class_loader: ClassLoaderType::default(),
            plugin_configuration: None,
            resource_configuration: None,
            metric_definitions: Vec::new(),
            operation_definitions: Vec::new(),
            event_definitions: Vec::new(),
            package_types: Vec::new(),
            process_scans: Vec::new(),
            drift_definitions: Vec::new(),
            bundle_type: None,
        }
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Name of the owning plugin.
    pub fn plugin(&self) -> &str {
        &self.key.plugin
    }

    pub fn category(&self) -> ResourceCategory {
        self.category
    }

    /// Parent types, natural parent first.
    pub fn parents(&self) -> &IndexSet<TypeKey> {
        &self.parents
    }

    pub fn children(&self) -> &IndexSet<TypeKey> {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn metric(&self, name: &str) -> Option<&MetricDefinition> {
        self.metric_definitions.iter().find(|m| m.name == name)
    }

    pub fn operation(&self, name: &str) -> Option<&OperationDefinition> {
        self.operation_definitions.iter().find(|o| o.name == name)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_key_display() {
        assert_eq!(TypeKey::new("JMX Server", "jmx").to_string(), "{jmx}JMX Server");
    }

    #[test]
    fn test_type_key_orders_by_name_then_plugin() {
        let mut keys = vec![
            TypeKey::new("b", "x"),
            TypeKey::new("a", "z"),
            TypeKey::new("a", "y"),
        ];
        keys.sort();
        assert_eq!(keys[0], TypeKey::new("a", "y"));
        assert_eq!(keys[2], TypeKey::new("b", "x"));
    }

    #[test]
    fn test_sub_category_find_descends() {
        let tree = SubCategory::from(&SubCategoryDescriptor {
            name: "applications".to_string(),
            display_name: None,
            description: None,
            sub_categories: vec![SubCategoryDescriptor {
                name: "web".to_string(),
                display_name: Some("Web Applications".to_string()),
                description: None,
                sub_categories: Vec::new(),
            }],
        });
        assert_eq!(tree.display_name, "applications");
        assert_eq!(tree.find("web").unwrap().display_name, "Web Applications");
        assert!(tree.find("ejb").is_none());
    }

    #[test]
    fn test_new_type_is_root() {
        let ty = ResourceType::new(TypeKey::new("Linux", "platform"), ResourceCategory::Platform);
        assert!(ty.is_root());
        assert_eq!(ty.to_string(), "platform {platform}Linux");
    }
}
