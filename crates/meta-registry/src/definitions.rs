//! Definition objects attached to resource types, and the parser that
//! produces them from descriptor sections.
//!
//! The registry never looks inside these definitions. They are built by a
//! [`DefinitionParser`] and carried on the [`ResourceType`](crate::ResourceType)
//! for the layers that consume them.

use std::collections::HashSet;

use meta_descriptor::{
    ConfigurationDescriptor, ContentDescriptor, DriftDescriptor, EventDescriptor, MetricDataType,
    MetricDescriptor, OperationDescriptor,
};

use crate::error::{Error, Result};

/// A configuration schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationDefinition {
    /// Name of the schema, usually the owning type's name.
    pub name: String,
    pub notes: Option<String>,
    pub properties: Vec<PropertyDefinition>,
}

impl ConfigurationDefinition {
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub required: bool,
    pub default_value: Option<String>,
    pub property_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub units: Option<String>,
    pub data_type: MetricDataType,
    pub default_on: bool,
    pub default_interval: Option<u64>,
    /// Position of the metric on its type, starting at 1.
    pub display_order: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationDefinition {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub timeout: Option<u32>,
    pub parameters: Option<ConfigurationDefinition>,
    pub results: Option<ConfigurationDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefinition {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
}

/// A content (package) type a resource can host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTypeDefinition {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_creation_type: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriftDefinition {
    pub name: String,
    pub description: Option<String>,
    pub base_dir: Option<String>,
    pub interval: Option<u64>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

/// Turns descriptor sections into definition objects.
///
/// Implementations report malformed sections as
/// [`Error::InvalidDescriptor`] for the given plugin.
pub trait DefinitionParser: std::fmt::Debug + Send + Sync {
    fn configuration(
        &self,
        plugin: &str,
        name: &str,
        section: &ConfigurationDescriptor,
    ) -> Result<ConfigurationDefinition>;

    /// Definitions for one metric section. Display order is assigned by
    /// the caller.
    fn metric(&self, section: &MetricDescriptor) -> Vec<MetricDefinition>;

    fn operation(&self, plugin: &str, section: &OperationDescriptor) -> Result<OperationDefinition>;

    fn event(&self, section: &EventDescriptor) -> EventDefinition;

    fn package_type(&self, section: &ContentDescriptor) -> PackageTypeDefinition;

    fn drift(&self, section: &DriftDescriptor) -> DriftDefinition;
}

/// Copies descriptor sections into definitions, defaulting display names
/// to the section name.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDefinitionParser;

impl DefinitionParser for StandardDefinitionParser {
    fn configuration(
        &self,
        plugin: &str,
        name: &str,
        section: &ConfigurationDescriptor,
    ) -> Result<ConfigurationDefinition> {
        let mut seen = HashSet::new();
        let mut properties = Vec::with_capacity(section.properties.len());
        for property in &section.properties {
            if property.name.trim().is_empty() {
                return Err(Error::invalid(
                    plugin,
                    format!("configuration of '{}' has a property without a name", name),
                ));
            }
            if !seen.insert(property.name.as_str()) {
                return Err(Error::invalid(
                    plugin,
                    format!(
                        "configuration of '{}' declares property '{}' twice",
                        name, property.name
                    ),
                ));
            }
            properties.push(PropertyDefinition {
                name: property.name.clone(),
                display_name: display_name(&property.display_name, &property.name),
                description: property.description.clone(),
                required: property.required,
                default_value: property.default_value.clone(),
                property_type: property.property_type.clone(),
            });
        }
        Ok(ConfigurationDefinition {
            name: name.to_string(),
            notes: section.notes.clone(),
            properties,
        })
    }

    fn metric(&self, section: &MetricDescriptor) -> Vec<MetricDefinition> {
        vec![MetricDefinition {
            name: section.property.clone(),
            display_name: display_name(&section.display_name, &section.property),
            description: section.description.clone(),
            units: section.units.clone(),
            data_type: section.data_type,
            default_on: section.default_on,
            default_interval: section.default_interval,
            display_order: 0,
        }]
    }

    fn operation(&self, plugin: &str, section: &OperationDescriptor) -> Result<OperationDefinition> {
        let parameters = section
            .parameters
            .as_ref()
            .map(|p| self.configuration(plugin, &section.name, p))
            .transpose()?;
        let results = section
            .results
            .as_ref()
            .map(|r| self.configuration(plugin, &section.name, r))
            .transpose()?;
        Ok(OperationDefinition {
            name: section.name.clone(),
            display_name: display_name(&section.display_name, &section.name),
            description: section.description.clone(),
            timeout: section.timeout,
            parameters,
            results,
        })
    }

    fn event(&self, section: &EventDescriptor) -> EventDefinition {
        EventDefinition {
            name: section.name.clone(),
            display_name: display_name(&section.display_name, &section.name),
            description: section.description.clone(),
        }
    }

    fn package_type(&self, section: &ContentDescriptor) -> PackageTypeDefinition {
        PackageTypeDefinition {
            name: section.name.clone(),
            display_name: display_name(&section.display_name, &section.name),
            description: section.description.clone(),
            category: section.category.clone(),
            is_creation_type: section.is_creation_type,
        }
    }

    fn drift(&self, section: &DriftDescriptor) -> DriftDefinition {
        DriftDefinition {
            name: section.name.clone(),
            description: section.description.clone(),
            base_dir: section.base_dir.clone(),
            interval: section.interval,
            includes: section.includes.clone(),
            excludes: section.excludes.clone(),
        }
    }
}

fn display_name(explicit: &Option<String>, fallback: &str) -> String {
    explicit
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}
