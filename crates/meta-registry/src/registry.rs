//! The cross-plugin metadata registry.
//!
//! Plugins are loaded one at a time, in dependency order. Each load builds a
//! [`TypeAssembler`] against a read-only view of the plugins loaded so far,
//! then commits it: foreign injections are applied, injections other plugins
//! made into an earlier version of the plugin are re-attached, and the
//! category index, disabled set and callback indexes are re-derived.
//!
//! A failed load leaves the registry untouched, including on redeploy: the
//! previous version of the plugin is only replaced once the new one has been
//! assembled successfully.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use meta_descriptor::{PluginDescriptor, TYPE_PATH_SEPARATOR};
use meta_graph::{DependencyGraph, PluginDependency};

use crate::assembler::{Injection, PluginCatalog, TypeAssembler, has_ancestor};
use crate::config::RegistryConfig;
use crate::definitions::{DefinitionParser, StandardDefinitionParser};
use crate::error::{Error, Result};
use crate::types::{ResourceCategory, ResourceType, TypeKey};

/// Callback classes for one target type, grouped by declaring plugin in
/// load order.
pub type CallbackIndex = IndexMap<String, Vec<String>>;

#[derive(Debug)]
pub struct MetadataRegistry {
    config: RegistryConfig,
    parser: Arc<dyn DefinitionParser>,
    assemblers: IndexMap<String, TypeAssembler>,
    by_category: HashMap<ResourceCategory, IndexSet<TypeKey>>,
    disabled_paths: HashSet<String>,
    disabled_types: HashSet<TypeKey>,
    ignored_types: HashSet<TypeKey>,
    discovery_callbacks: HashMap<TypeKey, CallbackIndex>,
    upgrade_callbacks: HashMap<TypeKey, CallbackIndex>,
    graph: DependencyGraph,
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataRegistry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self::with_parser(config, Arc::new(StandardDefinitionParser))
    }

    /// Create a registry that builds definitions with a custom parser.
    pub fn with_parser(config: RegistryConfig, parser: Arc<dyn DefinitionParser>) -> Self {
        let disabled_paths = config.disabled_types.iter().cloned().collect();
        let ignored_types = config.ignored_types.iter().cloned().collect();
        Self {
            config,
            parser,
            assemblers: IndexMap::new(),
            by_category: HashMap::new(),
            disabled_paths,
            disabled_types: HashSet::new(),
            ignored_types,
            discovery_callbacks: HashMap::new(),
            upgrade_callbacks: HashMap::new(),
            graph: DependencyGraph::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Load a plugin, or redeploy it if a plugin with the same name is
    /// already loaded. Returns the keys of the plugin's types.
    ///
    /// Every plugin the descriptor embeds from or injects into must be loaded
    /// first. With `strict_ordering` enabled this is checked for required
    /// dependencies.
    ///
    /// # Errors
    ///
    /// - `Error::Descriptor` if the descriptor fails validation.
    /// - `Error::DependencyNotLoaded` if a required dependency is missing and
    ///   ordering is strict.
    /// - Any assembly error (`InvalidDescriptor`, `DuplicateGlobalType`).
    pub fn load_plugin(&mut self, descriptor: PluginDescriptor) -> Result<Vec<TypeKey>> {
        descriptor.validate()?;
        let name = descriptor.name.clone();

        if self.config.strict_ordering {
            let missing = descriptor.depends.iter().find(|dep| {
                dep.required && dep.plugin != name && !self.assemblers.contains_key(&dep.plugin)
            });
            if let Some(dep) = missing {
                return Err(Error::DependencyNotLoaded {
                    plugin: name,
                    dependency: dep.plugin.clone(),
                });
            }
        }

        let assembler = {
            let catalog = PluginCatalog::excluding(&self.assemblers, &name);
            TypeAssembler::assemble(descriptor, &catalog, self.parser.as_ref())?
        };
        self.check_inbound_cycles(&assembler)?;
        let keys: Vec<TypeKey> = assembler.types().map(|t| t.key().clone()).collect();
        self.graph.add_plugin(
            name.clone(),
            assembler.descriptor().depends.iter().map(PluginDependency::from),
        );

        let previous = self.assemblers.insert(name.clone(), assembler);
        if let Some(old) = &previous {
            self.detach(old);
        }
        self.attach_outbound_injections(&name);
        self.sync_inbound_injections(&name);
        for key in &keys {
            if let Some(ty) = self.resource_type(key) {
                let category = ty.category();
                self.by_category
                    .entry(category)
                    .or_default()
                    .insert(key.clone());
            }
        }
        self.rebuild_disabled_types();
        self.rebuild_callbacks();

        if previous.is_some() {
            tracing::info!("Redeployed plugin '{}' with {} resource types", name, keys.len());
        } else {
            tracing::info!("Loaded plugin '{}' with {} resource types", name, keys.len());
        }
        Ok(keys)
    }

    /// Load several plugins in deployment order. Plugins already loaded
    /// count towards dependency resolution. Returns the names loaded, in
    /// order.
    pub fn load_plugins(
        &mut self,
        descriptors: impl IntoIterator<Item = PluginDescriptor>,
    ) -> Result<Vec<String>> {
        let mut pending: HashMap<String, PluginDescriptor> = HashMap::new();
        for descriptor in descriptors {
            if pending.contains_key(&descriptor.name) {
                return Err(Error::invalid(
                    &descriptor.name,
                    "plugin is listed more than once in one batch",
                ));
            }
            pending.insert(descriptor.name.clone(), descriptor);
        }
        let graph = DependencyGraph::from_descriptors(
            self.assemblers
                .values()
                .map(TypeAssembler::descriptor)
                .chain(pending.values()),
        );

        let mut loaded = Vec::with_capacity(pending.len());
        for name in graph.deployment_order()? {
            if let Some(descriptor) = pending.remove(&name) {
                self.load_plugin(descriptor)?;
                loaded.push(name);
            }
        }
        Ok(loaded)
    }

    /// Remove a plugin's types and every edge they hold. Returns the keys of
    /// the removed types.
    pub fn unload_plugin(&mut self, name: &str) -> Result<Vec<TypeKey>> {
        let Some(old) = self.assemblers.shift_remove(name) else {
            return Err(Error::UnknownPlugin(name.to_string()));
        };

        let dependents: Vec<String> = self
            .graph
            .all_dependents(name)
            .into_iter()
            .filter(|plugin| self.assemblers.contains_key(plugin))
            .collect();
        if !dependents.is_empty() {
            tracing::warn!(
                "Unloading plugin '{}' while loaded plugins depend on it: {}",
                name,
                dependents.join(", ")
            );
        }

        self.detach(&old);
        self.sync_inbound_injections(name);
        self.graph =
            DependencyGraph::from_descriptors(self.assemblers.values().map(TypeAssembler::descriptor));
        self.rebuild_disabled_types();
        self.rebuild_callbacks();

        tracing::info!("Unloaded plugin '{}' ({} resource types)", name, old.len());
        Ok(old.types().map(|t| t.key().clone()).collect())
    }

    /// Loaded plugin names, in load order.
    pub fn plugins(&self) -> impl Iterator<Item = &str> {
        self.assemblers.keys().map(String::as_str)
    }

    pub fn is_loaded(&self, plugin: &str) -> bool {
        self.assemblers.contains_key(plugin)
    }

    pub fn assembler(&self, plugin: &str) -> Option<&TypeAssembler> {
        self.assemblers.get(plugin)
    }

    /// Dependency graph of the loaded plugins.
    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn get_type(&self, name: &str, plugin: &str) -> Option<&ResourceType> {
        self.resource_type(&TypeKey::new(name, plugin))
    }

    pub fn resource_type(&self, key: &TypeKey) -> Option<&ResourceType> {
        self.assemblers.get(&key.plugin)?.resource_type(key)
    }

    pub fn contains_type(&self, key: &TypeKey) -> bool {
        self.resource_type(key).is_some()
    }

    /// Every loaded type, grouped by plugin in load order.
    pub fn types(&self) -> impl Iterator<Item = &ResourceType> {
        self.assemblers.values().flat_map(TypeAssembler::types)
    }

    pub fn type_count(&self) -> usize {
        self.assemblers.values().map(TypeAssembler::len).sum()
    }

    /// Types of one category in the order they were first loaded.
    pub fn types_by_category(&self, category: ResourceCategory) -> Vec<&ResourceType> {
        self.by_category
            .get(&category)
            .map(|keys| keys.iter().filter_map(|key| self.resource_type(key)).collect())
            .unwrap_or_default()
    }

    /// Types without any parent, across all plugins.
    pub fn root_types(&self) -> Vec<&ResourceType> {
        self.types().filter(|ty| ty.is_root()).collect()
    }

    /// Types declared at the top level of one plugin's descriptor.
    pub fn plugin_root_types(&self, plugin: &str) -> Vec<&ResourceType> {
        self.assemblers
            .get(plugin)
            .map(|assembler| assembler.root_types().collect())
            .unwrap_or_default()
    }

    pub fn child_types(&self, key: &TypeKey) -> Vec<&ResourceType> {
        self.resolve_keys(|ty| ty.children(), key)
    }

    pub fn parent_types(&self, key: &TypeKey) -> Vec<&ResourceType> {
        self.resolve_keys(|ty| ty.parents(), key)
    }

    /// Replace the disabled type paths (`plugin>typeA>typeB`) and re-derive
    /// the disabled set.
    pub fn set_disabled_types<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_paths = paths.into_iter().map(Into::into).collect();
        self.rebuild_disabled_types();
    }

    /// Types currently matched by a disabled path.
    pub fn disabled_types(&self) -> impl Iterator<Item = &TypeKey> {
        self.disabled_types.iter()
    }

    /// Replace the ignored type set.
    pub fn set_ignored_types(&mut self, types: impl IntoIterator<Item = TypeKey>) {
        self.ignored_types = types.into_iter().collect();
    }

    pub fn ignored_types(&self) -> impl Iterator<Item = &TypeKey> {
        self.ignored_types.iter()
    }

    pub fn is_disabled_or_ignored_resource_type(&self, key: &TypeKey) -> bool {
        self.disabled_types.contains(key) || self.ignored_types.contains(key)
    }

    /// Fully qualified discovery class of an enabled type.
    ///
    /// # Errors
    ///
    /// - `Error::ResourceTypeNotEnabled` if the type is disabled or ignored.
    /// - `Error::UnknownResourceType` if no such type is loaded.
    pub fn discovery_class(&self, key: &TypeKey) -> Result<Option<&str>> {
        Ok(self.enabled_assembler(key)?.discovery_class(key))
    }

    /// Fully qualified component class of an enabled type.
    pub fn component_class(&self, key: &TypeKey) -> Result<Option<&str>> {
        Ok(self.enabled_assembler(key)?.component_class(key))
    }

    /// Discovery callbacks registered against a type.
    pub fn discovery_callbacks(&self, key: &TypeKey) -> Option<&CallbackIndex> {
        self.discovery_callbacks.get(key)
    }

    /// Resource upgrade callbacks registered against a type.
    pub fn upgrade_callbacks(&self, key: &TypeKey) -> Option<&CallbackIndex> {
        self.upgrade_callbacks.get(key)
    }

    fn enabled_assembler(&self, key: &TypeKey) -> Result<&TypeAssembler> {
        if self.is_disabled_or_ignored_resource_type(key) {
            return Err(Error::ResourceTypeNotEnabled {
                type_key: key.clone(),
            });
        }
        self.assemblers
            .get(&key.plugin)
            .filter(|assembler| assembler.contains(key))
            .ok_or_else(|| Error::UnknownResourceType {
                type_key: key.clone(),
            })
    }

    fn resolve_keys<'a>(
        &'a self,
        select: impl Fn(&'a ResourceType) -> &'a IndexSet<TypeKey>,
        key: &TypeKey,
    ) -> Vec<&'a ResourceType> {
        self.resource_type(key)
            .map(|ty| {
                select(ty)
                    .iter()
                    .filter_map(|k| self.resource_type(k))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove a replaced or unloaded plugin's outbound edges, and the index
    /// entries of types no longer loaded under the same category.
    fn detach(&mut self, old: &TypeAssembler) {
        for injection in old.injections() {
            if let Some(parent) = self.resource_type_mut(&injection.parent) {
                parent.children.shift_remove(&injection.child);
            }
        }
        for ty in old.types() {
            let category = ty.category();
            if self.resource_type(ty.key()).map(ResourceType::category) == Some(category) {
                continue;
            }
            if let Some(keys) = self.by_category.get_mut(&category) {
                keys.shift_remove(ty.key());
            }
        }
    }

    /// Reject a new version of a plugin if re-attaching the injections other
    /// plugins made into it would make a type its own ancestor.
    fn check_inbound_cycles(&self, assembler: &TypeAssembler) -> Result<()> {
        let plugin = assembler.plugin_name();
        let lookup = |key: &TypeKey| {
            if key.plugin == plugin {
                assembler.resource_type(key)
            } else {
                self.resource_type(key)
            }
        };
        let inbound = self
            .assemblers
            .iter()
            .filter(|(name, _)| name.as_str() != plugin)
            .flat_map(|(_, other)| other.injections())
            .filter(|injection| injection.parent.plugin == plugin);
        for injection in inbound {
            if assembler.contains(&injection.parent)
                && has_ancestor(&injection.parent, &injection.child, lookup)
            {
                return Err(Error::invalid(
                    plugin,
                    format!(
                        "{} runs inside {}, which it would contain",
                        injection.child, injection.parent
                    ),
                ));
            }
        }
        Ok(())
    }

    fn attach_outbound_injections(&mut self, plugin: &str) {
        let outbound: Vec<Injection> = self
            .assemblers
            .get(plugin)
            .map(|assembler| assembler.injections().to_vec())
            .unwrap_or_default();
        for injection in outbound {
            if let Some(parent) = self.resource_type_mut(&injection.parent) {
                parent.children.insert(injection.child);
            }
        }
    }

    /// Re-attach injections other plugins made into `plugin`, or drop the
    /// dangling parent edge when the target type no longer exists.
    fn sync_inbound_injections(&mut self, plugin: &str) {
        let inbound: Vec<Injection> = self
            .assemblers
            .values()
            .flat_map(TypeAssembler::injections)
            .filter(|injection| injection.parent.plugin == plugin)
            .cloned()
            .collect();

        for injection in inbound {
            let attached = match self.resource_type_mut(&injection.parent) {
                Some(parent) => {
                    parent.children.insert(injection.child.clone());
                    true
                }
                None => false,
            };
            if let Some(child) = self.resource_type_mut(&injection.child) {
                if attached {
                    child.parents.insert(injection.parent.clone());
                } else {
                    child.parents.shift_remove(&injection.parent);
                    tracing::debug!(
                        child = %injection.child,
                        parent = %injection.parent,
                        "Detached injected type from missing parent"
                    );
                }
            }
        }
    }

    fn resource_type_mut(&mut self, key: &TypeKey) -> Option<&mut ResourceType> {
        self.assemblers.get_mut(&key.plugin)?.resource_type_mut(key)
    }

    /// Walk every loaded plugin's root types down through children and mark
    /// each type whose path matches a disabled path.
    fn rebuild_disabled_types(&mut self) {
        let mut disabled = HashSet::new();
        if !self.disabled_paths.is_empty() {
            for assembler in self.assemblers.values() {
                for root in assembler.root_type_keys() {
                    let path = format!("{}{}{}", root.plugin, TYPE_PATH_SEPARATOR, root.name);
                    self.mark_disabled(root, &path, &mut Vec::new(), &mut disabled);
                }
            }
        }
        if !disabled.is_empty() {
            tracing::debug!(count = disabled.len(), "Disabled resource types");
        }
        self.disabled_types = disabled;
    }

    fn mark_disabled(
        &self,
        key: &TypeKey,
        path: &str,
        on_path: &mut Vec<TypeKey>,
        disabled: &mut HashSet<TypeKey>,
    ) {
        if self.disabled_paths.contains(path) {
            disabled.insert(key.clone());
        }
        let Some(ty) = self.resource_type(key) else {
            return;
        };
        on_path.push(key.clone());
        for child in ty.children() {
            if on_path.contains(child) {
                continue;
            }
            let child_path = format!("{}{}{}", path, TYPE_PATH_SEPARATOR, child.name);
            self.mark_disabled(child, &child_path, on_path, disabled);
        }
        on_path.pop();
    }

    fn rebuild_callbacks(&mut self) {
        self.discovery_callbacks = self.index_callbacks(TypeAssembler::discovery_callbacks);
        self.upgrade_callbacks = self.index_callbacks(TypeAssembler::upgrade_callbacks);
    }

    fn index_callbacks(
        &self,
        select: fn(&TypeAssembler) -> &IndexMap<TypeKey, Vec<String>>,
    ) -> HashMap<TypeKey, CallbackIndex> {
        let mut index: HashMap<TypeKey, CallbackIndex> = HashMap::new();
        for assembler in self.assemblers.values() {
            for (key, classes) in select(assembler) {
                if !self.contains_type(key) {
                    continue;
                }
                index
                    .entry(key.clone())
                    .or_default()
                    .entry(assembler.plugin_name().to_string())
                    .or_default()
                    .extend(classes.iter().cloned());
            }
        }
        index
    }
}
