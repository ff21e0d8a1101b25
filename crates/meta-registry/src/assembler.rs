//! Per-plugin assembly of resource types from a descriptor.
//!
//! A [`TypeAssembler`] walks one plugin's platform, server and service
//! declarations and builds a [`ResourceType`] for each. A declaration is
//! either *declared* (all metadata comes from the node itself) or
//! *embedded* (`source_plugin` and `source_type` name another type whose
//! descriptor supplies the metadata and children, with local children
//! added on top). Independently, `runs_inside` *injects* a type as a child
//! of further parent types, possibly owned by other plugins.
//!
//! Other plugins are consulted through a [`PluginCatalog`]: a read-only view
//! of the plugins assembled so far. An assembler never mutates another
//! plugin's types; foreign edges are reported as [`Injection`]s and applied
//! by the registry.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use meta_descriptor::{
    CreateDeletePolicy, PluginDescriptor, ResourceDescriptor, TypeCallbackDescriptor,
};

use crate::definitions::DefinitionParser;
use crate::error::{Error, Result};
use crate::types::{ProcessScan, ResourceCategory, ResourceType, SubCategory, TypeKey};

/// Read-only view of already assembled plugins.
#[derive(Debug, Clone, Copy)]
pub struct PluginCatalog<'a> {
    assemblers: &'a IndexMap<String, TypeAssembler>,
    exclude: Option<&'a str>,
}

impl<'a> PluginCatalog<'a> {
    pub fn new(assemblers: &'a IndexMap<String, TypeAssembler>) -> Self {
        Self {
            assemblers,
            exclude: None,
        }
    }

    /// A view that hides one plugin, used while that plugin is redeployed.
    pub fn excluding(assemblers: &'a IndexMap<String, TypeAssembler>, plugin: &'a str) -> Self {
        Self {
            assemblers,
            exclude: Some(plugin),
        }
    }

    pub fn assembler(&self, plugin: &str) -> Option<&'a TypeAssembler> {
        if self.exclude == Some(plugin) {
            return None;
        }
        self.assemblers.get(plugin)
    }

    pub fn descriptor(&self, plugin: &str) -> Option<&'a PluginDescriptor> {
        self.assembler(plugin).map(TypeAssembler::descriptor)
    }

    pub fn resource_type(&self, key: &TypeKey) -> Option<&'a ResourceType> {
        self.assembler(&key.plugin)?.resource_type(key)
    }
}

/// A child edge into a type owned by another plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Injection {
    /// Foreign parent type.
    pub parent: TypeKey,
    /// Local child type.
    pub child: TypeKey,
}

/// The resource types of one plugin.
#[derive(Debug, Clone)]
pub struct TypeAssembler {
    descriptor: PluginDescriptor,
    types: IndexMap<TypeKey, ResourceType>,
    root_types: Vec<TypeKey>,
    discovery_classes: HashMap<TypeKey, String>,
    component_classes: HashMap<TypeKey, String>,
    injections: Vec<Injection>,
    discovery_callbacks: IndexMap<TypeKey, Vec<String>>,
    upgrade_callbacks: IndexMap<TypeKey, Vec<String>>,
}

impl TypeAssembler {
    /// Assemble a plugin's types.
    ///
    /// Every plugin this descriptor embeds from or injects into must already
    /// be present in `catalog`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDescriptor` for half-specified embedding, unresolved
    ///   `runs_inside` targets, duplicate siblings, duplicate drift names or
    ///   blank callback fields.
    /// - `Error::DuplicateGlobalType` if two non-sibling declarations share a
    ///   name.
    pub fn assemble(
        descriptor: PluginDescriptor,
        catalog: &PluginCatalog<'_>,
        parser: &dyn DefinitionParser,
    ) -> Result<Self> {
        let parts = Builder::new(&descriptor, catalog, parser).run()?;
        tracing::debug!(
            plugin = %descriptor.name,
            types = parts.types.len(),
            injections = parts.injections.len(),
            "Assembled plugin resource types"
        );
        Ok(Self {
            descriptor,
            types: parts.types,
            root_types: parts.root_types,
            discovery_classes: parts.discovery_classes,
            component_classes: parts.component_classes,
            injections: parts.injections,
            discovery_callbacks: parts.discovery_callbacks,
            upgrade_callbacks: parts.upgrade_callbacks,
        })
    }

    pub fn plugin_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    /// All types in declaration order (pre-order over the descriptor tree).
    pub fn types(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn resource_type(&self, key: &TypeKey) -> Option<&ResourceType> {
        self.types.get(key)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.types.contains_key(key)
    }

    /// Types declared at the top level of this plugin's descriptor.
    ///
    /// These are roots only from this plugin's point of view; injection can
    /// give them parents elsewhere.
    pub fn root_types(&self) -> impl Iterator<Item = &ResourceType> {
        self.root_types.iter().filter_map(|key| self.types.get(key))
    }

    pub fn root_type_keys(&self) -> &[TypeKey] {
        &self.root_types
    }

    /// Fully qualified discovery class of a type.
    pub fn discovery_class(&self, key: &TypeKey) -> Option<&str> {
        self.discovery_classes.get(key).map(String::as_str)
    }

    /// Fully qualified component class of a type.
    pub fn component_class(&self, key: &TypeKey) -> Option<&str> {
        self.component_classes.get(key).map(String::as_str)
    }

    pub fn plugin_lifecycle_listener_class(&self) -> Option<String> {
        self.descriptor
            .plugin_lifecycle_listener
            .as_deref()
            .map(str::trim)
            .filter(|class| !class.is_empty())
            .map(|class| qualify_class_name(self.descriptor.package.as_deref(), class))
    }

    /// Edges from this plugin's types into other plugins' types.
    pub fn injections(&self) -> &[Injection] {
        &self.injections
    }

    /// Discovery callback classes by target type, in declaration order.
    pub fn discovery_callbacks(&self) -> &IndexMap<TypeKey, Vec<String>> {
        &self.discovery_callbacks
    }

    /// Resource upgrade callback classes by target type.
    pub fn upgrade_callbacks(&self) -> &IndexMap<TypeKey, Vec<String>> {
        &self.upgrade_callbacks
    }

    pub(crate) fn resource_type_mut(&mut self, key: &TypeKey) -> Option<&mut ResourceType> {
        self.types.get_mut(key)
    }
}

/// Qualify a bare class name with a package. Names that already contain a
/// `.` are returned unchanged, as is every name when there is no package.
pub fn qualify_class_name(package: Option<&str>, class: &str) -> String {
    match package.map(str::trim).filter(|p| !p.is_empty()) {
        Some(package) if !class.contains('.') => format!("{}.{}", package, class),
        _ => class.to_string(),
    }
}

struct Parts {
    types: IndexMap<TypeKey, ResourceType>,
    root_types: Vec<TypeKey>,
    discovery_classes: HashMap<TypeKey, String>,
    component_classes: HashMap<TypeKey, String>,
    injections: Vec<Injection>,
    discovery_callbacks: IndexMap<TypeKey, Vec<String>>,
    upgrade_callbacks: IndexMap<TypeKey, Vec<String>>,
}

/// A declaration waiting to be turned into a type.
struct Pending<'d> {
    node: &'d ResourceDescriptor,
    category: ResourceCategory,
    parent: Option<TypeKey>,
    /// Plugin whose package qualifies this node's bare class names.
    class_owner: &'d str,
    /// Embedded sources expanded on the way down to this node.
    sources: Vec<TypeKey>,
}

enum Origin<'d> {
    Declared,
    Embedded {
        plugin: &'d str,
        key: TypeKey,
        node: &'d ResourceDescriptor,
    },
    /// The embedded source is not available; the node is skipped.
    Missing,
}

#[derive(Clone, Copy)]
enum ClassKind {
    Discovery,
    Component,
}

impl ClassKind {
    fn declared(self, node: &ResourceDescriptor) -> Option<&str> {
        let class = match self {
            ClassKind::Discovery => node.discovery.as_deref(),
            ClassKind::Component => node.component_class.as_deref(),
        };
        class.map(str::trim).filter(|c| !c.is_empty())
    }
}

struct Builder<'d> {
    descriptor: &'d PluginDescriptor,
    catalog: &'d PluginCatalog<'d>,
    parser: &'d dyn DefinitionParser,
    types: IndexMap<TypeKey, ResourceType>,
    root_types: Vec<TypeKey>,
    discovery_classes: HashMap<TypeKey, String>,
    component_classes: HashMap<TypeKey, String>,
    injections: Vec<Injection>,
    siblings: HashSet<(Option<TypeKey>, String)>,
    runs_inside: Vec<(TypeKey, &'d ResourceDescriptor)>,
}

impl<'d> Builder<'d> {
    fn new(
        descriptor: &'d PluginDescriptor,
        catalog: &'d PluginCatalog<'d>,
        parser: &'d dyn DefinitionParser,
    ) -> Self {
        Self {
            descriptor,
            catalog,
            parser,
            types: IndexMap::new(),
            root_types: Vec::new(),
            discovery_classes: HashMap::new(),
            component_classes: HashMap::new(),
            injections: Vec::new(),
            siblings: HashSet::new(),
            runs_inside: Vec::new(),
        }
    }

    fn plugin(&self) -> &'d str {
        &self.descriptor.name
    }

    fn run(mut self) -> Result<Parts> {
        let plugin = self.plugin();
        let descriptor = self.descriptor;

        let top_level = descriptor
            .platforms
            .iter()
            .map(|node| (node, ResourceCategory::Platform))
            .chain(descriptor.servers.iter().map(|node| (node, ResourceCategory::Server)))
            .chain(descriptor.services.iter().map(|node| (node, ResourceCategory::Service)));

        // Stack of pending declarations, popped in descriptor pre-order.
        let mut stack: Vec<Pending<'d>> = top_level
            .rev()
            .map(|(node, category)| Pending {
                node,
                category,
                parent: None,
                class_owner: plugin,
                sources: Vec::new(),
            })
            .collect();

        while let Some(pending) = stack.pop() {
            let children = self.build(pending)?;
            stack.extend(children.into_iter().rev());
        }

        self.resolve_runs_inside()?;
        self.resolve_sub_categories();
        let discovery_callbacks = self.callbacks(&descriptor.discovery_callbacks, "discovery")?;
        let upgrade_callbacks =
            self.callbacks(&descriptor.resource_upgrade_callbacks, "resource upgrade")?;

        Ok(Parts {
            types: self.types,
            root_types: self.root_types,
            discovery_classes: self.discovery_classes,
            component_classes: self.component_classes,
            injections: self.injections,
            discovery_callbacks,
            upgrade_callbacks,
        })
    }

    /// Build one type and return its child declarations in order.
    fn build(&mut self, pending: Pending<'d>) -> Result<Vec<Pending<'d>>> {
        let plugin = self.plugin();
        let declared = pending.node;
        let category = pending.category;

        if declared.name.trim().is_empty() {
            return Err(Error::invalid(plugin, "resource type with an empty name"));
        }

        let origin = self.resolve_origin(&pending)?;
        if let Origin::Missing = origin {
            return Ok(Vec::new());
        }

        let key = TypeKey::new(declared.name.clone(), plugin);
        if !self
            .siblings
            .insert((pending.parent.clone(), declared.name.clone()))
        {
            let scope = match &pending.parent {
                Some(parent) => parent.to_string(),
                None => "the top level".to_string(),
            };
            return Err(Error::invalid(
                plugin,
                format!("type '{}' is declared twice under {}", declared.name, scope),
            ));
        }
        if self.types.contains_key(&key) {
            return Err(Error::DuplicateGlobalType {
                plugin: plugin.to_string(),
                type_name: declared.name.clone(),
            });
        }

        let meta = match &origin {
            Origin::Embedded { node, .. } => *node,
            _ => declared,
        };

        let mut ty = ResourceType::new(key.clone(), category);
        ty.description = declared
            .description
            .clone()
            .or_else(|| meta.description.clone());
        ty.sub_category_name = declared
            .sub_category
            .clone()
            .or_else(|| meta.sub_category.clone());
        ty.child_sub_categories = meta.sub_categories.iter().map(SubCategory::from).collect();
        if let Origin::Embedded { .. } = origin {
            ty.child_sub_categories
                .extend(declared.sub_categories.iter().map(SubCategory::from));
        }
        ty.singleton = declared.singleton;
        ty.supports_manual_add = declared.supports_manual_add;
        ty.creation_data_type = declared.creation_data_type;
        ty.create_delete_policy = match category {
            ResourceCategory::Platform => CreateDeletePolicy::Neither,
            _ => declared.create_delete_policy,
        };
        ty.class_loader = meta.class_loader;
        self.attach_definitions(&mut ty, meta)?;

        let nested = pending.parent.is_some();
        if !ty.process_scans.is_empty()
            && (category == ResourceCategory::Platform
                || (category == ResourceCategory::Service && nested))
        {
            tracing::warn!(
                "Process scans on {} are ignored: only top-level servers and services are discovered by process scan",
                ty
            );
            ty.process_scans.clear();
        }

        if !declared.runs_inside.is_empty() {
            match (category, nested) {
                (ResourceCategory::Platform, _) => {
                    tracing::warn!("Platforms cannot run inside other types; ignoring runs_inside on {}", ty)
                }
                (ResourceCategory::Service, true) => {
                    tracing::warn!(
                        "Only top-level services can be injected; ignoring runs_inside on {}",
                        ty
                    )
                }
                _ => self.runs_inside.push((key.clone(), declared)),
            }
        }

        if let Some(class) = self.class_name(ClassKind::Discovery, &pending, &origin) {
            self.discovery_classes.insert(key.clone(), class);
        }
        if let Some(class) = self.class_name(ClassKind::Component, &pending, &origin) {
            self.component_classes.insert(key.clone(), class);
        }

        let mut children = Vec::new();
        let mut child_sources = pending.sources.clone();
        if let Origin::Embedded {
            plugin: source_plugin,
            key: source_key,
            node: source_node,
        } = &origin
        {
            child_sources.push(source_key.clone());
            self.push_children(
                &mut children,
                *source_node,
                &key,
                category,
                *source_plugin,
                &child_sources,
            );
        }
        self.push_children(
            &mut children,
            declared,
            &key,
            category,
            pending.class_owner,
            &child_sources,
        );

        match &pending.parent {
            Some(parent) => {
                ty.parents.insert(parent.clone());
                if let Some(parent_type) = self.types.get_mut(parent) {
                    parent_type.children.insert(key.clone());
                }
            }
            None => self.root_types.push(key.clone()),
        }

        let embedded = matches!(origin, Origin::Embedded { .. });
        tracing::debug!(resource_type = %ty, embedded, "Parsed resource type");
        self.types.insert(key, ty);
        Ok(children)
    }

    fn push_children(
        &self,
        children: &mut Vec<Pending<'d>>,
        node: &'d ResourceDescriptor,
        parent: &TypeKey,
        category: ResourceCategory,
        class_owner: &'d str,
        sources: &[TypeKey],
    ) {
        let pending = |child: &'d ResourceDescriptor, category: ResourceCategory| Pending {
            node: child,
            category,
            parent: Some(parent.clone()),
            class_owner,
            sources: sources.to_vec(),
        };
        if category == ResourceCategory::Service {
            if !node.servers.is_empty() {
                tracing::warn!(
                    "Services cannot host servers; ignoring {} server declarations under {}",
                    node.servers.len(),
                    parent
                );
            }
        } else {
            children.extend(
                node.servers
                    .iter()
                    .map(|child| pending(child, ResourceCategory::Server)),
            );
        }
        children.extend(
            node.services
                .iter()
                .map(|child| pending(child, ResourceCategory::Service)),
        );
    }

    fn resolve_origin(&self, pending: &Pending<'d>) -> Result<Origin<'d>> {
        let plugin = self.plugin();
        let declared = pending.node;
        let source_plugin = declared.source_plugin();
        let source_type = declared.source_type();

        if source_plugin.is_empty() && source_type.is_empty() {
            return Ok(Origin::Declared);
        }
        if source_plugin.is_empty() || source_type.is_empty() {
            return Err(Error::invalid(
                plugin,
                format!(
                    "both source_plugin and source_type must be set on '{}'",
                    declared.name
                ),
            ));
        }
        if pending.category == ResourceCategory::Platform {
            tracing::warn!(
                "Platforms cannot embed other types; ignoring source of platform '{}'",
                declared.name
            );
            return Ok(Origin::Declared);
        }

        let source_key = TypeKey::new(source_type, source_plugin);
        if pending.sources.contains(&source_key) {
            return Err(Error::invalid(
                plugin,
                format!("'{}' embeds {} recursively", declared.name, source_key),
            ));
        }

        let source_descriptor = if source_plugin == plugin {
            Some(self.descriptor)
        } else {
            self.catalog.descriptor(source_plugin)
        };
        let source_node = source_descriptor.and_then(|descriptor| match pending.category {
            ResourceCategory::Service => find_service(descriptor, source_type)
                .or_else(|| find_server(descriptor, source_type)),
            _ => find_server(descriptor, source_type),
        });

        match source_node {
            Some(node) => {
                tracing::debug!(
                    "Type {{{}}}{} embeds {}",
                    plugin,
                    declared.name,
                    source_key
                );
                Ok(Origin::Embedded {
                    plugin: source_plugin,
                    key: source_key,
                    node,
                })
            }
            None => {
                tracing::warn!(
                    "There is no {} type {}, probably because that plugin is missing; type {{{}}}{} is ignored",
                    pending.category,
                    source_key,
                    plugin,
                    declared.name
                );
                Ok(Origin::Missing)
            }
        }
    }

    fn class_name(&self, kind: ClassKind, pending: &Pending<'d>, origin: &Origin<'d>) -> Option<String> {
        if let Some(class) = kind.declared(pending.node) {
            return Some(qualify_class_name(self.package(pending.class_owner), class));
        }
        let Origin::Embedded { plugin, key, node } = origin else {
            return None;
        };
        self.resolved_class(kind, key)
            .map(str::to_string)
            .or_else(|| kind.declared(node).map(|class| qualify_class_name(self.package(plugin), class)))
    }

    /// Class already resolved for a type assembled earlier.
    fn resolved_class(&self, kind: ClassKind, key: &TypeKey) -> Option<&str> {
        if key.plugin == self.plugin() {
            let classes = match kind {
                ClassKind::Discovery => &self.discovery_classes,
                ClassKind::Component => &self.component_classes,
            };
            return classes.get(key).map(String::as_str);
        }
        let assembler = self.catalog.assembler(&key.plugin)?;
        match kind {
            ClassKind::Discovery => assembler.discovery_class(key),
            ClassKind::Component => assembler.component_class(key),
        }
    }

    fn package(&self, plugin: &str) -> Option<&'d str> {
        if plugin == self.plugin() {
            self.descriptor.package.as_deref()
        } else {
            self.catalog
                .descriptor(plugin)
                .and_then(|descriptor| descriptor.package.as_deref())
        }
    }

    fn attach_definitions(&self, ty: &mut ResourceType, meta: &ResourceDescriptor) -> Result<()> {
        let plugin = self.plugin();
        let name = ty.key.name.clone();

        if let Some(section) = &meta.plugin_configuration {
            ty.plugin_configuration = Some(self.parser.configuration(plugin, &name, section)?);
        }
        if let Some(section) = &meta.resource_configuration {
            ty.resource_configuration = Some(self.parser.configuration(plugin, &name, section)?);
        }

        let mut drift_names = HashSet::new();
        for drift in &meta.drift_definitions {
            if !drift_names.insert(drift.name.as_str()) {
                return Err(Error::invalid(
                    plugin,
                    format!("duplicate drift definition name '{}' on {}", drift.name, ty.key),
                ));
            }
            ty.drift_definitions.push(self.parser.drift(drift));
        }

        let mut display_order = 1;
        for metric in &meta.metrics {
            for mut definition in self.parser.metric(metric) {
                definition.display_order = display_order;
                display_order += 1;
                ty.metric_definitions.push(definition);
            }
        }

        ty.event_definitions = meta.events.iter().map(|e| self.parser.event(e)).collect();
        ty.operation_definitions = meta
            .operations
            .iter()
            .map(|op| self.parser.operation(plugin, op))
            .collect::<Result<_>>()?;
        ty.process_scans = meta.process_scans.iter().map(ProcessScan::from).collect();
        ty.package_types = meta
            .content
            .iter()
            .map(|c| self.parser.package_type(c))
            .collect();
        ty.bundle_type = meta.bundle.as_ref().map(|b| b.bundle_type.clone());
        Ok(())
    }

    fn resolve_runs_inside(&mut self) -> Result<()> {
        let plugin = self.plugin();
        for (child, node) in std::mem::take(&mut self.runs_inside) {
            for target in &node.runs_inside {
                let parent = TypeKey::new(target.name.trim(), target.plugin.trim());
                if parent == child {
                    return Err(Error::invalid(plugin, format!("{} cannot run inside itself", child)));
                }
                if has_ancestor(&parent, &child, |key| self.lookup(key)) {
                    return Err(Error::invalid(
                        plugin,
                        format!("{} cannot run inside {}, which it contains", child, parent),
                    ));
                }

                if parent.plugin == plugin {
                    let Some(parent_type) = self.types.get_mut(&parent) else {
                        return Err(no_such_parent(plugin, &child, &parent));
                    };
                    parent_type.children.insert(child.clone());
                } else if self.catalog.resource_type(&parent).is_some() {
                    let injection = Injection {
                        parent: parent.clone(),
                        child: child.clone(),
                    };
                    if !self.injections.contains(&injection) {
                        self.injections.push(injection);
                    }
                } else {
                    return Err(no_such_parent(plugin, &child, &parent));
                }

                tracing::debug!(%child, %parent, "Injected resource type");
                if let Some(child_type) = self.types.get_mut(&child) {
                    child_type.parents.insert(parent);
                }
            }
        }
        Ok(())
    }

    fn resolve_sub_categories(&mut self) {
        let resolved: Vec<(TypeKey, SubCategory)> = self
            .types
            .values()
            .filter_map(|ty| {
                let name = ty.sub_category_name.as_deref()?;
                match self.find_sub_category(ty, name) {
                    Some(found) => Some((ty.key.clone(), found.clone())),
                    None => {
                        tracing::debug!("No ancestor of {} declares sub-category '{}'", ty, name);
                        None
                    }
                }
            })
            .collect();

        for (key, sub_category) in resolved {
            if let Some(ty) = self.types.get_mut(&key) {
                ty.sub_category = Some(sub_category);
            }
        }
    }

    /// Breadth-first search of the ancestors of `ty` for a declared
    /// sub-category named `name`.
    fn find_sub_category(&self, ty: &ResourceType, name: &str) -> Option<&SubCategory> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<&TypeKey> = ty.parents.iter().collect();
        while let Some(key) = queue.pop_front() {
            if !visited.insert(key) {
                continue;
            }
            let Some(ancestor) = self.lookup(key) else {
                continue;
            };
            if let Some(found) = ancestor
                .child_sub_categories
                .iter()
                .find_map(|sub_category| sub_category.find(name))
            {
                return Some(found);
            }
            queue.extend(ancestor.parents.iter());
        }
        None
    }

    fn lookup(&self, key: &TypeKey) -> Option<&ResourceType> {
        if key.plugin == self.plugin() {
            self.types.get(key)
        } else {
            self.catalog.resource_type(key)
        }
    }

    fn callbacks(
        &self,
        declared: &[TypeCallbackDescriptor],
        kind: &str,
    ) -> Result<IndexMap<TypeKey, Vec<String>>> {
        let plugin = self.plugin();
        let mut callbacks: IndexMap<TypeKey, Vec<String>> = IndexMap::new();
        for callback in declared {
            let target_plugin = callback.plugin.trim();
            let target_type = callback.type_name.trim();
            let class = callback.callback_class.trim();

            if class.is_empty() {
                return Err(Error::invalid(
                    plugin,
                    format!("{} callback for {{{}}}{} has no class", kind, target_plugin, target_type),
                ));
            }
            if target_plugin.is_empty() || target_type.is_empty() {
                return Err(Error::invalid(
                    plugin,
                    format!("{} callback '{}' must name both a plugin and a type", kind, class),
                ));
            }

            let key = TypeKey::new(target_type, target_plugin);
            if self.lookup(&key).is_none() {
                tracing::warn!(
                    "There is no resource type {}, probably because that plugin is missing; {} callback '{}' of plugin '{}' is ignored",
                    key,
                    kind,
                    class,
                    plugin
                );
                continue;
            }

            let fqcn = qualify_class_name(self.descriptor.package.as_deref(), class);
            tracing::debug!(resource_type = %key, class = %fqcn, "Registered {} callback", kind);
            callbacks.entry(key).or_default().push(fqcn);
        }
        Ok(callbacks)
    }
}

/// Whether `ancestor` is `key` or is reachable from it through `parents`.
pub(crate) fn has_ancestor<'a>(
    key: &TypeKey,
    ancestor: &TypeKey,
    lookup: impl Fn(&TypeKey) -> Option<&'a ResourceType>,
) -> bool {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([key.clone()]);
    while let Some(current) = queue.pop_front() {
        if &current == ancestor {
            return true;
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        if let Some(ty) = lookup(&current) {
            queue.extend(ty.parents.iter().cloned());
        }
    }
    false
}

fn no_such_parent(plugin: &str, child: &TypeKey, parent: &TypeKey) -> Error {
    Error::invalid(
        plugin,
        format!("{} runs inside {}, but there is no such resource type", child, parent),
    )
}

fn find_server<'d>(descriptor: &'d PluginDescriptor, name: &str) -> Option<&'d ResourceDescriptor> {
    descriptor.servers.iter().find(|server| server.name == name)
}

/// Look a service up anywhere in a descriptor: top-level services and their
/// descendants first, then services nested under platforms and servers.
fn find_service<'d>(descriptor: &'d PluginDescriptor, name: &str) -> Option<&'d ResourceDescriptor> {
    descriptor
        .services
        .iter()
        .find_map(|service| {
            if service.name == name {
                Some(service)
            } else {
                service.find_nested_service(name)
            }
        })
        .or_else(|| {
            descriptor
                .platforms
                .iter()
                .chain(&descriptor.servers)
                .find_map(|node| node.find_nested_service(name))
        })
}
