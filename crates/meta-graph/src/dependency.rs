//! Dependency graph and deployment ordering for plugins.
//!
//! Each plugin lists the plugins it depends on. A *required* dependency must
//! be present for the plugin to deploy; an *optional* one is honoured for
//! ordering only when the target is present. The deployment order places
//! every plugin after all of its transitive dependencies.
//!
//! # Example
//!
//! ```
//! use meta_graph::{DependencyGraph, PluginDependency};
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_plugin("platform", []);
//! graph.add_plugin("jmx", [PluginDependency::required("platform")]);
//! graph.add_plugin("tomcat", [
//!     PluginDependency::required("jmx"),
//!     PluginDependency::optional("apache"),
//! ]);
//!
//! let order = graph.deployment_order().unwrap();
//! assert_eq!(order, vec!["platform", "jmx", "tomcat"]);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};

use meta_descriptor::{DependsDescriptor, PluginDescriptor};

use crate::error::{Error, Result};

/// An edge from a plugin to a plugin it depends on.
///
/// Identity is the target name alone: two dependencies on the same plugin
/// compare equal whatever their flags.
#[derive(Debug, Clone, Eq)]
pub struct PluginDependency {
    /// Name of the plugin depended on.
    pub name: String,
    pub required: bool,
    /// Whether the dependent's classloader is parented by this plugin.
    pub use_classes: bool,
}

impl PluginDependency {
    pub fn new(name: impl Into<String>, required: bool, use_classes: bool) -> Self {
        Self {
            name: name.into(),
            required,
            use_classes,
        }
    }

    /// A required dependency without class sharing.
    pub fn required(name: impl Into<String>) -> Self {
        Self::new(name, true, false)
    }

    /// An optional dependency.
    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name, false, false)
    }
}

impl PartialEq for PluginDependency {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for PluginDependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl From<&DependsDescriptor> for PluginDependency {
    fn from(depends: &DependsDescriptor) -> Self {
        Self::new(depends.plugin.clone(), depends.required, depends.use_classes)
    }
}

/// Directed graph of plugin dependencies.
///
/// Plugins are iterated in lexicographic order everywhere, which makes the
/// deployment order reproducible. Dependency targets are not validated when
/// added; missing targets surface when the order is computed.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Plugin name -> its direct dependencies in declaration order.
    dependencies: BTreeMap<String, Vec<PluginDependency>>,
}

impl DependencyGraph {
    /// Create an empty dependency graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from plugin descriptors.
    pub fn from_descriptors<'a>(descriptors: impl IntoIterator<Item = &'a PluginDescriptor>) -> Self {
        let mut graph = Self::new();
        for descriptor in descriptors {
            graph.add_plugin(
                descriptor.name.clone(),
                descriptor.depends.iter().map(PluginDependency::from),
            );
        }
        graph
    }

    /// Add a plugin and its dependencies, replacing any previous entry for
    /// the same plugin.
    ///
    /// Self-dependencies are dropped, as are repeated dependencies on the
    /// same plugin (the first declaration wins).
    pub fn add_plugin(
        &mut self,
        name: impl Into<String>,
        dependencies: impl IntoIterator<Item = PluginDependency>,
    ) {
        let name = name.into();
        let mut seen = HashSet::new();
        let dependencies = dependencies
            .into_iter()
            .filter(|dep| dep.name != name)
            .filter(|dep| seen.insert(dep.name.clone()))
            .collect();
        self.dependencies.insert(name, dependencies);
    }

    /// Whether the plugin is in the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// All plugin names, sorted.
    pub fn plugins(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }

    /// Return the number of plugins.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Direct dependencies of a plugin as declared. Empty for unknown plugins.
    pub fn dependencies(&self, name: &str) -> &[PluginDependency] {
        self.dependencies
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Compute the order in which plugins must be deployed.
    ///
    /// For each plugin (in lexicographic order) its deep dependency set is
    /// computed, then each plugin is inserted at the smallest index that
    /// follows every one of its deep dependencies already placed.
    ///
    /// # Errors
    ///
    /// - `Error::MissingDependency` if a required dependency is absent.
    /// - `Error::CircularDependency` if required dependencies form a cycle.
    pub fn deployment_order(&self) -> Result<Vec<String>> {
        let deep: Vec<(&String, BTreeSet<String>)> = self
            .dependencies
            .keys()
            .map(|name| self.deep_dependencies(name).map(|deep| (name, deep)))
            .collect::<Result<_>>()?;

        let mut order: Vec<String> = Vec::with_capacity(deep.len());
        for (name, deep_deps) in deep {
            let index = order
                .iter()
                .rposition(|placed| deep_deps.contains(placed))
                .map_or(0, |i| i + 1);
            order.insert(index, name.clone());
        }

        tracing::debug!(?order, "Computed plugin deployment order");
        Ok(order)
    }

    /// Whether every required dependency of every plugin is present.
    ///
    /// # Errors
    ///
    /// A circular dependency is not a completeness question and is returned
    /// as `Error::CircularDependency`.
    pub fn is_complete(&self) -> Result<bool> {
        match self.deployment_order() {
            Ok(_) => Ok(true),
            Err(Error::MissingDependency { plugin, dependency }) => {
                tracing::debug!(%plugin, %dependency, "Dependency graph is incomplete");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Return a graph holding only the plugins whose own dependencies can be
    /// fully resolved. Each failing plugin is dropped independently.
    pub fn reduce_graph(&self) -> DependencyGraph {
        let mut reduced = DependencyGraph::new();
        for (name, deps) in &self.dependencies {
            match self.deep_dependencies(name) {
                Ok(_) => {
                    reduced.dependencies.insert(name.clone(), deps.clone());
                }
                Err(e) => {
                    tracing::warn!("Dropping plugin '{}' from dependency graph: {}", name, e);
                }
            }
        }
        reduced
    }

    /// The required dependency whose classes this plugin should see.
    ///
    /// The dependency flagged `use_classes` wins; otherwise the last
    /// declared required dependency.
    pub fn use_classes_dependency(&self, name: &str) -> Option<&str> {
        let required: Vec<&PluginDependency> =
            self.dependencies(name).iter().filter(|d| d.required).collect();
        required
            .iter()
            .find(|d| d.use_classes)
            .or_else(|| required.last())
            .map(|d| d.name.as_str())
    }

    /// Direct dependencies, omitting optional ones that are not present.
    pub fn plugin_dependencies(&self, name: &str) -> Vec<&str> {
        self.dependencies(name)
            .iter()
            .filter(|d| d.required || self.contains(&d.name))
            .map(|d| d.name.as_str())
            .collect()
    }

    /// Plugins that declare a direct optional dependency on `name`.
    pub fn optional_dependents(&self, name: &str) -> Vec<&str> {
        self.dependencies
            .iter()
            .filter(|(_, deps)| deps.iter().any(|d| !d.required && d.name == name))
            .map(|(plugin, _)| plugin.as_str())
            .collect()
    }

    /// Every plugin `name` transitively depends on that is present in the
    /// graph, sorted. Missing targets are skipped rather than reported.
    pub fn all_dependencies(&self, name: &str) -> Vec<String> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            for dep in self.dependencies(current) {
                if dep.name != name && self.contains(&dep.name) && visited.insert(dep.name.clone()) {
                    queue.push_back(&dep.name);
                }
            }
        }
        visited.into_iter().collect()
    }

    /// Every plugin that transitively depends on `name`, through required
    /// and optional edges alike, sorted.
    pub fn all_dependents(&self, name: &str) -> Vec<String> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(current) = queue.pop_front() {
            for (plugin, deps) in &self.dependencies {
                if plugin != name
                    && deps.iter().any(|d| d.name == current)
                    && visited.insert(plugin.clone())
                {
                    queue.push_back(plugin.clone());
                }
            }
        }
        visited.into_iter().collect()
    }

    /// Transitive closure of a plugin's dependencies.
    ///
    /// Required edges are always followed; optional edges only when the
    /// target is present and its own closure resolves.
    fn deep_dependencies(&self, name: &str) -> Result<BTreeSet<String>> {
        let mut deep = BTreeSet::new();
        let mut path = Vec::new();
        self.collect_deep_dependencies(name, &mut path, &mut deep)?;
        Ok(deep)
    }

    fn collect_deep_dependencies(
        &self,
        plugin: &str,
        path: &mut Vec<String>,
        deep: &mut BTreeSet<String>,
    ) -> Result<()> {
        path.push(plugin.to_string());

        for dep in self.dependencies(plugin) {
            if let Some(start) = path.iter().position(|p| *p == dep.name) {
                let mut cycle = path[start..].to_vec();
                cycle.push(dep.name.clone());
                if dep.required {
                    return Err(Error::CircularDependency {
                        path: cycle.join(" -> "),
                    });
                }
                tracing::warn!(
                    "Ignoring optional dependency that closes a cycle: {}",
                    cycle.join(" -> ")
                );
                continue;
            }

            if !self.contains(&dep.name) {
                if dep.required {
                    return Err(Error::MissingDependency {
                        plugin: plugin.to_string(),
                        dependency: dep.name.clone(),
                    });
                }
                tracing::debug!(
                    plugin,
                    dependency = %dep.name,
                    "Skipping optional dependency that is not deployed"
                );
                continue;
            }

            if deep.contains(&dep.name) {
                continue;
            }

            if dep.required {
                deep.insert(dep.name.clone());
                self.collect_deep_dependencies(&dep.name, path, deep)?;
            } else {
                let depth = path.len();
                let mut branch = BTreeSet::new();
                match self.collect_deep_dependencies(&dep.name, path, &mut branch) {
                    Ok(()) => {
                        deep.insert(dep.name.clone());
                        deep.extend(branch);
                    }
                    Err(e) => {
                        path.truncate(depth);
                        tracing::warn!(
                            "Plugin '{}' ignores optional dependency '{}': {}",
                            plugin,
                            dep.name,
                            e
                        );
                    }
                }
            }
        }

        path.pop();
        Ok(())
    }
}

impl fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plugin dependency graph:")?;
        for (plugin, deps) in &self.dependencies {
            let rendered: Vec<String> = deps
                .iter()
                .map(|d| match (d.required, d.use_classes) {
                    (true, true) => format!("{} (use-classes)", d.name),
                    (true, false) => d.name.clone(),
                    (false, _) => format!("{} (optional)", d.name),
                })
                .collect();
            writeln!(f, "  {} -> [{}]", plugin, rendered.join(", "))?;
        }
        Ok(())
    }
}
