//! A cloneable, lock-guarded handle to a [`MetadataRegistry`].
//!
//! Loads, unloads and configuration changes take the write lock; queries
//! take the read lock and may run concurrently with each other.

use std::sync::Arc;

use meta_descriptor::PluginDescriptor;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Result;
use crate::registry::MetadataRegistry;
use crate::types::{ResourceType, TypeKey};

#[derive(Debug, Clone, Default)]
pub struct SharedMetadataRegistry {
    inner: Arc<RwLock<MetadataRegistry>>,
}

impl SharedMetadataRegistry {
    pub fn new(registry: MetadataRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Shared access for queries that borrow from the registry.
    pub fn read(&self) -> RwLockReadGuard<'_, MetadataRegistry> {
        self.inner.read()
    }

    /// Exclusive access. Hold the guard only as long as the mutation takes.
    pub fn write(&self) -> RwLockWriteGuard<'_, MetadataRegistry> {
        self.inner.write()
    }

    pub fn load_plugin(&self, descriptor: PluginDescriptor) -> Result<Vec<TypeKey>> {
        self.inner.write().load_plugin(descriptor)
    }

    pub fn load_plugins(
        &self,
        descriptors: impl IntoIterator<Item = PluginDescriptor>,
    ) -> Result<Vec<String>> {
        self.inner.write().load_plugins(descriptors)
    }

    pub fn unload_plugin(&self, name: &str) -> Result<Vec<TypeKey>> {
        self.inner.write().unload_plugin(name)
    }

    pub fn set_disabled_types<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.write().set_disabled_types(paths);
    }

    pub fn set_ignored_types(&self, types: impl IntoIterator<Item = TypeKey>) {
        self.inner.write().set_ignored_types(types);
    }

    pub fn is_disabled_or_ignored_resource_type(&self, key: &TypeKey) -> bool {
        self.inner.read().is_disabled_or_ignored_resource_type(key)
    }

    /// A snapshot of one type.
    pub fn get_type(&self, name: &str, plugin: &str) -> Option<ResourceType> {
        self.inner.read().get_type(name, plugin).cloned()
    }

    pub fn discovery_class(&self, key: &TypeKey) -> Result<Option<String>> {
        Ok(self.inner.read().discovery_class(key)?.map(str::to_string))
    }

    pub fn component_class(&self, key: &TypeKey) -> Result<Option<String>> {
        Ok(self.inner.read().component_class(key)?.map(str::to_string))
    }
}

impl From<MetadataRegistry> for SharedMetadataRegistry {
    fn from(registry: MetadataRegistry) -> Self {
        Self::new(registry)
    }
}
