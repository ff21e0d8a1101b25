//! [`DescriptorDir`]: a temporary directory of plugin descriptor files.

use std::fs;
use std::path::{Path, PathBuf};

use meta_descriptor::PluginDescriptor;
use tempfile::TempDir;

/// A temporary directory that descriptor files are written into.
///
/// # Example
///
/// ```rust
/// use meta_descriptor::PluginDescriptor;
/// use meta_test_utils::DescriptorDir;
///
/// let dir = DescriptorDir::new();
/// let path = dir.write_toml("jmx.toml", "name = \"jmx\"\n");
/// assert_eq!(PluginDescriptor::from_path(&path).unwrap().name, "jmx");
/// ```
pub struct DescriptorDir {
    temp_dir: TempDir,
}

impl Default for DescriptorDir {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write raw TOML to `file_name` and return its path.
    pub fn write_toml(&self, file_name: &str, content: &str) -> PathBuf {
        self.write_raw(file_name, content)
    }

    /// Serialize a descriptor to `<plugin name>.json` and return its path.
    pub fn write_descriptor(&self, descriptor: &PluginDescriptor) -> PathBuf {
        let content = serde_json::to_string_pretty(descriptor)
            .expect("DescriptorDir::write_descriptor: descriptor must serialize");
        self.write_raw(&format!("{}.json", descriptor.name), &content)
    }

    /// Write any file below the root, creating parent directories.
    pub fn write_raw(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Every descriptor file in the root, sorted by file name.
    pub fn descriptor_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = fs::read_dir(self.root())
            .unwrap()
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == "toml" || ext == "json")
            })
            .collect();
        paths.sort();
        paths
    }

    /// Parse every descriptor file in the root, sorted by file name.
    pub fn read_all(&self) -> Vec<PluginDescriptor> {
        self.descriptor_paths()
            .iter()
            .map(|path| {
                PluginDescriptor::from_path(path)
                    .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{PluginBuilder, ResourceBuilder};

    #[test]
    fn test_write_descriptor_round_trips_through_path() {
        let dir = DescriptorDir::new();
        let descriptor = PluginBuilder::new("jmx")
            .server(ResourceBuilder::new("JMX Server").service(ResourceBuilder::new("Threading")))
            .build();
        let path = dir.write_descriptor(&descriptor);

        assert!(path.ends_with("jmx.json"));
        assert_eq!(PluginDescriptor::from_path(&path).unwrap(), descriptor);
    }

    #[test]
    fn test_read_all_skips_other_files() {
        let dir = DescriptorDir::new();
        dir.write_toml("b.toml", "name = \"b\"\n");
        dir.write_toml("a.toml", "name = \"a\"\n");
        dir.write_raw("notes.txt", "not a descriptor");

        let names: Vec<String> = dir.read_all().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
