//! End-to-end deployment of a plugin set
//!
//! This test exercises the complete flow: descriptor files -> deployment
//! order -> type assembly -> registry queries.

use meta_descriptor::PluginDescriptor;
use meta_graph::DependencyGraph;
use meta_registry::{
    Error, MetadataRegistry, RegistryConfig, ResourceCategory, SharedMetadataRegistry, TypeKey,
};
use meta_test_utils::{DescriptorDir, PluginBuilder, ResourceBuilder, logging};
use pretty_assertions::assert_eq;

const PLATFORM: &str = r#"
name = "platform"
version = "4.0.0"
package = "org.example.plugins.platform"

[[platforms]]
name = "Linux"
discovery = "LinuxPlatformDiscovery"
class = "LinuxPlatformComponent"

[[platforms.sub_categories]]
name = "Applications"
"#;

const JMX: &str = r#"
name = "jmx"
version = "4.0.0"
package = "org.example.plugins.jmx"

[[depends]]
plugin = "platform"

[[servers]]
name = "JMX Server"
discovery = "JmxServerDiscovery"
class = "JmxServerComponent"
sub_category = "Applications"

[[servers.runs_inside]]
name = "Linux"
plugin = "platform"

[[servers.metrics]]
property = "uptime"
units = "seconds"

[[servers.services]]
name = "Threading"
class = "ThreadingComponent"

[[servers.services]]
name = "Memory"
class = "MemoryComponent"
"#;

const TOMCAT: &str = r#"
name = "tomcat"
version = "4.1.0"
package = "org.example.plugins.tomcat"

[[depends]]
plugin = "jmx"
use_classes = true

[[servers]]
name = "Tomcat Server"
discovery = "TomcatDiscovery"
class = "TomcatServerComponent"

[[servers.runs_inside]]
name = "Linux"
plugin = "platform"

[[servers.services]]
name = "Tomcat JVM"
source_plugin = "jmx"
source_type = "JMX Server"

[[servers.services.services]]
name = "Connector"
class = "ConnectorComponent"

[[discovery_callbacks]]
plugin = "jmx"
type = "JMX Server"
callback_class = "TomcatJmxDiscoveryCallback"
"#;

fn write_plugin_set(dir: &DescriptorDir) {
    dir.write_toml("tomcat.toml", TOMCAT);
    dir.write_toml("jmx.toml", JMX);
    dir.write_toml("platform.toml", PLATFORM);
}

fn key(name: &str, plugin: &str) -> TypeKey {
    TypeKey::new(name, plugin)
}

#[test]
fn test_deploy_plugin_set_from_files() {
    logging::init();
    let dir = DescriptorDir::new();
    write_plugin_set(&dir);
    let descriptors = dir.read_all();

    // 1. Order the plugins
    let graph = DependencyGraph::from_descriptors(&descriptors);
    assert!(graph.is_complete().unwrap());
    assert_eq!(
        graph.deployment_order().unwrap(),
        vec!["platform", "jmx", "tomcat"]
    );
    assert_eq!(graph.use_classes_dependency("tomcat"), Some("jmx"));

    // 2. Load them
    let mut registry = MetadataRegistry::new();
    let loaded = registry.load_plugins(descriptors).unwrap();
    assert_eq!(loaded, vec!["platform", "jmx", "tomcat"]);

    // 3. Query the assembled types
    let linux_children: Vec<String> = registry
        .child_types(&key("Linux", "platform"))
        .iter()
        .map(|t| t.key().to_string())
        .collect();
    assert_eq!(linux_children, vec!["{jmx}JMX Server", "{tomcat}Tomcat Server"]);

    let roots: Vec<String> = registry
        .root_types()
        .iter()
        .map(|t| t.key().to_string())
        .collect();
    assert_eq!(roots, vec!["{platform}Linux"]);

    // Embedded service inside a server, with the source's children and metrics
    let tomcat_jvm = registry.get_type("Tomcat JVM", "tomcat").unwrap();
    assert_eq!(tomcat_jvm.category(), ResourceCategory::Service);
    assert_eq!(tomcat_jvm.metric("uptime").unwrap().units.as_deref(), Some("seconds"));
    let jvm_children: Vec<&str> = registry
        .child_types(tomcat_jvm.key())
        .iter()
        .map(|t| t.name())
        .collect();
    assert_eq!(jvm_children, vec!["Threading", "Memory", "Connector"]);

    assert_eq!(
        registry.component_class(&key("Tomcat JVM", "tomcat")).unwrap(),
        Some("org.example.plugins.jmx.JmxServerComponent")
    );
    assert_eq!(
        registry.component_class(&key("Connector", "tomcat")).unwrap(),
        Some("org.example.plugins.tomcat.ConnectorComponent")
    );

    let sub_category = registry
        .get_type("JMX Server", "jmx")
        .and_then(|t| t.sub_category.as_ref())
        .map(|s| s.name.as_str());
    assert_eq!(sub_category, Some("Applications"));

    let callbacks = registry.discovery_callbacks(&key("JMX Server", "jmx")).unwrap();
    assert_eq!(
        callbacks.get("tomcat").map(Vec::as_slice),
        Some(&["org.example.plugins.tomcat.TomcatJmxDiscoveryCallback".to_string()][..])
    );
}

#[test]
fn test_disable_and_redeploy_through_shared_handle() {
    logging::init();
    let dir = DescriptorDir::new();
    write_plugin_set(&dir);

    let config = RegistryConfig {
        disabled_types: vec!["platform>Linux>Tomcat Server>Tomcat JVM".to_string()],
        ..RegistryConfig::default()
    };
    let shared = SharedMetadataRegistry::new(MetadataRegistry::with_config(config));
    shared.load_plugins(dir.read_all()).unwrap();

    let tomcat_jvm = key("Tomcat JVM", "tomcat");
    assert!(shared.is_disabled_or_ignored_resource_type(&tomcat_jvm));
    assert!(matches!(
        shared.discovery_class(&tomcat_jvm),
        Err(Error::ResourceTypeNotEnabled { .. })
    ));

    // Redeploy jmx with one fewer service; tomcat keeps its injection
    // parent and its existing copy.
    let jmx_v2 = PluginBuilder::new("jmx")
        .version("4.1.0")
        .package("org.example.plugins.jmx")
        .depends("platform")
        .server(
            ResourceBuilder::new("JMX Server")
                .runs_inside("Linux", "platform")
                .service(ResourceBuilder::new("Threading")),
        )
        .build();
    let keys = shared.load_plugin(jmx_v2).unwrap();
    assert_eq!(keys, vec![key("JMX Server", "jmx"), key("Threading", "jmx")]);

    let registry = shared.read();
    assert!(registry.get_type("Memory", "jmx").is_none());
    assert!(registry.get_type("Memory", "tomcat").is_some());
    let linux = registry.get_type("Linux", "platform").unwrap();
    assert!(linux.children().contains(&key("JMX Server", "jmx")));
    assert!(linux.children().contains(&key("Tomcat Server", "tomcat")));
    assert_eq!(registry.types_by_category(ResourceCategory::Server).len(), 2);
}

#[test]
fn test_json_and_toml_descriptors_mix() {
    let dir = DescriptorDir::new();
    dir.write_toml("platform.toml", PLATFORM);
    let agent = PluginBuilder::new("agent")
        .depends("platform")
        .server(ResourceBuilder::new("Agent").runs_inside("Linux", "platform"))
        .build();
    dir.write_descriptor(&agent);

    let descriptors: Vec<PluginDescriptor> = dir.read_all();
    assert_eq!(descriptors.len(), 2);

    let mut registry = MetadataRegistry::new();
    assert_eq!(
        registry.load_plugins(descriptors).unwrap(),
        vec!["platform", "agent"]
    );
    assert!(!registry.get_type("Agent", "agent").unwrap().is_root());
}

#[test]
fn test_out_of_order_load_rejected() {
    let dir = DescriptorDir::new();
    let path = dir.write_toml("jmx.toml", JMX);
    let jmx = PluginDescriptor::from_path(&path).unwrap();

    let mut registry = MetadataRegistry::new();
    let err = registry.load_plugin(jmx).unwrap_err();
    assert_eq!(
        err.to_string(),
        "plugin 'jmx' requires 'platform', which is not loaded"
    );
}
